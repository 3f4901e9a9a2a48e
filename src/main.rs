//! Frame Cache demo driver
//!
//! Runs a small frame loop against the cache: a random value that only
//! changes every few frames, then a per-value info record that is refreshed
//! in place.

use anyhow::Result;
use rand::Rng;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use frame_cache::{CacheManager, Cached, Config};

/// Info derived from a random int, rebuilt in place on recompute.
#[derive(Debug, Default)]
struct IntInfo {
    value: i32,
    even: bool,
    negative: bool,
}

fn random_values(count: usize) -> impl Iterator<Item = i32> {
    let mut rng = rand::thread_rng();
    (0..count).map(move |_| rng.gen_range(-100..100))
}

fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "frame_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: automatic_mode={}, cache_duration={}, demo_frames={}",
        config.automatic_mode, config.cache_duration, config.demo_frames
    );

    let mut manager = CacheManager::from_config(&config);

    println!("--- Cached random value ---");
    println!();

    for _ in 0..config.demo_frames {
        for value in random_values(1)
            .cached(&mut manager, config.cache_duration, 0u32)?
            .iter()
        {
            println!("{}", value);
        }

        manager.tick_all();
    }

    println!();
    println!("--- Cached ints info ---");
    println!();

    let mut updater = |value: i32, cached: &mut IntInfo| {
        println!("(caching int)");
        cached.value = value;
        cached.even = value % 2 == 0;
        cached.negative = value < 0;
    };

    for _ in 0..config.demo_frames {
        for info in random_values(2)
            .cached_update(&mut manager, config.cache_duration, 1u32, &mut updater)?
            .iter()
        {
            println!("{}, even={}, negative={}", info.value, info.even, info.negative);
        }

        println!();
        manager.tick_all();
    }

    let ints = manager.table::<i32, u32, i32>();
    let infos = manager.table::<i32, u32, IntInfo>();
    info!("Random value table: {}", serde_json::to_string(&ints.borrow().stats())?);
    info!("Int info table: {}", serde_json::to_string(&infos.borrow().stats())?);

    Ok(())
}
