//! Configuration Module
//!
//! Handles loading cache and driver settings from environment variables.

use std::env;

/// Frame cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether get-or-recompute calls count down their entry automatically
    pub automatic_mode: bool,
    /// Number of ticks a recomputed entry stays valid in the demo driver
    pub cache_duration: i64,
    /// Number of frames the demo driver runs per scenario
    pub demo_frames: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `AUTOMATIC_MODE` - Automatic countdown on access (default: false)
    /// - `CACHE_DURATION` - Validity in ticks (default: 3)
    /// - `DEMO_FRAMES` - Frames per demo scenario (default: 10)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            automatic_mode: env::var("AUTOMATIC_MODE")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.automatic_mode),
            cache_duration: env::var("CACHE_DURATION")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|d: &i64| *d >= 0)
                .unwrap_or(defaults.cache_duration),
            demo_frames: env::var("DEMO_FRAMES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.demo_frames),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            automatic_mode: false,
            cache_duration: 3,
            demo_frames: 10,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
