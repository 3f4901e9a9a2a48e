//! Call-site sugar
//!
//! Lets any iterable be cached inline, e.g.
//! `enemies.iter().copied().cached(&mut manager, 3, "visible")?`, keyed by the
//! caller and routed to the manager's table for the matching types.

use std::cell::Ref;
use std::fmt::Debug;
use std::hash::Hash;

use crate::cache::{CacheManager, Recache};
use crate::error::Result;

/// Extension methods caching an iterable's output under a key.
pub trait Cached: IntoIterator + Sized {
    /// Caches the elements themselves.
    fn cached<K>(self, manager: &mut CacheManager, duration: i64, key: K) -> Result<Ref<'_, [Self::Item]>>
    where
        K: Hash + Eq + Clone + Debug + 'static,
        Self::Item: Default + 'static,
    {
        manager.cached(self, key, duration, Recache::direct())
    }

    /// Caches `selector(element)` for each element.
    fn cached_map<'m, K, C>(
        self,
        manager: &'m mut CacheManager,
        duration: i64,
        key: K,
        selector: &dyn Fn(Self::Item) -> C,
    ) -> Result<Ref<'m, [C]>>
    where
        K: Hash + Eq + Clone + Debug + 'static,
        C: Default + 'static,
        Self::Item: 'static,
    {
        manager.cached(self, key, duration, Recache::Transform(selector))
    }

    /// Writes each element into a reused cached value through `updater`.
    fn cached_update<'m, K, C>(
        self,
        manager: &'m mut CacheManager,
        duration: i64,
        key: K,
        updater: &mut dyn FnMut(Self::Item, &mut C),
    ) -> Result<Ref<'m, [C]>>
    where
        K: Hash + Eq + Clone + Debug + 'static,
        C: Default + 'static,
        Self::Item: 'static,
    {
        manager.cached(self, key, duration, Recache::Update(updater))
    }
}

impl<I: IntoIterator> Cached for I {}
