//! Cache Table Module
//!
//! Keyed collection of cache entries with get-or-recompute, tick countdown,
//! dirty invalidation and the age-based removal sweep.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use tracing::{debug, info, warn};

use crate::cache::{AutomaticMode, CacheEntry, LifecycleHook, Recache, TableStats, TickRegistry};
use crate::error::{CacheError, Result};

/// A table registered with a [`TickRegistry`], shared with the registry's hooks.
pub type SharedTable<T, K, C> = Rc<RefCell<CacheTable<T, K, C>>>;

// == Cache Table ==
/// Cached sequences of `C` keyed by `K`, built from sources yielding `T`.
pub struct CacheTable<T, K, C> {
    /// Entry per key
    entries: HashMap<K, CacheEntry<C>>,
    /// Keys queued for removal during a sweep, reused between sweeps
    to_remove: Vec<K>,
    /// Builds a blank cached value for the update strategy
    factory: Box<dyn Fn() -> C>,
    automatic: AutomaticMode,
    stats: TableStats,
    _source: PhantomData<fn(T)>,
}

impl<T, K, C> CacheTable<T, K, C>
where
    K: Hash + Eq + Clone + Debug,
{
    // == Constructor ==
    /// Creates an empty table.
    ///
    /// # Arguments
    /// * `automatic` - Shared automatic-mode flag, usually from [`TickRegistry::automatic_mode`]
    /// * `factory` - Builds new cached values when the update strategy grows a list
    pub fn new(automatic: AutomaticMode, factory: impl Fn() -> C + 'static) -> Self {
        Self {
            entries: HashMap::new(),
            to_remove: Vec::new(),
            factory: Box::new(factory),
            automatic,
            stats: TableStats::new(),
            _source: PhantomData,
        }
    }

    /// Creates an empty table whose update strategy starts from `C::default()`.
    pub fn with_default(automatic: AutomaticMode) -> Self
    where
        C: Default + 'static,
    {
        Self::new(automatic, C::default)
    }

    // == Get Or Recompute ==
    /// Returns the cached list for `key`, rebuilding it from `source` first if
    /// the entry is missing or due.
    ///
    /// # Arguments
    /// * `source` - Sequence to materialize; only consumed on recompute
    /// * `key` - Stable identity of the call site
    /// * `duration` - Ticks the rebuilt list stays valid
    /// * `strategy` - How source elements become cached values
    ///
    /// # Errors
    /// `InvalidArgument` if `duration` is negative. Nothing is created in that case.
    pub fn get_or_recompute<I>(
        &mut self,
        source: I,
        key: K,
        duration: i64,
        strategy: Recache<'_, T, C>,
    ) -> Result<&[C]>
    where
        I: IntoIterator<Item = T>,
    {
        if duration < 0 {
            return Err(CacheError::InvalidArgument(format!(
                "duration must be non-negative, got {}",
                duration
            )));
        }

        let kind = strategy.kind();
        let automatic = self.automatic.is_enabled();
        let logged_key = self.recompute_key(&key);
        let factory: &dyn Fn() -> C = &*self.factory;
        let entry = self.entries.entry(key).or_default();

        let recomputed = entry.try_recache(source, duration, strategy, factory, automatic);

        if recomputed {
            if let Some(key) = &logged_key {
                debug!(
                    key = ?key,
                    strategy = kind,
                    duration,
                    len = entry.list().len(),
                    "recomputed cached sequence"
                );
            }
            self.stats.record_recompute();
        } else {
            self.stats.record_hit();
        }

        Ok(entry.list())
    }

    // == Tick ==
    /// Counts every entry down one tick and sweeps out the abandoned ones.
    ///
    /// Returns the number of entries removed.
    pub fn tick(&mut self) -> usize {
        for (key, entry) in self.entries.iter_mut() {
            entry.tick();
            if entry.is_abandoned() {
                self.to_remove.push(key.clone());
            }
        }

        self.sweep()
    }

    // == Tick For ==
    /// Counts a single entry down one tick, removing it if it is abandoned.
    ///
    /// # Errors
    /// `KeyNotFound` if the table has no entry for `key`.
    pub fn tick_for(&mut self, key: &K) -> Result<()> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| CacheError::KeyNotFound(format!("{:?}", key)))?;

        entry.tick();

        if entry.is_abandoned() {
            self.entries.remove(key);
            self.stats.record_removals(1);
            debug!(key = ?key, "removed abandoned entry");
        }

        Ok(())
    }

    // == Tick Where ==
    /// Like [`tick`](Self::tick), restricted to keys accepted by `predicate`.
    pub fn tick_where<P>(&mut self, mut predicate: P) -> usize
    where
        P: FnMut(&K) -> bool,
    {
        for (key, entry) in self.entries.iter_mut() {
            if predicate(key) {
                entry.tick();
                if entry.is_abandoned() {
                    self.to_remove.push(key.clone());
                }
            }
        }

        self.sweep()
    }

    // == Set Dirty ==
    /// Makes every entry with ticks left recompute on its next access.
    pub fn set_all_dirty(&mut self) {
        self.entries.values_mut().for_each(CacheEntry::mark_dirty);
    }

    /// Makes the entry for `key` recompute on its next access.
    ///
    /// # Errors
    /// `KeyNotFound` if the table has no entry for `key`.
    pub fn set_dirty(&mut self, key: &K) -> Result<()> {
        self.entries
            .get_mut(key)
            .map(CacheEntry::mark_dirty)
            .ok_or_else(|| CacheError::KeyNotFound(format!("{:?}", key)))
    }

    /// Marks dirty every entry whose key is accepted by `predicate`.
    pub fn set_dirty_where<P>(&mut self, mut predicate: P)
    where
        P: FnMut(&K) -> bool,
    {
        for (key, entry) in self.entries.iter_mut() {
            if entry.remaining_ticks() > 0 && predicate(key) {
                entry.mark_dirty();
            }
        }
    }

    // == Clear ==
    /// Removes every entry unconditionally.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.to_remove.clear();
    }

    // == Register ==
    /// Moves the table behind a shared handle and appends its tick,
    /// set-all-dirty and clear hooks to `registry`.
    ///
    /// The table's automatic mode is rebound to the registry's switch.
    /// Hooks hold a weak reference; once every handle is dropped they do nothing.
    pub fn register(mut self, registry: &mut TickRegistry) -> SharedTable<T, K, C>
    where
        T: 'static,
        K: 'static,
        C: 'static,
    {
        self.automatic = registry.automatic_mode();

        let shared = Rc::new(RefCell::new(self));
        let weak = Rc::downgrade(&shared);

        registry.add_tick_hook(hook(weak.clone(), |table| {
            table.tick();
        }));
        registry.add_set_all_dirty_hook(hook(weak.clone(), CacheTable::set_all_dirty));
        registry.add_clear_hook(hook(weak, CacheTable::clear));

        info!(
            table = std::any::type_name::<Self>(),
            "cache table registered"
        );

        shared
    }

    // == Accessors ==
    /// Cached list for `key` without recomputing or counting down.
    pub fn get(&self, key: &K) -> Option<&[C]> {
        self.entries.get(key).map(CacheEntry::list)
    }

    pub fn remaining_ticks(&self, key: &K) -> Option<i64> {
        self.entries.get(key).map(CacheEntry::remaining_ticks)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current statistics with an up to date entry count.
    pub fn stats(&self) -> TableStats {
        let mut stats = self.stats.clone();
        stats.set_live_entries(self.entries.len());
        stats
    }

    /// Copy of `key` if the next access recomputes it, for the recompute log.
    fn recompute_key(&self, key: &K) -> Option<K> {
        self.entries
            .get(key)
            .map_or(true, CacheEntry::is_due)
            .then(|| key.clone())
    }

    // == Sweep ==
    /// Applies the removals queued during a tick pass.
    fn sweep(&mut self) -> usize {
        let count = self.to_remove.len();
        if count == 0 {
            return 0;
        }

        if count == self.entries.len() {
            self.entries.clear();
            self.to_remove.clear();
        } else {
            for key in self.to_remove.drain(..) {
                self.entries.remove(&key);
            }
        }

        self.stats.record_removals(count);
        debug!(removed = count, remaining = self.entries.len(), "removal sweep");

        count
    }
}

/// Wraps a table operation into a registry hook bound to a weak handle.
fn hook<T, K, C>(
    table: Weak<RefCell<CacheTable<T, K, C>>>,
    op: fn(&mut CacheTable<T, K, C>),
) -> LifecycleHook
where
    T: 'static,
    K: 'static,
    C: 'static,
{
    Box::new(move || {
        let Some(table) = table.upgrade() else {
            return;
        };
        match table.try_borrow_mut() {
            Ok(mut table) => op(&mut table),
            Err(_) => warn!(
                table = std::any::type_name::<CacheTable<T, K, C>>(),
                "table busy during broadcast, skipped"
            ),
        };
    })
}

impl<T, K: Debug, C> Debug for CacheTable<T, K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheTable")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .field("automatic", &self.automatic.is_enabled())
            .field("stats", &self.stats)
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn table(automatic: bool) -> CacheTable<i32, &'static str, i32> {
        CacheTable::with_default(AutomaticMode::new(automatic))
    }

    #[test]
    fn test_table_new() {
        let table = table(false);
        assert!(table.is_empty());
        assert_eq!(table.stats(), TableStats::new());
    }

    #[test]
    fn test_get_or_recompute_creates_entry() {
        let mut table = table(false);

        let list = table.get_or_recompute(vec![1, 2], "k", 3, Recache::direct()).unwrap();

        assert_eq!(list, &[1, 2]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.remaining_ticks(&"k"), Some(3));
    }

    #[test]
    fn test_second_call_hits_cache() {
        let calls = Cell::new(0);
        let selector = |v: i32| {
            calls.set(calls.get() + 1);
            v * 10
        };
        let mut table = table(true);

        table.get_or_recompute(vec![1, 2], "k", 5, Recache::Transform(&selector)).unwrap();
        let list = table
            .get_or_recompute(vec![3], "k", 5, Recache::Transform(&selector))
            .unwrap()
            .to_vec();

        assert_eq!(list, vec![10, 20]);
        assert_eq!(calls.get(), 2);
        assert_eq!(table.stats().hits, 1);
        assert_eq!(table.stats().recomputes, 1);
    }

    #[test]
    fn test_recompute_key_only_for_due_entries() {
        let mut table = table(false);
        assert_eq!(table.recompute_key(&"new"), Some("new"));

        table.get_or_recompute(vec![1], "k", 2, Recache::direct()).unwrap();
        assert_eq!(table.recompute_key(&"k"), None);

        table.set_dirty(&"k").unwrap();
        assert_eq!(table.recompute_key(&"k"), Some("k"));
    }

    #[test]
    fn test_negative_duration_rejected() {
        let mut table = table(false);

        let result = table.get_or_recompute(vec![1], "k", -1, Recache::direct());

        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
        assert!(table.is_empty());
    }

    #[test]
    fn test_zero_duration_recomputes_every_call() {
        let mut table = table(false);

        table.get_or_recompute(vec![1], "k", 0, Recache::direct()).unwrap();
        let list = table.get_or_recompute(vec![2], "k", 0, Recache::direct()).unwrap();

        assert_eq!(list, &[2]);
    }

    #[test]
    fn test_tick_for_missing_key() {
        let mut table = table(false);
        assert!(matches!(table.tick_for(&"nope"), Err(CacheError::KeyNotFound(_))));
    }

    #[test]
    fn test_tick_for_removes_abandoned() {
        let mut table = table(false);
        table.get_or_recompute(vec![1], "k", 1, Recache::direct()).unwrap();

        // 1 -> 0 -> -1 -> -2 stays, -3 is past -(1) - 1
        for _ in 0..3 {
            table.tick_for(&"k").unwrap();
        }
        assert!(table.contains_key(&"k"));

        table.tick_for(&"k").unwrap();
        assert!(!table.contains_key(&"k"));
        assert_eq!(table.stats().removals, 1);
    }

    #[test]
    fn test_tick_sweeps_only_abandoned() {
        let mut table = table(false);
        table.get_or_recompute(vec![1], "short", 0, Recache::direct()).unwrap();
        table.get_or_recompute(vec![2], "long", 10, Recache::direct()).unwrap();

        assert_eq!(table.tick(), 0);
        assert_eq!(table.tick(), 1);

        assert!(!table.contains_key(&"short"));
        assert!(table.contains_key(&"long"));
    }

    #[test]
    fn test_tick_sweeps_everything_at_once() {
        let mut table = table(false);
        table.get_or_recompute(vec![1], "a", 0, Recache::direct()).unwrap();
        table.get_or_recompute(vec![2], "b", 0, Recache::direct()).unwrap();

        table.tick();
        assert_eq!(table.tick(), 2);
        assert!(table.is_empty());
        assert_eq!(table.stats().removals, 2);
    }

    #[test]
    fn test_tick_where_respects_predicate() {
        let mut table = table(false);
        table.get_or_recompute(vec![1], "enemy:1", 2, Recache::direct()).unwrap();
        table.get_or_recompute(vec![2], "ally:1", 2, Recache::direct()).unwrap();

        table.tick_where(|key| key.starts_with("enemy"));

        assert_eq!(table.remaining_ticks(&"enemy:1"), Some(1));
        assert_eq!(table.remaining_ticks(&"ally:1"), Some(2));
    }

    #[test]
    fn test_set_all_dirty_leaves_due_entries() {
        let mut table = table(false);
        table.get_or_recompute(vec![1], "fresh", 5, Recache::direct()).unwrap();
        table.get_or_recompute(vec![2], "stale", 1, Recache::direct()).unwrap();
        table.tick_for(&"stale").unwrap();
        table.tick_for(&"stale").unwrap();

        table.set_all_dirty();

        assert_eq!(table.remaining_ticks(&"fresh"), Some(0));
        assert_eq!(table.remaining_ticks(&"stale"), Some(-1));
    }

    #[test]
    fn test_set_dirty_forces_recompute() {
        let mut table = table(false);
        table.get_or_recompute(vec![1], "k", 5, Recache::direct()).unwrap();

        table.set_dirty(&"k").unwrap();
        let list = table.get_or_recompute(vec![2], "k", 5, Recache::direct()).unwrap();

        assert_eq!(list, &[2]);
        assert!(matches!(table.set_dirty(&"nope"), Err(CacheError::KeyNotFound(_))));
    }

    #[test]
    fn test_set_dirty_where() {
        let mut table = table(false);
        table.get_or_recompute(vec![1], "a", 4, Recache::direct()).unwrap();
        table.get_or_recompute(vec![2], "b", 4, Recache::direct()).unwrap();

        table.set_dirty_where(|key| *key == "a");

        assert_eq!(table.remaining_ticks(&"a"), Some(0));
        assert_eq!(table.remaining_ticks(&"b"), Some(4));
    }

    #[test]
    fn test_clear() {
        let mut table = table(false);
        table.get_or_recompute(vec![1], "a", 4, Recache::direct()).unwrap();
        table.get_or_recompute(vec![2], "b", 4, Recache::direct()).unwrap();

        table.clear();

        assert!(table.is_empty());
        assert_eq!(table.get(&"a"), None);
    }

    #[test]
    fn test_register_hooks_drive_table() {
        let mut registry = TickRegistry::new(false);
        let shared = table(false).register(&mut registry);
        shared
            .borrow_mut()
            .get_or_recompute(vec![1], "k", 2, Recache::direct())
            .unwrap();

        registry.tick_all();
        assert_eq!(shared.borrow().remaining_ticks(&"k"), Some(1));

        registry.set_all_dirty_all();
        assert_eq!(shared.borrow().remaining_ticks(&"k"), Some(0));

        registry.clear_all();
        assert!(shared.borrow().is_empty());
    }

    #[test]
    fn test_register_binds_registry_automatic_mode() {
        let mut registry = TickRegistry::new(false);
        // Built with automatic on, but the registry's switch wins once registered
        let shared = table(true).register(&mut registry);

        shared
            .borrow_mut()
            .get_or_recompute(vec![1], "a", 3, Recache::direct())
            .unwrap();
        assert_eq!(shared.borrow().remaining_ticks(&"a"), Some(3));

        registry.set_automatic_mode(true);
        shared
            .borrow_mut()
            .get_or_recompute(vec![1], "b", 3, Recache::direct())
            .unwrap();
        assert_eq!(shared.borrow().remaining_ticks(&"b"), Some(2));
    }

    #[test]
    fn test_dropped_table_hooks_are_inert() {
        let mut registry = TickRegistry::new(false);
        let shared = table(false).register(&mut registry);
        drop(shared);

        registry.tick_all();
        registry.clear_all();
        assert_eq!(registry.hook_count(), 1);
    }

    #[test]
    fn test_busy_table_skipped_by_broadcast() {
        let mut registry = TickRegistry::new(false);
        let shared = table(false).register(&mut registry);
        shared
            .borrow_mut()
            .get_or_recompute(vec![1], "k", 2, Recache::direct())
            .unwrap();

        {
            let _guard = shared.borrow();
            registry.tick_all();
        }

        assert_eq!(shared.borrow().remaining_ticks(&"k"), Some(2));
    }
}
