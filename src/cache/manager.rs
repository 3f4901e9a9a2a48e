//! Cache Manager Module
//!
//! Owns the tick registry and one cache table per (source, key, cached) type
//! combination. Tables are created and registered the first time they are asked for.

use std::any::{Any, TypeId};
use std::cell::Ref;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::cache::{CacheTable, Recache, SharedTable, TickRegistry};
use crate::config::Config;
use crate::error::Result;

// == Cache Manager ==
/// Explicit home for every cache table in a program, plus their shared registry.
#[derive(Debug)]
pub struct CacheManager {
    registry: TickRegistry,
    /// Shared tables, keyed by the `TypeId` of their concrete `CacheTable` type
    tables: HashMap<TypeId, Box<dyn Any>>,
}

impl CacheManager {
    // == Constructor ==
    pub fn new(automatic_mode: bool) -> Self {
        Self {
            registry: TickRegistry::new(automatic_mode),
            tables: HashMap::new(),
        }
    }

    /// Creates a manager with the automatic mode from the configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.automatic_mode)
    }

    pub fn registry(&self) -> &TickRegistry {
        &self.registry
    }

    pub fn set_automatic_mode(&self, enabled: bool) {
        self.registry.set_automatic_mode(enabled);
    }

    pub fn is_automatic(&self) -> bool {
        self.registry.is_automatic()
    }

    /// Number of distinct tables created so far.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    // == Table ==
    /// Shared table for this type combination, created on first use with
    /// `C::default` as its factory.
    ///
    /// ```
    /// use frame_cache::{CacheManager, Recache};
    ///
    /// let mut manager = CacheManager::new(true);
    /// let table = manager.table::<i32, &str, i32>();
    /// table
    ///     .borrow_mut()
    ///     .get_or_recompute(vec![1, 2], "scores", 3, Recache::direct())
    ///     .unwrap();
    ///
    /// manager.tick_all();
    /// assert_eq!(table.borrow().remaining_ticks(&"scores"), Some(1));
    /// ```
    pub fn table<T, K, C>(&mut self) -> SharedTable<T, K, C>
    where
        T: 'static,
        K: Hash + Eq + Clone + Debug + 'static,
        C: Default + 'static,
    {
        self.table_with_factory(C::default)
    }

    /// Shared table for this type combination. `factory` is only used if the
    /// table does not exist yet.
    pub fn table_with_factory<T, K, C>(&mut self, factory: impl Fn() -> C + 'static) -> SharedTable<T, K, C>
    where
        T: 'static,
        K: Hash + Eq + Clone + Debug + 'static,
        C: 'static,
    {
        self.slot(factory).clone()
    }

    // == Cached ==
    /// Runs get-or-recompute on the table for this type combination and
    /// borrows the resulting list.
    ///
    /// The returned guard must be dropped before the next broadcast, or that
    /// broadcast skips the table.
    pub fn cached<I, K, C>(
        &mut self,
        source: I,
        key: K,
        duration: i64,
        strategy: Recache<'_, I::Item, C>,
    ) -> Result<Ref<'_, [C]>>
    where
        I: IntoIterator,
        I::Item: 'static,
        K: Hash + Eq + Clone + Debug + 'static,
        C: Default + 'static,
    {
        let table = self.slot::<I::Item, K, C>(C::default);

        table
            .borrow_mut()
            .get_or_recompute(source, key.clone(), duration, strategy)?;

        Ok(Ref::map(table.borrow(), move |table| table.get(&key).unwrap_or(&[])))
    }

    // == Broadcasts ==
    pub fn tick_all(&self) {
        self.registry.tick_all();
    }

    pub fn set_all_dirty_all(&self) {
        self.registry.set_all_dirty_all();
    }

    pub fn clear_all(&self) {
        self.registry.clear_all();
    }

    /// Finds or creates the stored table for `CacheTable<T, K, C>`.
    fn slot<T, K, C>(&mut self, factory: impl Fn() -> C + 'static) -> &SharedTable<T, K, C>
    where
        T: 'static,
        K: Hash + Eq + Clone + Debug + 'static,
        C: 'static,
    {
        let registry = &mut self.registry;

        self.tables
            .entry(TypeId::of::<CacheTable<T, K, C>>())
            .or_insert_with(|| {
                let table = CacheTable::<T, K, C>::new(registry.automatic_mode(), factory);
                Box::new(table.register(registry))
            })
            .downcast_ref::<SharedTable<T, K, C>>()
            // The slot for this TypeId only ever holds a SharedTable<T, K, C>
            .expect("tables are stored under their own TypeId")
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new(false)
    }
}
