//! Tick Registry Module
//!
//! Broadcast point for every registered cache table. Tables append their
//! tick, set-all-dirty and clear hooks once; the host loop drives them all
//! through the registry, typically once per frame.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

/// Zero-argument lifecycle callback registered by a table.
pub type LifecycleHook = Box<dyn Fn()>;

// == Automatic Mode ==
/// Shared switch deciding whether get-or-recompute calls count their entry down.
///
/// Cloning hands out another view of the same flag; every table holds one.
#[derive(Debug, Clone, Default)]
pub struct AutomaticMode(Rc<Cell<bool>>);

impl AutomaticMode {
    pub fn new(enabled: bool) -> Self {
        Self(Rc::new(Cell::new(enabled)))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.get()
    }

    pub fn set(&self, enabled: bool) {
        self.0.set(enabled);
    }
}

// == Tick Registry ==
/// Append-only lists of lifecycle hooks plus the automatic-mode switch.
pub struct TickRegistry {
    tick_hooks: Vec<LifecycleHook>,
    set_all_dirty_hooks: Vec<LifecycleHook>,
    clear_hooks: Vec<LifecycleHook>,
    automatic: AutomaticMode,
}

impl TickRegistry {
    // == Constructor ==
    /// Creates an empty registry with the given automatic mode.
    pub fn new(automatic_mode: bool) -> Self {
        Self {
            tick_hooks: Vec::new(),
            set_all_dirty_hooks: Vec::new(),
            clear_hooks: Vec::new(),
            automatic: AutomaticMode::new(automatic_mode),
        }
    }

    /// Handle to the shared automatic-mode flag, for tables built against this registry.
    pub fn automatic_mode(&self) -> AutomaticMode {
        self.automatic.clone()
    }

    pub fn is_automatic(&self) -> bool {
        self.automatic.is_enabled()
    }

    /// Toggles automatic countdown. Already elapsed counts are not touched.
    pub fn set_automatic_mode(&self, enabled: bool) {
        self.automatic.set(enabled);
    }

    pub fn add_tick_hook(&mut self, hook: LifecycleHook) {
        self.tick_hooks.push(hook);
    }

    pub fn add_set_all_dirty_hook(&mut self, hook: LifecycleHook) {
        self.set_all_dirty_hooks.push(hook);
    }

    pub fn add_clear_hook(&mut self, hook: LifecycleHook) {
        self.clear_hooks.push(hook);
    }

    /// Number of tick hooks, i.e. tables registered so far.
    pub fn hook_count(&self) -> usize {
        self.tick_hooks.len()
    }

    // == Broadcasts ==
    /// Advances every registered table by one tick, in registration order.
    pub fn tick_all(&self) {
        trace!(tables = self.tick_hooks.len(), "tick broadcast");
        self.tick_hooks.iter().for_each(|hook| hook());
    }

    /// Marks every entry of every registered table dirty.
    pub fn set_all_dirty_all(&self) {
        trace!(tables = self.set_all_dirty_hooks.len(), "set-all-dirty broadcast");
        self.set_all_dirty_hooks.iter().for_each(|hook| hook());
    }

    /// Empties every registered table.
    pub fn clear_all(&self) {
        trace!(tables = self.clear_hooks.len(), "clear broadcast");
        self.clear_hooks.iter().for_each(|hook| hook());
    }
}

impl Default for TickRegistry {
    fn default() -> Self {
        Self::new(false)
    }
}

impl fmt::Debug for TickRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickRegistry")
            .field("tick_hooks", &self.tick_hooks.len())
            .field("set_all_dirty_hooks", &self.set_all_dirty_hooks.len())
            .field("clear_hooks", &self.clear_hooks.len())
            .field("automatic", &self.automatic.is_enabled())
            .finish()
    }
}
