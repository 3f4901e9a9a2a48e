//! Cache Entry Module
//!
//! Defines a single cached result list with its tick countdown, and the three
//! ways of refreshing it from a source sequence.

use std::fmt;

// == Recache Strategy ==
/// How a stale entry is repopulated from its source sequence.
///
/// `Direct` can only be built through [`Recache::direct`]:
///
/// ```compile_fail
/// use frame_cache::cache::{Passthrough, Recache};
///
/// let doubled: Recache<'_, i32, i32> = Recache::Direct(Passthrough(|x: i32| x * 2));
/// ```
pub enum Recache<'f, T, C> {
    /// Source already yields cached values; they are stored as-is.
    Direct(Passthrough<T, C>),
    /// Each source element is mapped to a fresh cached value.
    Transform(&'f dyn Fn(T) -> C),
    /// Each source element is written into an existing cached slot, reusing it.
    Update(&'f mut dyn FnMut(T, &mut C)),
}

/// Payload of [`Recache::Direct`]; always the identity on `C`.
pub struct Passthrough<T, C>(fn(T) -> C);

impl<'f, C> Recache<'f, C, C> {
    /// Stores source elements unchanged. Only available when source and cached types match.
    pub fn direct() -> Self {
        Recache::Direct(Passthrough(std::convert::identity))
    }
}

impl<T, C> Recache<'_, T, C> {
    /// Short name used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Recache::Direct(_) => "direct",
            Recache::Transform(_) => "transform",
            Recache::Update(_) => "update",
        }
    }
}

impl<T, C> fmt::Debug for Recache<'_, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Recache").field(&self.kind()).finish()
    }
}

// == Cache Entry ==
/// One cached result list plus its countdown state.
#[derive(Debug, Clone)]
pub struct CacheEntry<C> {
    /// The materialized sequence
    list: Vec<C>,
    /// Ticks left before the next access recomputes; goes negative while unused
    remaining_ticks: i64,
    /// Duration passed at the most recent recompute
    last_used_duration: i64,
}

impl<C> Default for CacheEntry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> CacheEntry<C> {
    // == Constructor ==
    /// Creates an empty entry that is due for recompute on first access.
    pub fn new() -> Self {
        Self {
            list: Vec::new(),
            remaining_ticks: 0,
            last_used_duration: 0,
        }
    }

    /// The cached sequence as of the last recompute.
    pub fn list(&self) -> &[C] {
        &self.list
    }

    pub fn remaining_ticks(&self) -> i64 {
        self.remaining_ticks
    }

    pub fn last_used_duration(&self) -> i64 {
        self.last_used_duration
    }

    /// True when the next access will recompute.
    pub fn is_due(&self) -> bool {
        self.remaining_ticks <= 0
    }

    // == Try Recache ==
    /// Recomputes the list from `source` if the entry is due, then counts down
    /// one tick when `automatic` is set.
    ///
    /// The countdown runs after the recompute decision, so a freshly filled
    /// entry already loses one tick on the call that filled it.
    ///
    /// # Returns
    /// `true` if the list was recomputed on this call.
    pub fn try_recache<I>(
        &mut self,
        source: I,
        duration: i64,
        strategy: Recache<'_, I::Item, C>,
        factory: &dyn Fn() -> C,
        automatic: bool,
    ) -> bool
    where
        I: IntoIterator,
    {
        let recomputed = self.is_due();

        if recomputed {
            match strategy {
                Recache::Direct(Passthrough(store)) => {
                    self.list.clear();
                    self.list.extend(source.into_iter().map(store));
                }
                Recache::Transform(selector) => {
                    self.list.clear();
                    self.list.extend(source.into_iter().map(selector));
                }
                Recache::Update(updater) => {
                    let mut produced = 0;

                    for item in source {
                        match self.list.get_mut(produced) {
                            Some(slot) => updater(item, slot),
                            None => {
                                let mut fresh = factory();
                                updater(item, &mut fresh);
                                self.list.push(fresh);
                            }
                        }
                        produced += 1;
                    }

                    // Drop surplus from a previous, longer run
                    self.list.truncate(produced);
                }
            }

            self.remaining_ticks = duration;
            self.last_used_duration = duration;
        }

        if automatic {
            self.remaining_ticks -= 1;
        }

        recomputed
    }

    // == Tick ==
    /// Counts down one tick.
    pub fn tick(&mut self) {
        self.remaining_ticks -= 1;
    }

    // == Mark Dirty ==
    /// Forces the next access to recompute. Entries already due keep their
    /// counter so their removal timing is unchanged.
    pub fn mark_dirty(&mut self) {
        if self.remaining_ticks > 0 {
            self.remaining_ticks = 0;
        }
    }

    // == Is Abandoned ==
    /// True once the entry has sat unused for more than its own duration plus
    /// one tick past becoming due.
    pub fn is_abandoned(&self) -> bool {
        self.remaining_ticks < -self.last_used_duration - 1
    }
}
