//! Cache Statistics Module
//!
//! Tracks per-table counters: hits, recomputes, and age-based removals.

use serde::Serialize;

// == Table Stats ==
/// Tracks cache table activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableStats {
    /// Get-or-recompute calls served from the existing list
    pub hits: u64,
    /// Get-or-recompute calls that rebuilt the list (first fill included)
    pub recomputes: u64,
    /// Entries reclaimed because they went unused past their threshold
    pub removals: u64,
    /// Current number of entries in the table
    pub live_entries: usize,
}

impl TableStats {
    // == Constructor ==
    /// Creates a new TableStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the share of accesses served without recomputing.
    ///
    /// Returns hits / (hits + recomputes), or 0.0 if nothing was requested yet.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.recomputes;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_recompute(&mut self) {
        self.recomputes += 1;
    }

    pub fn record_removals(&mut self, count: usize) {
        self.removals += count as u64;
    }

    pub fn set_live_entries(&mut self, count: usize) {
        self.live_entries = count;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = TableStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.recomputes, 0);
        assert_eq!(stats.removals, 0);
        assert_eq!(stats.live_entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(TableStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = TableStats::new();
        stats.record_recompute();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_record_removals() {
        let mut stats = TableStats::new();
        stats.record_removals(2);
        stats.record_removals(0);
        stats.record_removals(3);
        assert_eq!(stats.removals, 5);
    }

    #[test]
    fn test_serializes_to_json() {
        let mut stats = TableStats::new();
        stats.record_hit();
        stats.set_live_entries(4);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["hits"], 1);
        assert_eq!(json["live_entries"], 4);
    }
}
