// src/service/cache.rs

use crate::common::timing;
use crate::sensor::Reading;

/// Single-slot cache over the most recent successful reading.
///
/// Freshness is judged against the tick at which the frame was captured, not
/// the tick at which it was stored, so a reading that took a while to decode
/// does not look younger than it is.
#[derive(Debug, Default)]
pub(crate) struct ReadingCache {
    reading: Option<Reading>,
}

impl ReadingCache {
    pub(crate) const fn new() -> Self {
        ReadingCache { reading: None }
    }

    /// Returns the cached reading when one exists and its age at `now` does
    /// not exceed `max_age_ticks`.
    pub(crate) fn fresh(&self, now: u32, max_age_ticks: u32) -> Option<Reading> {
        let reading = self.reading?;
        if timing::ticks_since(now, reading.captured_at()) <= max_age_ticks {
            Some(reading)
        } else {
            None
        }
    }

    /// Unconditional view of the last stored reading, regardless of age.
    pub(crate) fn last(&self) -> Option<Reading> {
        self.reading
    }

    /// Replaces the slot. Only called with successfully decoded readings;
    /// failed refresh attempts leave the previous value in place.
    pub(crate) fn store(&mut self, reading: Reading) {
        self.reading = Some(reading);
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::command::FRAME_LEN;
    use crate::sensor::Frame;

    fn reading_at(captured_at: u32) -> Reading {
        Reading::from_frame(&Frame::from_bytes([0; FRAME_LEN]), captured_at)
    }

    #[test]
    fn test_empty_cache_is_never_fresh() {
        let cache = ReadingCache::new();
        assert_eq!(cache.fresh(0, u32::MAX), None);
        assert_eq!(cache.last(), None);
    }

    #[test]
    fn test_freshness_boundary_is_inclusive() {
        let mut cache = ReadingCache::new();
        cache.store(reading_at(1_000));

        assert!(cache.fresh(1_500, 500).is_some());
        assert_eq!(cache.fresh(1_501, 500), None);
        // Stale for freshness checks, still visible via `last`.
        assert!(cache.last().is_some());
    }

    #[test]
    fn test_freshness_survives_counter_wraparound() {
        let mut cache = ReadingCache::new();
        cache.store(reading_at(u32::MAX - 10));
        assert!(cache.fresh(20, 100).is_some());
        assert_eq!(cache.fresh(200, 100), None);
    }

    #[test]
    fn test_zero_max_age_demands_same_tick() {
        let mut cache = ReadingCache::new();
        cache.store(reading_at(42));
        assert!(cache.fresh(42, 0).is_some());
        assert_eq!(cache.fresh(43, 0), None);
    }
}
