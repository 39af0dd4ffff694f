//! This session's own presence and its logical clock.
//!
//! The tracker lives as long as the [`Client`](crate::Client); activation
//! cycles do not reset it.

use tessera_types::{Presence, PresenceInfo};

#[derive(Debug, Default)]
pub struct PresenceTracker {
    info: PresenceInfo,
}

impl PresenceTracker {
    pub fn new(initial: Presence) -> Self {
        Self { info: PresenceInfo::new(initial) }
    }

    /// Write one presence entry and bump the clock. Returns the new clock, or
    /// `None` without writing anything once the clock is at `u32::MAX`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<u32> {
        let clock = self.info.clock.checked_add(1)?;
        self.info.presence.insert(key.into(), value.into());
        self.info.clock = clock;
        Some(clock)
    }

    pub fn clock(&self) -> u32 {
        self.info.clock
    }

    pub fn presence(&self) -> Presence {
        self.info.presence.clone()
    }

    pub fn info(&self) -> PresenceInfo {
        self.info.clone()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_presence_at_clock_zero() {
        let tracker = PresenceTracker::new(Presence::from([("name".into(), "amy".into())]));
        assert_eq!(tracker.clock(), 0);
        assert_eq!(tracker.presence()["name"], "amy");
    }

    #[test]
    fn test_set_bumps_clock_every_time() {
        let mut tracker = PresenceTracker::default();
        assert_eq!(tracker.set("cursor", "1:1"), Some(1));
        // Same value again still counts as a write
        assert_eq!(tracker.set("cursor", "1:1"), Some(2));
        assert_eq!(tracker.set("name", "amy"), Some(3));

        let info = tracker.info();
        assert_eq!(info.clock, 3);
        assert_eq!(info.presence.len(), 2);
    }

    #[test]
    fn test_snapshots_are_copies() {
        let mut tracker = PresenceTracker::default();
        tracker.set("a", "1");
        let mut snapshot = tracker.presence();
        snapshot.insert("b".into(), "2".into());
        assert_eq!(tracker.presence().len(), 1);
    }

    #[test]
    fn test_exhausted_clock_rejects_write() {
        let mut tracker = PresenceTracker {
            info: PresenceInfo { clock: u32::MAX, presence: Presence::new() },
        };
        assert_eq!(tracker.set("cursor", "1:1"), None);
        assert_eq!(tracker.clock(), u32::MAX);
        assert!(tracker.presence().is_empty());
    }
}
