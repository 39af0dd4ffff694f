//! Presence: per-session key/value metadata ordered by a logical clock.
//!
//! A session bumps its clock on every local presence write. Peers compare
//! clocks, not arrival order, when two snapshots of the same session meet.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::ActorId;

/// Arbitrary presence metadata (cursor position, display name, ...).
pub type Presence = BTreeMap<String, String>;

/// A presence map plus the clock of the write that produced it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceInfo {
    pub clock: u32,
    pub presence: Presence,
}

impl PresenceInfo {
    pub fn new(presence: Presence) -> Self {
        Self { clock: 0, presence }
    }

    /// Replace this snapshot with `incoming` unless ours is strictly newer.
    ///
    /// Returns true if `incoming` was taken. Equal clocks take the incoming
    /// snapshot.
    pub fn merge(&mut self, incoming: PresenceInfo) -> bool {
        if incoming.clock < self.clock {
            return false;
        }
        *self = incoming;
        true
    }
}

/// A session as seen by its peers: identity plus last-known presence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerClient {
    pub id: ActorId,
    pub presence_info: PresenceInfo,
}

// ============================================================================
// Tests
// ============================================================================
