//! Shared value types for tessera document sync.
//!
//! This is the leaf crate the client builds on: typed identifiers, presence,
//! change packs, and the frames a server pushes over a watch stream. It has
//! **no internal tessera dependencies** and performs no I/O.
//!
//! # Key Types
//!
//! |-------------------|----------------------------------------------------|
//! | Type              | Purpose                                            |
//! |-------------------|----------------------------------------------------|
//! | [`ActorId`]       | Session identity issued by the server              |
//! | [`DocumentKey`]   | Which document (validated, stable string key)      |
//! | [`PresenceInfo`]  | Presence map + logical clock for one session       |
//! | [`PeerClient`]    | A peer's identity and its last-known presence      |
//! | [`ChangePack`]    | Batch of changes + checkpoint exchanged on sync    |
//! | [`ChangeSummary`] | Change id, message, and document snapshot after it |
//! | [`WatchFrame`]    | Initialization or event frame on a watch stream    |
//! |-------------------|----------------------------------------------------|

pub mod change;
pub mod ids;
pub mod presence;
pub mod watch;

pub use change::{Change, ChangeId, ChangePack, ChangeSummary, Checkpoint, DocumentStatus};
pub use ids::{ActorId, DocumentKey, IdError};
pub use presence::{PeerClient, Presence, PresenceInfo};
pub use watch::{DocEvent, DocEventType, WatchFrame};
