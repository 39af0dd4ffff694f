//! Change packs: the unit of exchange between a document replica and the server.
//!
//! The client never looks inside a change's operations. It moves packs
//! between the document engine and the server, and counts them for logging.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::ids::{ActorId, DocumentKey};

/// Whether a local document is currently bound to a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Detached,
    Attached,
}

/// Identifies a change: which actor made it and where it sits in that actor's
/// sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeId {
    pub client_seq: u32,
    pub lamport: u64,
    pub actor: ActorId,
}

/// One change produced by a document engine. `operations` is opaque here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub id: ChangeId,
    pub message: Option<String>,
    pub operations: Vec<u8>,
}

/// Sequence numbers both sides have seen, carried on every pack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub server_seq: u64,
    pub client_seq: u32,
}

impl Checkpoint {
    pub fn new(server_seq: u64, client_seq: u32) -> Self {
        Self { server_seq, client_seq }
    }

    /// Component-wise maximum of two checkpoints.
    pub fn forward(self, other: Checkpoint) -> Checkpoint {
        Checkpoint {
            server_seq: self.server_seq.max(other.server_seq),
            client_seq: self.client_seq.max(other.client_seq),
        }
    }
}

/// A batch of changes for one document plus the sender's checkpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePack {
    pub document_key: DocumentKey,
    pub checkpoint: Checkpoint,
    pub changes: Vec<Change>,
}

impl ChangePack {
    pub fn new(document_key: DocumentKey, checkpoint: Checkpoint, changes: Vec<Change>) -> Self {
        Self { document_key, checkpoint, changes }
    }

    /// A pack with no changes, e.g. a server reply when nothing is new.
    pub fn empty(document_key: DocumentKey, checkpoint: Checkpoint) -> Self {
        Self::new(document_key, checkpoint, Vec::new())
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn change_count(&self) -> usize {
        self.changes.len()
    }
}

/// A change as shown in history listings: the document rendered after it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub id: ChangeId,
    pub message: Option<String>,
    pub snapshot: String,
}

// ============================================================================
// Tests
// ============================================================================
