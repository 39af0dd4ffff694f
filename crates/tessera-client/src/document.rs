//! The document engine as the client sees it.
//!
//! Merging, tombstones, and change encoding all belong to the engine. The
//! client only asks a document for its pending changes, hands it the server's
//! reply, and flips its actor and status around attach/detach.

use std::sync::Arc;

use parking_lot::Mutex;
use tessera_types::{ActorId, Change, ChangePack, DocumentKey, DocumentStatus};

/// A document shared between its owner and the session it is attached to.
pub type DocumentHandle<D> = Arc<Mutex<D>>;

/// Wrap a document for use with [`Client::attach`](crate::Client::attach).
pub fn document_handle<D: Document>(doc: D) -> DocumentHandle<D> {
    Arc::new(Mutex::new(doc))
}

/// The engine rejected a change pack or change list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    #[error("change pack is for {got}, document is {expected}")]
    KeyMismatch { expected: DocumentKey, got: DocumentKey },
    #[error("document {key} rejected change: {reason}")]
    Rejected { key: DocumentKey, reason: String },
}

pub trait Document: Send + 'static {
    /// An empty replica, used to replay history for change summaries.
    fn blank(key: DocumentKey) -> Self
    where
        Self: Sized;

    fn key(&self) -> &DocumentKey;

    fn set_actor(&mut self, actor: ActorId);

    fn set_status(&mut self, status: DocumentStatus);

    /// Pending local changes plus the current checkpoint.
    fn create_change_pack(&self) -> ChangePack;

    /// Apply a server reply. Must leave the document untouched on error.
    fn apply_change_pack(&mut self, pack: ChangePack) -> Result<(), ApplyError>;

    /// Apply raw changes in order (history replay).
    fn apply_changes(&mut self, changes: &[Change]) -> Result<(), ApplyError>;

    /// Render the current content, e.g. as JSON.
    fn marshal(&self) -> String;
}
