//! The remote sync service as the client sees it.
//!
//! [`SyncService`] is the seam between the session logic and whatever carries
//! it to the server. Implementations own the connection, credentials, and wire
//! encoding; every method exchanges already-decoded values. One request maps to
//! one server round trip; implementations must not retry.

use async_trait::async_trait;
use futures::stream::BoxStream;
use tessera_types::{ActorId, Change, ChangePack, DocumentKey, PeerClient, WatchFrame};

/// Transport and server failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RpcError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("server rejected request ({code}): {message}")]
    Rejected { code: String, message: String },
    #[error("stream closed by server")]
    StreamClosed,
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Inbound frames of one watch subscription. Ends when the server closes it.
pub type WatchStream = BoxStream<'static, Result<WatchFrame, RpcError>>;

#[async_trait]
pub trait SyncService: Send + Sync {
    /// Register a session under `session_key`. Returns the raw session id bytes.
    async fn activate_session(&self, session_key: &str) -> Result<Vec<u8>, RpcError>;

    async fn deactivate_session(&self, session_id: ActorId) -> Result<(), RpcError>;

    /// Register a document with the session; the reply carries the server's changes.
    async fn attach_document(
        &self,
        session_id: ActorId,
        pack: ChangePack,
    ) -> Result<ChangePack, RpcError>;

    /// Final push-pull before the server stops tracking the document for this session.
    async fn detach_document(
        &self,
        session_id: ActorId,
        pack: ChangePack,
    ) -> Result<ChangePack, RpcError>;

    /// Send local changes, receive remote changes since the pack's checkpoint.
    async fn push_pull(&self, session_id: ActorId, pack: ChangePack)
        -> Result<ChangePack, RpcError>;

    /// Open a watch subscription for `document_keys` under `client`'s identity.
    async fn watch_documents(
        &self,
        client: PeerClient,
        document_keys: Vec<DocumentKey>,
    ) -> Result<WatchStream, RpcError>;

    /// Broadcast `client`'s presence to the watchers of `document_keys`.
    async fn update_presence(
        &self,
        client: PeerClient,
        document_keys: Vec<DocumentKey>,
    ) -> Result<(), RpcError>;

    /// Full change history of a document, oldest first.
    async fn list_changes(
        &self,
        session_id: ActorId,
        document_key: &DocumentKey,
    ) -> Result<Vec<Change>, RpcError>;

    /// Release the underlying connection.
    async fn close(&self) -> Result<(), RpcError>;
}
