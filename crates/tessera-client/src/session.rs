//! Session lifecycle: activation, attach/detach, presence, history.
//!
//! ```text
//!   caller (&mut Client)                      watch task (spawned)
//!   ┌──────────────────────┐                  ┌──────────────────────┐
//!   │ activate / attach    │                  │ drains WatchStream   │
//!   │ sync / update_presence│                 │ merges peer rosters  │
//!   └─────────┬────────────┘                  └─────────┬────────────┘
//!             │        Arc<Mutex<SessionState>>         │
//!             └───────────────▶ attachments ◀───────────┘
//!                               presence
//! ```
//!
//! The state mutex is never held across a server round trip. Each operation
//! reads what it needs, drops the guard, awaits the server, then re-locks to
//! commit.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tessera_types::{ActorId, ChangeSummary, DocumentKey, DocumentStatus, PeerClient, Presence};
use tracing::{debug, info, warn};

use crate::attachment::{AttachmentTable, PeersMapByDoc};
use crate::config::ClientOptions;
use crate::document::{Document, DocumentHandle};
use crate::error::ClientError;
use crate::presence::PresenceTracker;
use crate::service::{RpcError, SyncService};
use crate::sync::Exchange;

/// State shared between the client and its watch tasks.
pub(crate) struct SessionState<D> {
    pub attachments: AttachmentTable<D>,
    pub presence: PresenceTracker,
}

pub(crate) type SharedState<D> = Arc<Mutex<SessionState<D>>>;

/// Reservation of a document key while its attach exchange is in flight.
/// Released on drop, including when the attach future is dropped mid-call.
struct PendingAttach<'a, D> {
    state: &'a SharedState<D>,
    key: DocumentKey,
}

impl<'a, D> PendingAttach<'a, D> {
    fn reserve(state: &'a SharedState<D>, key: &DocumentKey) -> Result<Self, ClientError> {
        if !state.lock().attachments.reserve(key) {
            return Err(ClientError::DocumentAlreadyAttached(key.clone()));
        }
        Ok(Self { state, key: key.clone() })
    }
}

impl<D> Drop for PendingAttach<'_, D> {
    fn drop(&mut self) {
        self.state.lock().attachments.release(&self.key);
    }
}

/// Activation status. The session id exists exactly while activated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Deactivated,
    Activated(ActorId),
}

/// A client session against one sync service.
///
/// Operations that need the server require an activated session and fail with
/// [`ClientError::ClientNotActivated`] otherwise, without a round trip. No
/// operation retries; every failure goes back to the caller.
pub struct Client<D> {
    pub(crate) service: Arc<dyn SyncService>,
    pub(crate) state: SharedState<D>,
    key: String,
    status: SessionStatus,
    rpc_timeout: Option<Duration>,
    pub(crate) watch_capacity: usize,
}

impl<D: Document> Client<D> {
    /// Create a deactivated session. Nothing is sent until [`activate`](Self::activate).
    pub fn new(service: Arc<dyn SyncService>, options: ClientOptions) -> Self {
        let rpc_timeout = options.rpc_timeout();
        let watch_capacity = options.watch_capacity();
        let key = options
            .key
            .unwrap_or_else(|| uuid::Uuid::now_v7().as_simple().to_string());

        Self {
            service,
            state: Arc::new(Mutex::new(SessionState {
                attachments: AttachmentTable::new(),
                presence: PresenceTracker::new(options.presence),
            })),
            key,
            status: SessionStatus::Deactivated,
            rpc_timeout,
            watch_capacity,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Register with the server and receive a session id. No-op if active.
    pub async fn activate(&mut self) -> Result<(), ClientError> {
        if self.is_active() {
            return Ok(());
        }

        let raw = self
            .round_trip("activate_session", self.service.activate_session(&self.key))
            .await?;
        let id = ActorId::try_from_slice(&raw)?;

        self.status = SessionStatus::Activated(id);
        info!(session_key = %self.key, session_id = %id, "client activated");
        Ok(())
    }

    /// Unregister the session id. Attached documents stay attached locally.
    pub async fn deactivate(&mut self) -> Result<(), ClientError> {
        let SessionStatus::Activated(id) = self.status else {
            return Ok(());
        };

        self.round_trip("deactivate_session", self.service.deactivate_session(id))
            .await?;

        self.status = SessionStatus::Deactivated;
        info!(session_key = %self.key, session_id = %id, "client deactivated");
        Ok(())
    }

    /// Deactivate, then release the connection. A failed deactivation leaves
    /// the connection open.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        self.deactivate().await?;
        self.round_trip("close", self.service.close()).await?;
        debug!(session_key = %self.key, "connection closed");
        Ok(())
    }

    // =========================================================================
    // Attach / Detach
    // =========================================================================

    /// Bind a document to this session and pull the server's state into it.
    ///
    /// The key is reserved for the whole exchange, so a second attach of the
    /// same key fails with [`ClientError::DocumentAlreadyAttached`] before
    /// reaching the server. On any failure no attachment is recorded.
    pub async fn attach(&self, doc: &DocumentHandle<D>) -> Result<(), ClientError> {
        let session_id = self.require_active()?;
        let key = doc.lock().key().clone();
        let _pending = PendingAttach::reserve(&self.state, &key)?;

        doc.lock().set_actor(session_id);
        self.exchange(Exchange::Attach, session_id, &key, doc).await?;

        self.state.lock().attachments.insert(key.clone(), Arc::clone(doc));
        doc.lock().set_status(DocumentStatus::Attached);
        info!(document = %key, "document attached");
        Ok(())
    }

    /// Push the document's last changes and stop tracking it.
    ///
    /// Detaching lets the server count this replica as caught up, so
    /// tombstones it has seen can be collected.
    pub async fn detach(&self, doc: &DocumentHandle<D>) -> Result<(), ClientError> {
        let session_id = self.require_active()?;
        let key = doc.lock().key().clone();
        let attached = self
            .state
            .lock()
            .attachments
            .doc(&key)
            .ok_or_else(|| ClientError::DocumentNotAttached(key.clone()))?;

        self.exchange(Exchange::Detach, session_id, &key, &attached).await?;
        attached.lock().set_status(DocumentStatus::Detached);

        self.state.lock().attachments.remove(&key);
        info!(document = %key, "document detached");
        Ok(())
    }

    // =========================================================================
    // Presence
    // =========================================================================

    /// Set one presence entry and broadcast it to the watchers of every
    /// attached document.
    ///
    /// The local write and clock bump happen first and are kept even when
    /// nothing is attached or the broadcast fails. Fails with
    /// [`ClientError::PresenceClockExhausted`] once the clock reaches `u32::MAX`.
    pub async fn update_presence(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ClientError> {
        let session_id = self.require_active()?;

        let (presence_info, document_keys) = {
            let mut state = self.state.lock();
            state
                .presence
                .set(key, value)
                .ok_or(ClientError::PresenceClockExhausted)?;
            (state.presence.info(), state.attachments.keys())
        };

        if document_keys.is_empty() {
            debug!(clock = presence_info.clock, "presence updated locally, nothing attached");
            return Ok(());
        }

        let clock = presence_info.clock;
        let client = PeerClient { id: session_id, presence_info };
        self.round_trip(
            "update_presence",
            self.service.update_presence(client, document_keys),
        )
        .await
        .inspect_err(|e| warn!(clock, error = %e, "presence broadcast failed"))?;

        debug!(clock, "presence broadcast");
        Ok(())
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Replay a document's history and summarize each change with the
    /// document content right after it.
    pub async fn list_change_summaries(
        &self,
        key: &DocumentKey,
    ) -> Result<Vec<ChangeSummary>, ClientError> {
        let session_id = self.require_active()?;
        let changes = self
            .round_trip("list_changes", self.service.list_changes(session_id, key))
            .await?;

        let mut replica = D::blank(key.clone());
        let mut summaries = Vec::with_capacity(changes.len());
        for change in changes {
            replica.apply_changes(std::slice::from_ref(&change))?;
            summaries.push(ChangeSummary {
                id: change.id,
                message: change.message,
                snapshot: replica.marshal(),
            });
        }
        Ok(summaries)
    }

    // =========================================================================
    // Read accessors
    // =========================================================================

    /// Server-issued session id, present only while activated.
    pub fn id(&self) -> Option<ActorId> {
        match self.status {
            SessionStatus::Activated(id) => Some(id),
            SessionStatus::Deactivated => None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, SessionStatus::Activated(_))
    }

    pub fn presence(&self) -> Presence {
        self.state.lock().presence.presence()
    }

    pub fn presence_clock(&self) -> u32 {
        self.state.lock().presence.clock()
    }

    pub fn is_attached(&self, key: &DocumentKey) -> bool {
        self.state.lock().attachments.contains(key)
    }

    pub fn attached_keys(&self) -> Vec<DocumentKey> {
        self.state.lock().attachments.keys()
    }

    /// Copy of every attached document's peer roster.
    pub fn peers_map_by_doc(&self) -> PeersMapByDoc {
        self.state.lock().attachments.peers_map_by_doc()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    pub(crate) fn require_active(&self) -> Result<ActorId, ClientError> {
        self.id().ok_or(ClientError::ClientNotActivated)
    }

    /// Await `fut` under the configured per-call timeout.
    pub(crate) async fn with_timeout<F: Future>(
        &self,
        op: &'static str,
        fut: F,
    ) -> Result<F::Output, ClientError> {
        match self.rpc_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| ClientError::Timeout(op, limit)),
            None => Ok(fut.await),
        }
    }

    pub(crate) async fn round_trip<T, F>(&self, op: &'static str, fut: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, RpcError>>,
    {
        Ok(self.with_timeout(op, fut).await??)
    }
}
