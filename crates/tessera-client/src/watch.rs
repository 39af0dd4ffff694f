//! Watch streams: document-change and peer-presence events from the server.
//!
//! [`Client::watch`] opens one subscription, applies its initialization frame,
//! then hands the stream to a spawned task that turns each event frame into a
//! [`WatchResponse`] on a bounded channel.
//!
//! # Stream State Machine
//!
//! ```text
//! +------------------+
//! |  Opening         | first frame must be Initialization
//! +--------+---------+
//!          | Initialization merged into rosters → channel returned
//!          v
//! +------------------+  DocumentsChanged            → DocumentsChanged
//! |  Streaming       |  DocumentsWatched/Presence…  → merge, PeersChanged
//! |                  |  DocumentsUnwatched          → remove, PeersChanged
//! +--------+---------+
//!          | receive error, stream end, unsupported frame, or cancellation
//!          | (a dropped receiver skips Closed and releases the stream at once)
//!          v
//! +------------------+
//! |  Closed          | one Closed(..) sent, then the channel closes
//! +------------------+
//! ```
//!
//! Roster changes and the snapshot sent with them happen under one lock of the
//! session state, so callers never observe a half-applied event.

use futures::StreamExt;
use tessera_types::{DocEvent, DocEventType, DocumentKey, PeerClient, WatchFrame};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::attachment::PeersMapByDoc;
use crate::document::Document;
use crate::error::ClientError;
use crate::service::{RpcError, WatchStream};
use crate::session::{Client, SharedState};

/// Receiving end of a watch. Yields `None` once the stream is closed.
pub type WatchReceiver = mpsc::Receiver<WatchResponse>;

/// A normalized watch notification.
#[derive(Debug)]
pub enum WatchResponse {
    /// Remote content changed; call [`Client::sync`] to fetch it.
    DocumentsChanged { keys: Vec<DocumentKey> },
    /// Some roster changed. Carries every attached document's roster.
    PeersChanged { peers_map_by_doc: PeersMapByDoc },
    /// Terminal element. `None` when the caller cancelled the watch.
    Closed(Option<ClientError>),
}

impl<D: Document> Client<D> {
    /// Subscribe to events for `keys` under this session's identity.
    ///
    /// Returns once the initialization frame has been applied. Errors before
    /// that point are returned here and no channel is created; afterwards
    /// they arrive as the channel's final [`WatchResponse::Closed`].
    /// Cancelling `cancel` ends the watch cleanly.
    pub async fn watch(
        &self,
        keys: &[DocumentKey],
        cancel: CancellationToken,
    ) -> Result<WatchReceiver, ClientError> {
        let session_id = self.require_active()?;
        let identity = PeerClient {
            id: session_id,
            presence_info: self.state.lock().presence.info(),
        };

        let mut stream = self
            .round_trip(
                "watch_documents",
                self.service.watch_documents(identity, keys.to_vec()),
            )
            .await?;

        let first = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            next = self.with_timeout("watch_documents", stream.next()) => next?,
        };
        let handler = WatchHandler::new(self.state.clone());
        match first {
            Some(Ok(frame)) => handler.initialize(frame)?,
            Some(Err(e)) => return Err(e.into()),
            None => return Err(RpcError::StreamClosed.into()),
        }

        let (tx, rx) = mpsc::channel(self.watch_capacity);
        tokio::spawn(handler.run(stream, tx, cancel));
        debug!(documents = keys.len(), "watch stream opened");
        Ok(rx)
    }
}

/// Applies watch frames to the shared session state.
pub(crate) struct WatchHandler<D> {
    state: SharedState<D>,
}

impl<D: Send + 'static> WatchHandler<D> {
    pub(crate) fn new(state: SharedState<D>) -> Self {
        Self { state }
    }

    /// Merge the initialization frame's rosters.
    pub(crate) fn initialize(&self, frame: WatchFrame) -> Result<(), ClientError> {
        let WatchFrame::Initialization { peers_map_by_doc } = frame else {
            return Err(ClientError::UnsupportedWatchResponse(
                "stream did not start with an initialization frame".into(),
            ));
        };

        let mut state = self.state.lock();
        for (key, peers) in peers_map_by_doc {
            if !state.attachments.contains(&key) {
                warn!(document = %key, "initialization for unattached document, skipping");
                continue;
            }
            for peer in peers {
                state.attachments.merge_peer(&key, peer);
            }
        }
        Ok(())
    }

    pub(crate) fn handle_frame(&self, frame: WatchFrame) -> Result<WatchResponse, ClientError> {
        match frame {
            WatchFrame::Event(event) => self.handle_event(event),
            WatchFrame::Initialization { .. } => Err(ClientError::UnsupportedWatchResponse(
                "initialization frame after stream start".into(),
            )),
        }
    }

    fn handle_event(&self, event: DocEvent) -> Result<WatchResponse, ClientError> {
        trace!(
            kind = %event.event_type,
            publisher = %event.publisher.id,
            documents = event.document_keys.len(),
            "watch event"
        );

        let DocEvent { event_type, publisher, document_keys } = event;
        match event_type {
            DocEventType::DocumentsChanged => {
                Ok(WatchResponse::DocumentsChanged { keys: document_keys })
            }
            DocEventType::DocumentsWatched | DocEventType::PresenceChanged => {
                let mut state = self.state.lock();
                for key in &document_keys {
                    if !state.attachments.contains(key) {
                        debug!(document = %key, "peer event for unattached document");
                        continue;
                    }
                    state.attachments.merge_peer(key, publisher.clone());
                }
                Ok(WatchResponse::PeersChanged {
                    peers_map_by_doc: state.attachments.peers_map_by_doc(),
                })
            }
            DocEventType::DocumentsUnwatched => {
                let mut state = self.state.lock();
                for key in &document_keys {
                    state.attachments.remove_peer(key, &publisher.id);
                }
                Ok(WatchResponse::PeersChanged {
                    peers_map_by_doc: state.attachments.peers_map_by_doc(),
                })
            }
            DocEventType::Unsupported(kind) => Err(ClientError::UnsupportedWatchResponse(kind)),
        }
    }

    /// Drain the stream until it fails, ends, `cancel` fires, or the receiver
    /// is dropped. The stream is released when this returns.
    pub(crate) async fn run(
        self,
        mut stream: WatchStream,
        tx: mpsc::Sender<WatchResponse>,
        cancel: CancellationToken,
    ) {
        let failure = loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => break None,
                _ = tx.closed() => {
                    debug!("watch receiver dropped, releasing stream");
                    return;
                }
                next = stream.next() => next,
            };

            let response = match next {
                Some(Ok(frame)) => match self.handle_frame(frame) {
                    Ok(response) => response,
                    Err(e) => break Some(e),
                },
                Some(Err(e)) => break Some(e.into()),
                None => break Some(RpcError::StreamClosed.into()),
            };

            if tx.send(response).await.is_err() {
                debug!("watch receiver dropped, stopping");
                return;
            }
        };

        match &failure {
            None => info!("watch cancelled"),
            Some(e) => warn!(error = %e, "watch stream terminated"),
        }
        let _ = tx.send(WatchResponse::Closed(failure)).await;
    }
}

// ============================================================================
// Tests
// ============================================================================
