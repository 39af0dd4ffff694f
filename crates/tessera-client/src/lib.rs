//! Tessera client session manager
//!
//! Keeps one logical session with a document-sync server: activation,
//! attaching documents, push-pull sync of change packs, presence, and watch
//! streams that report document changes and peer presence.
//!
//! The transport and the document engine are plugged in through
//! [`SyncService`] and [`Document`]; this crate only sequences the protocol
//! around them.
//!
//! ```ignore
//! let mut client = Client::<MyDoc>::new(service, ClientOptions::default());
//! client.activate().await?;
//!
//! let doc = document_handle(MyDoc::blank(DocumentKey::new("notes")?));
//! client.attach(&doc).await?;
//!
//! let mut events = client.watch(&[doc.lock().key().clone()], cancel.clone()).await?;
//! while let Some(event) = events.recv().await {
//!     if let WatchResponse::DocumentsChanged { keys } = event {
//!         client.sync(&keys).await?;
//!     }
//! }
//! ```

pub mod attachment;
pub mod config;
pub mod constants;
pub mod document;
pub mod error;
pub mod presence;
pub mod service;
pub mod session;
pub mod sync;
pub mod watch;

pub use attachment::{Attachment, AttachmentTable, PeersMapByDoc};
pub use config::{ClientOptions, ConfigError};
pub use document::{ApplyError, Document, DocumentHandle, document_handle};
pub use error::ClientError;
pub use presence::PresenceTracker;
pub use service::{RpcError, SyncService, WatchStream};
pub use session::{Client, SessionStatus};
pub use watch::{WatchReceiver, WatchResponse};

// Value types callers need alongside the client.
pub use tessera_types::{
    ActorId, Change, ChangeId, ChangePack, ChangeSummary, Checkpoint, DocEvent, DocEventType,
    DocumentKey, DocumentStatus, PeerClient, Presence, PresenceInfo, WatchFrame,
};
