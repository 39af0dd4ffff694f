//! Shared fixtures for client integration tests.
//!
//! `FakeService` records every call and answers from scripted state.
//! `MemoryDocument` is a tiny key/value document whose changes are `k=v` bytes.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use futures::channel::mpsc::{UnboundedSender, unbounded};
use futures::StreamExt;
use parking_lot::Mutex;
use tessera_client::{
    ActorId, ApplyError, Change, ChangeId, ChangePack, Checkpoint, Client, ClientOptions,
    Document, DocumentHandle, DocumentKey, DocumentStatus, PeerClient, RpcError, SyncService,
    WatchFrame, WatchStream, document_handle,
};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn key(s: &str) -> DocumentKey {
    DocumentKey::new(s).unwrap()
}

pub fn actor(n: u8) -> ActorId {
    ActorId::from_bytes([n; 16])
}

// ============================================================================
// FakeService
// ============================================================================

/// A recorded service call.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Activate(String),
    Deactivate(ActorId),
    Attach(DocumentKey, usize),
    Detach(DocumentKey, usize),
    PushPull(DocumentKey, usize),
    Watch(Vec<DocumentKey>),
    UpdatePresence(PeerClient, Vec<DocumentKey>),
    ListChanges(DocumentKey),
    Close,
}

#[derive(Default)]
pub struct FakeState {
    pub calls: Vec<Call>,
    /// Raw id returned by activate. Defaults to `actor(0xAA)`.
    pub session_id: Option<Vec<u8>>,
    /// Error returned by the next call, whatever it is.
    pub fail_next: Option<RpcError>,
    /// Calls to these ops never complete.
    pub hang: Vec<&'static str>,
    /// Remote changes handed out on the next exchange for a document.
    pub remote: HashMap<DocumentKey, Vec<Change>>,
    pub server_seq: u64,
    pub streams: VecDeque<WatchStream>,
    pub history: BTreeMap<DocumentKey, Vec<Change>>,
}

#[derive(Default)]
pub struct FakeService {
    pub state: Mutex<FakeState>,
}

impl FakeService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn fail_next(&self, err: RpcError) {
        self.state.lock().fail_next = Some(err);
    }

    pub fn hang(&self, op: &'static str) {
        self.state.lock().hang.push(op);
    }

    pub fn queue_remote(&self, key: &DocumentKey, change: Change) {
        self.state.lock().remote.entry(key.clone()).or_default().push(change);
    }

    /// Queue a watch stream; frames sent on the returned sender reach the client.
    pub fn push_stream(&self) -> UnboundedSender<Result<WatchFrame, RpcError>> {
        let (tx, rx) = unbounded();
        self.state.lock().streams.push_back(rx.boxed());
        tx
    }

    /// Record a call and apply the scripted failure / hang for it.
    async fn enter(&self, op: &'static str, call: Call) -> Result<(), RpcError> {
        let (failure, hang) = {
            let mut state = self.state.lock();
            state.calls.push(call);
            (state.fail_next.take(), state.hang.contains(&op))
        };
        if hang {
            futures::future::pending::<()>().await;
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn reply(&self, pack: &ChangePack) -> ChangePack {
        let mut state = self.state.lock();
        let changes = state.remote.remove(&pack.document_key).unwrap_or_default();
        state.server_seq += changes.len() as u64;
        ChangePack::new(
            pack.document_key.clone(),
            Checkpoint::new(state.server_seq, pack.checkpoint.client_seq),
            changes,
        )
    }
}

#[async_trait]
impl SyncService for FakeService {
    async fn activate_session(&self, session_key: &str) -> Result<Vec<u8>, RpcError> {
        self.enter("activate", Call::Activate(session_key.to_string())).await?;
        let raw = self.state.lock().session_id.clone();
        Ok(raw.unwrap_or_else(|| actor(0xAA).as_bytes().to_vec()))
    }

    async fn deactivate_session(&self, session_id: ActorId) -> Result<(), RpcError> {
        self.enter("deactivate", Call::Deactivate(session_id)).await
    }

    async fn attach_document(
        &self,
        _session_id: ActorId,
        pack: ChangePack,
    ) -> Result<ChangePack, RpcError> {
        self.enter("attach", Call::Attach(pack.document_key.clone(), pack.change_count()))
            .await?;
        Ok(self.reply(&pack))
    }

    async fn detach_document(
        &self,
        _session_id: ActorId,
        pack: ChangePack,
    ) -> Result<ChangePack, RpcError> {
        self.enter("detach", Call::Detach(pack.document_key.clone(), pack.change_count()))
            .await?;
        Ok(self.reply(&pack))
    }

    async fn push_pull(
        &self,
        _session_id: ActorId,
        pack: ChangePack,
    ) -> Result<ChangePack, RpcError> {
        self.enter("push_pull", Call::PushPull(pack.document_key.clone(), pack.change_count()))
            .await?;
        Ok(self.reply(&pack))
    }

    async fn watch_documents(
        &self,
        _client: PeerClient,
        document_keys: Vec<DocumentKey>,
    ) -> Result<WatchStream, RpcError> {
        self.enter("watch", Call::Watch(document_keys)).await?;
        self.state
            .lock()
            .streams
            .pop_front()
            .ok_or_else(|| RpcError::Connection("no stream scripted".into()))
    }

    async fn update_presence(
        &self,
        client: PeerClient,
        document_keys: Vec<DocumentKey>,
    ) -> Result<(), RpcError> {
        self.enter("update_presence", Call::UpdatePresence(client, document_keys)).await
    }

    async fn list_changes(
        &self,
        _session_id: ActorId,
        document_key: &DocumentKey,
    ) -> Result<Vec<Change>, RpcError> {
        self.enter("list_changes", Call::ListChanges(document_key.clone())).await?;
        Ok(self.state.lock().history.get(document_key).cloned().unwrap_or_default())
    }

    async fn close(&self) -> Result<(), RpcError> {
        self.enter("close", Call::Close).await
    }
}

// ============================================================================
// MemoryDocument
// ============================================================================

/// Key/value document. Each change sets one entry; operations are `k=v`.
#[derive(Debug)]
pub struct MemoryDocument {
    key: DocumentKey,
    pub actor: Option<ActorId>,
    pub status: DocumentStatus,
    pub content: BTreeMap<String, String>,
    pending: Vec<Change>,
    checkpoint: Checkpoint,
    /// Reject the next apply with this reason.
    pub reject_next: Option<String>,
}

impl MemoryDocument {
    pub fn handle(k: &str) -> DocumentHandle<MemoryDocument> {
        document_handle(MemoryDocument::blank(key(k)))
    }

    /// Local edit: set an entry and queue the change for the next push.
    pub fn set(&mut self, k: &str, v: &str) {
        self.content.insert(k.to_string(), v.to_string());
        self.checkpoint.client_seq += 1;
        let change = change(
            self.actor.unwrap_or_else(ActorId::nil),
            self.checkpoint.client_seq,
            k,
            v,
        );
        self.pending.push(change);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn decode(&self, changes: &[Change]) -> Result<Vec<(String, String)>, ApplyError> {
        changes
            .iter()
            .map(|c| {
                let text = String::from_utf8_lossy(&c.operations);
                text.split_once('=')
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .ok_or_else(|| ApplyError::Rejected {
                        key: self.key.clone(),
                        reason: format!("malformed operation {text:?}"),
                    })
            })
            .collect()
    }
}

/// Build a change that sets `k` to `v`.
pub fn change(actor: ActorId, seq: u32, k: &str, v: &str) -> Change {
    Change {
        id: ChangeId { client_seq: seq, lamport: seq as u64, actor },
        message: Some(format!("set {k}")),
        operations: format!("{k}={v}").into_bytes(),
    }
}

impl Document for MemoryDocument {
    fn blank(key: DocumentKey) -> Self {
        Self {
            key,
            actor: None,
            status: DocumentStatus::Detached,
            content: BTreeMap::new(),
            pending: Vec::new(),
            checkpoint: Checkpoint::default(),
            reject_next: None,
        }
    }

    fn key(&self) -> &DocumentKey {
        &self.key
    }

    fn set_actor(&mut self, actor: ActorId) {
        self.actor = Some(actor);
    }

    fn set_status(&mut self, status: DocumentStatus) {
        self.status = status;
    }

    fn create_change_pack(&self) -> ChangePack {
        ChangePack::new(self.key.clone(), self.checkpoint, self.pending.clone())
    }

    fn apply_change_pack(&mut self, pack: ChangePack) -> Result<(), ApplyError> {
        if pack.document_key != self.key {
            return Err(ApplyError::KeyMismatch {
                expected: self.key.clone(),
                got: pack.document_key,
            });
        }
        if let Some(reason) = self.reject_next.take() {
            return Err(ApplyError::Rejected { key: self.key.clone(), reason });
        }
        let entries = self.decode(&pack.changes)?;

        self.content.extend(entries);
        self.pending.retain(|c| c.id.client_seq > pack.checkpoint.client_seq);
        self.checkpoint = self.checkpoint.forward(pack.checkpoint);
        Ok(())
    }

    fn apply_changes(&mut self, changes: &[Change]) -> Result<(), ApplyError> {
        let entries = self.decode(changes)?;
        self.content.extend(entries);
        Ok(())
    }

    fn marshal(&self) -> String {
        let fields: Vec<String> = self
            .content
            .iter()
            .map(|(k, v)| format!("\"{k}\":\"{v}\""))
            .collect();
        format!("{{{}}}", fields.join(","))
    }
}

// ============================================================================
// Client helpers
// ============================================================================

pub fn client(service: &Arc<FakeService>) -> Client<MemoryDocument> {
    init_tracing();
    Client::new(
        service.clone(),
        ClientOptions::default().with_key("test-client"),
    )
}

pub async fn active_client(service: &Arc<FakeService>) -> Client<MemoryDocument> {
    let mut c = client(service);
    c.activate().await.unwrap();
    c
}
