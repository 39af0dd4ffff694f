//! Push-pull sync between attached documents and the server.
//!
//! # Exchange
//!
//! Attach, detach, and sync all run the same exchange against different
//! endpoints:
//!
//! 1. ask the document for a change pack of its pending local changes
//! 2. send it with the session id, await the server's pack
//! 3. apply the server's pack to the document
//!
//! The document lock is taken only for steps 1 and 3. A failed apply leaves
//! the document as it was (the engine's contract) and is returned as
//! [`ClientError::Apply`]; nothing is retried.

use tessera_types::{ActorId, ChangePack, DocumentKey};
use tracing::{debug, error, trace};

use crate::document::{Document, DocumentHandle};
use crate::error::ClientError;
use crate::session::Client;

/// Which endpoint an exchange goes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Exchange {
    Attach,
    Detach,
    PushPull,
}

impl Exchange {
    fn op_name(self) -> &'static str {
        match self {
            Exchange::Attach => "attach_document",
            Exchange::Detach => "detach_document",
            Exchange::PushPull => "push_pull",
        }
    }
}

impl<D: Document> Client<D> {
    /// Push local changes and pull remote ones for the given documents.
    ///
    /// With no keys, every attached document is synced. Documents are synced
    /// one at a time in order; the first failure stops the rest.
    pub async fn sync(&self, keys: &[DocumentKey]) -> Result<(), ClientError> {
        self.require_active()?;

        let keys = if keys.is_empty() {
            self.state.lock().attachments.keys()
        } else {
            keys.to_vec()
        };

        for key in &keys {
            self.sync_document(key).await?;
        }
        Ok(())
    }

    async fn sync_document(&self, key: &DocumentKey) -> Result<(), ClientError> {
        let session_id = self.require_active()?;
        let doc = self
            .state
            .lock()
            .attachments
            .doc(key)
            .ok_or_else(|| ClientError::DocumentNotAttached(key.clone()))?;

        self.exchange(Exchange::PushPull, session_id, key, &doc).await?;
        Ok(())
    }

    /// Run one exchange. Returns the number of remote changes applied.
    pub(crate) async fn exchange(
        &self,
        kind: Exchange,
        session_id: ActorId,
        key: &DocumentKey,
        doc: &DocumentHandle<D>,
    ) -> Result<usize, ClientError> {
        let pack = doc.lock().create_change_pack();
        let local = pack.change_count();
        trace!(document = %key, op = kind.op_name(), local, "sending change pack");

        let response = self
            .round_trip(kind.op_name(), self.send_pack(kind, session_id, pack))
            .await
            .inspect_err(|e| error!(document = %key, op = kind.op_name(), error = %e, "failed to sync"))?;

        let remote = response.change_count();
        let mut guard = doc.lock();
        guard
            .apply_change_pack(response)
            .inspect_err(|e| error!(document = %key, error = %e, "failed to apply change pack"))?;
        debug!(
            document = %key,
            op = kind.op_name(),
            local,
            remote,
            content = %guard.marshal(),
            "change pack applied"
        );
        Ok(remote)
    }

    async fn send_pack(
        &self,
        kind: Exchange,
        session_id: ActorId,
        pack: ChangePack,
    ) -> Result<ChangePack, crate::service::RpcError> {
        match kind {
            Exchange::Attach => self.service.attach_document(session_id, pack).await,
            Exchange::Detach => self.service.detach_document(session_id, pack).await,
            Exchange::PushPull => self.service.push_pull(session_id, pack).await,
        }
    }
}
