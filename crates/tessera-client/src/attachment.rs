//! Attachment table: attached documents and who else is watching them.
//!
//! Pure bookkeeping, no I/O. The session keeps one table behind its state
//! mutex; both the caller's operations and the watch task go through it.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tessera_types::{ActorId, DocumentKey, PeerClient, Presence, PresenceInfo};

use crate::document::DocumentHandle;

/// Peer presence per attached document, as handed to callers.
pub type PeersMapByDoc = BTreeMap<DocumentKey, BTreeMap<ActorId, Presence>>;

/// A document bound to the session, plus its peer roster.
pub struct Attachment<D> {
    doc: DocumentHandle<D>,
    peers: BTreeMap<ActorId, PresenceInfo>,
}

impl<D> Attachment<D> {
    fn new(doc: DocumentHandle<D>) -> Self {
        Self { doc, peers: BTreeMap::new() }
    }

    pub fn doc(&self) -> &DocumentHandle<D> {
        &self.doc
    }

    pub fn peers(&self) -> &BTreeMap<ActorId, PresenceInfo> {
        &self.peers
    }

    /// Record a peer's presence; an existing entry with a higher clock wins.
    pub fn merge_peer(&mut self, peer: PeerClient) -> bool {
        match self.peers.get_mut(&peer.id) {
            Some(existing) => existing.merge(peer.presence_info),
            None => {
                self.peers.insert(peer.id, peer.presence_info);
                true
            }
        }
    }

    pub fn remove_peer(&mut self, id: &ActorId) -> bool {
        self.peers.remove(id).is_some()
    }

    fn peer_presences(&self) -> BTreeMap<ActorId, Presence> {
        self.peers
            .iter()
            .map(|(id, info)| (*id, info.presence.clone()))
            .collect()
    }
}

/// At most one [`Attachment`] per document key.
///
/// A key can also be reserved while its attach exchange is in flight; a
/// reserved key is not attached yet but cannot be attached by anyone else.
pub struct AttachmentTable<D> {
    entries: BTreeMap<DocumentKey, Attachment<D>>,
    pending: BTreeSet<DocumentKey>,
}

impl<D> Default for AttachmentTable<D> {
    fn default() -> Self {
        Self { entries: BTreeMap::new(), pending: BTreeSet::new() }
    }
}

impl<D> AttachmentTable<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &DocumentKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Claim `key` for an attach in progress. False if it is already
    /// attached or claimed.
    pub fn reserve(&mut self, key: &DocumentKey) -> bool {
        !self.entries.contains_key(key) && self.pending.insert(key.clone())
    }

    pub fn release(&mut self, key: &DocumentKey) {
        self.pending.remove(key);
    }

    pub fn is_reserved(&self, key: &DocumentKey) -> bool {
        self.pending.contains(key)
    }

    pub fn get(&self, key: &DocumentKey) -> Option<&Attachment<D>> {
        self.entries.get(key)
    }

    /// Insert a fresh, peerless attachment. Returns false (and changes
    /// nothing) if the key is already attached.
    pub fn insert(&mut self, key: DocumentKey, doc: DocumentHandle<D>) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, Attachment::new(doc));
        true
    }

    pub fn remove(&mut self, key: &DocumentKey) -> Option<Attachment<D>> {
        self.entries.remove(key)
    }

    /// Attached keys in sorted order.
    pub fn keys(&self) -> Vec<DocumentKey> {
        self.entries.keys().cloned().collect()
    }

    /// A clone of the attached document's handle.
    pub fn doc(&self, key: &DocumentKey) -> Option<DocumentHandle<D>> {
        self.entries.get(key).map(|a| Arc::clone(&a.doc))
    }

    /// Merge a peer into one document's roster. False if the document isn't
    /// attached or the stored entry was newer.
    pub fn merge_peer(&mut self, key: &DocumentKey, peer: PeerClient) -> bool {
        self.entries
            .get_mut(key)
            .is_some_and(|a| a.merge_peer(peer))
    }

    /// False if the document isn't attached or the peer wasn't listed.
    pub fn remove_peer(&mut self, key: &DocumentKey, id: &ActorId) -> bool {
        self.entries
            .get_mut(key)
            .is_some_and(|a| a.remove_peer(id))
    }

    /// Snapshot of every attached document's roster.
    pub fn peers_map_by_doc(&self) -> PeersMapByDoc {
        self.entries
            .iter()
            .map(|(key, a)| (key.clone(), a.peer_presences()))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
