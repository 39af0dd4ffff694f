//! Frames pushed by the server on a watch stream.
//!
//! A stream opens with exactly one [`WatchFrame::Initialization`], then carries
//! [`WatchFrame::Event`]s. Event kinds the client does not know arrive as
//! [`DocEventType::Unsupported`] rather than failing to decode.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::ids::DocumentKey;
use crate::presence::PeerClient;

/// Kind of a document event. Serializes as its wire name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(into = "String", from = "String")]
pub enum DocEventType {
    /// Content of the listed documents changed on the server.
    DocumentsChanged,
    /// The publisher started watching the listed documents.
    DocumentsWatched,
    /// The publisher stopped watching the listed documents.
    DocumentsUnwatched,
    /// The publisher's presence changed.
    PresenceChanged,
    /// Any wire name not listed above.
    #[strum(default)]
    Unsupported(String),
}

impl DocEventType {
    /// Stable wire name, e.g. `"documents-changed"`.
    pub fn as_str(&self) -> &str {
        match self {
            DocEventType::DocumentsChanged => "documents-changed",
            DocEventType::DocumentsWatched => "documents-watched",
            DocEventType::DocumentsUnwatched => "documents-unwatched",
            DocEventType::PresenceChanged => "presence-changed",
            DocEventType::Unsupported(name) => name,
        }
    }

    /// Parse a wire name. Never fails; unknown names map to `Unsupported`.
    pub fn from_wire(name: &str) -> Self {
        name.parse()
            .unwrap_or_else(|_| DocEventType::Unsupported(name.to_string()))
    }
}

impl From<String> for DocEventType {
    fn from(name: String) -> Self {
        DocEventType::from_wire(&name)
    }
}

impl From<DocEventType> for String {
    fn from(kind: DocEventType) -> Self {
        match kind {
            DocEventType::Unsupported(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DocEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event about one or more documents, published by a peer session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocEvent {
    pub event_type: DocEventType,
    pub publisher: PeerClient,
    pub document_keys: Vec<DocumentKey>,
}

/// One message on a watch stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchFrame {
    /// Peers already watching each requested document.
    Initialization {
        peers_map_by_doc: BTreeMap<DocumentKey, Vec<PeerClient>>,
    },
    Event(DocEvent),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_event_names() {
        for kind in [
            DocEventType::DocumentsChanged,
            DocEventType::DocumentsWatched,
            DocEventType::DocumentsUnwatched,
            DocEventType::PresenceChanged,
        ] {
            assert_eq!(DocEventType::from_wire(kind.as_str()), kind);
        }
        assert_eq!(
            "presence-changed".parse::<DocEventType>().unwrap(),
            DocEventType::PresenceChanged
        );
    }

    #[test]
    fn test_unknown_event_name_is_unsupported() {
        let kind = DocEventType::from_wire("documents-exploded");
        assert_eq!(kind, DocEventType::Unsupported("documents-exploded".into()));
        assert_eq!(kind.to_string(), "documents-exploded");
    }

    #[test]
    fn test_event_type_json_uses_wire_names() {
        let json = serde_json::to_string(&DocEventType::DocumentsChanged).unwrap();
        assert_eq!(json, "\"documents-changed\"");

        let known: DocEventType = serde_json::from_str("\"documents-unwatched\"").unwrap();
        assert_eq!(known, DocEventType::DocumentsUnwatched);

        let unknown: DocEventType = serde_json::from_str("\"documents-exploded\"").unwrap();
        assert_eq!(unknown, DocEventType::Unsupported("documents-exploded".into()));
        assert_eq!(serde_json::to_string(&unknown).unwrap(), "\"documents-exploded\"");
    }

    #[test]
    fn test_event_frame_with_unknown_kind_decodes() {
        let json = r#"{"Event":{"event_type":"documents-archived","publisher":{"id":"00000000-0000-0000-0000-000000000000","presence_info":{"clock":0,"presence":{}}},"document_keys":["doc-1"]}}"#;
        let frame: WatchFrame = serde_json::from_str(json).unwrap();
        let WatchFrame::Event(event) = frame else {
            panic!("expected event frame");
        };
        assert_eq!(event.event_type, DocEventType::Unsupported("documents-archived".into()));
    }
}
