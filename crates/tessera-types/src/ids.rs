//! Typed identifiers for sessions and documents.
//!
//! `ActorId` wraps a UUID. The server issues it on activation as 16 opaque
//! bytes; it displays as standard UUID text for logging, and `short()` (first
//! 8 hex chars) is for human-facing output only.
//!
//! `DocumentKey` is the caller-facing document name. Keys are validated once at
//! construction so the rest of the client can treat them as plain map keys.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Longest accepted document key, in bytes.
pub const MAX_DOCUMENT_KEY_LEN: usize = 120;

/// Errors from constructing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("actor id must be 16 bytes, got {0}")]
    InvalidLength(usize),
    #[error("invalid actor id text: {0}")]
    InvalidText(String),
    #[error("document key is empty")]
    EmptyKey,
    #[error("document key is longer than {MAX_DOCUMENT_KEY_LEN} bytes")]
    KeyTooLong,
    #[error("document key {key:?} contains invalid character {ch:?}")]
    InvalidKeyChar { key: String, ch: char },
}

// ============================================================================
// ActorId
// ============================================================================

/// A session identifier assigned by the server.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(uuid::Uuid);

impl ActorId {
    /// Create a new time-ordered ID (UUIDv7).
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// First 8 hex characters, for human display only.
    pub fn short(&self) -> String {
        self.0.as_simple().to_string()[..8].to_string()
    }

    /// Full 32-character hex string (no hyphens).
    pub fn to_hex(&self) -> String {
        self.0.as_simple().to_string()
    }

    /// The raw 16 bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Reconstruct from 16 bytes.
    pub fn from_bytes(b: [u8; 16]) -> Self {
        Self(uuid::Uuid::from_bytes(b))
    }

    /// Reconstruct from a byte slice received off the wire.
    pub fn try_from_slice(b: &[u8]) -> Result<Self, IdError> {
        let arr: [u8; 16] = b.try_into().map_err(|_| IdError::InvalidLength(b.len()))?;
        Ok(Self::from_bytes(arr))
    }

    /// Parse from a hex string (32 chars, no hyphens) or standard UUID format.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| IdError::InvalidText(e.to_string()))
    }

    /// The all-zero ID, used as a sentinel.
    pub fn nil() -> Self {
        Self(uuid::Uuid::nil())
    }

    /// Check if this is the nil ID.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<[u8; 16]> for ActorId {
    fn from(b: [u8; 16]) -> Self {
        Self::from_bytes(b)
    }
}

impl FromStr for ActorId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.short())
    }
}

// ============================================================================
// DocumentKey
// ============================================================================

/// A validated document key such as `"notes/2024-plan"`.
///
/// Allowed characters: ASCII letters, digits, and `- . _ ~ /`.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentKey(String);

impl DocumentKey {
    pub fn new(key: impl Into<String>) -> Result<Self, IdError> {
        let key = key.into();
        if key.is_empty() {
            return Err(IdError::EmptyKey);
        }
        if key.len() > MAX_DOCUMENT_KEY_LEN {
            return Err(IdError::KeyTooLong);
        }
        if let Some(ch) = key
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~' | '/')))
        {
            return Err(IdError::InvalidKeyChar { key, ch });
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DocumentKey {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<DocumentKey> for String {
    fn from(key: DocumentKey) -> String {
        key.0
    }
}

impl FromStr for DocumentKey {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for DocumentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for DocumentKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentKey({:?})", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
