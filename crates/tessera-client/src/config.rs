//! Client options, loadable from RON.
//!
//! ```ron
//! (
//!     key: Some("editor-laptop"),
//!     presence: {"name": "amy", "color": "teal"},
//!     rpc_timeout_ms: Some(5000),
//!     watch_buffer: 4,
//! )
//! ```
//!
//! Every field is optional in the file; missing fields take [`ClientOptions::default`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tessera_types::Presence;

use crate::constants::{DEFAULT_RPC_TIMEOUT, DEFAULT_WATCH_BUFFER};

/// Error type for options loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Options for constructing a [`Client`](crate::Client).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Stable session key. A random one is generated when absent.
    pub key: Option<String>,
    /// Presence the session starts with (clock 0).
    pub presence: Presence,
    /// Per-call timeout in milliseconds. `None` or `Some(0)` disables it.
    pub rpc_timeout_ms: Option<u64>,
    /// Capacity of the watch notification channel (minimum 1).
    pub watch_buffer: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            key: None,
            presence: Presence::new(),
            rpc_timeout_ms: Some(DEFAULT_RPC_TIMEOUT.as_millis() as u64),
            watch_buffer: DEFAULT_WATCH_BUFFER,
        }
    }
}

impl ClientOptions {
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Read options from a `.ron` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    pub fn with_rpc_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.rpc_timeout_ms = timeout.map(|t| t.as_millis() as u64);
        self
    }

    pub fn rpc_timeout(&self) -> Option<Duration> {
        match self.rpc_timeout_ms {
            None | Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
        }
    }

    pub(crate) fn watch_capacity(&self) -> usize {
        self.watch_buffer.max(1)
    }
}

// ============================================================================
// Tests
// ============================================================================
