//! Caller-facing error type.

use std::time::Duration;

use tessera_types::{DocumentKey, IdError};

use crate::document::ApplyError;
use crate::service::RpcError;

/// Errors returned by [`Client`](crate::Client) operations and carried by the
/// terminal watch notification.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("client is not activated")]
    ClientNotActivated,
    #[error("document is not attached: {0}")]
    DocumentNotAttached(DocumentKey),
    #[error("document is already attached: {0}")]
    DocumentAlreadyAttached(DocumentKey),
    #[error("unsupported watch response: {0}")]
    UnsupportedWatchResponse(String),
    #[error("server returned an invalid session id: {0}")]
    InvalidSessionId(#[from] IdError),
    #[error("presence clock exhausted")]
    PresenceClockExhausted,
    #[error("{0} timed out after {1:?}")]
    Timeout(&'static str, Duration),
    #[error("operation cancelled")]
    Cancelled,
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
    #[error("apply error: {0}")]
    Apply(#[from] ApplyError),
}
