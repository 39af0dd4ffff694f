//! Client configuration constants.
//!
//! Centralizes hardcoded values for easier configuration and documentation.

use std::time::Duration;

/// Default per-call timeout for unary round trips (activate, attach, push-pull, ...).
///
/// Also bounds the wait for the initialization frame when a watch is opened.
/// The open stream itself has no timeout.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Default capacity of the watch notification channel.
///
/// With 1, the watch task runs at most one notification ahead of the consumer.
pub const DEFAULT_WATCH_BUFFER: usize = 1;
