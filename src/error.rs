//! Error types for dispatcher construction.
//!
//! Per the dispatcher's error-handling contract, this is the only error this
//! crate ever hands back to a caller. Handler failures, queue overflow,
//! give-up, and source eviction are normal state transitions, not errors —
//! see [`crate::dispatch`] for where those are logged instead of surfaced.

use thiserror::Error;

/// Reasons [`crate::DispatcherConfig`] can fail validation at construction time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_source_queue_size` was zero; every accepted message would overflow
    /// immediately, which is almost certainly a misconfiguration.
    #[error("max_source_queue_size must be greater than zero")]
    ZeroQueueSize,
}
