//! Error types for the relay
//!
//! Defines connection-level errors. Uses thiserror for ergonomic error
//! definitions. Nothing here crosses the client/Hub boundary: handler errors
//! are logged at the accept loop and the affected connection is dropped.

use thiserror::Error;

/// Connection-level errors
///
/// All of these are fatal to a single connection attempt. Steady-state I/O
/// failures are handled in place by the reader/writer tasks and never
/// surface through this type.
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (fatal - the Hub is gone)
    #[error("Channel send error")]
    ChannelSend,

    /// Upgrade request did not carry both `room` and `name` parameters
    #[error("Missing join parameters")]
    MissingJoinParams,

    /// Upgrade request origin not allowed by the configured policy
    #[error("Origin not allowed: {0}")]
    OriginRejected(String),
}
