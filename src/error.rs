//! Error types
//!
//! The relay core never fails: unknown devices, empty identifiers and stale
//! connections are silent no-ops. Errors only exist at the edges, where the
//! server binds sockets, decodes frames and reads its configuration.

use thiserror::Error;

/// Crate-level error
#[derive(Debug, Error)]
pub enum Error {
    /// Socket bind or serve failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Incoming frame could not be decoded into a client event
    #[error("invalid frame: {0}")]
    Decode(#[source] serde_json::Error),

    /// Incoming frame named an event this server does not handle
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// Outgoing event could not be serialized
    #[error("failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),

    /// Invalid configuration value
    #[error("invalid configuration for {key}: {message}")]
    Config {
        /// Environment variable or setting name
        key: &'static str,
        /// What was wrong with it
        message: String,
    },

    /// The relay task has shut down
    #[error("relay task is no longer running")]
    RelayClosed,
}

/// Result alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;
