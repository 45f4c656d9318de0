//! Error types

use std::time::Duration;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by connection setup and the diagnostic probes
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection string rejected by the driver before any network activity
    #[error("invalid connection uri: {0}")]
    Uri(#[source] mongodb::error::Error),

    /// Server unreachable or handshake rejected during the initial dial
    #[error("cannot reach server: {0}")]
    Dial(#[source] mongodb::error::Error),

    /// Initial dial did not complete within the configured window
    #[error("dial timed out after {0:?}")]
    DialTimeout(Duration),

    /// No session was ever established, or the connection was closed
    #[error("no session established")]
    NoSession,

    /// An administrative command failed after the connection was live
    #[error("admin command failed: {0}")]
    Command(#[source] mongodb::error::Error),

    /// The server replied, but the reply did not decode
    #[error("malformed {command} reply: {source}")]
    Reply {
        command: &'static str,
        #[source]
        source: mongodb::bson::de::Error,
    },

    /// Lifecycle state machine rejected a transition
    #[error("invalid state transition: expected {expected}, actual {actual}")]
    InvalidState { expected: String, actual: String },
}
