//! Server-level error types.

// Layer 1: Standard library
// (none)

// Layer 2: Third-party
use thiserror::Error;

// Layer 3: Internal
// (none)

/// Why a connection attempt was not admitted.
///
/// Returned to the transport glue (the HTTP upgrade handler), which is
/// expected to close the socket and log.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConnectError {
    /// The id policy found no free identifier.
    #[error("no free client id available")]
    IdsExhausted,

    /// The connect listener vetoed the client.
    #[error("connection rejected: {0}")]
    Rejected(String),

    /// The server loop is not running (or already shut down).
    #[error("server is not running")]
    NotRunning,
}
