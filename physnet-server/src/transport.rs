//! The duplex text transport seam.
//!
//! The core speaks to peers through [`Socket`]: one JSON value per text
//! frame, in both directions. The sample application adapts its WebSocket
//! connection to this trait; [`ChannelSocket`] is an in-memory implementation
//! for tests and local (in-process) clients.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

// Layer 3: Internal module imports
// (none)

/// Transport-level failures.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The peer (or the in-memory counterpart) is gone.
    #[error("transport closed")]
    Closed,

    /// Underlying I/O failure, stringly typed at the seam.
    #[error("transport i/o: {0}")]
    Io(String),
}

/// A duplex text-frame transport to one peer.
#[async_trait]
pub trait Socket: Send + 'static {
    /// Next inbound text frame; `None` once the peer has closed.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;

    /// Send one text frame.
    async fn send(&mut self, text: &str) -> Result<(), TransportError>;

    /// Close the transport; best-effort, idempotent.
    async fn close(&mut self);
}

/// In-memory socket backed by a pair of unbounded channels.
pub struct ChannelSocket {
    tx: UnboundedSender<String>,
    rx: UnboundedReceiver<String>,
}

/// Create two cross-wired [`ChannelSocket`]s.
///
/// Hand one half to [`ServerHandle::connect`](crate::ServerHandle::connect)
/// and drive the other as the peer.
pub fn channel_pair() -> (ChannelSocket, ChannelSocket) {
    let (a_tx, a_rx) = unbounded_channel();
    let (b_tx, b_rx) = unbounded_channel();
    (
        ChannelSocket { tx: a_tx, rx: b_rx },
        ChannelSocket { tx: b_tx, rx: a_rx },
    )
}

#[async_trait]
impl Socket for ChannelSocket {
    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        self.rx.recv().await.map(Ok)
    }

    async fn send(&mut self, text: &str) -> Result<(), TransportError> {
        self.tx
            .send(text.to_owned())
            .map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) {
        self.rx.close();
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
