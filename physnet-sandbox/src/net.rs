//! WebSocket → [`Socket`] adapter.

use async_trait::async_trait;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket};

use physnet_server::{Socket, TransportError};

/// One client's WebSocket, seen as a duplex text transport.
pub struct WsSocket {
    inner: WebSocket,
}

impl WsSocket {
    pub fn new(inner: WebSocket) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Socket for WsSocket {
    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.inner.recv().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Close(_)) => return None,
                // Binary frames and ping/pong control traffic are not part
                // of the protocol.
                Ok(_) => continue,
                Err(err) => return Some(Err(TransportError::Io(err.to_string()))),
            }
        }
    }

    async fn send(&mut self, text: &str) -> Result<(), TransportError> {
        self.inner
            .send(Message::Text(Utf8Bytes::from(text.to_owned())))
            .await
            .map_err(|err| TransportError::Io(err.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.inner.send(Message::Close(None)).await;
    }
}
