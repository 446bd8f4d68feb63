//! Connected client registry and per-client send API.
//!
//! The registry maps client ids to handles. It is mutated only by the tick
//! fiber (connect/disconnect are commands on the server's channel); the
//! synchronizer takes the read side when fanning a frame out. Each handle
//! owns the sending half of that client's outbound queue - the client's own
//! task drains the queue into the socket, so a stalled peer never blocks the
//! tick loop.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

// Layer 3: Internal module imports
use crate::wire::Frame;

/// Identity of a connected client. By convention it doubles as the id of the
/// entity the client controls (`"ship-a"`, ...).
pub type ClientId = String;

/// A connected peer: the sending half of its outbound queue.
#[derive(Clone)]
pub struct ClientHandle {
    id: ClientId,
    outbound: UnboundedSender<String>,
}

impl ClientHandle {
    pub(crate) fn new(id: ClientId, outbound: UnboundedSender<String>) -> Self {
        Self { id, outbound }
    }

    /// The client's id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Send an application-level system payload to this client only.
    ///
    /// Wire shape: `{"type":"system","data":{"id":"default","data": ...}}`.
    pub fn send_system(&self, data: Value) {
        let frame = Frame::system_default(data);
        match serde_json::to_string(&frame) {
            Ok(text) => self.forward(&text),
            Err(err) => warn!(client = %self.id, %err, "system frame did not serialize"),
        }
    }

    /// Queue a serialized frame for this client.
    pub(crate) fn forward(&self, text: &str) {
        if self.outbound.send(text.to_owned()).is_err() {
            debug!(client = %self.id, "outbound queue closed, frame dropped");
        }
    }
}

/// Shared view of the client map, read by the synchronizer.
pub(crate) type ClientMap = Arc<RwLock<HashMap<ClientId, ClientHandle>>>;

/// Registry of connected clients.
pub(crate) struct ClientRegistry {
    map: ClientMap,
}

impl ClientRegistry {
    pub(crate) fn new() -> Self {
        Self {
            map: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Shared view handed to the synchronizer.
    pub(crate) fn map(&self) -> ClientMap {
        Arc::clone(&self.map)
    }

    pub(crate) fn insert(&self, handle: ClientHandle) {
        self.map.write().insert(handle.id.clone(), handle);
    }

    pub(crate) fn remove(&self, id: &str) -> Option<ClientHandle> {
        self.map.write().remove(id)
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.map.read().contains_key(id)
    }

    pub(crate) fn get(&self, id: &str) -> Option<ClientHandle> {
        self.map.read().get(id).cloned()
    }

    pub(crate) fn ids(&self) -> Vec<ClientId> {
        self.map.read().keys().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.map.read().len()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn test_registry_insert_remove() {
        let registry = ClientRegistry::new();
        let (tx, _rx) = unbounded_channel();
        registry.insert(ClientHandle::new("ship-a".to_owned(), tx));

        assert!(registry.contains("ship-a"));
        assert_eq!(registry.len(), 1);
        assert!(registry.remove("ship-a").is_some());
        assert!(registry.remove("ship-a").is_none());
        assert!(!registry.contains("ship-a"));
    }

    #[test]
    fn test_send_system_wire_shape() {
        let (tx, mut rx) = unbounded_channel();
        let handle = ClientHandle::new("ship-a".to_owned(), tx);
        handle.send_system(json!({"seat": "ship-a"}));

        let text = rx.try_recv().unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({"type": "system", "data": {"id": "default", "data": {"seat": "ship-a"}}})
        );
    }

    #[test]
    fn test_forward_to_closed_queue_is_dropped() {
        let (tx, rx) = unbounded_channel();
        let handle = ClientHandle::new("ship-a".to_owned(), tx);
        drop(rx);
        // Must not panic; the frame is simply dropped.
        handle.forward("{}");
    }
}
