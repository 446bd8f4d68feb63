//! The synchronization pipeline: destination contexts and frame emission.
//!
//! Every outbound frame is emitted "to the current destination" - one
//! client, all clients, all-except-one, or nowhere. The destination is a
//! scoped binding on the synchronizer handle: [`Synchronizer::with`] swaps it
//! in, runs the given closure, and restores the previous destination, so
//! *every emission inside the closure goes exclusively to that destination*.
//!
//! All rebinding and emission happens on the tick fiber; the lock around the
//! slot is uncontended and only makes the sharing expressible.

// Layer 1: Standard library imports
use std::mem;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;
use tracing::warn;

// Layer 3: Internal module imports
use crate::clients::{ClientId, ClientMap};
use crate::wire::Frame;

/// Where the current emission goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Every connected client.
    All,
    /// A single client (used for new-client replay).
    One(ClientId),
    /// Every client except one (used for event rebroadcast).
    Except(ClientId),
    /// Nobody; emissions are swallowed (used for actor-initiated spawns).
    Silent,
}

struct SyncShared {
    clients: ClientMap,
    destination: Mutex<Destination>,
}

/// Cheaply cloneable handle to the synchronization pipeline.
///
/// The default destination is [`Destination::All`], which is what the tick
/// loop broadcasts under.
#[derive(Clone)]
pub struct Synchronizer {
    inner: Arc<SyncShared>,
}

impl Synchronizer {
    pub(crate) fn new(clients: ClientMap) -> Self {
        Self {
            inner: Arc::new(SyncShared {
                clients,
                destination: Mutex::new(Destination::All),
            }),
        }
    }

    /// Run `f` with the destination rebound, restoring the previous one
    /// afterwards.
    pub fn with<R>(&self, destination: Destination, f: impl FnOnce() -> R) -> R {
        let previous = mem::replace(&mut *self.inner.destination.lock(), destination);
        let result = f();
        *self.inner.destination.lock() = previous;
        result
    }

    /// The destination emissions currently go to.
    pub fn destination(&self) -> Destination {
        self.inner.destination.lock().clone()
    }

    /// Serialize the frame once and fan it out to the current destination.
    ///
    /// Write failures are per-client best-effort; a closed peer's frames are
    /// dropped and its disconnect is already on its way through the command
    /// channel.
    pub fn emit(&self, frame: &Frame) {
        let destination = self.destination();
        if destination == Destination::Silent {
            return;
        }
        let text = match serde_json::to_string(frame) {
            Ok(text) => text,
            Err(err) => {
                warn!(%err, "outbound frame did not serialize");
                return;
            }
        };
        let clients = self.inner.clients.read();
        match destination {
            Destination::All => {
                for client in clients.values() {
                    client.forward(&text);
                }
            }
            Destination::One(id) => {
                if let Some(client) = clients.get(&id) {
                    client.forward(&text);
                }
            }
            Destination::Except(id) => {
                for (client_id, client) in clients.iter() {
                    if client_id != &id {
                        client.forward(&text);
                    }
                }
            }
            Destination::Silent => {}
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
