//! Per-delivery actor context.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use serde_json::Value;

// Layer 3: Internal module imports
use super::engine::ActorSystem;
use crate::util::ActorId;

/// Capabilities handed to an actor for the duration of one delivery.
///
/// A context is only ever constructed by the dispatch loop; actor code
/// cannot hold on to it across deliveries.
pub struct Context<'a> {
    system: &'a mut ActorSystem,
    self_id: ActorId,
    exited: bool,
}

impl<'a> Context<'a> {
    pub(crate) fn new(system: &'a mut ActorSystem, self_id: ActorId) -> Self {
        Self {
            system,
            self_id,
            exited: false,
        }
    }

    /// The id of the actor this delivery belongs to.
    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    /// Send a message to another actor (or to self, delivered later).
    ///
    /// Returns `false` if the target does not exist; the system's dead-letter
    /// handler sees the message in that case.
    pub fn send(&mut self, to: &str, message: Value) -> bool {
        self.system.enqueue(to, message)
    }

    /// Request a child actor of the given kind.
    ///
    /// The child's id and mailbox are reserved immediately, so mail can be
    /// sent to the returned id right away; the embedder resolves the actual
    /// construction. Returns `None` if no id could be reserved.
    pub fn spawn(&mut self, kind: &str, props: Value) -> Option<ActorId> {
        self.system.reserve_spawn(kind, props)
    }

    /// Terminate this actor after the current delivery.
    ///
    /// Undelivered mail is dropped.
    pub fn exit(&mut self) {
        self.exited = true;
    }

    pub(crate) fn exited(&self) -> bool {
        self.exited
    }
}
