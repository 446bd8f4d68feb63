//! Per-tick dispatch of controllers over their bodies.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::time::Duration;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::controller::SharedController;
use crate::wire::EntityId;
use crate::world::{BodyHandle, World};

/// The set of live (controller, body) pairs, keyed by entity id.
///
/// Exactly one entry exists per live controller that has a body; iteration
/// order is unspecified and the step is non-concurrent.
#[derive(Default)]
pub struct Simulator {
    pairs: HashMap<EntityId, (BodyHandle, SharedController)>,
}

impl Simulator {
    /// Create an empty simulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair a controller with its body.
    pub fn add(&mut self, id: &str, body: BodyHandle, controller: SharedController) {
        self.pairs.insert(id.to_owned(), (body, controller));
    }

    /// Remove the pair for an entity; `false` if none existed.
    pub fn remove(&mut self, id: &str) -> bool {
        self.pairs.remove(id).is_some()
    }

    /// Number of live pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no pairs are live.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Invoke every controller once with the elapsed time.
    ///
    /// A pair whose body has meanwhile left the world is skipped; the server
    /// removes such pairs on entity destruction.
    pub fn step(&mut self, world: &mut World, dt: Duration) {
        for (handle, controller) in self.pairs.values() {
            if let Some(body) = world.body_mut(*handle) {
                controller.lock().step(body, dt);
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
