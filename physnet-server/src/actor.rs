//! Actor engine adapter.
//!
//! Wraps the embedded actor engine to thread each entity's controller through
//! its actor callbacks, pre-seed the next assigned identifier (so an actor's
//! id equals its entity's id), and surface actor-requested child spawns to
//! the server without the engine ever calling back into it.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;
use physnet_rt::{
    Actor, ActorId, ActorSystem, Context, DeadLetterHandler, IdGenerator, NumericIdGenerator,
    SpawnError, SpawnRequest,
};
use serde_json::Value;

// Layer 3: Internal module imports
use crate::controller::SharedController;

/// Mailbox-bound message handler for one entity.
///
/// The injected controller reference gives actor code typed access to the
/// physics state of its entity (lock, then downcast via
/// [`Controller::as_any_mut`](crate::controller::Controller::as_any_mut)).
/// The [`Context`] carries `send`/`spawn`/`exit`; a `spawn(kind, props)`
/// builds a full child entity around the new actor.
pub trait EntityActor: Send {
    /// Called once before the first message.
    fn on_init(&mut self, controller: &SharedController, ctx: &mut Context<'_>) {
        let _ = (controller, ctx);
    }

    /// Handle one control event.
    fn on_message(
        &mut self,
        controller: &SharedController,
        message: Value,
        ctx: &mut Context<'_>,
    );
}

/// An entity actor shared between its manager and the engine.
pub type SharedActor = Arc<Mutex<dyn EntityActor>>;

/// Engine-facing wrapper binding an entity actor to its controller.
struct ActorOwner {
    actor: SharedActor,
    controller: SharedController,
}

impl Actor for ActorOwner {
    fn on_init(&mut self, ctx: &mut Context<'_>) {
        self.actor.lock().on_init(&self.controller, ctx);
    }

    fn on_message(&mut self, message: Value, ctx: &mut Context<'_>) {
        self.actor.lock().on_message(&self.controller, message, ctx);
    }
}

/// Id generator with a consume-once preset over a numeric fallback.
///
/// `CreateEntity` presets the entity id right before spawning, so the engine
/// assigns exactly that id; actor-requested children fall back to numeric
/// ids.
struct PresetIdGenerator {
    preset: Arc<Mutex<Option<ActorId>>>,
    fallback: NumericIdGenerator,
}

impl IdGenerator for PresetIdGenerator {
    fn next_id(&mut self) -> ActorId {
        match self.preset.lock().take() {
            Some(id) => id,
            None => self.fallback.next_id(),
        }
    }
}

/// The adapter the server drives the actor engine through.
pub struct ActorHost {
    system: ActorSystem,
    preset: Arc<Mutex<Option<ActorId>>>,
}

impl Default for ActorHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorHost {
    /// Create a host with an empty engine.
    pub fn new() -> Self {
        let preset = Arc::new(Mutex::new(None));
        let system = ActorSystem::with_id_generator(Box::new(PresetIdGenerator {
            preset: Arc::clone(&preset),
            fallback: NumericIdGenerator::new(),
        }));
        Self { system, preset }
    }

    /// Spawn an actor under exactly the given id, bound to its controller.
    pub fn spawn_as(
        &mut self,
        id: &str,
        controller: SharedController,
        actor: SharedActor,
    ) -> Result<ActorId, SpawnError> {
        *self.preset.lock() = Some(id.to_owned());
        let result = self.system.spawn(move |_| Some(Box::new(ActorOwner { actor, controller })));
        // The preset is consumed by the spawn above; clear it on the error
        // paths that never reached the generator.
        self.preset.lock().take();
        result
    }

    /// Forward a message to the actor's mailbox.
    pub fn send(&mut self, id: &str, message: Value) -> bool {
        self.system.send(id, message)
    }

    /// Remove an actor, dropping undelivered mail.
    pub fn stop(&mut self, id: &str) -> bool {
        self.system.stop(id)
    }

    /// Whether the id names a live actor.
    pub fn is_live(&self, id: &str) -> bool {
        self.system.is_live(id)
    }

    /// Oldest unresolved child-spawn request, if any.
    pub fn take_pending_spawn(&mut self) -> Option<SpawnRequest> {
        self.system.take_pending_spawn()
    }

    /// Resolve a child-spawn request with the child's controller and actor.
    pub fn fulfill(&mut self, id: &str, controller: SharedController, actor: SharedActor) -> bool {
        self.system
            .fulfill_spawn(id, Box::new(ActorOwner { actor, controller }))
    }

    /// Drop a child-spawn reservation whose triple could not be built.
    pub fn abort(&mut self, id: &str) -> bool {
        self.system.abort_spawn(id)
    }

    /// Route messages addressed to unknown actors somewhere useful.
    ///
    /// Without a handler they are logged at debug level and dropped.
    pub fn set_dead_letter_handler(&mut self, handler: DeadLetterHandler) {
        self.system.set_dead_letter_handler(handler);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::controller::Controller;
    use rapier2d::prelude::RigidBody;
    use serde_json::json;
    use std::any::Any;
    use std::time::Duration;

    struct Dial {
        value: f64,
    }

    impl Controller for Dial {
        fn step(&mut self, _body: &mut RigidBody, _dt: Duration) {}

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    /// Copies the numeric payload of each message into its controller.
    struct DialActor;

    impl EntityActor for DialActor {
        fn on_message(
            &mut self,
            controller: &SharedController,
            message: Value,
            _ctx: &mut Context<'_>,
        ) {
            if let Some(value) = message.as_f64() {
                let mut guard = controller.lock();
                if let Some(dial) = guard.as_any_mut().downcast_mut::<Dial>() {
                    dial.value = value;
                }
            }
        }
    }

    fn dial() -> (SharedController, SharedActor) {
        (
            Arc::new(Mutex::new(Dial { value: 0.0 })),
            Arc::new(Mutex::new(DialActor)),
        )
    }

    #[test]
    fn test_spawn_uses_preset_id() {
        let mut host = ActorHost::new();
        let (controller, actor) = dial();
        let id = host.spawn_as("ship-a", controller, actor).unwrap();
        assert_eq!(id, "ship-a");
        assert!(host.is_live("ship-a"));
    }

    #[test]
    fn test_message_reaches_controller() {
        let mut host = ActorHost::new();
        let (controller, actor) = dial();
        host.spawn_as("ship-a", Arc::clone(&controller), actor).unwrap();

        assert!(host.send("ship-a", json!(0.5)));
        let mut guard = controller.lock();
        let value = guard.as_any_mut().downcast_mut::<Dial>().unwrap().value;
        assert!((value - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_child_spawns_fall_back_to_numeric_ids() {
        struct Spawner;
        impl EntityActor for Spawner {
            fn on_init(&mut self, _controller: &SharedController, ctx: &mut Context<'_>) {
                let child = ctx.spawn("probe", Value::Null).unwrap();
                assert_eq!(child, "0");
            }
            fn on_message(
                &mut self,
                _controller: &SharedController,
                _message: Value,
                _ctx: &mut Context<'_>,
            ) {
            }
        }

        let mut host = ActorHost::new();
        let (controller, _) = dial();
        host.spawn_as("ship-a", controller, Arc::new(Mutex::new(Spawner)))
            .unwrap();

        let request = host.take_pending_spawn().unwrap();
        assert_eq!(request.id, "0");
        assert_eq!(request.kind, "probe");

        let (child_controller, child_actor) = dial();
        assert!(host.fulfill("0", child_controller, child_actor));
        assert!(host.is_live("0"));
    }

    #[test]
    fn test_duplicate_preset_id_is_error() {
        let mut host = ActorHost::new();
        let (controller, actor) = dial();
        host.spawn_as("ship-a", controller, actor).unwrap();
        let (controller, actor) = dial();
        let err = host.spawn_as("ship-a", controller, actor).unwrap_err();
        assert!(matches!(err, SpawnError::DuplicateId(_)));
    }

    #[test]
    fn test_stop_silences_mailbox() {
        let mut host = ActorHost::new();
        let (controller, actor) = dial();
        host.spawn_as("ship-a", controller, actor).unwrap();
        assert!(host.stop("ship-a"));
        assert!(!host.send("ship-a", json!(1.0)));
    }
}
