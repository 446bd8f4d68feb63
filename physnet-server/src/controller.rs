//! Per-step body controllers.

// Layer 1: Standard library imports
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;
use rapier2d::prelude::RigidBody;

// Layer 3: Internal module imports
// (none)

/// Per-step state updater for one body.
///
/// The simulator invokes [`step`](Controller::step) once per physics tick
/// with the elapsed time since the previous tick; implementations mutate
/// forces, torques or velocities on the body.
///
/// Actor code reaches its entity's controller through
/// [`as_any_mut`](Controller::as_any_mut) and a downcast - the actor/
/// controller pair for one entity kind knows its own concrete type.
pub trait Controller: Send {
    /// Advance the controller's body by `dt`.
    fn step(&mut self, body: &mut RigidBody, dt: Duration);

    /// Downcasting hook for actors that need their concrete controller.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A controller shared between the simulator, its manager and its actor.
///
/// Everything that touches a controller runs on the tick fiber, so the lock
/// is never contended; it exists to make the sharing safe to express.
pub type SharedController = Arc<Mutex<dyn Controller>>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rapier2d::prelude::{vector, RigidBodyBuilder};

    struct Thruster {
        force: f32,
    }

    impl Controller for Thruster {
        fn step(&mut self, body: &mut RigidBody, _dt: Duration) {
            body.add_force(vector![self.force, 0.0], true);
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_shared_controller_downcast() {
        let shared: SharedController = Arc::new(Mutex::new(Thruster { force: 1.0 }));
        let mut guard = shared.lock();
        let thruster = guard.as_any_mut().downcast_mut::<Thruster>().unwrap();
        thruster.force = 2.0;
        assert_eq!(thruster.force, 2.0);
    }

    #[test]
    fn test_step_adds_force() {
        let shared: SharedController = Arc::new(Mutex::new(Thruster { force: 3.0 }));
        let mut body = RigidBodyBuilder::dynamic().build();
        shared.lock().step(&mut body, Duration::from_millis(16));
        assert_eq!(body.user_force(), vector![3.0, 0.0]);
    }
}
