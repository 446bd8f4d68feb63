//! Ships: controller, actor and command vocabulary.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use physnet_rt::Context;
use rapier2d::prelude::{vector, ColliderBuilder, Real, RigidBody, RigidBodyBuilder, Vector};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use physnet_server::{
    Controller, EntityActor, Server, SharedActor, SharedController, Vec2,
};

use super::projectile::PROJECTILE_RADIUS;

/// Collider radius of a ship.
pub const SHIP_RADIUS: f32 = 0.05;

const THRUST_FORCE: f32 = 0.02;
const STEER_TORQUE: f32 = 0.0004;
const MUZZLE_SPEED: f32 = 0.8;

/// Creation properties of a ship body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ShipProps {
    pub position: Vec2,
    pub angle: f32,
}

/// Commands a ship actor understands, decoded at the actor boundary.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ShipCommand {
    /// Throttle along the ship's nose, -1..1.
    Thrust { amount: f32 },
    /// Turning torque, -1..1.
    Steer { amount: f32 },
    /// Launch a projectile from the nose.
    Fire,
}

#[derive(Debug, Clone, Copy)]
struct Pose {
    position: Vector<Real>,
    angle: f32,
    velocity: Vector<Real>,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vector::zeros(),
            angle: 0.0,
            velocity: Vector::zeros(),
        }
    }
}

/// Applies thrust and steering each tick; remembers the last stepped pose so
/// the actor can derive launch parameters without touching the world.
pub struct ShipController {
    thrust: f32,
    steer: f32,
    pose: Pose,
}

impl ShipController {
    pub fn new() -> Self {
        Self {
            thrust: 0.0,
            steer: 0.0,
            pose: Pose::default(),
        }
    }

    pub fn set_thrust(&mut self, amount: f32) {
        self.thrust = amount.clamp(-1.0, 1.0);
    }

    pub fn set_steer(&mut self, amount: f32) {
        self.steer = amount.clamp(-1.0, 1.0);
    }

    /// Properties for a projectile leaving the ship's nose right now.
    pub fn launch_props(&self) -> Value {
        let nose = vector![-self.pose.angle.sin(), self.pose.angle.cos()];
        let position = self.pose.position + nose * (SHIP_RADIUS + 2.0 * PROJECTILE_RADIUS);
        let velocity = self.pose.velocity + nose * MUZZLE_SPEED;
        json!({
            "position": {"x": position.x, "y": position.y},
            "angle": self.pose.angle,
            "velocity": {"x": velocity.x, "y": velocity.y},
        })
    }
}

impl Default for ShipController {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller for ShipController {
    fn step(&mut self, body: &mut RigidBody, _dt: Duration) {
        self.pose = Pose {
            position: *body.translation(),
            angle: body.rotation().angle(),
            velocity: *body.linvel(),
        };
        if self.thrust != 0.0 {
            let nose = body.rotation() * vector![0.0, 1.0];
            body.add_force(nose * (self.thrust * THRUST_FORCE), true);
        }
        if self.steer != 0.0 {
            body.add_torque(self.steer * STEER_TORQUE, true);
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Routes decoded commands into the ship controller; `fire` spawns a
/// projectile entity through the actor engine.
pub struct ShipActor;

impl EntityActor for ShipActor {
    fn on_message(&mut self, controller: &SharedController, message: Value, ctx: &mut Context<'_>) {
        let command = match serde_json::from_value::<ShipCommand>(message) {
            Ok(command) => command,
            Err(err) => {
                // Dead-letter path for undecodable payloads.
                debug!(actor = ctx.self_id(), %err, "undecodable ship command");
                return;
            }
        };
        match command {
            ShipCommand::Thrust { amount } => with_ship(controller, |ship| ship.set_thrust(amount)),
            ShipCommand::Steer { amount } => with_ship(controller, |ship| ship.set_steer(amount)),
            ShipCommand::Fire => {
                let props = {
                    let mut guard = controller.lock();
                    guard
                        .as_any_mut()
                        .downcast_mut::<ShipController>()
                        .map(|ship| ship.launch_props())
                };
                if let Some(props) = props {
                    ctx.spawn("projectile", props);
                }
            }
        }
    }
}

fn with_ship(controller: &SharedController, f: impl FnOnce(&mut ShipController)) {
    let mut guard = controller.lock();
    if let Some(ship) = guard.as_any_mut().downcast_mut::<ShipController>() {
        f(ship);
    }
}

pub fn register(server: &mut Server) {
    server.body_registrator_mut().register("ship", |world, props| {
        let props: ShipProps = serde_json::from_value(props.clone()).ok()?;
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![props.position.x, props.position.y])
            .rotation(props.angle)
            .linear_damping(0.8)
            .angular_damping(2.0)
            .build();
        let handle = world.insert_body(body);
        world.attach_collider(
            ColliderBuilder::ball(SHIP_RADIUS).density(1.0).build(),
            handle,
        );
        Some(handle)
    });
    server.controller_registrator_mut().register("ship", |_, _| {
        Some(Arc::new(Mutex::new(ShipController::new())) as SharedController)
    });
    server
        .actor_registrator_mut()
        .register("ship", |_, _| Some(Arc::new(Mutex::new(ShipActor)) as SharedActor));
}
