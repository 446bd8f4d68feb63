//! Projectiles: ballistic bodies spawned by ship actors.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use physnet_rt::Context;
use rapier2d::prelude::{vector, ColliderBuilder, RigidBody, RigidBodyBuilder};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use physnet_server::{Controller, EntityActor, Server, SharedActor, SharedController, Vec2};

/// Collider radius of a projectile.
pub const PROJECTILE_RADIUS: f32 = 0.01;

/// Launch parameters produced by [`ShipController::launch_props`]
/// (position, facing and initial velocity at the muzzle).
///
/// [`ShipController::launch_props`]: super::ship::ShipController::launch_props
#[derive(Debug, Deserialize)]
struct LaunchProps {
    position: Vec2,
    angle: f32,
    velocity: Vec2,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ProjectileCommand {
    /// Retire the projectile's actor.
    Detonate,
}

/// Ballistic: the body keeps its launch velocity, nothing to do per tick.
/// Exists so the projectile triple is complete and its mailbox goes live.
pub struct ProjectileController;

impl Controller for ProjectileController {
    fn step(&mut self, _body: &mut RigidBody, _dt: Duration) {}

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub struct ProjectileActor;

impl EntityActor for ProjectileActor {
    fn on_message(&mut self, _controller: &SharedController, message: Value, ctx: &mut Context<'_>) {
        match serde_json::from_value::<ProjectileCommand>(message) {
            Ok(ProjectileCommand::Detonate) => ctx.exit(),
            Err(err) => debug!(actor = ctx.self_id(), %err, "undecodable projectile command"),
        }
    }
}

pub fn register(server: &mut Server) {
    server
        .body_registrator_mut()
        .register("projectile", |world, props| {
            let props: LaunchProps = serde_json::from_value(props.clone()).ok()?;
            let body = RigidBodyBuilder::dynamic()
                .translation(vector![props.position.x, props.position.y])
                .rotation(props.angle)
                .linvel(vector![props.velocity.x, props.velocity.y])
                .ccd_enabled(true)
                .build();
            let handle = world.insert_body(body);
            world.attach_collider(
                ColliderBuilder::ball(PROJECTILE_RADIUS).density(1.0).build(),
                handle,
            );
            Some(handle)
        });
    server
        .controller_registrator_mut()
        .register("projectile", |_, _| {
            Some(Arc::new(Mutex::new(ProjectileController)) as SharedController)
        });
    server.actor_registrator_mut().register("projectile", |_, _| {
        Some(Arc::new(Mutex::new(ProjectileActor)) as SharedActor)
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_launch_props_decode() {
        let props: LaunchProps = serde_json::from_value(json!({
            "position": {"x": 0.1, "y": 0.2},
            "angle": 1.0,
            "velocity": {"x": 0.0, "y": 0.8},
        }))
        .unwrap();
        assert_eq!(props.position.x, 0.1);
        assert_eq!(props.velocity.y, 0.8);
        assert_eq!(props.angle, 1.0);
    }

    #[test]
    fn test_detonate_decodes() {
        assert!(serde_json::from_value::<ProjectileCommand>(json!({"type": "detonate"})).is_ok());
        assert!(serde_json::from_value::<ProjectileCommand>(json!({"type": "boom"})).is_err());
    }
}
