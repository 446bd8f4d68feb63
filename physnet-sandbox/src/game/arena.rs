//! The arena: a fixed circular boundary the ships bounce around in.

use rapier2d::prelude::{point, ColliderBuilder, Point, Real, RigidBodyBuilder};

use physnet_server::Server;

/// Radius of the arena boundary.
pub const ARENA_RADIUS: f32 = 1.0;

const SEGMENTS: u32 = 48;

pub fn register(server: &mut Server) {
    server.body_registrator_mut().register("arena", |world, _props| {
        let handle = world.insert_body(RigidBodyBuilder::fixed().build());
        // A closed polyline ring: walls that keep everything inside.
        let vertices: Vec<Point<Real>> = (0..=SEGMENTS)
            .map(|segment| {
                let around = segment as f32 * std::f32::consts::TAU / SEGMENTS as f32;
                point![ARENA_RADIUS * around.cos(), ARENA_RADIUS * around.sin()]
            })
            .collect();
        world.attach_collider(ColliderBuilder::polyline(vertices, None).build(), handle);
        Some(handle)
    });
}
