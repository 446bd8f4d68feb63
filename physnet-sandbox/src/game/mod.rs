//! The sample domain: ships in a circular arena, firing projectiles.

use std::f32::consts::{FRAC_PI_2, TAU};

use serde_json::Value;

use physnet_server::{Server, Vec2};

mod arena;
mod projectile;
mod ship;

pub use ship::ShipProps;

/// Id of the one arena entity.
pub const ARENA_ID: &str = "arena";

/// Radius of the circle the seats sit on.
const SEAT_RING_RADIUS: f32 = 0.5;

/// Register every factory of the sample domain.
pub fn register(server: &mut Server) {
    arena::register(server);
    ship::register(server);
    projectile::register(server);
}

/// Initial ship properties for a seat id (`ship-a` ... `ship-y`).
///
/// Seats are spread around a ring, each ship facing the center. Unknown ids
/// get no seat, which makes the connect listener refuse the client.
pub fn seat_props(id: &str) -> Option<Value> {
    let mut letters = id.strip_prefix("ship-")?.chars();
    let letter = letters.next()?;
    if letters.next().is_some() || !letter.is_ascii_lowercase() {
        return None;
    }
    let index = (letter as u8 - b'a') as f32;
    let around = index * (TAU / 25.0);
    let props = ShipProps {
        position: Vec2::new(
            SEAT_RING_RADIUS * around.cos(),
            SEAT_RING_RADIUS * around.sin(),
        ),
        // Nose towards the center of the arena.
        angle: around + FRAC_PI_2,
    };
    serde_json::to_value(props).ok()
}
