//! Wire vocabulary: the outbound envelope tree and its payloads.
//!
//! Every frame on the wire is `{"type": T, "data": D}` with
//! `T ∈ {manage, sync, event, system}`. Manage frames nest a route (the
//! manager name), an entity command (`create`/`destroy`) and finally the
//! command payload:
//!
//! ```json
//! {"type":"manage","data":{"id":"bodies","data":{"type":"create",
//!  "data":{"id":"ship-a","type":"ship","data":{...}}}}}
//! ```
//!
//! The layers are serde adjacently-tagged enums, so the shapes above fall out
//! of the type definitions; the constructors below are the only way the rest
//! of the crate builds frames.

// Layer 1: Standard library imports
use std::collections::BTreeMap;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Layer 3: Internal module imports
// (none)

/// Logical identity of an entity (and of the actor mirroring it).
pub type EntityId = String;

/// Route id used for body snapshots and server-originated system frames.
pub const DEFAULT_ROUTE: &str = "default";

/// Body snapshots keyed by entity id.
///
/// A `BTreeMap` so that back-to-back snapshots of an unchanged world
/// serialize identically.
pub type SnapshotMap = BTreeMap<EntityId, BodySnapshot>;

/// A 2D vector on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Kinematic state of one body at snapshot time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub position: Vec2,
    pub angle: f32,
    pub linear: Vec2,
    pub angular: f32,
}

/// A routed payload: `{"id": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route<T> {
    pub id: String,
    pub data: T,
}

/// Payload of a `create` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProps {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
}

/// Payload of a `destroy` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestroyProps {
    pub id: EntityId,
}

/// A lifecycle command inside a manage frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum EntityCommand {
    Create(CreateProps),
    Destroy(DestroyProps),
}

impl EntityCommand {
    /// Build a `create` command.
    pub fn create(id: &str, kind: &str, props: Value) -> Self {
        Self::Create(CreateProps {
            id: id.to_owned(),
            kind: kind.to_owned(),
            data: props,
        })
    }

    /// Build a `destroy` command.
    pub fn destroy(id: &str) -> Self {
        Self::Destroy(DestroyProps { id: id.to_owned() })
    }
}

/// The outermost envelope of every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Frame {
    /// Entity lifecycle command routed to one of the managers.
    Manage(Route<EntityCommand>),
    /// Periodic body snapshot broadcast.
    Sync(Route<SnapshotMap>),
    /// Control event mirrored between peers.
    Event(Value),
    /// Application-level system payload.
    System(Route<Value>),
}

impl Frame {
    /// Wrap an entity command under the named manager route.
    pub fn manage(route: &str, command: EntityCommand) -> Self {
        Self::Manage(Route {
            id: route.to_owned(),
            data: command,
        })
    }

    /// Wrap a snapshot map under the default route.
    pub fn sync_default(snapshots: SnapshotMap) -> Self {
        Self::Sync(Route {
            id: DEFAULT_ROUTE.to_owned(),
            data: snapshots,
        })
    }

    /// Wrap an event payload.
    pub fn event(data: Value) -> Self {
        Self::Event(data)
    }

    /// Wrap a system payload under the default route.
    pub fn system_default(data: Value) -> Self {
        Self::System(Route {
            id: DEFAULT_ROUTE.to_owned(),
            data,
        })
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

    #[test]
    fn test_create_frame_shape() {
        let frame = Frame::manage(
            "bodies",
            EntityCommand::create("ship-a", "ship", json!({"position": {"x": 0.5, "y": 0.5}})),
        );
        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            json!({
                "type": "manage",
                "data": {
                    "id": "bodies",
                    "data": {
                        "type": "create",
                        "data": {
                            "id": "ship-a",
                            "type": "ship",
                            "data": {"position": {"x": 0.5, "y": 0.5}}
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_destroy_frame_shape() {
        let frame = Frame::manage("actors", EntityCommand::destroy("ship-b"));
        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            json!({
                "type": "manage",
                "data": {
                    "id": "actors",
                    "data": {"type": "destroy", "data": {"id": "ship-b"}}
                }
            })
        );
    }

    #[test]
    fn test_sync_frame_shape() {
        let mut snapshots = SnapshotMap::new();
        snapshots.insert(
            "ship-a".to_owned(),
            BodySnapshot {
                position: Vec2::new(1.0, 2.0),
                angle: 0.5,
                linear: Vec2::new(0.0, -1.0),
                angular: 0.25,
            },
        );
        let frame = Frame::sync_default(snapshots);
        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            json!({
                "type": "sync",
                "data": {
                    "id": "default",
                    "data": {
                        "ship-a": {
                            "position": {"x": 1.0, "y": 2.0},
                            "angle": 0.5,
                            "linear": {"x": 0.0, "y": -1.0},
                            "angular": 0.25
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_system_frame_shape() {
        let frame = Frame::system_default(json!({"motd": "welcome"}));
        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            json!({
                "type": "system",
                "data": {"id": "default", "data": {"motd": "welcome"}}
            })
        );
    }

    #[test]
    fn test_event_frame_round_trip() {
        let frame = Frame::event(json!({"id": "ship-a", "data": {"type": "thrust"}}));
        let text = serde_json::to_string(&frame).unwrap();
        let back: Frame = serde_json::from_str(&text).unwrap();
        assert_eq!(back, frame);
    }
}
