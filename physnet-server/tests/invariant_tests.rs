//! Property tests for the lifecycle invariants and the wire envelope.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use proptest::prelude::*;
use rapier2d::prelude::{RigidBody, RigidBodyBuilder};
use serde_json::{json, Value};

use physnet_rt::Context;
use physnet_server::{
    Controller, EntityActor, EntityCommand, Frame, Server, SharedActor, SharedController,
};

struct Idle;

impl Controller for Idle {
    fn step(&mut self, _body: &mut RigidBody, _dt: Duration) {}
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

struct Mute;

impl EntityActor for Mute {
    fn on_message(&mut self, _controller: &SharedController, _message: Value, _ctx: &mut Context<'_>) {
    }
}

/// A server where `full` builds the whole triple and `scenery` only a body.
fn rigged_server() -> Server {
    let mut server = Server::default();
    for kind in ["full", "scenery"] {
        server.body_registrator_mut().register(kind, |world, _| {
            Some(world.insert_body(RigidBodyBuilder::dynamic().build()))
        });
    }
    server
        .controller_registrator_mut()
        .register("full", |_, _| Some(Arc::new(Mutex::new(Idle)) as SharedController));
    server
        .actor_registrator_mut()
        .register("full", |_, _| Some(Arc::new(Mutex::new(Mute)) as SharedActor));
    server
}

#[derive(Debug, Clone)]
enum Op {
    CreateFull(usize),
    CreateScenery(usize),
    Destroy(usize),
    DestroyBody(usize),
}

const IDS: [&str; 5] = ["e0", "e1", "e2", "e3", "e4"];

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..IDS.len()).prop_map(Op::CreateFull),
        (0..IDS.len()).prop_map(Op::CreateScenery),
        (0..IDS.len()).prop_map(Op::Destroy),
        (0..IDS.len()).prop_map(Op::DestroyBody),
    ]
}

fn is_free(server: &Server, id: &str) -> bool {
    // The manager does not dedupe ids; the embedding server is responsible
    // for never reusing a live one, so the generator respects that too.
    !server.has_body(id) && !server.has_controller(id) && !server.has_actor(id)
}

fn apply(server: &mut Server, op: &Op) {
    match op {
        Op::CreateFull(i) => {
            if is_free(server, IDS[*i]) {
                server.create_entity(IDS[*i], "full", json!({"n": i}));
            }
        }
        Op::CreateScenery(i) => {
            if is_free(server, IDS[*i]) {
                server.create_entity(IDS[*i], "scenery", json!({"n": i}));
            }
        }
        Op::Destroy(i) => server.destroy_entity(IDS[*i]),
        Op::DestroyBody(i) => {
            if let Some(handle) = server.body_handle(IDS[*i]) {
                server.destroy_body(handle);
            }
        }
    }
}

fn assert_invariants(server: &Server) {
    let mut live_pairs = 0;
    let mut live_bodies = 0;
    for id in IDS {
        // Triple integrity: an actor implies controller and body.
        if server.has_actor(id) {
            assert!(server.has_controller(id), "{id}: actor without controller");
            assert!(server.has_body(id), "{id}: actor without body");
            assert!(server.actor_is_live(id), "{id}: actor record without mailbox");
        }
        // Reverse-map coherence.
        if let Some(handle) = server.body_handle(id) {
            assert_eq!(server.body_id_of(handle), Some(id));
            live_bodies += 1;
        }
        if server.has_controller(id) && server.has_body(id) {
            live_pairs += 1;
        }
    }
    // One simulator entry per live (controller, body) pair.
    assert_eq!(server.simulator_len(), live_pairs);
    // The world owns exactly the managed bodies.
    assert_eq!(server.world().body_count(), live_bodies);
}

proptest! {
    #[test]
    fn test_lifecycle_invariants_hold(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut server = rigged_server();
        for op in &ops {
            apply(&mut server, op);
            assert_invariants(&server);
        }
        // Destroying everything leaves nothing behind.
        for id in IDS {
            server.destroy_entity(id);
        }
        for id in IDS {
            prop_assert!(!server.has_body(id));
            prop_assert!(!server.has_controller(id));
            prop_assert!(!server.has_actor(id));
        }
        prop_assert_eq!(server.simulator_len(), 0);
        prop_assert_eq!(server.world().body_count(), 0);
    }
}

// ----------------------------------------------------------------------------
// Envelope well-formedness
// ----------------------------------------------------------------------------

fn id_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,8}(-[a-z0-9]{1,4})?"
}

fn props_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<f64>().prop_filter("finite", |x| x.is_finite()).prop_map(|x| json!(x)),
        id_strategy().prop_map(|s| json!({"tag": s})),
    ]
}

fn frame_strategy() -> impl Strategy<Value = Frame> {
    let route = prop_oneof![Just("bodies"), Just("controllers"), Just("actors")];
    let command = prop_oneof![
        (id_strategy(), id_strategy(), props_strategy())
            .prop_map(|(id, kind, props)| EntityCommand::create(&id, &kind, props)),
        id_strategy().prop_map(|id| EntityCommand::destroy(&id)),
    ];
    prop_oneof![
        (route, command).prop_map(|(route, command)| Frame::manage(route, command)),
        props_strategy().prop_map(|props| Frame::event(json!({"id": "x", "data": props}))),
        props_strategy().prop_map(Frame::system_default),
        Just(Frame::sync_default(Default::default())),
    ]
}

proptest! {
    #[test]
    fn test_every_emitted_frame_is_well_formed(frame in frame_strategy()) {
        let text = serde_json::to_string(&frame).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        let outer = value.as_object().unwrap();
        let kind = outer["type"].as_str().unwrap();
        prop_assert!(["manage", "sync", "event", "system"].contains(&kind));
        prop_assert!(outer.contains_key("data"));

        if kind == "manage" {
            let route = value["data"]["id"].as_str().unwrap();
            prop_assert!(["bodies", "controllers", "actors"].contains(&route));
            let op = value["data"]["data"]["type"].as_str().unwrap();
            prop_assert!(["create", "destroy"].contains(&op));
            prop_assert!(value["data"]["data"]["data"]["id"].is_string());
        }

        // The envelope decodes back to itself.
        let back: Frame = serde_json::from_str(&text).unwrap();
        prop_assert_eq!(back, frame);
    }
}
