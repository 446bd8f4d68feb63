//! # physnet-rt - Embedded Actor Engine
//!
//! Cooperative actor engine for session runtimes that keep all mutation on a
//! single fiber. Actors are mailbox-bound message handlers addressed by
//! string ids; delivery is FIFO per actor with at-most-once semantics (an
//! exiting actor's remaining mail is dropped).
//!
//! The engine never schedules work on its own: every `spawn`/`send` call runs
//! the dispatch loop to completion before returning, so the embedding fiber
//! observes each message fully handled - including any sends it triggered -
//! before the next one starts.
//!
//! # Quick Start
//!
//! ```rust
//! use physnet_rt::{Actor, ActorSystem, Context};
//! use serde_json::{json, Value};
//!
//! struct Echo {
//!     heard: usize,
//! }
//!
//! impl Actor for Echo {
//!     fn on_message(&mut self, _message: Value, _ctx: &mut Context<'_>) {
//!         self.heard += 1;
//!     }
//! }
//!
//! let mut system = ActorSystem::new();
//! let id = system
//!     .spawn(|_id| Some(Box::new(Echo { heard: 0 })))
//!     .unwrap();
//! assert!(system.send(&id, json!({"type": "ping"})));
//! ```
//!
//! # Dynamic spawn
//!
//! Actor code may request children through [`Context::spawn`]. The engine
//! reserves the child's id and mailbox immediately (so the parent can start
//! sending to it) and records a [`SpawnRequest`]; the embedder drains those
//! requests with [`ActorSystem::take_pending_spawn`] and either
//! [`ActorSystem::fulfill_spawn`]s or [`ActorSystem::abort_spawn`]s the
//! reservation. This keeps the engine free of callbacks into its embedder.
//!
//! # Module Organization
//!
//! - [`actor`] - the [`Actor`] trait
//! - [`mailbox`] - per-actor FIFO queue
//! - [`system`] - [`ActorSystem`], [`Context`], spawn errors
//! - [`util`] - id generation primitives

pub mod actor;
pub mod mailbox;
pub mod system;
pub mod util;

// Re-export commonly used types
pub use actor::Actor;
pub use mailbox::Mailbox;
pub use system::{ActorSystem, Context, DeadLetterHandler, SpawnError, SpawnRequest};
pub use util::{ActorId, IdGenerator, NumericIdGenerator};
