//! # physnet-server - Authoritative Networked 2D Physics Sessions
//!
//! Server-side runtime of a real-time networked 2D physics session. Many
//! clients connect over a duplex JSON text transport; the server owns the
//! authoritative physics world, steps it at a fixed cadence, routes control
//! events to per-entity actors, and broadcasts create/destroy/synchronize
//! commands so every client's local mirror converges to the server's state.
//!
//! # Entities
//!
//! An entity is the triple (body, controller, actor) sharing one string id:
//!
//! - **Body** - rigid body owned by the physics [`world::World`]
//! - **Controller** - per-step force/velocity updater for that body
//! - **Actor** - mailbox-bound handler for control events, with typed access
//!   to its controller
//!
//! Each part is built by a user-registered factory; partial triples are
//! permitted (scenery may register only a body factory). Every create and
//! destroy is logged by the owning [`manager::Manager`] so a late-joining
//! client can be brought up to date by replay.
//!
//! # Single-writer discipline
//!
//! One tick-loop task per server multiplexes three sources - the inbound
//! command channel, the physics step ticker and the snapshot ticker - and is
//! the only fiber that mutates the world, the managers or the synchronizer
//! context. Connects, disconnects and inbound frames are commands on the same
//! FIFO channel, so nothing else ever races the loop.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use physnet_server::{Server, ServerConfig, ServerListener};
//!
//! let mut listener = ServerListener::default();
//! listener.on_server_start = Some(Box::new(|server| {
//!     // register factories, create the arena ...
//! }));
//!
//! let mut server = Server::new(ServerConfig::default());
//! server.set_listener(listener);
//! let handle = server.handle();
//! tokio::spawn(async move { server.run().await });
//! // hand `handle` to the transport glue; it calls `handle.connect(socket)`
//! ```

pub mod actor;
pub mod clients;
pub mod config;
pub mod controller;
pub mod error;
pub mod manager;
pub mod registry;
pub mod server;
pub mod simulator;
pub mod sync;
pub mod transport;
pub mod wire;
pub mod world;

// Re-export commonly used types
pub use actor::{ActorHost, EntityActor, SharedActor};
pub use clients::{ClientHandle, ClientId};
pub use config::{ServerConfig, DEFAULT_STEP_INTERVAL, DEFAULT_SYNC_INTERVAL};
pub use controller::{Controller, SharedController};
pub use error::ConnectError;
pub use manager::Manager;
pub use registry::{Factory, Registrator};
pub use server::{Server, ServerHandle, ServerListener};
pub use simulator::Simulator;
pub use sync::{Destination, Synchronizer};
pub use transport::{channel_pair, ChannelSocket, Socket, TransportError};
pub use wire::{BodySnapshot, CreateProps, DestroyProps, EntityCommand, EntityId, Frame, Vec2};
pub use world::{BodyHandle, World};
