//! The server: entity lifecycle, message demultiplexing, and the tick loop.
//!
//! A [`Server`] owns the world, the three managers, the simulator, the actor
//! host and the synchronizer. [`Server::run`] is the tick loop - the single
//! fiber that mutates any of them. Everything that arrives from outside
//! (connects, disconnects, inbound frames, shutdown) is a [`Command`] on one
//! FIFO channel, handed out as a cloneable [`ServerHandle`].

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};

// Layer 2: Third-party crate imports
use physnet_rt::SpawnRequest;
use serde_json::Value;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

// Layer 3: Internal module imports
use crate::actor::{ActorHost, SharedActor};
use crate::clients::{ClientHandle, ClientId, ClientRegistry};
use crate::config::ServerConfig;
use crate::controller::SharedController;
use crate::error::ConnectError;
use crate::manager::Manager;
use crate::registry::Registrator;
use crate::simulator::Simulator;
use crate::sync::{Destination, Synchronizer};
use crate::transport::Socket;
use crate::wire::{EntityId, Frame, SnapshotMap};
use crate::world::{BodyHandle, World};

/// Callback invoked on server start and stop.
pub type LifecycleCallback = Box<dyn FnMut(&mut Server) + Send>;

/// Callback invoked for a connecting client; an `Err` aborts the connect.
pub type ConnectCallback =
    Box<dyn FnMut(&mut Server, &str, &ClientHandle) -> Result<(), ConnectError> + Send>;

/// Callback invoked after a client is gone.
pub type DisconnectCallback = Box<dyn FnMut(&mut Server, &str) + Send>;

/// Callback invoked for an inbound event/system payload; returning `false`
/// suppresses further processing.
pub type MessageCallback = Box<dyn FnMut(&mut Server, &str, &Value) -> bool + Send>;

/// Application hooks into the server lifecycle.
///
/// All callbacks run on the tick fiber and receive the server itself, so
/// they may create/destroy entities and mutate registrators freely.
#[derive(Default)]
pub struct ServerListener {
    pub on_server_start: Option<LifecycleCallback>,
    pub on_server_stop: Option<LifecycleCallback>,
    pub on_client_connect: Option<ConnectCallback>,
    pub on_client_disconnect: Option<DisconnectCallback>,
    pub on_event_message: Option<MessageCallback>,
    pub on_system_message: Option<MessageCallback>,
}

enum Command {
    Connect {
        socket: Box<dyn Socket>,
        reply: oneshot::Sender<Result<ClientId, ConnectError>>,
    },
    Disconnect {
        id: ClientId,
    },
    Inbound {
        id: ClientId,
        payload: Value,
    },
    Close,
}

/// Cloneable handle for threads that feed the tick loop from outside.
#[derive(Clone)]
pub struct ServerHandle {
    commands: UnboundedSender<Command>,
}

impl ServerHandle {
    /// Admit a new client over the given transport.
    ///
    /// Resolves once the tick loop has assigned an id, run the connect
    /// listener, registered the client and replayed current state to it.
    /// On error the caller owns closing its side of the transport.
    pub async fn connect(&self, socket: Box<dyn Socket>) -> Result<ClientId, ConnectError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Connect { socket, reply })
            .map_err(|_| ConnectError::NotRunning)?;
        response.await.map_err(|_| ConnectError::NotRunning)?
    }

    /// Ask the tick loop to disconnect a client. No-op for unknown ids.
    pub fn disconnect(&self, id: &str) {
        let _ = self.commands.send(Command::Disconnect { id: id.to_owned() });
    }

    /// Drain all clients and stop the tick loop.
    pub fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }
}

/// The authoritative session server.
pub struct Server {
    config: ServerConfig,
    listener: ServerListener,
    world: World,
    bodies: Manager<BodyHandle>,
    controllers: Manager<SharedController>,
    actors: Manager<SharedActor>,
    body_ids: HashMap<BodyHandle, EntityId>,
    simulator: Simulator,
    host: ActorHost,
    registry: ClientRegistry,
    sync: Synchronizer,
    commands: UnboundedSender<Command>,
    inbox: Option<UnboundedReceiver<Command>>,
    running: bool,
}

impl Default for Server {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

impl Server {
    /// Create an idle server.
    pub fn new(config: ServerConfig) -> Self {
        let registry = ClientRegistry::new();
        let sync = Synchronizer::new(registry.map());
        let (commands, inbox) = unbounded_channel();
        Self {
            config,
            listener: ServerListener::default(),
            world: World::new(),
            bodies: Manager::new("bodies"),
            controllers: Manager::new("controllers"),
            actors: Manager::new("actors"),
            body_ids: HashMap::new(),
            simulator: Simulator::new(),
            host: ActorHost::new(),
            registry,
            sync,
            commands,
            inbox: Some(inbox),
            running: false,
        }
    }

    /// Install the application listener.
    pub fn set_listener(&mut self, listener: ServerListener) {
        self.listener = listener;
    }

    /// Handle for feeding the tick loop from other tasks.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            commands: self.commands.clone(),
        }
    }

    /// The physics world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the physics world (tick fiber only).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Registrator for body factories.
    pub fn body_registrator_mut(&mut self) -> &mut Registrator<BodyHandle> {
        self.bodies.registrator_mut()
    }

    /// Registrator for controller factories.
    pub fn controller_registrator_mut(&mut self) -> &mut Registrator<SharedController> {
        self.controllers.registrator_mut()
    }

    /// Registrator for actor factories.
    pub fn actor_registrator_mut(&mut self) -> &mut Registrator<SharedActor> {
        self.actors.registrator_mut()
    }

    /// Toggle snapshot broadcasts.
    pub fn set_synchronization(&mut self, enabled: bool) {
        self.config.synchronization = enabled;
    }

    /// Whether an entity's body exists.
    pub fn has_body(&self, id: &str) -> bool {
        self.bodies.contains(id)
    }

    /// Whether an entity's controller exists.
    pub fn has_controller(&self, id: &str) -> bool {
        self.controllers.contains(id)
    }

    /// Whether an entity's actor record exists.
    pub fn has_actor(&self, id: &str) -> bool {
        self.actors.contains(id)
    }

    /// Whether an entity's actor mailbox is live in the engine.
    pub fn actor_is_live(&self, id: &str) -> bool {
        self.host.is_live(id)
    }

    /// The body handle stored for an entity.
    pub fn body_handle(&self, id: &str) -> Option<BodyHandle> {
        self.bodies.get(id).copied()
    }

    /// Reverse lookup: the entity id owning a body.
    pub fn body_id_of(&self, handle: BodyHandle) -> Option<&str> {
        self.body_ids.get(&handle).map(String::as_str)
    }

    /// The shared controller of an entity.
    pub fn controller(&self, id: &str) -> Option<SharedController> {
        self.controllers.get(id).cloned()
    }

    /// Number of live (controller, body) pairs.
    pub fn simulator_len(&self) -> usize {
        self.simulator.len()
    }

    /// Ids of the connected clients.
    pub fn client_ids(&self) -> Vec<ClientId> {
        self.registry.ids()
    }

    /// Number of connected clients.
    pub fn client_count(&self) -> usize {
        self.registry.len()
    }

    /// Handle of a connected client.
    pub fn client(&self, id: &str) -> Option<ClientHandle> {
        self.registry.get(id)
    }

    /// Create the entity triple for `id`.
    ///
    /// Body factory first (fed `props`), then controller and actor factories
    /// (fed null). Each success is stored and announced to the current
    /// destination. A controller is paired into the simulator only when the
    /// body exists, and the actor factory only runs once body and controller
    /// both do - an actor always implies the rest of its triple.
    pub fn create_entity(&mut self, id: &str, kind: &str, props: Value) {
        let body = self.bodies.create(&mut self.world, &self.sync, id, kind, &props);
        if let Some(handle) = body {
            self.body_ids.insert(handle, id.to_owned());
        }
        let controller = self
            .controllers
            .create(&mut self.world, &self.sync, id, kind, &Value::Null);
        if let (Some(handle), Some(ctrl)) = (body, controller.clone()) {
            self.simulator.add(id, handle, ctrl);
        }
        if body.is_none() || controller.is_none() {
            return;
        }
        let actor = self
            .actors
            .create(&mut self.world, &self.sync, id, kind, &Value::Null);
        if let (Some(ctrl), Some(actor)) = (controller, actor) {
            if let Err(err) = self.host.spawn_as(id, ctrl, actor) {
                warn!(entity = %id, %err, "actor spawn failed");
            }
            self.pump_spawns();
        }
    }

    /// Destroy whatever parts exist for `id`: actor, controller, body - in
    /// that order. Each removal is announced to the current destination.
    pub fn destroy_entity(&mut self, id: &str) {
        if self.actors.destroy(&self.sync, id) {
            self.host.stop(id);
        }
        if self.controllers.destroy(&self.sync, id) {
            self.simulator.remove(id);
        }
        if let Some(handle) = self.bodies.get(id).copied() {
            self.bodies.destroy(&self.sync, id);
            self.body_ids.remove(&handle);
            self.world.remove_body(handle);
        }
    }

    /// Destroy the entity owning a body (incidental destruction cascade).
    pub fn destroy_body(&mut self, handle: BodyHandle) {
        if let Some(id) = self.body_ids.get(&handle).cloned() {
            self.destroy_entity(&id);
        }
    }

    /// Run the tick loop until [`ServerHandle::close`] (or channel drop).
    ///
    /// Transitions idle → running → idle; a second concurrent call returns
    /// immediately.
    pub async fn run(&mut self) {
        if self.running {
            return;
        }
        let Some(mut inbox) = self.inbox.take() else {
            return;
        };
        self.running = true;
        info!("server started");
        self.invoke_lifecycle(|listener| listener.on_server_start.as_mut());

        let mut step = tokio::time::interval(self.config.step_interval);
        step.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut snapshot = tokio::time::interval(self.config.sync_interval);
        snapshot.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut past = Instant::now();

        loop {
            tokio::select! {
                command = inbox.recv() => match command {
                    Some(Command::Connect { socket, reply }) => {
                        let result = self.connect_client(socket);
                        let _ = reply.send(result);
                    }
                    Some(Command::Disconnect { id }) => self.disconnect_client(&id),
                    Some(Command::Inbound { id, payload }) => self.on_message(&id, payload),
                    Some(Command::Close) | None => {
                        self.drain_clients();
                        break;
                    }
                },
                _ = step.tick() => {
                    let now = Instant::now();
                    let dt = now - past;
                    past = now;
                    self.on_step(dt);
                }
                _ = snapshot.tick() => self.on_sync(),
            }
        }

        self.inbox = Some(inbox);
        self.running = false;
        self.invoke_lifecycle(|listener| listener.on_server_stop.as_mut());
        info!("server stopped");
    }

    // ------------------------------------------------------------------
    // Tick handlers
    // ------------------------------------------------------------------

    fn on_step(&mut self, dt: Duration) {
        self.world.clear_forces();
        self.simulator.step(&mut self.world, dt);
        self.world.step(dt);
    }

    fn on_sync(&mut self) {
        if !self.config.synchronization {
            return;
        }
        let mut snapshots = SnapshotMap::new();
        for (id, handle) in self.bodies.iter() {
            if let Some(snapshot) = self.world.snapshot(*handle) {
                snapshots.insert(id.clone(), snapshot);
            }
        }
        self.sync.emit(&Frame::sync_default(snapshots));
    }

    // ------------------------------------------------------------------
    // Message demultiplexer
    // ------------------------------------------------------------------

    fn on_message(&mut self, sender: &str, payload: Value) {
        if !payload.is_object() {
            debug!(client = %sender, "dropping non-object frame");
            return;
        }
        match payload.get("type").and_then(Value::as_str) {
            Some("event") => {
                let data = payload.get("data").cloned().unwrap_or(Value::Null);
                if data.is_object() {
                    self.on_event(sender, data);
                } else {
                    debug!(client = %sender, "dropping event without object payload");
                }
            }
            Some("system") => {
                let data = payload.get("data").cloned().unwrap_or(Value::Null);
                self.on_system(sender, &data);
            }
            _ => debug!(client = %sender, "dropping frame of unknown type"),
        }
    }

    fn on_event(&mut self, sender: &str, data: Value) {
        if !self.invoke_message(sender, &data, |listener| listener.on_event_message.as_mut()) {
            return;
        }
        if let Some(actor_id) = data.get("id").and_then(Value::as_str).map(str::to_owned) {
            let message = data.get("data").cloned().unwrap_or(Value::Null);
            self.host.send(&actor_id, message);
            self.pump_spawns();
        }
        if self.registry.contains(sender) {
            let sync = self.sync.clone();
            sync.with(Destination::Except(sender.to_owned()), || {
                sync.emit(&Frame::event(data));
            });
        }
    }

    fn on_system(&mut self, sender: &str, data: &Value) {
        self.invoke_message(sender, data, |listener| listener.on_system_message.as_mut());
    }

    // ------------------------------------------------------------------
    // Client lifecycle
    // ------------------------------------------------------------------

    fn connect_client(&mut self, socket: Box<dyn Socket>) -> Result<ClientId, ConnectError> {
        let existing = self.registry.ids();
        let id = (self.config.new_id)(&existing).ok_or(ConnectError::IdsExhausted)?;

        let (outbound_tx, outbound_rx) = unbounded_channel();
        let handle = ClientHandle::new(id.clone(), outbound_tx);

        self.invoke_connect(&id, &handle)?;

        self.registry.insert(handle);
        self.replay_to(&id);
        tokio::spawn(client_task(
            id.clone(),
            socket,
            outbound_rx,
            self.commands.clone(),
        ));
        info!(client = %id, "client connected");
        Ok(id)
    }

    fn disconnect_client(&mut self, id: &str) {
        // Presence check makes repeated disconnects no-ops.
        if self.registry.remove(id).is_none() {
            return;
        }
        info!(client = %id, "client disconnected");
        let mut listener = mem::take(&mut self.listener);
        if let Some(callback) = listener.on_client_disconnect.as_mut() {
            callback(self, id);
        }
        self.listener = listener;
    }

    fn drain_clients(&mut self) {
        for id in self.registry.ids() {
            self.disconnect_client(&id);
        }
    }

    /// Replay every live create to one client, managers in bodies →
    /// controllers → actors order.
    fn replay_to(&self, id: &str) {
        let sync = self.sync.clone();
        sync.with(Destination::One(id.to_owned()), || {
            self.bodies.sync(&sync);
            self.controllers.sync(&sync);
            self.actors.sync(&sync);
        });
    }

    // ------------------------------------------------------------------
    // Actor-initiated spawns
    // ------------------------------------------------------------------

    /// Build the triple for every pending child-spawn request, silently.
    ///
    /// The creates are swallowed because the peers that need them will learn
    /// of the child through replay; emitting here would double-notify (see
    /// DESIGN.md on spawn visibility).
    fn pump_spawns(&mut self) {
        while let Some(request) = self.host.take_pending_spawn() {
            let sync = self.sync.clone();
            sync.with(Destination::Silent, || self.create_spawned(&request));
        }
    }

    fn create_spawned(&mut self, request: &SpawnRequest) {
        let id = request.id.as_str();
        let body = self
            .bodies
            .create(&mut self.world, &self.sync, id, &request.kind, &request.props);
        if let Some(handle) = body {
            self.body_ids.insert(handle, id.to_owned());
        }
        let controller =
            self.controllers
                .create(&mut self.world, &self.sync, id, &request.kind, &Value::Null);
        let actor = if body.is_some() && controller.is_some() {
            self.actors
                .create(&mut self.world, &self.sync, id, &request.kind, &Value::Null)
        } else {
            None
        };
        match (controller, actor) {
            (Some(ctrl), Some(actor)) => {
                if let Some(handle) = body {
                    self.simulator.add(id, handle, Arc::clone(&ctrl));
                }
                if !self.host.fulfill(id, ctrl, actor) {
                    debug!(entity = %id, "spawn reservation vanished before fulfillment");
                }
            }
            _ => {
                debug!(entity = %id, kind = %request.kind, "child triple incomplete, spawn aborted");
                self.host.abort(id);
            }
        }
    }

    // ------------------------------------------------------------------
    // Listener plumbing
    // ------------------------------------------------------------------

    fn invoke_lifecycle<F>(&mut self, select: F)
    where
        F: Fn(&mut ServerListener) -> Option<&mut LifecycleCallback>,
    {
        let mut listener = mem::take(&mut self.listener);
        if let Some(callback) = select(&mut listener) {
            callback(self);
        }
        self.listener = listener;
    }

    fn invoke_connect(&mut self, id: &str, handle: &ClientHandle) -> Result<(), ConnectError> {
        let mut listener = mem::take(&mut self.listener);
        let result = match listener.on_client_connect.as_mut() {
            Some(callback) => callback(self, id, handle),
            None => Ok(()),
        };
        self.listener = listener;
        result
    }

    fn invoke_message<F>(&mut self, id: &str, data: &Value, select: F) -> bool
    where
        F: Fn(&mut ServerListener) -> Option<&mut MessageCallback>,
    {
        let mut listener = mem::take(&mut self.listener);
        let keep = match select(&mut listener) {
            Some(callback) => callback(self, id, data),
            None => true,
        };
        self.listener = listener;
        keep
    }
}

/// Per-client task: multiplexes the socket's reads (into the command
/// channel) with the outbound queue's drains (into the socket).
///
/// Unwinds through a `Disconnect` command on any read or write failure, on
/// peer close, and on server-side removal (the queue's sender is dropped).
async fn client_task(
    id: ClientId,
    mut socket: Box<dyn Socket>,
    mut outbound: UnboundedReceiver<String>,
    commands: UnboundedSender<Command>,
) {
    loop {
        tokio::select! {
            queued = outbound.recv() => match queued {
                Some(text) => {
                    if let Err(err) = socket.send(&text).await {
                        warn!(client = %id, %err, "outbound write failed");
                        break;
                    }
                }
                None => break,
            },
            inbound = socket.recv() => match inbound {
                Some(Ok(text)) => match serde_json::from_str::<Value>(&text) {
                    Ok(payload) => {
                        if commands.send(Command::Inbound { id: id.clone(), payload }).is_err() {
                            break;
                        }
                    }
                    Err(err) => debug!(client = %id, %err, "dropping malformed frame"),
                },
                Some(Err(err)) => {
                    warn!(client = %id, %err, "read failed");
                    break;
                }
                None => break,
            },
        }
    }
    socket.close().await;
    let _ = commands.send(Command::Disconnect { id });
}

// ============================================================================
// Unit Tests
// ============================================================================
