//! Actor system with a cooperative, reentrancy-safe dispatch loop.
//!
//! All engine entry points (`spawn`, `send`, `fulfill_spawn`) run the
//! dispatch loop to completion before returning. Sends issued from inside a
//! handler only enqueue: the already-running loop picks them up, so handlers
//! never nest and per-actor delivery order is preserved.

// Layer 1: Standard library imports
use std::collections::{HashMap, VecDeque};

// Layer 2: Third-party crate imports
use serde_json::Value;
use tracing::debug;

// Layer 3: Internal module imports
use super::context::Context;
use super::errors::SpawnError;
use crate::actor::Actor;
use crate::mailbox::Mailbox;
use crate::util::{ActorId, IdGenerator, NumericIdGenerator};

/// Handler invoked for messages addressed to unknown actors.
pub type DeadLetterHandler = Box<dyn FnMut(&str, Value) + Send>;

/// A child spawn requested by actor code via [`Context::spawn`].
///
/// The id and mailbox are already reserved when the request surfaces; the
/// embedder must resolve it with [`ActorSystem::fulfill_spawn`] or
/// [`ActorSystem::abort_spawn`].
#[derive(Debug)]
pub struct SpawnRequest {
    /// Reserved id of the child actor.
    pub id: ActorId,
    /// Kind tag the requesting actor asked for.
    pub kind: String,
    /// Opaque construction properties.
    pub props: Value,
}

enum Work {
    Init,
    Message(Value),
}

struct Cell {
    /// False while the cell is only a reservation from [`Context::spawn`].
    live: bool,
    /// Taken out of the cell for the duration of a handler invocation.
    actor: Option<Box<dyn Actor>>,
    mailbox: Mailbox,
    needs_init: bool,
    scheduled: bool,
}

impl Cell {
    fn reserved() -> Self {
        Self {
            live: false,
            actor: None,
            mailbox: Mailbox::new(),
            needs_init: false,
            scheduled: false,
        }
    }

    fn live(actor: Box<dyn Actor>) -> Self {
        Self {
            live: true,
            actor: Some(actor),
            mailbox: Mailbox::new(),
            needs_init: true,
            scheduled: false,
        }
    }

    fn has_work(&self) -> bool {
        self.live && (self.needs_init || !self.mailbox.is_empty())
    }
}

/// The actor engine: id-keyed mailboxes plus a single dispatch loop.
///
/// The system is [`Send`] but deliberately not `Sync`: it is owned by one
/// fiber, and everything it runs - handlers included - runs on that fiber.
pub struct ActorSystem {
    cells: HashMap<ActorId, Cell>,
    ready: VecDeque<ActorId>,
    pending_spawns: VecDeque<SpawnRequest>,
    id_gen: Box<dyn IdGenerator>,
    on_dead_letter: Option<DeadLetterHandler>,
    dispatching: bool,
}

impl Default for ActorSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorSystem {
    /// Create a system with the default numeric id generator.
    pub fn new() -> Self {
        Self::with_id_generator(Box::new(NumericIdGenerator::new()))
    }

    /// Create a system with a custom root id generator.
    pub fn with_id_generator(id_gen: Box<dyn IdGenerator>) -> Self {
        Self {
            cells: HashMap::new(),
            ready: VecDeque::new(),
            pending_spawns: VecDeque::new(),
            id_gen,
            on_dead_letter: None,
            dispatching: false,
        }
    }

    /// Install a handler for messages addressed to unknown actors.
    ///
    /// Without a handler, dead letters are logged at debug level and dropped.
    pub fn set_dead_letter_handler(&mut self, handler: DeadLetterHandler) {
        self.on_dead_letter = Some(handler);
    }

    /// Spawn an actor under an id drawn from the system's generator.
    ///
    /// The constructor receives the assigned id and may decline by returning
    /// `None`. On success the actor's `on_init` runs (along with any work it
    /// triggers) before this call returns.
    pub fn spawn<F>(&mut self, build: F) -> Result<ActorId, SpawnError>
    where
        F: FnOnce(&str) -> Option<Box<dyn Actor>>,
    {
        let id = self.id_gen.next_id();
        if self.cells.contains_key(&id) {
            return Err(SpawnError::DuplicateId(id));
        }
        let Some(actor) = build(&id) else {
            return Err(SpawnError::Rejected(id));
        };
        self.cells.insert(id.clone(), Cell::live(actor));
        self.schedule(&id);
        self.dispatch();
        Ok(id)
    }

    /// Deliver a message to the actor's mailbox.
    ///
    /// Returns `false` (after invoking the dead-letter handler) if no live or
    /// reserved actor has this id. Mail for a reserved actor queues until the
    /// reservation is fulfilled.
    pub fn send(&mut self, id: &str, message: Value) -> bool {
        if !self.cells.contains_key(id) {
            self.dead_letter(id, message);
            return false;
        }
        if let Some(cell) = self.cells.get_mut(id) {
            cell.mailbox.push(message);
        }
        self.schedule(id);
        self.dispatch();
        true
    }

    /// Remove an actor, dropping any undelivered mail.
    ///
    /// Returns whether the id named a live or reserved actor.
    pub fn stop(&mut self, id: &str) -> bool {
        self.cells.remove(id).is_some()
    }

    /// Whether the id names a live actor (reservations excluded).
    pub fn is_live(&self, id: &str) -> bool {
        self.cells.get(id).is_some_and(|cell| cell.live)
    }

    /// Whether the id is taken by a live actor or a reservation.
    pub fn contains(&self, id: &str) -> bool {
        self.cells.contains_key(id)
    }

    /// Take the oldest unresolved spawn request, if any.
    pub fn take_pending_spawn(&mut self) -> Option<SpawnRequest> {
        self.pending_spawns.pop_front()
    }

    /// Turn a reservation into a live actor.
    ///
    /// Queued mail is delivered after `on_init`, in arrival order. Returns
    /// `false` if the id does not name a reservation.
    pub fn fulfill_spawn(&mut self, id: &str, actor: Box<dyn Actor>) -> bool {
        let Some(cell) = self.cells.get_mut(id) else {
            return false;
        };
        if cell.live {
            return false;
        }
        cell.live = true;
        cell.actor = Some(actor);
        cell.needs_init = true;
        self.schedule(id);
        self.dispatch();
        true
    }

    /// Drop a reservation (and any mail queued against it).
    pub fn abort_spawn(&mut self, id: &str) -> bool {
        match self.cells.get(id) {
            Some(cell) if !cell.live => {
                self.cells.remove(id);
                true
            }
            _ => false,
        }
    }

    /// Reserve an id and record a spawn request. Called from [`Context`].
    pub(crate) fn reserve_spawn(&mut self, kind: &str, props: Value) -> Option<ActorId> {
        let id = self.id_gen.next_id();
        if self.cells.contains_key(&id) {
            debug!(actor = %id, "spawn: generated id already taken");
            return None;
        }
        self.cells.insert(id.clone(), Cell::reserved());
        self.pending_spawns.push_back(SpawnRequest {
            id: id.clone(),
            kind: kind.to_owned(),
            props,
        });
        Some(id)
    }

    /// Enqueue without running dispatch. Called from [`Context`] while the
    /// dispatch loop is already on the stack.
    pub(crate) fn enqueue(&mut self, id: &str, message: Value) -> bool {
        if !self.cells.contains_key(id) {
            self.dead_letter(id, message);
            return false;
        }
        if let Some(cell) = self.cells.get_mut(id) {
            cell.mailbox.push(message);
        }
        self.schedule(id);
        true
    }

    fn schedule(&mut self, id: &str) {
        if let Some(cell) = self.cells.get_mut(id) {
            if cell.live && !cell.scheduled {
                cell.scheduled = true;
                self.ready.push_back(id.to_owned());
            }
        }
    }

    fn dead_letter(&mut self, id: &str, message: Value) {
        match self.on_dead_letter.as_mut() {
            Some(handler) => handler(id, message),
            None => debug!(actor = %id, "dead letter: no such actor"),
        }
    }

    fn dispatch(&mut self) {
        if self.dispatching {
            return;
        }
        self.dispatching = true;
        while let Some(id) = self.ready.pop_front() {
            let taken = self.take_work(&id);
            let Some((work, mut actor)) = taken else {
                continue;
            };
            let exited = {
                let mut ctx = Context::new(self, id.clone());
                match work {
                    Work::Init => actor.on_init(&mut ctx),
                    Work::Message(message) => actor.on_message(message, &mut ctx),
                }
                ctx.exited()
            };
            if exited {
                self.cells.remove(&id);
                continue;
            }
            if let Some(cell) = self.cells.get_mut(&id) {
                cell.actor = Some(actor);
                if cell.has_work() && !cell.scheduled {
                    cell.scheduled = true;
                    self.ready.push_back(id);
                }
            }
        }
        self.dispatching = false;
    }

    fn take_work(&mut self, id: &str) -> Option<(Work, Box<dyn Actor>)> {
        let cell = self.cells.get_mut(id)?;
        cell.scheduled = false;
        let actor = cell.actor.take()?;
        if cell.needs_init {
            cell.needs_init = false;
            return Some((Work::Init, actor));
        }
        match cell.mailbox.pop() {
            Some(message) => Some((Work::Message(message), actor)),
            None => {
                cell.actor = Some(actor);
                None
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
