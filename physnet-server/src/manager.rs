//! Generic keyed store of created entity parts, with replay.
//!
//! One manager exists per entity part (`bodies`, `controllers`, `actors`);
//! its route name is baked into every manage frame it emits. The manager
//! stores the creation record alongside the factory result so that
//! [`Manager::sync`] can re-emit every live `create` to a joining client.
//!
//! The manager does not detect id collisions - a second create under the
//! same id overwrites the record; the server dedupes ids.

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
use serde_json::Value;

// Layer 3: Internal module imports
use crate::registry::{Factory, Registrator};
use crate::sync::Synchronizer;
use crate::wire::{EntityCommand, EntityId, Frame};
use crate::world::World;

struct ManagedItem<T> {
    kind: String,
    props: Value,
    result: T,
}

/// Keyed container over a factory; emits create/destroy through its route.
pub struct Manager<T> {
    route: &'static str,
    factory: Factory<T>,
    store: HashMap<EntityId, ManagedItem<T>>,
}

impl<T: Clone> Manager<T> {
    /// Create a manager emitting under the given route name.
    pub fn new(route: &'static str) -> Self {
        Self {
            route,
            factory: Factory::default(),
            store: HashMap::new(),
        }
    }

    /// The registrator backing this manager's factory.
    pub fn registrator_mut(&mut self) -> &mut Registrator<T> {
        &mut self.factory.registrator
    }

    /// Build, store and announce a part.
    ///
    /// On factory success the record is stored under `id`, a `create` frame
    /// goes to the current destination, and the result is returned. Unknown
    /// kinds and declining creators produce `None` with no store or emission.
    pub fn create(
        &mut self,
        world: &mut World,
        sync: &Synchronizer,
        id: &str,
        kind: &str,
        props: &Value,
    ) -> Option<T> {
        let result = self.factory.create(world, kind, props)?;
        self.store.insert(
            id.to_owned(),
            ManagedItem {
                kind: kind.to_owned(),
                props: props.clone(),
                result: result.clone(),
            },
        );
        sync.emit(&Frame::manage(
            self.route,
            EntityCommand::create(id, kind, props.clone()),
        ));
        Some(result)
    }

    /// Remove and announce a part; `false` if the id was not stored.
    pub fn destroy(&mut self, sync: &Synchronizer, id: &str) -> bool {
        if self.store.remove(id).is_none() {
            return false;
        }
        sync.emit(&Frame::manage(self.route, EntityCommand::destroy(id)));
        true
    }

    /// The stored factory result for an id.
    pub fn get(&self, id: &str) -> Option<&T> {
        self.store.get(id).map(|item| &item.result)
    }

    /// Whether an id is stored.
    pub fn contains(&self, id: &str) -> bool {
        self.store.contains_key(id)
    }

    /// Stored (id, result) pairs, in store-iteration order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &T)> {
        self.store.iter().map(|(id, item)| (id, &item.result))
    }

    /// Number of stored parts.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Re-emit one `create` per stored item to the current destination.
    ///
    /// Iteration order is unspecified; a replayed client only needs the set.
    pub fn sync(&self, sync: &Synchronizer) {
        for (id, item) in &self.store {
            sync.emit(&Frame::manage(
                self.route,
                EntityCommand::create(id, &item.kind, item.props.clone()),
            ));
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
