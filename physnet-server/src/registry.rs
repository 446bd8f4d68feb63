//! Registrators and factories: kind → creator maps per entity part.
//!
//! User code registers a creator per entity kind; a factory over the
//! registrator builds parts on demand. Unknown kinds are not an error -
//! creation short-circuits to `None` and the caller moves on, which is what
//! lets an entity be a partial triple (scenery with a body and nothing else).
//!
//! Registrations are only mutated during startup or from listener callbacks,
//! both of which run on the tick fiber.

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
use serde_json::Value;

// Layer 3: Internal module imports
use crate::world::World;

/// Creator of one entity part.
///
/// Receives the world (body creators build into it; others may ignore it) and
/// the opaque creation properties. Returning `None` declines creation.
pub type Creator<T> = Box<dyn FnMut(&mut World, &Value) -> Option<T> + Send>;

/// Kind → creator map for one entity part.
pub struct Registrator<T> {
    creators: HashMap<String, Creator<T>>,
}

impl<T> Default for Registrator<T> {
    fn default() -> Self {
        Self {
            creators: HashMap::new(),
        }
    }
}

impl<T> Registrator<T> {
    /// Create an empty registrator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a creator for the given kind, replacing any previous one.
    pub fn register<F>(&mut self, kind: impl Into<String>, creator: F)
    where
        F: FnMut(&mut World, &Value) -> Option<T> + Send + 'static,
    {
        self.creators.insert(kind.into(), Box::new(creator));
    }

    /// Remove the creator for the given kind.
    pub fn unregister(&mut self, kind: &str) {
        self.creators.remove(kind);
    }

    /// Whether a creator is registered for the given kind.
    pub fn is_registered(&self, kind: &str) -> bool {
        self.creators.contains_key(kind)
    }

    fn create(&mut self, world: &mut World, kind: &str, props: &Value) -> Option<T> {
        self.creators.get_mut(kind)?(world, props)
    }
}

/// A factory producing parts through its registrator.
pub struct Factory<T> {
    pub registrator: Registrator<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            registrator: Registrator::default(),
        }
    }
}

impl<T> Factory<T> {
    /// Build a part of the given kind; `None` for unknown kinds or when the
    /// creator declines.
    pub fn create(&mut self, world: &mut World, kind: &str, props: &Value) -> Option<T> {
        self.registrator.create(world, kind, props)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
