//! System-level error types.

// Layer 1: Standard library
// (none)

// Layer 2: Third-party
use thiserror::Error;

// Layer 3: Internal
use crate::util::ActorId;

/// Errors from [`ActorSystem::spawn`](crate::ActorSystem::spawn).
#[derive(Error, Debug)]
pub enum SpawnError {
    /// The generated or preset id already names a live or reserved actor.
    #[error("actor id already in use: {0}")]
    DuplicateId(ActorId),

    /// The constructor declined to build an actor for the assigned id.
    #[error("no actor built for id: {0}")]
    Rejected(ActorId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_error_display() {
        let err = SpawnError::DuplicateId("ship-a".to_owned());
        assert_eq!(err.to_string(), "actor id already in use: ship-a");

        let err = SpawnError::Rejected("7".to_owned());
        assert_eq!(err.to_string(), "no actor built for id: 7");
    }
}
