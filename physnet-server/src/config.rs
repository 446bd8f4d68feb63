//! Server configuration with sensible defaults.

// Layer 1: Standard library
use std::time::Duration;

// Layer 2: Third-party
// (none)

// Layer 3: Internal
use crate::clients::ClientId;

/// Default physics step cadence (~60 Hz).
pub const DEFAULT_STEP_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// Default body-snapshot broadcast cadence (~5 Hz).
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / 5);

/// Policy producing the id for a connecting client, given the ids in use.
///
/// Returning `None` rejects the connection with
/// [`ConnectError::IdsExhausted`](crate::error::ConnectError::IdsExhausted).
pub type NewIdFn = Box<dyn FnMut(&[ClientId]) -> Option<ClientId> + Send>;

/// The default id policy: first unused of `ship-a` ... `ship-y`.
pub fn seat_letter_ids(existing: &[ClientId]) -> Option<ClientId> {
    ('a'..'z')
        .map(|letter| format!("ship-{letter}"))
        .find(|id| !existing.iter().any(|used| used == id))
}

/// Tunable behavior of one server.
pub struct ServerConfig {
    /// Period of the physics step ticker.
    pub step_interval: Duration,

    /// Period of the snapshot broadcast ticker.
    pub sync_interval: Duration,

    /// Whether snapshot broadcasts are emitted at all.
    pub synchronization: bool,

    /// Client id assignment policy.
    pub new_id: NewIdFn,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            step_interval: DEFAULT_STEP_INTERVAL,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            synchronization: true,
            new_id: Box::new(seat_letter_ids),
        }
    }
}
