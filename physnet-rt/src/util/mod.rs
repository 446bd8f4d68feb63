//! Utilities: actor ids and id generation.

mod ids;

pub use ids::{ActorId, IdGenerator, NumericIdGenerator};
