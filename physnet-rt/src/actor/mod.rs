//! Actor trait for mailbox-bound message handlers.

mod traits;

pub use traits::Actor;
