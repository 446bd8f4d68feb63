//! Core Actor trait.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use serde_json::Value;

// Layer 3: Internal module imports
use crate::system::Context;

/// A mailbox-bound message handler.
///
/// Actors are registered by string kind at runtime and exchange opaque JSON
/// payloads, so the trait dispatches dynamically over [`Value`] rather than a
/// per-actor message type; implementors decode the payload at their own
/// boundary.
///
/// Both hooks receive a [`Context`] giving the actor its own id and the
/// `send`/`spawn`/`exit` capabilities.
///
/// # Example
///
/// ```rust
/// use physnet_rt::{Actor, Context};
/// use serde_json::Value;
///
/// struct Logger;
///
/// impl Actor for Logger {
///     fn on_init(&mut self, ctx: &mut Context<'_>) {
///         println!("{} is live", ctx.self_id());
///     }
///
///     fn on_message(&mut self, message: Value, _ctx: &mut Context<'_>) {
///         println!("got {message}");
///     }
/// }
/// ```
pub trait Actor: Send {
    /// Called once, before the first message is delivered.
    fn on_init(&mut self, ctx: &mut Context<'_>) {
        let _ = ctx;
    }

    /// Handle one message from the actor's mailbox.
    fn on_message(&mut self, message: Value, ctx: &mut Context<'_>);
}
