//! The occurrence contract shared by events and processes.

use super::Event;

/// One-shot callback run when an occurrence settles.
///
/// The argument is the event that settled. For a [`Process`](super::Process)
/// this is its completion event.
pub type Handler = Box<dyn FnOnce(&Event) + Send + 'static>;

/// Something a process can wait on.
///
/// An awaitable is pending until it settles exactly once into processed or
/// aborted. Handlers run synchronously, in registration order, in the context
/// of whoever settles it.
pub trait Awaitable: Send + Sync {
    /// Whether the awaitable has not been triggered, processed or aborted.
    fn pending(&self) -> bool;

    /// Whether the awaitable has left the pending state.
    fn triggered(&self) -> bool;

    /// Whether the awaitable was processed.
    fn processed(&self) -> bool;

    /// Whether the awaitable was aborted.
    fn aborted(&self) -> bool;

    /// Register a handler run once the awaitable is processed.
    fn add_handler(&self, handler: Handler);

    /// Register a handler run once the awaitable is aborted.
    fn add_abort_handler(&self, handler: Handler);
}
