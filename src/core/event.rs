//! One-shot simulation events.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use super::simulation::Shared;
use super::{Awaitable, Handler, SimError};

/// Lifecycle state of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    /// Not yet triggered.
    Pending,
    /// Scheduled on the simulation queue, not yet processed.
    Triggered,
    /// Processed by the simulation; handlers have run.
    Processed,
    /// Aborted; abort handlers have run.
    Aborted,
}

struct EventState {
    status: EventStatus,
    handlers: Vec<Handler>,
    abort_handlers: Vec<Handler>,
}

struct EventInner {
    id: u64,
    sim: Weak<Shared>,
    state: Mutex<EventState>,
}

/// A one-shot event owned by a simulation.
///
/// `Event` is a cheap handle; clones refer to the same event. Handlers never
/// run while the internal lock is held, so a handler may freely query or
/// register on the event that invoked it.
#[derive(Clone)]
pub struct Event {
    inner: Arc<EventInner>,
}

impl Event {
    pub(crate) fn new(id: u64, sim: Weak<Shared>) -> Self {
        Self {
            inner: Arc::new(EventInner {
                id,
                sim,
                state: Mutex::new(EventState {
                    status: EventStatus::Pending,
                    handlers: Vec::new(),
                    abort_handlers: Vec::new(),
                }),
            }),
        }
    }

    /// Identifier unique within the owning simulation.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> EventStatus {
        self.inner.state.lock().status
    }

    /// Schedule the event to be processed at the current simulation time.
    ///
    /// Returns `false` if the event was not pending or the simulation is gone
    /// or shut down.
    pub fn trigger(&self) -> bool {
        self.trigger_delayed(0.0).unwrap_or(false)
    }

    /// Schedule the event to be processed `delay` time units from now.
    ///
    /// Returns `Ok(false)` if the event was not pending.
    ///
    /// # Errors
    ///
    /// - `SimError::InvalidDelay` if `delay` is negative or NaN
    /// - `SimError::Shutdown` if the simulation is gone or shut down
    pub fn trigger_delayed(&self, delay: f64) -> Result<bool, SimError> {
        if delay.is_nan() || delay < 0.0 {
            return Err(SimError::InvalidDelay(delay));
        }
        let sim = self.inner.sim.upgrade().ok_or(SimError::Shutdown)?;

        let mut state = self.inner.state.lock();
        if state.status != EventStatus::Pending {
            return Ok(false);
        }
        sim.schedule(delay, self.clone())?;
        state.status = EventStatus::Triggered;
        Ok(true)
    }

    /// Abort a pending event and run its abort handlers in the caller's context.
    ///
    /// Returns `false` if the event was not pending.
    pub fn abort(&self) -> bool {
        let handlers = {
            let mut state = self.inner.state.lock();
            if state.status != EventStatus::Pending {
                return false;
            }
            state.status = EventStatus::Aborted;
            state.handlers.clear();
            std::mem::take(&mut state.abort_handlers)
        };

        debug!(event_id = self.inner.id, handlers = handlers.len(), "Event aborted");
        for handler in handlers {
            handler(self);
        }
        true
    }

    /// Mark a triggered event processed and run its handlers.
    ///
    /// Only the simulation driver calls this, when the event reaches the head
    /// of the queue.
    pub(crate) fn process(&self) {
        let handlers = {
            let mut state = self.inner.state.lock();
            if state.status != EventStatus::Triggered {
                return;
            }
            state.status = EventStatus::Processed;
            state.abort_handlers.clear();
            std::mem::take(&mut state.handlers)
        };

        for handler in handlers {
            handler(self);
        }
    }

    fn register(&self, handler: Handler, on_abort: bool) {
        let mut state = self.inner.state.lock();
        match state.status {
            EventStatus::Pending | EventStatus::Triggered => {
                if on_abort {
                    state.abort_handlers.push(handler);
                } else {
                    state.handlers.push(handler);
                }
            }
            status => {
                debug!(event_id = self.inner.id, ?status, "Handler dropped on settled event");
            }
        }
    }
}

impl Awaitable for Event {
    fn pending(&self) -> bool {
        self.status() == EventStatus::Pending
    }

    fn triggered(&self) -> bool {
        self.status() != EventStatus::Pending
    }

    fn processed(&self) -> bool {
        self.status() == EventStatus::Processed
    }

    fn aborted(&self) -> bool {
        self.status() == EventStatus::Aborted
    }

    fn add_handler(&self, handler: Handler) {
        self.register(handler, false);
    }

    fn add_abort_handler(&self, handler: Handler) {
        self.register(handler, true);
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Event {}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.inner.id)
            .field("status", &self.status())
            .finish()
    }
}
