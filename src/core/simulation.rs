//! Simulation driver: clock, event queue, process launching and shutdown.
//!
//! The driver pops events in `(time, insertion order)` order and processes
//! them one at a time. Processing an event that a process waits on hands the
//! baton to that process and blocks until the process yields again, so at
//! most one participant touches simulation state at any instant.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::SimulationConfig;

use super::process::run_process;
use super::{AppResult, Awaitable, Event, Process, SimError};

/// Queue entry ordered as a min-heap on `(at, seq)`.
struct Scheduled {
    at: f64,
    seq: u64,
    event: Event,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == CmpOrdering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // Reversed so the BinaryHeap pops the earliest entry first.
        other
            .at
            .total_cmp(&self.at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct Clock {
    now: f64,
    queue: BinaryHeap<Scheduled>,
    next_seq: u64,
}

/// State shared by every handle to one simulation.
pub(crate) struct Shared {
    config: SimulationConfig,
    clock: Mutex<Clock>,
    next_event_id: AtomicU64,
    next_process_id: AtomicU64,
    /// Dropped exactly once to raise the shutdown signal.
    shutdown_tx: Mutex<Option<Sender<()>>>,
    shutdown_rx: Receiver<()>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl Shared {
    fn is_shutdown(&self) -> bool {
        matches!(self.shutdown_rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    pub(crate) fn schedule(&self, delay: f64, event: Event) -> Result<(), SimError> {
        if self.is_shutdown() {
            return Err(SimError::Shutdown);
        }
        let mut clock = self.clock.lock();
        let at = clock.now + delay;
        let seq = clock.next_seq;
        clock.next_seq += 1;
        clock.queue.push(Scheduled { at, seq, event });
        Ok(())
    }
}

/// Handle to a discrete-event simulation.
///
/// Handles are cheap to clone and all refer to the same simulation. Always
/// finish with [`shutdown`](Self::shutdown); dropping the handles alone leaves
/// suspended process threads blocked.
///
/// ```rust,ignore
/// use prometheus_sim_process::core::{Awaitable, Simulation};
///
/// let sim = Simulation::new();
/// sim.process(|proc| {
///     proc.wait(&proc.timeout(5.0)?)?;
///     println!("woke at {}", proc.now());
///     Ok(())
/// })?;
/// sim.run();
/// sim.shutdown();
/// ```
#[derive(Clone)]
pub struct Simulation {
    shared: Arc<Shared>,
}

impl Simulation {
    /// Create a simulation with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_valid_config(SimulationConfig::default())
    }

    /// Create a simulation from a configuration.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidConfig` if the configuration is invalid.
    pub fn with_config(config: SimulationConfig) -> Result<Self, SimError> {
        config.validate().map_err(SimError::InvalidConfig)?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: SimulationConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = unbounded();
        let now = config.start_time;
        Self {
            shared: Arc::new(Shared {
                config,
                clock: Mutex::new(Clock {
                    now,
                    queue: BinaryHeap::new(),
                    next_seq: 0,
                }),
                next_event_id: AtomicU64::new(0),
                next_process_id: AtomicU64::new(0),
                shutdown_tx: Mutex::new(Some(shutdown_tx)),
                shutdown_rx,
                threads: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Current simulation time.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.shared.clock.lock().now
    }

    /// Number of events waiting on the queue.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.shared.clock.lock().queue.len()
    }

    /// Create a new pending event.
    #[must_use]
    pub fn event(&self) -> Event {
        let id = self.shared.next_event_id.fetch_add(1, Ordering::Relaxed);
        Event::new(id, Arc::downgrade(&self.shared))
    }

    /// Create an event that is processed `delay` time units from now.
    ///
    /// # Errors
    ///
    /// - `SimError::InvalidDelay` if `delay` is negative or NaN
    /// - `SimError::Shutdown` if the simulation has been shut down
    pub fn timeout(&self, delay: f64) -> Result<Event, SimError> {
        let ev = self.event();
        ev.trigger_delayed(delay)?;
        Ok(ev)
    }

    /// Start a new process running `body`.
    ///
    /// The body starts on its own thread when the simulation processes the
    /// zero-delay start event. Returning `Ok(())` triggers the process's
    /// completion event. Returning an [`Interrupt`](super::Interrupt) leaves
    /// the completion event as the interrupt left it; any other error aborts it.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Shutdown` if the simulation has been shut down.
    pub fn process<F>(&self, body: F) -> Result<Process, SimError>
    where
        F: FnOnce(Process) -> AppResult<()> + Send + 'static,
    {
        let id = self.shared.next_process_id.fetch_add(1, Ordering::Relaxed);
        let proc = Process::new(id, self.clone(), self.event());
        let start = self.timeout(0.0)?;

        let sim = self.clone();
        let runner = proc.clone();
        start.add_handler(Box::new(move |_| sim.launch(runner, body)));

        debug!(process_id = id, time = self.now(), "Process scheduled");
        Ok(proc)
    }

    /// Spawn the process thread and hand it the baton.
    fn launch<F>(&self, proc: Process, body: F)
    where
        F: FnOnce(Process) -> AppResult<()> + Send + 'static,
    {
        let id = proc.id();
        let config = &self.shared.config;
        let runner = proc.clone();
        let spawned = thread::Builder::new()
            .name(format!("{}-{id}", config.thread_name_prefix))
            .stack_size(config.thread_stack_size)
            .spawn(move || run_process(runner, body));

        match spawned {
            Ok(handle) => {
                self.reap_finished_threads();
                self.shared.threads.lock().push(handle);
                proc.hand_over();
            }
            Err(e) => {
                let err = SimError::from(e);
                error!(process_id = id, error = %err, "Process aborted before start");
                proc.completion().abort();
            }
        }
    }

    /// Join process threads that have exited. Returns how many handles remain.
    pub(crate) fn reap_finished_threads(&self) -> usize {
        let finished: Vec<JoinHandle<()>> = {
            let mut threads = self.shared.threads.lock();
            let (finished, live): (Vec<_>, Vec<_>) = threads.drain(..).partition(JoinHandle::is_finished);
            *threads = live;
            finished
        };
        for handle in finished {
            if handle.join().is_err() {
                warn!("Process thread panicked");
            }
        }
        self.shared.threads.lock().len()
    }

    /// Pop the next event due strictly before `limit`, advancing the clock to it.
    fn pop_next(&self, limit: Option<f64>) -> Option<Event> {
        let mut clock = self.shared.clock.lock();
        let due = clock
            .queue
            .peek()
            .is_some_and(|next| limit.is_none_or(|limit| next.at < limit));
        if !due {
            return None;
        }
        let next = clock.queue.pop()?;
        clock.now = next.at;
        Some(next.event)
    }

    /// Process the next event.
    ///
    /// Returns `false` if the queue is empty or the simulation is shut down.
    pub fn step(&self) -> bool {
        if self.is_shutdown() {
            return false;
        }
        match self.pop_next(None) {
            Some(event) => {
                event.process();
                true
            }
            None => false,
        }
    }

    /// Process events until the queue is empty or the simulation shuts down.
    pub fn run(&self) {
        while self.step() {}
    }

    /// Process every event scheduled before `until`, then advance the clock to
    /// `until`.
    pub fn run_until(&self, until: f64) {
        while !self.is_shutdown() {
            let Some(event) = self.pop_next(Some(until)) else {
                break;
            };
            event.process();
        }

        if !self.is_shutdown() {
            let mut clock = self.shared.clock.lock();
            if clock.now < until {
                clock.now = until;
            }
        }
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shared.is_shutdown()
    }

    /// Shut the simulation down.
    ///
    /// Raises the shutdown signal, which force-terminates every suspended
    /// process without touching the events they wait on, drops the queue and
    /// joins process threads. Calling it again is a no-op.
    ///
    /// Call this before the last handle goes away. Queued events hold handlers
    /// that hold processes, and processes hold the simulation, so dropping
    /// every `Simulation` handle does not free it: suspended process threads
    /// stay blocked until the process exits.
    pub fn shutdown(&self) {
        let Some(tx) = self.shared.shutdown_tx.lock().take() else {
            return;
        };
        drop(tx);
        info!(time = self.now(), "Shutting down simulation");

        let queue = std::mem::take(&mut self.shared.clock.lock().queue);
        drop(queue);

        let threads: Vec<_> = self.shared.threads.lock().drain(..).collect();
        let current = thread::current().id();
        let mut joined = 0usize;
        for handle in threads {
            if handle.thread().id() == current {
                continue;
            }
            match handle.join() {
                Ok(()) => joined += 1,
                Err(_) => warn!("Process thread panicked"),
            }
        }
        info!(joined, "Simulation shut down complete");
    }

    pub(crate) fn shutdown_signal(&self) -> &Receiver<()> {
        &self.shared.shutdown_rx
    }

    /// Create an event processed as soon as any member is processed.
    ///
    /// It is aborted once every member has aborted. An empty set is processed
    /// immediately.
    #[must_use]
    pub fn any_of(&self, members: &[&dyn Awaitable]) -> Event {
        super::combinators::any_of(self.event(), members)
    }

    /// Create an event processed once every member is processed.
    ///
    /// It is aborted as soon as any member aborts. An empty set is processed
    /// immediately.
    #[must_use]
    pub fn all_of(&self, members: &[&dyn Awaitable]) -> Event {
        super::combinators::all_of(self.event(), members)
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}
