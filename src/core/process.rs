//! Processes: sequential simulation logic on its own thread, coordinated with
//! the driver through a baton.
//!
//! # Handoff protocol
//!
//! Every process owns an unbuffered bool channel used in both directions.
//! Exactly one side holds the baton at a time:
//!
//! - The driver (or a handler running in whatever context settles an event)
//!   sends a token to resume the process and then blocks receiving.
//! - The process runs until it suspends in [`Process::wait`] or finishes, then
//!   sends a token back and blocks (or exits).
//!
//! A `true` token means "run on", `false` means "the awaited event aborted".
//! Every blocking send and receive also selects on the simulation's shutdown
//! signal, so teardown never leaves a thread stuck on a handoff.
//!
//! Only the process's own thread may touch the baton from the process side.
//! [`Process::wait`] called from any other thread is rejected before it can
//! hand a token to a suspended process.

use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

use crossbeam_channel::{bounded, select, Receiver, Sender};
use tracing::{debug, error, warn};

use super::{AppResult, Awaitable, Event, Handler, Interrupt, ProcessResult, SimError, Simulation};

/// The two-way handoff channel of one process.
#[derive(Clone)]
struct Baton {
    tx: Sender<bool>,
    rx: Receiver<bool>,
}

impl Baton {
    fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self { tx, rx }
    }

    /// Hand the baton to the other side. Returns `false` on shutdown.
    fn send(&self, token: bool, shutdown: &Receiver<()>) -> bool {
        select! {
            send(self.tx, token) -> res => res.is_ok(),
            recv(shutdown) -> _ => false,
        }
    }

    /// Block until the baton comes back. Returns `None` on shutdown.
    fn receive(&self, shutdown: &Receiver<()>) -> Option<bool> {
        select! {
            recv(self.rx) -> token => token.ok(),
            recv(shutdown) -> _ => None,
        }
    }

    /// Hand the baton over and block until it comes back.
    fn pass(&self, token: bool, shutdown: &Receiver<()>) -> Option<bool> {
        if !self.send(token, shutdown) {
            return None;
        }
        self.receive(shutdown)
    }
}

/// A process in a discrete-event simulation.
///
/// A process can wait on events and other processes, create events and start
/// new processes. It is itself [`Awaitable`]: its completion event is
/// processed when the body returns `Ok(())` and aborted when the process is
/// aborted.
///
/// Handles are cheap to clone. Every clone can query status and be awaited,
/// but only the body running on the process's own thread can [`wait`](Self::wait).
///
/// ```rust,ignore
/// sim.process(|proc| {
///     println!("start");
///     proc.wait(&proc.timeout(5.0)?)?;
///     println!("end");
///     Ok(())
/// })?;
/// ```
#[derive(Clone)]
pub struct Process {
    id: u64,
    sim: Simulation,
    ev: Event,
    baton: Baton,
    owner: Arc<OnceLock<ThreadId>>,
}

impl Process {
    pub(crate) fn new(id: u64, sim: Simulation, ev: Event) -> Self {
        Self {
            id,
            sim,
            ev,
            baton: Baton::new(),
            owner: Arc::new(OnceLock::new()),
        }
    }

    /// Identifier unique within the owning simulation.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// The simulation this process belongs to.
    #[must_use]
    pub const fn sim(&self) -> &Simulation {
        &self.sim
    }

    /// Event that settles when this process finishes or is aborted.
    #[must_use]
    pub const fn completion(&self) -> &Event {
        &self.ev
    }

    /// Current simulation time.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.sim.now()
    }

    /// Create a new pending event.
    #[must_use]
    pub fn event(&self) -> Event {
        self.sim.event()
    }

    /// Create an event processed `delay` time units from now.
    ///
    /// # Errors
    ///
    /// See [`Simulation::timeout`].
    pub fn timeout(&self, delay: f64) -> Result<Event, SimError> {
        self.sim.timeout(delay)
    }

    /// Start a child process.
    ///
    /// # Errors
    ///
    /// See [`Simulation::process`].
    pub fn process<F>(&self, body: F) -> Result<Self, SimError>
    where
        F: FnOnce(Self) -> AppResult<()> + Send + 'static,
    {
        self.sim.process(body)
    }

    /// Yield to the simulation until `awaitable` is processed.
    ///
    /// - Already processed: returns at once without suspending.
    /// - Already aborted: aborts this process and returns
    ///   `Err(Interrupt::Aborted)`.
    /// - Otherwise suspends. Resumes with `Ok(())` when the awaitable is
    ///   processed, aborts this process and returns `Err(Interrupt::Aborted)`
    ///   when it is aborted, or returns `Err(Interrupt::Shutdown)` if the
    ///   simulation shuts down first, leaving every event untouched.
    ///
    /// Once a process has been interrupted, every later call returns the same
    /// interrupt without suspending. Propagate it with `?`.
    ///
    /// # Errors
    ///
    /// Returns the [`Interrupt`] that ended the process, or
    /// [`Interrupt::ForeignThread`] when called from any thread but the
    /// process's own.
    pub fn wait<A>(&self, awaitable: &A) -> ProcessResult
    where
        A: Awaitable + ?Sized,
    {
        if self.owner.get() != Some(&thread::current().id()) {
            warn!(process_id = self.id, "Wait rejected outside the process thread");
            return Err(Interrupt::ForeignThread);
        }
        self.interrupted()?;

        if awaitable.processed() {
            return Ok(());
        }
        if awaitable.aborted() {
            return Err(self.abort());
        }

        awaitable.add_handler(self.resume_handler(true));
        awaitable.add_abort_handler(self.resume_handler(false));

        debug!(process_id = self.id, time = self.now(), "Process suspended");
        match self.baton.pass(true, self.sim.shutdown_signal()) {
            Some(true) => {
                debug!(process_id = self.id, time = self.now(), "Process resumed");
                Ok(())
            }
            Some(false) => Err(self.abort()),
            None => {
                debug!(process_id = self.id, "Process terminated by shutdown");
                Err(Interrupt::Shutdown)
            }
        }
    }

    /// Handler that resumes this process with `token` and blocks until it
    /// yields again.
    fn resume_handler(&self, token: bool) -> Handler {
        let baton = self.baton.clone();
        let shutdown = self.sim.shutdown_signal().clone();
        Box::new(move |_| {
            baton.pass(token, &shutdown);
        })
    }

    fn interrupted(&self) -> ProcessResult {
        if self.sim.is_shutdown() {
            return Err(Interrupt::Shutdown);
        }
        if self.ev.aborted() {
            return Err(Interrupt::Aborted);
        }
        Ok(())
    }

    fn abort(&self) -> Interrupt {
        debug!(process_id = self.id, time = self.now(), "Process aborted");
        self.ev.abort();
        Interrupt::Aborted
    }

    /// Driver side of the start handshake: run the process until it yields.
    pub(crate) fn hand_over(&self) {
        self.baton.pass(true, self.sim.shutdown_signal());
    }
}

impl Awaitable for Process {
    fn pending(&self) -> bool {
        self.ev.pending()
    }

    fn triggered(&self) -> bool {
        self.ev.triggered()
    }

    fn processed(&self) -> bool {
        self.ev.processed()
    }

    fn aborted(&self) -> bool {
        self.ev.aborted()
    }

    fn add_handler(&self, handler: Handler) {
        self.ev.add_handler(handler);
    }

    fn add_abort_handler(&self, handler: Handler) {
        self.ev.add_abort_handler(handler);
    }
}

impl std::fmt::Debug for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Process")
            .field("id", &self.id)
            .field("completion", &self.ev)
            .finish_non_exhaustive()
    }
}

/// Hands the baton back when the process thread ends, including by panic.
struct YieldOnExit {
    proc: Process,
}

impl Drop for YieldOnExit {
    fn drop(&mut self) {
        if thread::panicking() && !self.proc.sim.is_shutdown() {
            error!(process_id = self.proc.id, "Process panicked, aborting");
            self.proc.ev.abort();
        }
        self.proc.baton.send(true, self.proc.sim.shutdown_signal());
    }
}

/// Body of a process thread.
pub(crate) fn run_process<F>(proc: Process, body: F)
where
    F: FnOnce(Process) -> AppResult<()>,
{
    let shutdown = proc.sim.shutdown_signal().clone();
    if proc.baton.receive(&shutdown).is_none() {
        debug!(process_id = proc.id, "Process never started");
        return;
    }
    let _ = proc.owner.set(thread::current().id());
    debug!(process_id = proc.id, time = proc.now(), "Process started");

    let guard = YieldOnExit { proc: proc.clone() };
    match body(proc.clone()) {
        Ok(()) => {
            if proc.ev.trigger() {
                debug!(process_id = proc.id, time = proc.now(), "Process finished");
            }
        }
        Err(err) => match err.downcast_ref::<Interrupt>() {
            Some(interrupt @ (Interrupt::Aborted | Interrupt::Shutdown)) => {
                debug!(process_id = proc.id, %interrupt, "Process interrupted");
            }
            // Shutdown skips completion bookkeeping, whatever the body returned.
            _ if proc.sim.is_shutdown() => {
                debug!(process_id = proc.id, error = %err, "Process stopped by shutdown");
            }
            _ => {
                warn!(process_id = proc.id, error = %err, "Process failed, aborting");
                proc.ev.abort();
            }
        },
    }
    drop(guard);
}
