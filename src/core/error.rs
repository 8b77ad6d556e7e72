//! Error types for process suspension and simulation driving.

use thiserror::Error;

/// Outcome of a suspension point that did not resume normally.
///
/// Process bodies propagate this with `?`, so nothing after the interrupted
/// `wait` runs while scoped `Drop` cleanup still does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupt {
    /// An awaited occurrence was aborted; the process was aborted with it.
    #[error("process aborted")]
    Aborted,
    /// The simulation was shut down while the process was suspended.
    #[error("simulation shut down")]
    Shutdown,
    /// `wait` was called from a thread other than the process's own. The
    /// process and the awaited occurrence are left untouched.
    #[error("wait called outside the process thread")]
    ForeignThread,
}

/// Result type returned by process bodies and `Process::wait`.
pub type ProcessResult = Result<(), Interrupt>;

/// Errors produced by the simulation driver.
#[derive(Debug, Error)]
pub enum SimError {
    /// A delay was negative or not a number.
    #[error("invalid delay: {0}")]
    InvalidDelay(f64),
    /// The simulation has already been shut down.
    #[error("simulation shut down")]
    Shutdown,
    /// The OS refused to spawn a process thread.
    #[error("failed to spawn process thread: {0}")]
    Spawn(#[from] std::io::Error),
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
