//! Events, processes and the simulation driver.

pub mod awaitable;
mod combinators;
pub mod error;
pub mod event;
pub mod process;
pub mod simulation;

pub use awaitable::{Awaitable, Handler};
pub use error::{AppResult, Interrupt, ProcessResult, SimError};
pub use event::{Event, EventStatus};
pub use process::Process;
pub use simulation::Simulation;
