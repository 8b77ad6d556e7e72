//! # Prometheus Sim Process
//!
//! Deterministic process coordination for discrete-event simulation.
//!
//! Simulation logic is written as an ordinary sequential function (a
//! *process*) that suspends itself awaiting a future event and is resumed
//! later, while the driver advances simulated time and decides, one event at a
//! time, which waiting process runs next.
//!
//! ## How it works
//!
//! Each process runs on its own OS thread, but only one participant runs at
//! any instant. Control is passed back and forth as a baton over an
//! unbuffered channel dedicated to that process, so there is no shared lock
//! around process state and the wake order is fully determined by the
//! event order.
//!
//! - **Suspension**: [`Process::wait`](core::Process::wait) is the only
//!   suspension point, and only while the awaited event is pending.
//! - **Abort propagation**: if an awaited event aborts, the waiting process
//!   aborts too, cascading through chains of processes waiting on processes.
//! - **Shutdown**: [`Simulation::shutdown`](core::Simulation::shutdown)
//!   force-terminates every suspended process without touching the events it
//!   waited on.
//!
//! Interrupts surface as [`Interrupt`](core::Interrupt) errors; process
//! bodies propagate them with `?`, so nothing after an interrupted `wait` runs
//! while scoped `Drop` cleanup still does.
//!
//! ```rust,ignore
//! use prometheus_sim_process::core::{Awaitable, Simulation};
//!
//! let sim = Simulation::new();
//! let child = sim.process(|proc| {
//!     proc.wait(&proc.timeout(5.0)?)?;
//!     Ok(())
//! })?;
//! sim.process(move |proc| {
//!     proc.wait(&child)?;
//!     println!("child finished at {}", proc.now());
//!     Ok(())
//! })?;
//! sim.run();
//! sim.shutdown();
//! ```
//!
//! For complete scenarios, see `tests/process_test.rs`.

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Events, processes and the simulation driver.
pub mod core;
/// Configuration models for simulations.
pub mod config;
/// Shared utilities.
pub mod util;
