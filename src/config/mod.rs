//! Configuration models for simulations.

pub mod simulation;

pub use simulation::SimulationConfig;
