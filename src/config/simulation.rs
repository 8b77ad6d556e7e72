//! Simulation configuration.

use std::env;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

const MIN_STACK_SIZE: usize = 16 * 1024;

/// Configuration for a [`Simulation`](crate::core::Simulation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulation time the clock starts at.
    pub start_time: f64,
    /// Stack size in bytes of each process thread.
    pub thread_stack_size: usize,
    /// Prefix of process thread names; the process id is appended.
    pub thread_name_prefix: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            thread_stack_size: 2 * 1024 * 1024,
            thread_name_prefix: "sim-process".into(),
        }
    }
}

impl SimulationConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the start time.
    #[must_use]
    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    /// Set the process thread stack size.
    #[must_use]
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = bytes;
        self
    }

    /// Set the process thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if !self.start_time.is_finite() {
            return Err("start_time must be finite".into());
        }
        if self.thread_stack_size < MIN_STACK_SIZE {
            return Err(format!("thread_stack_size must be at least {MIN_STACK_SIZE} bytes"));
        }
        if self.thread_name_prefix.is_empty() {
            return Err("thread_name_prefix must not be empty".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `SIM_START_TIME`, `SIM_THREAD_STACK_SIZE` and
    /// `SIM_THREAD_NAME_PREFIX`, loading a `.env` file first if present.
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Fails if a variable does not parse or the result is invalid.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        let mut cfg = Self::default();

        if let Ok(raw) = env::var("SIM_START_TIME") {
            cfg.start_time = raw
                .parse()
                .with_context(|| format!("SIM_START_TIME is not a number: {raw}"))?;
        }
        if let Ok(raw) = env::var("SIM_THREAD_STACK_SIZE") {
            cfg.thread_stack_size = raw
                .parse()
                .with_context(|| format!("SIM_THREAD_STACK_SIZE is not a byte count: {raw}"))?;
        }
        if let Ok(prefix) = env::var("SIM_THREAD_NAME_PREFIX") {
            cfg.thread_name_prefix = prefix;
        }

        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}
