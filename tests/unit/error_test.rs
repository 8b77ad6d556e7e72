//! Tests for error types

use prometheus_sim_process::core::{Interrupt, SimError};

#[test]
fn test_interrupt_aborted() {
    let err = Interrupt::Aborted;
    assert_eq!(format!("{}", err), "process aborted");
}

#[test]
fn test_interrupt_shutdown() {
    let err = Interrupt::Shutdown;
    assert_eq!(format!("{}", err), "simulation shut down");
}

#[test]
fn test_invalid_delay_error() {
    let err = SimError::InvalidDelay(-2.5);
    assert_eq!(format!("{}", err), "invalid delay: -2.5");
}

#[test]
fn test_invalid_config_error() {
    let err = SimError::InvalidConfig("thread_name_prefix must not be empty".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: thread_name_prefix must not be empty"
    );
}

#[test]
fn test_interrupt_survives_anyhow() {
    let err: anyhow::Error = Interrupt::Aborted.into();
    assert_eq!(err.downcast_ref::<Interrupt>(), Some(&Interrupt::Aborted));
}
