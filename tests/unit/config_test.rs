//! Tests for configuration validation

use prometheus_sim_process::config::SimulationConfig;

#[test]
fn test_default_config_is_valid() {
    let config = SimulationConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.start_time, 0.0);
    assert_eq!(config.thread_name_prefix, "sim-process");
}

#[test]
fn test_builder_methods() {
    let config = SimulationConfig::new()
        .with_start_time(3.5)
        .with_stack_size(256 * 1024)
        .with_thread_name_prefix("model");
    assert_eq!(config.start_time, 3.5);
    assert_eq!(config.thread_stack_size, 256 * 1024);
    assert_eq!(config.thread_name_prefix, "model");
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_start_time() {
    let config = SimulationConfig::new().with_start_time(f64::INFINITY);
    assert!(config.validate().is_err());
}

#[test]
fn test_invalid_stack_size() {
    let config = SimulationConfig::new().with_stack_size(1024);
    assert!(config.validate().is_err());
}

#[test]
fn test_invalid_thread_name_prefix() {
    let config = SimulationConfig::new().with_thread_name_prefix("");
    assert!(config.validate().is_err());
}

#[test]
fn test_config_from_json() {
    let json = r#"{
        "start_time": 10.0,
        "thread_stack_size": 1048576,
        "thread_name_prefix": "worker"
    }"#;

    let config = SimulationConfig::from_json_str(json).unwrap();
    assert_eq!(config.start_time, 10.0);
    assert_eq!(config.thread_stack_size, 1_048_576);
    assert_eq!(config.thread_name_prefix, "worker");
}

#[test]
fn test_config_from_json_uses_defaults() {
    let config = SimulationConfig::from_json_str(r#"{ "start_time": 2.0 }"#).unwrap();
    assert_eq!(config.start_time, 2.0);
    assert_eq!(config.thread_stack_size, SimulationConfig::default().thread_stack_size);
}

#[test]
fn test_config_from_json_rejects_invalid() {
    assert!(SimulationConfig::from_json_str(r#"{ "thread_stack_size": 0 }"#).is_err());
    assert!(SimulationConfig::from_json_str("not json").is_err());
}

#[test]
fn test_config_from_env_defaults() {
    // Only reads; other tests in this binary never set SIM_* variables.
    if std::env::var_os("SIM_START_TIME").is_none()
        && std::env::var_os("SIM_THREAD_STACK_SIZE").is_none()
        && std::env::var_os("SIM_THREAD_NAME_PREFIX").is_none()
    {
        let config = SimulationConfig::from_env().unwrap();
        assert_eq!(config, SimulationConfig::default());
    }
}
