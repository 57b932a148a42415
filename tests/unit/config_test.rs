//! Tests for configuration validation and loading

use std::collections::HashMap;

use action_runner::config::pool::{
    ENV_INSTANCE_NAME, ENV_SHUTDOWN_POLL_ATTEMPTS, ENV_SHUTDOWN_POLL_INTERVAL_MS,
    ENV_THREADS_DAEMON, ENV_THREAD_COUNT,
};
use action_runner::config::{OutputConfig, WorkerPoolConfig};

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn test_pool_config_defaults() {
    let cfg = WorkerPoolConfig::default();
    assert_eq!(cfg.instance_name, "ActionScheduler");
    assert_eq!(cfg.instance_id, "NON_CLUSTERED");
    assert!(cfg.worker_thread_count > 0);
    assert!(cfg.make_threads_daemons);
    assert!(cfg.make_dispatch_thread_daemon);
    assert_eq!(cfg.shutdown_poll_interval_ms, 1000);
    assert_eq!(cfg.shutdown_poll_attempts, 30);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_pool_config_invalid_values() {
    assert!(WorkerPoolConfig::new().with_instance_name("  ").validate().is_err());
    assert!(WorkerPoolConfig::new().with_worker_thread_count(0).validate().is_err());
    assert!(WorkerPoolConfig::new().with_shutdown_poll(10, 0).validate().is_err());
    assert!(WorkerPoolConfig::new().with_thread_stack_size(0).validate().is_err());
}

#[test]
fn test_pool_config_from_json() {
    let cfg = WorkerPoolConfig::from_json_str(
        r#"{"instance_name": "Nightly", "worker_thread_count": 4, "make_threads_daemons": false}"#,
    )
    .expect("valid config");
    assert_eq!(cfg.instance_name, "Nightly");
    assert_eq!(cfg.worker_thread_count, 4);
    assert!(!cfg.make_threads_daemons);
    assert_eq!(cfg.instance_id, "NON_CLUSTERED");

    let err = WorkerPoolConfig::from_json_str(r#"{"worker_thread_count": 0}"#).unwrap_err();
    assert!(err.contains("worker_thread_count"));
    assert!(WorkerPoolConfig::from_json_str("not json").is_err());
}

#[test]
fn test_pool_config_from_lookup() {
    let cfg = WorkerPoolConfig::from_lookup(lookup(&[
        (ENV_INSTANCE_NAME, "EnvScheduler"),
        (ENV_THREAD_COUNT, " 6 "),
        (ENV_THREADS_DAEMON, "false"),
        (ENV_SHUTDOWN_POLL_INTERVAL_MS, "250"),
        (ENV_SHUTDOWN_POLL_ATTEMPTS, "8"),
    ]))
    .expect("valid config");

    assert_eq!(cfg.instance_name, "EnvScheduler");
    assert_eq!(cfg.worker_thread_count, 6);
    assert!(!cfg.make_threads_daemons);
    assert!(cfg.make_dispatch_thread_daemon);
    assert_eq!(cfg.shutdown_poll_interval().as_millis(), 250);
    assert_eq!(cfg.shutdown_poll_attempts, 8);
}

#[test]
fn test_pool_config_from_lookup_rejects_garbage() {
    let err = WorkerPoolConfig::from_lookup(lookup(&[(ENV_THREAD_COUNT, "many")])).unwrap_err();
    assert!(err.contains(ENV_THREAD_COUNT));
}

#[test]
fn test_output_config_home_folder() {
    let cfg = OutputConfig::default();
    assert_eq!(cfg.home_folder("joe"), "/home/joe");
    assert_eq!(cfg.default_output_folder, None);

    let cfg = OutputConfig::default()
        .with_home_root("/users/")
        .with_default_output_folder("/public");
    assert_eq!(cfg.home_folder("suzy"), "/users/suzy");
    assert_eq!(cfg.default_output_folder.as_deref(), Some("/public"));
}
