//! Tests for builder modules

use std::sync::Arc;

use action_runner::builders::build_pool;
use action_runner::config::WorkerPoolConfig;
use action_runner::core::{InMemoryAuditSink, PoolError, PoolState, ThreadRegistry};

#[test]
fn test_build_pool_starts_pool() {
    let registry = ThreadRegistry::new();
    let cfg = WorkerPoolConfig::new()
        .with_instance_name("Built")
        .with_worker_thread_count(2)
        .with_shutdown_poll(20, 50);

    let pool = build_pool(cfg, registry.clone(), Arc::new(InMemoryAuditSink::new(8)))
        .expect("pool should start");
    assert_eq!(pool.state(), PoolState::Started);
    assert_eq!(registry.live_count(), 3);

    assert!(pool.shutdown().is_clean());
    assert_eq!(registry.live_count(), 0);
}

#[test]
fn test_build_pool_rejects_invalid_config() {
    let cfg = WorkerPoolConfig::new().with_worker_thread_count(0);
    let result = build_pool(cfg, ThreadRegistry::new(), Arc::new(InMemoryAuditSink::new(8)));
    assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
}

#[test]
fn test_build_pool_from_env_uses_defaults() {
    let pool = action_runner::builders::build_pool_from_env().expect("pool should start");
    assert_eq!(pool.state(), PoolState::Started);
    assert!(pool.live_threads().len() > 1);
    assert!(pool.shutdown().is_clean());
}
