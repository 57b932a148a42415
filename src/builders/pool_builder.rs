//! Builders to construct started worker pools from configuration.

use std::sync::Arc;

use anyhow::{anyhow, Context};

use crate::config::WorkerPoolConfig;
use crate::core::{AppResult, AuditSink, PoolError, ThreadRegistry, TracingAuditSink, WorkerPool};

/// Validate `cfg`, build a pool that reports to `audit`, and start it.
///
/// # Errors
///
/// Invalid configuration or thread-spawn failure.
pub fn build_pool(
    cfg: WorkerPoolConfig,
    registry: ThreadRegistry,
    audit: Arc<dyn AuditSink>,
) -> Result<WorkerPool, PoolError> {
    let pool = WorkerPool::with_parts(cfg, registry, audit)?;
    pool.start()?;
    Ok(pool)
}

/// Build and start a pool configured from the environment (and `.env`),
/// logging runs through `tracing`.
///
/// # Errors
///
/// Configuration that cannot be parsed or validated, or a pool that fails
/// to start.
pub fn build_pool_from_env() -> AppResult<WorkerPool> {
    let cfg = WorkerPoolConfig::from_env()
        .map_err(|e| anyhow!(e))
        .context("loading worker pool configuration")?;
    let name = cfg.instance_name.clone();
    build_pool(cfg, ThreadRegistry::new(), Arc::new(TracingAuditSink))
        .with_context(|| format!("starting worker pool `{name}`"))
}
