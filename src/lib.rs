//! # Action Runner
//!
//! Execution runner for scheduled actions.
//!
//! A trigger engine decides *when* a scheduled run fires; this crate decides
//! *how* it runs. Given an opaque action, its runtime parameters, the acting
//! user and an optional stream provider, it executes the action under that
//! user's identity, wires input and output streams when the action produces
//! file output, resolves where that output lands, and removes the artifact
//! again if the run left it empty.
//!
//! ## Components
//!
//! - **`OutputPathResolver`**: splits an output-path pattern such as
//!   `/home/joe/reports/sales.*` into directory and file name, and checks the
//!   directory against the repository with fallbacks to the user's home.
//! - **`ActionInvoker`**: one run of one action: stream binding, parameter
//!   augmentation, impersonated execution, empty-output cleanup.
//! - **`WorkerPool`**: a dispatch thread plus a fixed set of worker threads
//!   with a deterministic, observable shutdown.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use action_runner::config::WorkerPoolConfig;
//! use action_runner::core::{ActionInvoker, ParameterSet, RunnerServices, WorkerPool};
//! use action_runner::infra::repository::InMemoryRepository;
//! use action_runner::infra::security::{SessionImpersonator, StaticAuthorizationPolicy};
//!
//! let services = RunnerServices::new(
//!     Arc::new(InMemoryRepository::new()),
//!     Arc::new(StaticAuthorizationPolicy::allow_all()),
//!     Arc::new(SessionImpersonator::new()),
//! );
//!
//! let pool = WorkerPool::new(
//!     WorkerPoolConfig::new()
//!         .with_instance_name("NightlyReports")
//!         .with_worker_thread_count(4),
//! )?;
//! pool.start()?;
//!
//! let invoker = ActionInvoker::new(Box::new(my_action), "joe", ParameterSet::new(), None, services);
//! let result = pool.dispatch(invoker)?.wait(Duration::from_secs(60))?;
//! assert!(result.success);
//!
//! let report = pool.shutdown();
//! assert!(report.is_clean());
//! ```
//!
//! For complete examples, see:
//! - `tests/invoker_test.rs` - invocation scenarios
//! - `tests/worker_pool_test.rs` - pool lifecycle and thread accounting

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Actions, invocation, output-path resolution and the worker pool.
pub mod core;
/// Configuration models for the pool and output resolution.
pub mod config;
/// Builders to construct runner components from configuration.
pub mod builders;
/// In-memory collaborator implementations.
pub mod infra;
/// Shared utilities.
pub mod util;
