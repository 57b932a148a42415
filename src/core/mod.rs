//! Action invocation, output-path resolution and the worker pool.

pub mod action;
pub mod audit;
pub mod error;
pub mod identity;
pub mod invoker;
pub mod output_path;
pub mod params;
pub mod services;
pub mod worker_pool;

pub use action::{
    Action, ActionResult, InputStream, OutputStream, StreamConsumer, VarArgsAction,
};
pub use audit::{
    build_audit_event, AuditEvent, AuditSink, InMemoryAuditSink, RunPhase, TracingAuditSink,
};
pub use error::{
    ActionExecutionError, ActionInvocationError, AppResult, BoxError, InvalidPathError,
    InvokerError, OutputPathError, RepositoryError,
};
pub use identity::{run_as_user, Identity, ImpersonationScope, Impersonator};
pub use invoker::{
    add_repository_params, ActionInvoker, KEY_REPOSITORY_OUTPUT_PATH, KEY_USE_REPOSITORY,
};
pub use output_path::{expand_wildcard, parent_directory, OutputPathResolver};
pub use params::{ParamValue, ParameterSet, Primitive, WireParamValue};
pub use services::{
    AuthorizationPolicy, Repository, RepositoryFile, RunnerServices, StreamProvider,
    SCHEDULABLE_KEY, SCHEDULER_ACTION_NAME,
};
pub use worker_pool::{
    PoolError, PoolState, PoolStats, RunHandle, ShutdownReport, ThreadInfo, ThreadRegistry,
    WorkerPool,
};
