//! Tests for error types

use std::error::Error as _;
use std::io;

use action_runner::core::{
    ActionExecutionError, ActionInvocationError, InvalidPathError, InvokerError, OutputPathError,
    PoolError, PoolState, RepositoryError,
};

#[test]
fn test_invalid_path_error() {
    let err = InvalidPathError {
        pattern: "report.*".to_string(),
    };
    assert_eq!(format!("{}", err), "invalid output path `report.*`: no path separator");
}

#[test]
fn test_invocation_error_keeps_source() {
    let err = ActionInvocationError::new(
        "acquiring input stream",
        io::Error::other("something went wrong"),
    );
    assert_eq!(format!("{}", err), "action invocation failed: acquiring input stream");
    assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("something went wrong"));
}

#[test]
fn test_execution_error() {
    let err = ActionExecutionError::new("sales_report", "template missing");
    assert_eq!(format!("{}", err), "action `sales_report` failed: template missing");
    assert!(err.source().is_none());

    let err = ActionExecutionError::with_source("sales_report", "write failed", "disk full");
    assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("disk full"));
}

#[test]
fn test_repository_error() {
    let err = RepositoryError::NotFound("/home/joe".to_string());
    assert_eq!(format!("{}", err), "repository entry not found: /home/joe");

    let err = RepositoryError::Backend("connection reset".to_string());
    assert_eq!(format!("{}", err), "repository backend error: connection reset");
}

#[test]
fn test_no_schedulable_location_error() {
    let err = OutputPathError::NoSchedulableLocation {
        requested: "/locked/out.*".to_string(),
        user: "joe".to_string(),
    };
    assert_eq!(
        format!("{}", err),
        "no schedulable output location for `/locked/out.*` (user `joe`)"
    );
}

#[test]
fn test_invoker_error_is_transparent() {
    let err: InvokerError = ActionExecutionError::new("etl", "bad row").into();
    assert_eq!(format!("{}", err), "action `etl` failed: bad row");
    assert!(matches!(err, InvokerError::Execution(_)));

    let err: InvokerError = InvalidPathError {
        pattern: "x".to_string(),
    }
    .into();
    assert!(matches!(err, InvokerError::InvalidPath(_)));
}

#[test]
fn test_pool_error() {
    let err = PoolError::NotStarted(PoolState::ShuttingDown);
    assert_eq!(format!("{}", err), "pool is not started (state: shutting down)");

    let err = PoolError::RunDropped;
    assert_eq!(format!("{}", err), "run was dropped before completion");

    let err = PoolError::InvalidConfig("worker_thread_count must be greater than 0".into());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: worker_thread_count must be greater than 0"
    );
}
