//! Error types for action invocation and output-path resolution.

use thiserror::Error;

/// Boxed error that can cross thread boundaries. Collaborator failures
/// (stream providers, repositories) are carried as this type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An output-path pattern that cannot be split into directory and file name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid output path `{pattern}`: no path separator")]
pub struct InvalidPathError {
    /// The offending pattern.
    pub pattern: String,
}

/// Failure to prepare an invocation (stream acquisition, output location).
///
/// This is the single checked failure boundary of [`ActionInvoker::run`]:
/// the cause is kept as the error's `source()`.
///
/// [`ActionInvoker::run`]: crate::core::ActionInvoker::run
#[derive(Debug, Error)]
#[error("action invocation failed: {message}")]
pub struct ActionInvocationError {
    /// What the invoker was doing when the cause surfaced.
    pub message: String,
    /// The underlying failure.
    #[source]
    pub source: BoxError,
}

impl ActionInvocationError {
    /// Wrap `source` with a short description of the failed step.
    pub fn new(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: source.into(),
        }
    }
}

/// Failure raised by an action's own `execute`.
#[derive(Debug, Error)]
#[error("action `{action}` failed: {message}")]
pub struct ActionExecutionError {
    /// Name of the failing action.
    pub action: String,
    /// Human-readable failure description.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<BoxError>,
}

impl ActionExecutionError {
    /// Create an execution error without an underlying cause.
    pub fn new(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create an execution error wrapping `source`.
    pub fn with_source(
        action: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self {
            action: action.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Errors reported by a content repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// No file or folder exists at the given path or id.
    #[error("repository entry not found: {0}")]
    NotFound(String),
    /// Backend-specific failure with context.
    #[error("repository backend error: {0}")]
    Backend(String),
}

/// Errors produced while choosing where scheduled output is written.
#[derive(Debug, Error)]
pub enum OutputPathError {
    /// Neither the requested directory nor any fallback accepts scheduled output.
    #[error("no schedulable output location for `{requested}` (user `{user}`)")]
    NoSchedulableLocation {
        /// The requested output-path pattern.
        requested: String,
        /// The acting user.
        user: String,
    },
}

/// Everything [`ActionInvoker::run`] can fail with.
///
/// Execution errors are passed through unchanged; they are the action's own
/// contract.
///
/// [`ActionInvoker::run`]: crate::core::ActionInvoker::run
#[derive(Debug, Error)]
pub enum InvokerError {
    /// Stream acquisition or output-location failure.
    #[error(transparent)]
    Invocation(#[from] ActionInvocationError),
    /// The output-path pattern is malformed.
    #[error(transparent)]
    InvalidPath(#[from] InvalidPathError),
    /// The action's `execute` failed.
    #[error(transparent)]
    Execution(#[from] ActionExecutionError),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
