//! Collaborator contracts the runner plugs into.
//!
//! The runner owns none of these. They are injected through
//! [`RunnerServices`] when an invoker is built; in-memory implementations for
//! development and tests live under [`crate::infra`].

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::action::{InputStream, OutputStream};
use super::error::{BoxError, RepositoryError};
use super::identity::Impersonator;
use crate::config::OutputConfig;

/// Metadata key that gates whether a folder may receive scheduled output.
pub const SCHEDULABLE_KEY: &str = "schedulable";

/// Capability a user must hold to write scheduled output.
pub const SCHEDULER_ACTION_NAME: &str = "scheduler.schedule";

/// File or folder stored in the content repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryFile {
    /// Repository-assigned identifier.
    pub id: String,
    /// Absolute repository path.
    pub path: String,
    /// Whether this entry is a folder.
    pub folder: bool,
    /// Content size in bytes (0 for folders).
    pub size: u64,
}

impl RepositoryFile {
    /// Whether this entry is a folder.
    #[must_use]
    pub const fn is_folder(&self) -> bool {
        self.folder
    }
}

/// Narrow view of the persisted content repository.
pub trait Repository: Send + Sync {
    /// Look up the entry at `path`.
    ///
    /// # Errors
    ///
    /// Backend failures. A missing entry is `Ok(None)`.
    fn get_file(&self, path: &str) -> Result<Option<RepositoryFile>, RepositoryError>;

    /// Metadata attached to the entry with id `id`.
    ///
    /// # Errors
    ///
    /// `RepositoryError::NotFound` if the id is unknown.
    fn get_file_metadata(
        &self,
        id: &str,
    ) -> Result<HashMap<String, serde_json::Value>, RepositoryError>;

    /// Delete `file`.
    ///
    /// # Errors
    ///
    /// `RepositoryError::NotFound` if it no longer exists, or a backend error.
    fn delete_file(&self, file: &RepositoryFile) -> Result<(), RepositoryError>;
}

/// Yes/no capability check for the acting user.
pub trait AuthorizationPolicy: Send + Sync {
    /// Whether the current user may perform `action_name`.
    fn is_allowed(&self, action_name: &str) -> bool;
}

/// Supplies the data streams and the nominal output path of a background run.
///
/// Owned by the caller and handed to exactly one invoker.
pub trait StreamProvider: Send {
    /// Stream the action reads from.
    ///
    /// # Errors
    ///
    /// Any acquisition failure; the invoker wraps it in an
    /// [`ActionInvocationError`](crate::core::ActionInvocationError).
    fn input_stream(&mut self) -> Result<InputStream, BoxError>;

    /// Stream writing to the artifact at the current output path.
    ///
    /// # Errors
    ///
    /// Any acquisition failure.
    fn output_stream(&mut self) -> Result<OutputStream, BoxError>;

    /// Nominal output path pattern, e.g. `/home/joe/reports/sales.*`.
    ///
    /// # Errors
    ///
    /// Any lookup failure.
    fn output_path(&self) -> Result<String, BoxError>;

    /// Replace the output path after resolution or wildcard expansion.
    fn set_output_path(&mut self, path: String);
}

/// Collaborators an invoker needs, injected explicitly.
#[derive(Clone)]
pub struct RunnerServices {
    /// Content repository for output validation and empty-output cleanup.
    pub repository: Arc<dyn Repository>,
    /// Capability checks.
    pub authorization: Arc<dyn AuthorizationPolicy>,
    /// Identity switching.
    pub impersonator: Arc<dyn Impersonator>,
    /// Output fallback settings.
    pub output: OutputConfig,
}

impl RunnerServices {
    /// Bundle the collaborators with default output settings.
    pub fn new(
        repository: Arc<dyn Repository>,
        authorization: Arc<dyn AuthorizationPolicy>,
        impersonator: Arc<dyn Impersonator>,
    ) -> Self {
        Self {
            repository,
            authorization,
            impersonator,
            output: OutputConfig::default(),
        }
    }

    /// Replace the output settings.
    #[must_use]
    pub fn with_output_config(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }
}

impl std::fmt::Debug for RunnerServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerServices")
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}
