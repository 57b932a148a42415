//! Single invocation of an action.
//!
//! An [`ActionInvoker`] binds an action to its parameters, acting user and
//! optional stream provider, and runs it once:
//!
//! 1. impersonate the acting user for everything below,
//! 2. bind the input stream if the action consumes streams,
//! 3. resolve the output location and add the repository parameters,
//! 4. execute the action,
//! 5. release the action's streams and remove the artifact if it is empty.

use std::sync::Arc;

use tracing::{debug, info, info_span, warn};

use super::action::{Action, ActionResult};
use super::error::{ActionInvocationError, InvokerError};
use super::identity::ImpersonationScope;
use super::output_path::{expand_wildcard, parent_directory, OutputPathResolver};
use super::params::ParameterSet;
use super::services::{Repository, RunnerServices, StreamProvider};

/// Parameter telling a stream-writing action to store output in the
/// content repository.
pub const KEY_USE_REPOSITORY: &str = "use_repository";

/// Parameter carrying the repository folder that receives the output.
pub const KEY_REPOSITORY_OUTPUT_PATH: &str = "repository_output_path";

/// Add the derived repository parameters for `output_path`, keeping any
/// value the caller already set.
///
/// `use_repository` becomes `true` and `repository_output_path` the parent
/// directory of `output_path`.
pub fn add_repository_params(params: &mut ParameterSet, output_path: &str) {
    params.insert_if_absent(KEY_USE_REPOSITORY, true);
    params.insert_if_absent(KEY_REPOSITORY_OUTPUT_PATH, parent_directory(output_path));
}

/// Runs one action once.
pub struct ActionInvoker {
    action: Box<dyn Action>,
    acting_user: String,
    params: ParameterSet,
    stream_provider: Option<Box<dyn StreamProvider>>,
    services: RunnerServices,
    output_file_path: Option<String>,
}

impl ActionInvoker {
    /// Bind an action to its invocation inputs.
    pub fn new(
        action: Box<dyn Action>,
        acting_user: impl Into<String>,
        params: ParameterSet,
        stream_provider: Option<Box<dyn StreamProvider>>,
        services: RunnerServices,
    ) -> Self {
        Self {
            action,
            acting_user: acting_user.into(),
            params,
            stream_provider,
            services,
            output_file_path: None,
        }
    }

    /// The user the action runs as.
    #[must_use]
    pub fn acting_user(&self) -> &str {
        &self.acting_user
    }

    /// Name of the wrapped action.
    #[must_use]
    pub fn action_name(&self) -> &str {
        self.action.name()
    }

    /// Run the action. Consumes the invoker, so it runs at most once.
    ///
    /// # Errors
    ///
    /// - [`InvokerError::Invocation`] if a stream cannot be acquired or no
    ///   output location qualifies; the action is not executed.
    /// - [`InvokerError::InvalidPath`] if the provider's output path is
    ///   malformed; the action is not executed.
    /// - [`InvokerError::Execution`] with the action's own error, unchanged.
    pub fn run(mut self) -> Result<ActionResult, InvokerError> {
        let span = info_span!("action_run", action = %self.action.name(), user = %self.acting_user);
        let _entered = span.enter();

        // Output checks and cleanup run as the acting user too.
        let impersonator = Arc::clone(&self.services.impersonator);
        let scope = ImpersonationScope::enter(impersonator.as_ref(), &self.acting_user);

        if self.stream_provider.is_some() {
            self.prepare_streams()?;
        }

        if let Some(var_args) = self.action.as_var_args() {
            var_args.set_var_args(self.params.expand_positional());
        }
        debug!(params = self.params.len(), "Executing action");
        let outcome = self.action.execute(&self.params, scope.identity());
        let success = self.action.is_execution_successful();

        let Self {
            action,
            stream_provider,
            services,
            output_file_path,
            ..
        } = self;
        // Dropping the action closes its output stream, flushing buffered bytes.
        drop(action);
        drop(stream_provider);
        if let Some(path) = output_file_path.as_deref() {
            delete_file_if_empty(services.repository.as_ref(), path);
        }
        drop(scope);
        outcome?;

        info!(success, "Action finished");
        Ok(ActionResult::completed(success))
    }

    fn prepare_streams(&mut self) -> Result<(), InvokerError> {
        let Some(provider) = self.stream_provider.as_mut() else {
            return Ok(());
        };

        if let Some(consumer) = self.action.as_stream_consumer() {
            let input = provider
                .input_stream()
                .map_err(|e| ActionInvocationError::new("acquiring input stream", e))?;
            consumer.set_input_stream(input);
        }

        let requested = provider
            .output_path()
            .map_err(|e| ActionInvocationError::new("reading output path", e))?;
        let resolver = OutputPathResolver::resolve(&requested, &self.acting_user)?;
        let resolved = resolver
            .resolve_output_file_path(
                self.services.repository.as_ref(),
                self.services.authorization.as_ref(),
                &self.services.output,
            )
            .map_err(|e| ActionInvocationError::new("resolving output location", e))?;

        add_repository_params(&mut self.params, &resolved);
        if resolved != requested {
            provider.set_output_path(resolved.clone());
        }

        if let Some(consumer) = self.action.as_stream_consumer() {
            let artifact = expand_wildcard(&resolved, consumer.output_extension());
            provider.set_output_path(artifact.clone());
            let output = provider
                .output_stream()
                .map_err(|e| ActionInvocationError::new("acquiring output stream", e))?;
            consumer.set_output_stream(output);
            debug!(artifact = %artifact, "Output stream bound");
            self.output_file_path = Some(artifact);
        }
        Ok(())
    }
}

/// Remove the artifact at `path` if it exists and is empty. Failures are
/// logged only.
fn delete_file_if_empty(repository: &dyn Repository, path: &str) {
    match repository.get_file(path) {
        Ok(Some(file)) if !file.is_folder() && file.size == 0 => {
            match repository.delete_file(&file) {
                Ok(()) => info!(path, "Deleted empty output file"),
                Err(e) => warn!(path, error = %e, "Failed to delete empty output file"),
            }
        }
        Ok(_) => {}
        Err(e) => warn!(path, error = %e, "Failed to look up output file"),
    }
}

impl std::fmt::Debug for ActionInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionInvoker")
            .field("action", &self.action.name())
            .field("acting_user", &self.acting_user)
            .field("params", &self.params)
            .field("stream_provider", &self.stream_provider.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::ParamValue;

    #[test]
    fn repository_params_added_when_absent() {
        let mut params: ParameterSet = [("key1", "value1"), ("key2", "value2")].into_iter().collect();
        add_repository_params(&mut params, "/home/janeDoe/reports/someJob.*");
        assert_eq!(params.get(KEY_USE_REPOSITORY).and_then(ParamValue::as_bool), Some(true));
        assert_eq!(
            params.get(KEY_REPOSITORY_OUTPUT_PATH).and_then(ParamValue::as_str),
            Some("/home/janeDoe/reports")
        );
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn repository_params_never_overwritten() {
        let mut params: ParameterSet = [("key1", "value1"), ("key2", "value2")].into_iter().collect();
        params.insert(KEY_USE_REPOSITORY, false);
        params.insert(KEY_REPOSITORY_OUTPUT_PATH, "/home/sally/super/secret");
        add_repository_params(&mut params, "/home/janeDoe/reports/someJob.*");
        assert_eq!(params.get(KEY_USE_REPOSITORY).and_then(ParamValue::as_bool), Some(false));
        assert_eq!(
            params.get(KEY_REPOSITORY_OUTPUT_PATH).and_then(ParamValue::as_str),
            Some("/home/sally/super/secret")
        );
    }
}
