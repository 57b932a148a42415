//! Action traits and the result reported for a run.
//!
//! An [`Action`] is the unit of scheduled work. Every action can be executed;
//! some additionally consume data streams or accept variable arguments. Those
//! optional capabilities are queried at invocation time through
//! [`Action::as_stream_consumer`] and [`Action::as_var_args`] rather than
//! expressed as separate action types.
//!
//! # Example
//!
//! ```rust,ignore
//! use action_runner::core::{Action, ActionExecutionError, Identity, ParameterSet};
//!
//! struct Cleanup { done: bool }
//!
//! impl Action for Cleanup {
//!     fn name(&self) -> &str { "cleanup" }
//!
//!     fn execute(&mut self, _params: &ParameterSet, identity: &Identity)
//!         -> Result<(), ActionExecutionError>
//!     {
//!         tracing::info!(user = %identity.username(), "purging temp files");
//!         self.done = true;
//!         Ok(())
//!     }
//!
//!     fn is_execution_successful(&self) -> bool { self.done }
//! }
//! ```

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use super::error::ActionExecutionError;
use super::identity::Identity;
use super::params::{ParamValue, ParameterSet};

/// Input stream handed to a stream-consuming action.
pub type InputStream = Box<dyn Read + Send>;

/// Output stream handed to a stream-consuming action.
pub type OutputStream = Box<dyn Write + Send>;

/// A unit of scheduled work.
///
/// Constructed by the caller and handed once to an
/// [`ActionInvoker`](crate::core::ActionInvoker); never run concurrently.
pub trait Action: Send {
    /// Name used in logs, audit events and error messages.
    fn name(&self) -> &str;

    /// Run the action with the given parameters as `identity`.
    ///
    /// # Errors
    ///
    /// Returns the action's own failure; the invoker passes it through
    /// unchanged.
    fn execute(
        &mut self,
        params: &ParameterSet,
        identity: &Identity,
    ) -> Result<(), ActionExecutionError>;

    /// Whether the last `execute` achieved its goal. Queried after the run.
    fn is_execution_successful(&self) -> bool {
        true
    }

    /// Stream capability, if the action consumes an input stream and
    /// produces file output.
    fn as_stream_consumer(&mut self) -> Option<&mut dyn StreamConsumer> {
        None
    }

    /// Variable-argument capability, if the action accepts parameters it
    /// does not name up front.
    fn as_var_args(&mut self) -> Option<&mut dyn VarArgsAction> {
        None
    }
}

/// Capability of actions that read an input stream and write file output.
pub trait StreamConsumer {
    /// Receive the input stream before execution.
    fn set_input_stream(&mut self, input: InputStream);

    /// Receive the output stream bound to the stored artifact.
    fn set_output_stream(&mut self, output: OutputStream);

    /// File extension of the produced artifact (without the dot), used to
    /// expand a trailing `.*` in the output file name.
    fn output_extension(&self) -> Option<&str> {
        None
    }
}

/// Capability of actions that accept arbitrary extra parameters.
pub trait VarArgsAction {
    /// Receive the full positional expansion of the parameter set before
    /// execution.
    fn set_var_args(&mut self, args: Vec<(String, ParamValue)>);
}

/// Outcome of a single run, as reported to the trigger engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Value of [`Action::is_execution_successful`] after the run, or
    /// `false` if the run failed.
    pub success: bool,
    /// Failure description when the run did not complete.
    pub error: Option<String>,
}

impl ActionResult {
    /// Result of a run that completed; `success` comes from the action.
    #[must_use]
    pub const fn completed(success: bool) -> Self {
        Self {
            success,
            error: None,
        }
    }

    /// Result of a run that failed with `error`.
    pub fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
        }
    }
}
