/*!
dispatch.rs - the option-dispatch adapter.

`Dispatcher::dispatch` is the only non-delegated logic in the crate:

  1. resolve the operation in the registry          (UnknownOperation)
  2. keep only options the operation accepts        (unknown ones dropped)
  3. resolve positional args in declared order      (MissingArgument)
  4. build the command via the injected factory
  5. configure(helpers) -> set_option* -> set_argument* -> run (once)

Steps 1-3 happen before any external call, so a rejected request never
constructs a command. The dispatcher holds no per-call state.
*/

use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::command::{CommandFactory, ExecutionResult, OptionValue};
use crate::context::HelperContext;
use crate::registry::{self, OperationDescriptor};

/* ---- Request / Errors ---- */

/// One call: operation name plus whatever the caller supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationRequest {
    pub operation: String,
    pub options: BTreeMap<String, OptionValue>,
    pub args: BTreeMap<String, String>,
}

impl InvocationRequest {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Default::default()
        }
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("missing required argument: {0}")]
    MissingArgument(String),

    #[error("{command} failed: {}", failure_summary(exit_code, detail))]
    ExternalCommandFailure {
        command: String,
        /// `None` when the command never started.
        exit_code: Option<i32>,
        /// The command's stderr verbatim, or the launch error.
        detail: String,
        /// Output produced before the failure, verbatim.
        stdout: String,
    },
}

impl DispatchError {
    /// Process exit code for a CLI surface: the external command's own code
    /// when it ran, 1 when it could not be launched, 2 for usage errors.
    pub fn exit_code(&self) -> i32 {
        if self.is_usage() {
            return 2;
        }
        match self {
            DispatchError::ExternalCommandFailure { exit_code, .. } => exit_code.unwrap_or(1),
            _ => 1,
        }
    }

    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            DispatchError::UnknownOperation(_) | DispatchError::MissingArgument(_)
        )
    }
}

fn failure_summary(exit_code: &Option<i32>, detail: &str) -> String {
    let detail = detail.trim_end();
    match exit_code {
        Some(code) if detail.is_empty() => format!("exit code {code}"),
        _ => detail.to_string(),
    }
}

/* ---- Dispatcher ---- */

pub struct Dispatcher<F: CommandFactory> {
    factory: F,
}

impl<F: CommandFactory> Dispatcher<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    pub fn dispatch(
        &self,
        request: &InvocationRequest,
        helpers: &HelperContext,
    ) -> Result<ExecutionResult, DispatchError> {
        let descriptor = registry::find(&request.operation)
            .ok_or_else(|| DispatchError::UnknownOperation(request.operation.clone()))?;

        let options = filter_options(descriptor, &request.options);
        let args = bind_arguments(descriptor, &request.args)?;

        debug!(
            operation = descriptor.name,
            command = descriptor.command,
            options = options.len(),
            args = args.len(),
            "dispatching"
        );

        let mut command = self.factory.create(descriptor.command);
        command.configure(helpers);
        for (key, value) in options {
            command.set_option(key, value);
        }
        for (key, value) in args {
            command.set_argument(key, value);
        }

        let result = command
            .run()
            .map_err(|e| DispatchError::ExternalCommandFailure {
                command: descriptor.command.to_string(),
                exit_code: None,
                detail: format!("{e:#}"),
                stdout: String::new(),
            })?;

        if !result.success() {
            info!(
                command = descriptor.command,
                exit_code = result.exit_code,
                "external command reported failure"
            );
            return Err(DispatchError::ExternalCommandFailure {
                command: descriptor.command.to_string(),
                exit_code: Some(result.exit_code),
                detail: result.stderr,
                stdout: result.stdout,
            });
        }

        Ok(result)
    }
}

/// Intersect supplied options with the operation's accept-list.
pub fn filter_options<'a>(
    descriptor: &OperationDescriptor,
    supplied: &'a BTreeMap<String, OptionValue>,
) -> Vec<(&'a str, &'a OptionValue)> {
    let mut kept = Vec::with_capacity(supplied.len());
    for (key, value) in supplied {
        if descriptor.accepts(key) {
            kept.push((key.as_str(), value));
        } else {
            trace!(operation = descriptor.name, option = %key, "dropping unaccepted option");
        }
    }
    kept
}

/// Resolve positional arguments in declared order.
pub fn bind_arguments<'a>(
    descriptor: &OperationDescriptor,
    supplied: &'a BTreeMap<String, String>,
) -> Result<Vec<(&'static str, &'a str)>, DispatchError> {
    let mut bound = Vec::with_capacity(descriptor.args.len());
    for spec in descriptor.args {
        match supplied.get(spec.name) {
            Some(v) => bound.push((spec.name, v.as_str())),
            None if spec.required => {
                return Err(DispatchError::MissingArgument(spec.name.to_string()));
            }
            None => {}
        }
    }
    for key in supplied.keys() {
        if !descriptor.args.iter().any(|a| a.name == key) {
            trace!(operation = descriptor.name, arg = %key, "dropping undeclared argument");
        }
    }
    Ok(bound)
}
