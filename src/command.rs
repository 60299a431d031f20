/*!
command.rs - capability seam between the dispatcher and the wrapped console.

Every wrapped schema / codegen / query toolkit plugs in through two traits:

  - `ConsoleCommand`  one external command instance (configure, options, args, run)
  - `CommandFactory`  builds a fresh instance for a console command name

The dispatcher never looks inside a command; it only drives this interface.
*/

use anyhow::Result;
use serde::Serialize;
use std::fmt;

use crate::context::HelperContext;

/* ---- Values ---- */

/// Value attached to a forwarded option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean switch (`--force`)
    Flag(bool),
    /// Single value (`--num-spaces=4`)
    Text(String),
    /// Repeatable value (`--filter=User --filter=Post`)
    List(Vec<String>),
}

impl OptionValue {
    /// Whether a flag is switched on. Non-flag values count as set.
    pub fn is_set(&self) -> bool {
        match self {
            OptionValue::Flag(b) => *b,
            OptionValue::Text(_) => true,
            OptionValue::List(v) => !v.is_empty(),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Flag(b)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Text(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Text(s)
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Flag(b) => write!(f, "{b}"),
            OptionValue::Text(s) => f.write_str(s),
            OptionValue::List(v) => f.write_str(&v.join(",")),
        }
    }
}

/// Outcome reported by an external command, passed through unmodified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/* ---- Capabilities ---- */

/// One instance of a wrapped console command.
///
/// Call order used by the dispatcher: `configure`, then `set_option` for each
/// forwarded option, then `set_argument` in declared positional order, then
/// `run` exactly once.
pub trait ConsoleCommand {
    /// External command name (e.g. `orm:schema-tool:update`).
    fn name(&self) -> &str;

    /// Attach the shared connection / metadata context.
    fn configure(&mut self, helpers: &HelperContext);

    fn set_option(&mut self, key: &str, value: &OptionValue);

    /// Bind a positional argument. Positional order is the call order.
    fn set_argument(&mut self, key: &str, value: &str);

    /// Execute. `Err` means the command could not be launched at all;
    /// a launched command that fails reports a non-zero `exit_code`.
    fn run(&mut self) -> Result<ExecutionResult>;
}

/// Injected command-execution capability: turns a console command name into
/// a fresh, unconfigured command instance.
pub trait CommandFactory {
    fn create(&self, command: &str) -> Box<dyn ConsoleCommand>;
}

impl<F> CommandFactory for F
where
    F: Fn(&str) -> Box<dyn ConsoleCommand>,
{
    fn create(&self, command: &str) -> Box<dyn ConsoleCommand> {
        self(command)
    }
}
