//! Process-backed console (the production `CommandFactory`).
//!
//! ConsoleTarget::parse -> program + leading args (shell-style split)
//! ProcessFactory       -> ProcessCommand per console command name
//! ProcessCommand::run  -> spawn, capture stdout/stderr, report exit code
//!
//! argv layout: <program> <target args..> <command> --no-interaction [--em=NAME]
//!              <options sorted by name..> <positional values in bound order..>
//!
use anyhow::{Context, Result, bail};
use shell_words::split as shell_split;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::command::{CommandFactory, ConsoleCommand, ExecutionResult, OptionValue};
use crate::context::HelperContext;

/// Console used when nothing else is configured.
pub const DEFAULT_CONSOLE: &str = "vendor/bin/doctrine";

/// A parsed console command line (`php bin/console`, `vendor/bin/doctrine`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleTarget {
    pub program: String,
    pub args: Vec<String>,
}

impl ConsoleTarget {
    /// Split a console command line with shell-style quoting rules.
    ///
    /// - "vendor/bin/doctrine"           -> program only
    /// - "php bin/console --env=prod"    -> program + leading args
    /// - "php '/srv/my app/bin/console'" -> quoted path kept whole
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            bail!("Console command line is empty");
        }
        let parts =
            shell_split(trimmed).context("Failed to parse console command line (shell splitting)")?;
        let Some((program, rest)) = parts.split_first() else {
            bail!("No tokens produced when parsing console command line");
        };
        if program.is_empty() {
            bail!("Empty program name in console command line");
        }
        Ok(Self {
            program: program.clone(),
            args: rest.to_vec(),
        })
    }
}

impl fmt::Display for ConsoleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.program)
        } else {
            write!(f, "{} {}", self.program, self.args.join(" "))
        }
    }
}

/* ---- Factory ---- */

#[derive(Debug, Clone)]
pub struct ProcessFactory {
    target: ConsoleTarget,
}

impl ProcessFactory {
    pub fn new(target: ConsoleTarget) -> Self {
        Self { target }
    }
}

impl CommandFactory for ProcessFactory {
    fn create(&self, command: &str) -> Box<dyn ConsoleCommand> {
        Box::new(ProcessCommand::new(self.target.clone(), command))
    }
}

/* ---- Command ---- */

#[derive(Debug, Clone)]
pub struct ProcessCommand {
    target: ConsoleTarget,
    command: String,
    options: BTreeMap<String, OptionValue>,
    arguments: Vec<String>,
    working_dir: Option<PathBuf>,
    env: BTreeMap<String, String>,
    entity_manager: Option<String>,
}

impl ProcessCommand {
    pub fn new(target: ConsoleTarget, command: impl Into<String>) -> Self {
        Self {
            target,
            command: command.into(),
            options: BTreeMap::new(),
            arguments: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
            entity_manager: None,
        }
    }

    /// Arguments passed to the console program (program itself excluded).
    pub fn argv(&self) -> Vec<String> {
        let mut argv = self.target.args.clone();
        argv.push(self.command.clone());
        argv.push("--no-interaction".to_string());
        if let Some(em) = &self.entity_manager {
            argv.push(format!("--em={em}"));
        }
        for (key, value) in &self.options {
            match value {
                OptionValue::Flag(true) => argv.push(format!("--{key}")),
                OptionValue::Flag(false) => {}
                OptionValue::Text(v) => argv.push(format!("--{key}={v}")),
                OptionValue::List(vs) => {
                    for v in vs {
                        argv.push(format!("--{key}={v}"));
                    }
                }
            }
        }
        argv.extend(self.arguments.iter().cloned());
        argv
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    async fn run_async(&self) -> Result<ExecutionResult> {
        let argv = self.argv();
        debug!(program = %self.target.program, ?argv, "spawning console");

        let mut cmd = Command::new(&self.target.program);
        cmd.args(&argv)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .await
            .with_context(|| format!("Failed to spawn console: {}", self.target))?;

        // Terminated by signal: no code, report plain failure.
        let exit_code = output.status.code().unwrap_or(1);
        trace!(exit_code, "console exited");

        Ok(ExecutionResult {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl ConsoleCommand for ProcessCommand {
    fn name(&self) -> &str {
        &self.command
    }

    fn configure(&mut self, helpers: &HelperContext) {
        self.working_dir = helpers.working_dir.clone();
        self.entity_manager = helpers.entity_manager.clone();
        self.env = helpers.env.clone();
        if let Some(url) = &helpers.database_url {
            self.env.insert("DATABASE_URL".to_string(), url.to_string());
        }
    }

    fn set_option(&mut self, key: &str, value: &OptionValue) {
        self.options.insert(key.to_string(), value.clone());
    }

    fn set_argument(&mut self, _key: &str, value: &str) {
        self.arguments.push(value.to_string());
    }

    fn run(&mut self) -> Result<ExecutionResult> {
        let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
        rt.block_on(self.run_async())
    }
}
