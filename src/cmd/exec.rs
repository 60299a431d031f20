/*!
`exec.rs`

Implements `orm-tasks exec <OPERATION>`: builds an `InvocationRequest` from
the command line and hands it to the dispatcher with the process console.

Inputs:
  --opt KEY[=VALUE]      (repeatable; bare KEY means true)
  --arg KEY=VALUE        (repeatable; named positional)
  VALUE...               (fill remaining positionals in declared order)
  --options-file PATH    (JSON or YAML object; CLI --opt wins per key)

Output:
  human : console stdout / stderr relayed verbatim
  --json: one object (below)

Exit code: the console's own exit code; 2 for usage errors.

JSON Success Output:
{
  "status": "ok",
  "operation": "schema-update",
  "command": "orm:schema-tool:update",
  "console": "vendor/bin/doctrine",
  "elapsed_ms": 420,
  "options": { "dump-sql": true },
  "ignored_options": ["unknownFlag"],
  "arguments": {},
  "exit_code": 0,
  "stdout": "...",
  "stderr": ""
}

JSON Error Output:
{ "status": "error", "error": "message", "exit_code": 2 }
*/

use anyhow::Result;
use clap::Args;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::debug;

use crate::cmd::shared::{
    build_options, collect_arguments, load_options_file, merge_options_file, output_error,
    parse_named_arg, parse_option_flag,
};
use orm_tasks::config::Settings;
use orm_tasks::console::ProcessFactory;
use orm_tasks::dispatch::filter_options;
use orm_tasks::{DispatchError, Dispatcher, InvocationRequest, OptionValue, registry};

/* -------------------------------------------------------------------------- */
/* Argument Struct                                                            */
/* -------------------------------------------------------------------------- */

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Operation to run (see `orm-tasks list`)
    #[arg(value_name = "OPERATION")]
    pub operation: String,

    /// Positional values, filled in declared order
    #[arg(value_name = "VALUE")]
    pub values: Vec<String>,

    /// Console option (KEY or KEY=VALUE), repeatable
    #[arg(short = 'o', long = "opt", value_name = "KEY[=VALUE]")]
    pub opts: Vec<String>,

    /// Named positional argument (KEY=VALUE), repeatable
    #[arg(short = 'a', long = "arg", value_name = "KEY=VALUE")]
    pub args: Vec<String>,

    /// Load options from file (JSON or YAML). CLI --opt overrides file entries
    #[arg(long = "options-file", value_name = "PATH")]
    pub options_file: Option<String>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

/* -------------------------------------------------------------------------- */
/* Public Entry Point                                                         */
/* -------------------------------------------------------------------------- */

/// Returns the process exit code.
pub fn execute_exec(args: ExecArgs, settings: &Settings) -> Result<i32> {
    let request = match build_request(&args) {
        Ok(r) => r,
        Err(e) => return Ok(output_error(args.json, "Exec Error", &format!("{e:#}"), 2)),
    };

    let ignored: Vec<&str> = match registry::find(&request.operation) {
        Some(op) => {
            let kept = filter_options(op, &request.options);
            request
                .options
                .keys()
                .map(String::as_str)
                .filter(|k| !kept.iter().any(|(name, _)| name == k))
                .collect()
        }
        None => Vec::new(),
    };
    if !ignored.is_empty() {
        debug!(?ignored, "options not accepted by {}", request.operation);
    }

    let dispatcher = Dispatcher::new(ProcessFactory::new(settings.console.clone()));
    let started = Instant::now();
    let result = dispatcher.dispatch(&request, &settings.helpers);
    let elapsed_ms = started.elapsed().as_millis();

    match result {
        Ok(out) => {
            if args.json {
                let forwarded: BTreeMap<&str, &OptionValue> = request
                    .options
                    .iter()
                    .filter(|(k, _)| !ignored.contains(&k.as_str()))
                    .map(|(k, v)| (k.as_str(), v))
                    .collect();
                let command = registry::find(&request.operation).map(|op| op.command);
                let body = serde_json::json!({
                    "status": "ok",
                    "operation": request.operation,
                    "command": command,
                    "console": settings.console.to_string(),
                    "elapsed_ms": elapsed_ms,
                    "options": forwarded,
                    "ignored_options": ignored,
                    "arguments": request.args,
                    "exit_code": out.exit_code,
                    "stdout": out.stdout,
                    "stderr": out.stderr,
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string())
                );
            } else {
                print!("{}", out.stdout);
                eprint!("{}", out.stderr);
            }
            Ok(out.exit_code)
        }
        Err(e) => Ok(report_dispatch_error(args.json, &e)),
    }
}

/* -------------------------------------------------------------------------- */
/* Request Building                                                           */
/* -------------------------------------------------------------------------- */

fn build_request(args: &ExecArgs) -> Result<InvocationRequest> {
    let operation = args.operation.trim().to_string();
    if operation.is_empty() {
        anyhow::bail!("operation name cannot be empty");
    }

    // Unknown operation: let the dispatcher reject it.
    let Some(op) = registry::find(&operation) else {
        return Ok(InvocationRequest::new(operation));
    };

    let raw_opts = args
        .opts
        .iter()
        .map(|o| parse_option_flag(o))
        .collect::<Result<Vec<_>>>()?;
    let mut options = build_options(op, &raw_opts)?;

    if let Some(path) = &args.options_file {
        let file = load_options_file(path)?;
        merge_options_file(op, &file, &mut options)?;
    }

    let named = args
        .args
        .iter()
        .map(|a| parse_named_arg(a))
        .collect::<Result<Vec<_>>>()?;
    let arguments = collect_arguments(op, &named, &args.values)?;

    Ok(InvocationRequest {
        operation,
        options,
        args: arguments,
    })
}

/* -------------------------------------------------------------------------- */
/* Output Helpers                                                             */
/* -------------------------------------------------------------------------- */

fn report_dispatch_error(json: bool, err: &DispatchError) -> i32 {
    let code = err.exit_code();
    match err {
        DispatchError::ExternalCommandFailure {
            exit_code: Some(_),
            detail,
            stdout,
            ..
        } if !json => {
            // The console already explained itself; relay it untouched.
            print!("{stdout}");
            eprint!("{detail}");
            code
        }
        DispatchError::ExternalCommandFailure { stdout, .. } if json => {
            let body = serde_json::json!({
                "status": "error",
                "error": err.to_string(),
                "exit_code": code,
                "stdout": stdout,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string())
            );
            code
        }
        _ => output_error(json, "Exec Error", &err.to_string(), code),
    }
}

/* -------------------------------------------------------------------------- */
/* Tests                                                                       */
/* -------------------------------------------------------------------------- */
#[cfg(test)]
mod tests {
    use super::*;

    fn exec_args(operation: &str) -> ExecArgs {
        ExecArgs {
            operation: operation.to_string(),
            values: Vec::new(),
            opts: Vec::new(),
            args: Vec::new(),
            options_file: None,
            json: true,
        }
    }

    #[test]
    fn request_for_schema_update() {
        let mut a = exec_args("schema-update");
        a.opts = vec!["dump-sql".into(), "unknownFlag".into()];
        let req = build_request(&a).unwrap();
        assert_eq!(req.operation, "schema-update");
        assert_eq!(req.options.get("dump-sql"), Some(&OptionValue::Flag(true)));
        // kept in the request; the dispatcher drops it
        assert!(req.options.contains_key("unknownFlag"));
    }

    #[test]
    fn request_for_unknown_operation_is_bare() {
        let mut a = exec_args("no-such-op");
        a.opts = vec!["force".into()];
        let req = build_request(&a).unwrap();
        assert_eq!(req, InvocationRequest::new("no-such-op"));
    }

    #[test]
    fn request_positionals() {
        let mut a = exec_args("run-dql");
        a.values = vec!["SELECT u FROM App\\Entity\\User u".into()];
        a.opts = vec!["hydrate=array".into()];
        let req = build_request(&a).unwrap();
        assert_eq!(
            req.args.get("dql").map(String::as_str),
            Some("SELECT u FROM App\\Entity\\User u")
        );
    }

    #[test]
    fn empty_operation_rejected() {
        assert!(build_request(&exec_args("  ")).is_err());
    }

    #[test]
    fn bad_option_syntax_rejected() {
        let mut a = exec_args("schema-update");
        a.opts = vec!["force=perhaps".into()];
        assert!(build_request(&a).is_err());
    }

    #[test]
    fn unknown_operation_exits_with_usage_code() {
        let settings = Settings {
            console: orm_tasks::console::ConsoleTarget::parse("orm-tasks-no-such-console").unwrap(),
            helpers: orm_tasks::HelperContext::new(),
            source: None,
        };
        assert_eq!(execute_exec(exec_args("schema-explode"), &settings).unwrap(), 2);
    }
}
