/*!
`get.rs`

Implements `orm-tasks get <OPERATION>`: the accepted options (name, kind,
help) and positional arguments (order, required, help) of one operation.

JSON Output Shape:
{
  "status": "ok",
  "operation": {
    "name": "generate-entities",
    "group": "generate",
    "summary": "...",
    "command": "orm:generate-entities",
    "options": [ { "name": "filter", "kind": "multi", "help": "..." } ],
    "args": [ { "name": "dest-path", "required": true, "help": "..." } ]
  }
}
*/

use anyhow::Result;
use clap::Args;

use crate::cmd::format::{Role, StyleOptions, TableOpts, box_header, color, emoji, table};
use crate::cmd::shared::output_error;
use orm_tasks::registry::{self, OperationDescriptor};

/// CLI arguments for `orm-tasks get <OPERATION>`
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Operation name (see `orm-tasks list`)
    #[arg(value_name = "OPERATION")]
    pub operation: String,

    /// Output JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,
}

/// Returns the process exit code (2 for an unknown operation).
pub fn execute_get(args: GetArgs) -> Result<i32> {
    let Some(op) = registry::find(&args.operation) else {
        let known: Vec<&str> = registry::names().collect();
        let msg = format!(
            "unknown operation '{}' (known: {})",
            args.operation.trim(),
            known.join(", ")
        );
        return Ok(output_error(args.json, "Get Error", &msg, 2));
    };

    if args.json {
        let out = serde_json::json!({ "status": "ok", "operation": op });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).unwrap_or_else(|_| out.to_string())
        );
        return Ok(0);
    }

    let style = StyleOptions::detect();
    println!(
        "{}",
        box_header(
            format!("{} {}", emoji("db", &style), op.name),
            Some(op.command),
            &style
        )
    );
    println!("{}", op.summary);
    println!();
    println!("{} {}", color(Role::Accent, "Usage:", &style), usage_line(op));

    println!();
    if op.options.is_empty() {
        println!("{}", color(Role::Dim, "No options", &style));
    } else {
        let rows: Vec<Vec<String>> = op
            .options
            .iter()
            .map(|o| vec![format!("--{}", o.name), o.kind.to_string(), o.help.to_string()])
            .collect();
        println!("{}", color(Role::Accent, "Options:", &style));
        println!(
            "{}",
            table(&["NAME", "KIND", "DESCRIPTION"], &rows, TableOpts::default(), &style)
        );
    }

    println!();
    if op.args.is_empty() {
        println!("{}", color(Role::Dim, "No positional arguments", &style));
    } else {
        let rows: Vec<Vec<String>> = op
            .args
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let req = if a.required {
                    color(Role::Warning, "yes", &style)
                } else {
                    "no".to_string()
                };
                vec![(i + 1).to_string(), a.name.to_string(), req, a.help.to_string()]
            })
            .collect();
        println!("{}", color(Role::Accent, "Arguments:", &style));
        println!(
            "{}",
            table(
                &["#", "NAME", "REQ", "DESCRIPTION"],
                &rows,
                TableOpts::default(),
                &style
            )
        );
    }
    Ok(0)
}

/// `orm-tasks exec generate-entities [--opt filter=V].. <dest-path>`
pub fn usage_line(op: &OperationDescriptor) -> String {
    let mut parts = vec!["orm-tasks exec".to_string(), op.name.to_string()];
    for o in op.options {
        parts.push(match o.kind {
            registry::OptionKind::Flag => format!("[--opt {}]", o.name),
            registry::OptionKind::Value => format!("[--opt {}=V]", o.name),
            registry::OptionKind::Multi => format!("[--opt {}=V]..", o.name),
        });
    }
    for a in op.args {
        parts.push(if a.required {
            format!("<{}>", a.name)
        } else {
            format!("[{}]", a.name)
        });
    }
    parts.join(" ")
}
