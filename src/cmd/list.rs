/*!
`list.rs`

Implements `orm-tasks list`: every registered operation, grouped, with the
console command it wraps.

JSON Output Shape:
{
  "status": "ok",
  "count": 15,
  "operations": [
    { "name": "schema-update", "group": "schema",
      "command": "orm:schema-tool:update", "summary": "..." }
  ]
}
*/

use anyhow::Result;
use clap::Args;

use crate::cmd::format::{Role, StyleOptions, TableOpts, box_header, color, emoji, table};
use crate::cmd::shared::output_error;
use orm_tasks::registry::{self, Group};

/// CLI arguments for `orm-tasks list`
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show one group (clear-cache|schema|diagnostics|generate|mapping|query)
    #[arg(short, long, value_name = "GROUP")]
    pub group: Option<String>,

    /// Output JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,
}

/// Returns the process exit code (2 for an unknown group).
pub fn execute_list(args: ListArgs) -> Result<i32> {
    let groups: Vec<Group> = match &args.group {
        Some(g) => {
            let norm = g.trim().to_ascii_lowercase();
            let Some(found) = Group::variants().iter().find(|v| v.to_string() == norm) else {
                let msg = format!(
                    "unknown group '{g}' (expected one of: {})",
                    Group::variants()
                        .iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                return Ok(output_error(args.json, "List Error", &msg, 2));
            };
            vec![*found]
        }
        None => Group::variants().to_vec(),
    };

    if args.json {
        let items: Vec<serde_json::Value> = groups
            .iter()
            .flat_map(|g| registry::in_group(*g))
            .map(|op| {
                serde_json::json!({
                    "name": op.name,
                    "group": op.group,
                    "command": op.command,
                    "summary": op.summary,
                })
            })
            .collect();
        let out = serde_json::json!({
            "status": "ok",
            "count": items.len(),
            "operations": items,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).unwrap_or_else(|_| out.to_string())
        );
        return Ok(0);
    }

    let style = StyleOptions::detect();
    let total: usize = groups.iter().map(|g| registry::in_group(*g).count()).sum();
    println!(
        "{}",
        box_header(
            format!("{} Operations ({total})", emoji("list", &style)),
            Some("orm-tasks exec <OPERATION> --opt KEY[=VALUE] [VALUE]..."),
            &style,
        )
    );

    for g in groups {
        let rows: Vec<Vec<String>> = registry::in_group(g)
            .map(|op| {
                vec![
                    op.name.to_string(),
                    op.command.to_string(),
                    op.summary.to_string(),
                ]
            })
            .collect();
        println!();
        println!("{}", color(Role::Accent, format!("{g}:"), &style));
        println!(
            "{}",
            table(
                &["OPERATION", "COMMAND", "SUMMARY"],
                &rows,
                TableOpts::default(),
                &style
            )
        );
    }

    println!(
        "\n{} {}",
        emoji("info", &style),
        color(
            Role::Dim,
            "Use 'orm-tasks get <OPERATION>' for accepted options and arguments",
            &style
        )
    );
    Ok(0)
}
