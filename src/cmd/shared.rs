/*!
shared.rs - request building helpers for `exec`.

Focus:
  - parse_option_flag / parse_named_arg: KEY[=VALUE] / KEY=VALUE parsing
  - build_options: raw CLI pairs -> typed OptionValue map (by option kind)
  - merge_options_file: JSON / YAML options file under CLI options
  - collect_arguments: --arg pairs + bare values in declared order
  - output_error: error box / JSON error shared by every subcommand

Unknown option names are kept (as text / true) so the dispatcher is the one
place that decides what gets dropped.
*/

use anyhow::{Context, Result, bail};
use std::collections::BTreeMap;

use crate::cmd::format::{Role, StyleOptions, box_header, color, emoji};
use orm_tasks::{OperationDescriptor, OptionKind, OptionValue};

/* ---- Raw Parsing ---- */

/// `--opt KEY` or `--opt KEY=VALUE`.
pub fn parse_option_flag(raw: &str) -> Result<(String, Option<String>)> {
    let (key, value) = match raw.split_once('=') {
        Some((k, v)) => (k.trim(), Some(v.to_string())),
        None => (raw.trim(), None),
    };
    let key = key.trim_start_matches("--");
    if key.is_empty() {
        bail!("invalid --opt (empty key): {raw}");
    }
    Ok((key.to_string(), value))
}

/// `--arg KEY=VALUE` (value required).
pub fn parse_named_arg(raw: &str) -> Result<(String, String)> {
    let Some((k, v)) = raw.split_once('=') else {
        bail!("invalid --arg (expected KEY=VALUE): {raw}");
    };
    let key = k.trim();
    if key.is_empty() {
        bail!("invalid --arg (empty key): {raw}");
    }
    Ok((key.to_string(), v.to_string()))
}

/// Boolean spellings accepted for flag options.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "0" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/* ---- Option Building ---- */

/// Coerce raw `--opt` pairs using the operation's declared option kinds.
///
/// - Flag : bare key -> true; value must be a boolean spelling
/// - Value: value required; last occurrence wins
/// - Multi: repeatable, comma-separated values are split
/// - unknown key: bare -> true, else text (dropped later by the dispatcher)
pub fn build_options(
    descriptor: &OperationDescriptor,
    pairs: &[(String, Option<String>)],
) -> Result<BTreeMap<String, OptionValue>> {
    let mut out: BTreeMap<String, OptionValue> = BTreeMap::new();
    for (key, raw) in pairs {
        let kind = descriptor.option(key).map(|o| o.kind);
        let value = match (kind, raw.as_deref()) {
            (Some(OptionKind::Flag), None) => OptionValue::Flag(true),
            (Some(OptionKind::Flag), Some(v)) => match parse_bool(v) {
                Some(b) => OptionValue::Flag(b),
                None => bail!("option '{key}' is a flag; expected a boolean, got '{v}'"),
            },
            (Some(OptionKind::Value), None) => bail!("option '{key}' requires a value"),
            (Some(OptionKind::Value), Some(v)) => OptionValue::Text(v.to_string()),
            (Some(OptionKind::Multi), None) => bail!("option '{key}' requires a value"),
            (Some(OptionKind::Multi), Some(v)) => {
                let mut items = match out.remove(key) {
                    Some(OptionValue::List(existing)) => existing,
                    _ => Vec::new(),
                };
                items.extend(split_list(v));
                OptionValue::List(items)
            }
            (None, None) => OptionValue::Flag(true),
            (None, Some(v)) => OptionValue::Text(v.to_string()),
        };
        out.insert(key.clone(), value);
    }
    Ok(out)
}

fn split_list(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Convert an options-file JSON value using the option kind.
///
/// `null` means "not supplied" and yields `None`.
pub fn option_from_json(
    kind: Option<OptionKind>,
    key: &str,
    value: &serde_json::Value,
) -> Result<Option<OptionValue>> {
    use serde_json::Value;
    let scalar = |v: &Value| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    };
    let converted = match (kind, value) {
        (_, Value::Null) => return Ok(None),
        (Some(OptionKind::Flag), Value::Bool(b)) => OptionValue::Flag(*b),
        (Some(OptionKind::Flag), Value::String(s)) => match parse_bool(s) {
            Some(b) => OptionValue::Flag(b),
            None => bail!("option '{key}' is a flag; expected a boolean, got '{s}'"),
        },
        (Some(OptionKind::Flag), other) => {
            bail!("option '{key}' is a flag; expected a boolean, got {other}")
        }
        (Some(OptionKind::Value), v @ (Value::Array(_) | Value::Object(_))) => {
            bail!("option '{key}' takes a single value, got {v}")
        }
        (Some(OptionKind::Multi), Value::Array(items)) => {
            OptionValue::List(items.iter().filter_map(scalar).collect())
        }
        (Some(OptionKind::Multi), v) => match scalar(v) {
            Some(s) => OptionValue::List(split_list(&s).collect()),
            None => bail!("option '{key}' expects a list of values"),
        },
        (_, Value::Bool(b)) => OptionValue::Flag(*b),
        (_, v) => match scalar(v) {
            Some(s) => OptionValue::Text(s),
            None => OptionValue::Text(v.to_string()),
        },
    };
    Ok(Some(converted))
}

/// Read an options file (JSON, or YAML by extension) into a JSON object.
pub fn load_options_file(path: &str) -> Result<serde_json::Map<String, serde_json::Value>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read options file: {path}"))?;
    let lower = path.to_ascii_lowercase();

    let value: serde_json::Value = if lower.ends_with(".yaml") || lower.ends_with(".yml") {
        let yaml_v: serde_yaml::Value =
            serde_yaml::from_str(&raw).context("failed to parse YAML options file")?;
        serde_json::to_value(yaml_v).context("failed to convert YAML to JSON")?
    } else {
        serde_json::from_str(&raw).context("failed to parse JSON options file")?
    };

    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => bail!("options file root must be an object"),
    }
}

/// Merge file options under already-built CLI options (CLI wins per key).
/// Null entries are skipped.
pub fn merge_options_file(
    descriptor: &OperationDescriptor,
    file: &serde_json::Map<String, serde_json::Value>,
    options: &mut BTreeMap<String, OptionValue>,
) -> Result<()> {
    for (key, value) in file {
        if options.contains_key(key) {
            continue;
        }
        let kind = descriptor.option(key).map(|o| o.kind);
        if let Some(v) = option_from_json(kind, key, value)? {
            options.insert(key.clone(), v);
        }
    }
    Ok(())
}

/* ---- Positional Arguments ---- */

/// Named `--arg` pairs first, then bare values fill the remaining declared
/// positionals in order.
pub fn collect_arguments(
    descriptor: &OperationDescriptor,
    named: &[(String, String)],
    values: &[String],
) -> Result<BTreeMap<String, String>> {
    let mut out: BTreeMap<String, String> = named.iter().cloned().collect();
    let free: Vec<_> = descriptor
        .args
        .iter()
        .filter(|spec| !out.contains_key(spec.name))
        .collect();
    let mut free = free.into_iter();
    for v in values {
        match free.next() {
            Some(spec) => {
                out.insert(spec.name.to_string(), v.clone());
            }
            None => bail!(
                "unexpected positional value '{v}' ({} takes {} argument(s))",
                descriptor.name,
                descriptor.args.len()
            ),
        }
    }
    Ok(out)
}

/* ---- Error Output ---- */

/// Print an error (boxed on stderr, or a JSON object on stdout) and return
/// `code` for the caller to exit with.
pub fn output_error(json: bool, title: &str, msg: &str, code: i32) -> i32 {
    if json {
        let err = serde_json::json!({"status": "error", "error": msg, "exit_code": code});
        println!(
            "{}",
            serde_json::to_string_pretty(&err).unwrap_or_else(|_| err.to_string())
        );
    } else {
        let style = StyleOptions::detect();
        let title = format!("{} {title}", emoji("error", &style));
        let boxed = box_header(title, Some(color(Role::Error, msg, &style)), &style);
        eprintln!("{boxed}");
        eprintln!(
            "{} {}",
            emoji("info", &style),
            color(
                Role::Dim,
                "Run 'orm-tasks list' for operations, 'orm-tasks get <OPERATION>' for their options.",
                &style
            )
        );
    }
    code
}

/* ---- Tests ---- */
#[cfg(test)]
mod tests {
    use super::*;
    use orm_tasks::registry;
    use serde_json::json;

    fn pairs(raw: &[&str]) -> Vec<(String, Option<String>)> {
        raw.iter().map(|r| parse_option_flag(r).unwrap()).collect()
    }

    #[test]
    fn parse_option_forms() {
        assert_eq!(parse_option_flag("force").unwrap(), ("force".into(), None));
        assert_eq!(
            parse_option_flag("--num-spaces=2").unwrap(),
            ("num-spaces".into(), Some("2".into()))
        );
        assert!(parse_option_flag("=x").is_err());
    }

    #[test]
    fn parse_named_arg_requires_value() {
        assert_eq!(
            parse_named_arg("dest-path=src/Entity").unwrap(),
            ("dest-path".into(), "src/Entity".into())
        );
        assert!(parse_named_arg("dest-path").is_err());
        assert!(parse_named_arg(" =x").is_err());
    }

    #[test]
    fn flags_coerce() {
        let op = registry::find("schema-update").unwrap();
        let opts = build_options(op, &pairs(&["dump-sql", "force=no"])).unwrap();
        assert_eq!(opts.get("dump-sql"), Some(&OptionValue::Flag(true)));
        assert_eq!(opts.get("force"), Some(&OptionValue::Flag(false)));
        assert!(build_options(op, &pairs(&["force=maybe"])).is_err());
    }

    #[test]
    fn multi_accumulates_and_splits() {
        let op = registry::find("generate-entities").unwrap();
        let opts = build_options(op, &pairs(&["filter=User", "filter=Post, Tag"])).unwrap();
        assert_eq!(
            opts.get("filter"),
            Some(&OptionValue::List(vec![
                "User".into(),
                "Post".into(),
                "Tag".into()
            ]))
        );
    }

    #[test]
    fn value_requires_value() {
        let op = registry::find("run-dql").unwrap();
        assert!(build_options(op, &pairs(&["hydrate"])).is_err());
        let opts = build_options(op, &pairs(&["hydrate=array"])).unwrap();
        assert_eq!(opts.get("hydrate"), Some(&OptionValue::from("array")));
    }

    #[test]
    fn unknown_options_pass_through() {
        let op = registry::find("info").unwrap();
        let opts = build_options(op, &pairs(&["verbose", "env=prod"])).unwrap();
        assert_eq!(opts.get("verbose"), Some(&OptionValue::Flag(true)));
        assert_eq!(opts.get("env"), Some(&OptionValue::from("prod")));
    }

    #[test]
    fn options_file_merges_under_cli() {
        let path = std::env::temp_dir().join("orm_tasks_options_test.yaml");
        std::fs::write(&path, "force: true\ndump-sql: false\ncomplete: 'yes'\n").unwrap();
        let op = registry::find("schema-update").unwrap();
        let mut opts = build_options(op, &pairs(&["dump-sql"])).unwrap();
        let file = load_options_file(path.to_str().unwrap()).unwrap();
        merge_options_file(op, &file, &mut opts).unwrap();
        assert_eq!(opts.get("dump-sql"), Some(&OptionValue::Flag(true)));
        assert_eq!(opts.get("force"), Some(&OptionValue::Flag(true)));
        assert_eq!(opts.get("complete"), Some(&OptionValue::Flag(true)));
    }

    #[test]
    fn options_file_root_must_be_object() {
        let path = std::env::temp_dir().join("orm_tasks_options_array.json");
        std::fs::write(&path, "[1,2]").unwrap();
        let err = load_options_file(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("must be an object"));
    }

    #[test]
    fn json_values_by_kind() {
        assert_eq!(
            option_from_json(Some(OptionKind::Multi), "filter", &json!(["A", "B"])).unwrap(),
            Some(OptionValue::List(vec!["A".into(), "B".into()]))
        );
        assert_eq!(
            option_from_json(Some(OptionKind::Value), "num-spaces", &json!(2)).unwrap(),
            Some(OptionValue::from("2"))
        );
        assert!(option_from_json(Some(OptionKind::Flag), "force", &json!(1)).is_err());
    }

    #[test]
    fn null_is_not_supplied() {
        for kind in [
            Some(OptionKind::Flag),
            Some(OptionKind::Value),
            Some(OptionKind::Multi),
            None,
        ] {
            assert_eq!(option_from_json(kind, "extend", &json!(null)).unwrap(), None);
        }
    }

    #[test]
    fn value_option_rejects_structured_json() {
        let err = option_from_json(Some(OptionKind::Value), "extend", &json!(["A"])).unwrap_err();
        assert!(err.to_string().contains("single value"));
        assert!(option_from_json(Some(OptionKind::Value), "extend", &json!({"a": 1})).is_err());
    }

    #[test]
    fn null_entries_in_options_file_are_skipped() {
        let path = std::env::temp_dir().join("orm_tasks_options_null.yaml");
        std::fs::write(&path, "extend: ~\nnum-spaces: 2\n").unwrap();
        let op = registry::find("generate-entities").unwrap();
        let mut opts = BTreeMap::new();
        let file = load_options_file(path.to_str().unwrap()).unwrap();
        merge_options_file(op, &file, &mut opts).unwrap();
        assert!(!opts.contains_key("extend"));
        assert_eq!(opts.get("num-spaces"), Some(&OptionValue::from("2")));
    }

    #[test]
    fn values_are_not_trimmed() {
        assert_eq!(
            parse_option_flag(" hydrate = array ").unwrap(),
            ("hydrate".into(), Some(" array ".into()))
        );
        assert_eq!(
            parse_named_arg("dql= SELECT 1 ").unwrap(),
            ("dql".into(), " SELECT 1 ".into())
        );
    }

    #[test]
    fn bare_values_fill_declared_order() {
        let op = registry::find("convert-mapping").unwrap();
        let args = collect_arguments(op, &[], &["xml".into(), "config/mapping".into()]).unwrap();
        assert_eq!(args.get("to-type").map(String::as_str), Some("xml"));
        assert_eq!(args.get("dest-path").map(String::as_str), Some("config/mapping"));
    }

    #[test]
    fn named_args_skip_slots() {
        let op = registry::find("convert-mapping").unwrap();
        let named = vec![("to-type".to_string(), "yaml".to_string())];
        let args = collect_arguments(op, &named, &["out".into()]).unwrap();
        assert_eq!(args.get("to-type").map(String::as_str), Some("yaml"));
        assert_eq!(args.get("dest-path").map(String::as_str), Some("out"));
    }

    #[test]
    fn output_error_returns_code() {
        assert_eq!(output_error(true, "Exec Error", "boom", 2), 2);
    }

    #[test]
    fn too_many_values_rejected() {
        let op = registry::find("info").unwrap();
        assert!(collect_arguments(op, &[], &["extra".into()]).is_err());
    }
}
