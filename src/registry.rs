/*!
registry.rs - the declarative operation table.

One `OperationDescriptor` per wrapped ORM console command: which external
command to build, which options it accepts, which positional arguments it
takes (in order). Adding an operation is a data change here; the dispatcher
itself never changes.

Option kinds:
  Flag   boolean switch         --force
  Value  single value           --num-spaces=4
  Multi  repeatable value       --filter=User --filter=Post
*/

use serde::Serialize;
use std::fmt;

/* ---- Descriptor Types ---- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Flag,
    Value,
    Multi,
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OptionKind::Flag => "flag",
            OptionKind::Value => "value",
            OptionKind::Multi => "multi",
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct OptionSpec {
    pub name: &'static str,
    pub kind: OptionKind,
    pub help: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ArgSpec {
    pub name: &'static str,
    pub required: bool,
    pub help: &'static str,
}

/// Coarse grouping used for listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Group {
    ClearCache,
    Schema,
    Diagnostics,
    Generate,
    Mapping,
    Query,
}

impl Group {
    pub const fn variants() -> &'static [Group] {
        &[
            Group::ClearCache,
            Group::Schema,
            Group::Diagnostics,
            Group::Generate,
            Group::Mapping,
            Group::Query,
        ]
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Group::ClearCache => "clear-cache",
            Group::Schema => "schema",
            Group::Diagnostics => "diagnostics",
            Group::Generate => "generate",
            Group::Mapping => "mapping",
            Group::Query => "query",
        })
    }
}

#[derive(Debug, Serialize)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub group: Group,
    pub summary: &'static str,
    /// External console command this operation builds.
    pub command: &'static str,
    pub options: &'static [OptionSpec],
    pub args: &'static [ArgSpec],
}

impl OperationDescriptor {
    pub fn accepts(&self, option: &str) -> bool {
        self.option(option).is_some()
    }

    pub fn option(&self, name: &str) -> Option<&'static OptionSpec> {
        self.options.iter().find(|o| o.name == name)
    }

    pub fn accepted_options(&self) -> impl Iterator<Item = &'static str> {
        self.options.iter().map(|o| o.name)
    }

    pub fn required_args(&self) -> impl Iterator<Item = &'static ArgSpec> {
        self.args.iter().filter(|a| a.required)
    }
}

/* ---- Table ---- */

const fn flag(name: &'static str, help: &'static str) -> OptionSpec {
    OptionSpec {
        name,
        kind: OptionKind::Flag,
        help,
    }
}

const fn value(name: &'static str, help: &'static str) -> OptionSpec {
    OptionSpec {
        name,
        kind: OptionKind::Value,
        help,
    }
}

const fn multi(name: &'static str, help: &'static str) -> OptionSpec {
    OptionSpec {
        name,
        kind: OptionKind::Multi,
        help,
    }
}

const fn required(name: &'static str, help: &'static str) -> ArgSpec {
    ArgSpec {
        name,
        required: true,
        help,
    }
}

const fn optional(name: &'static str, help: &'static str) -> ArgSpec {
    ArgSpec {
        name,
        required: false,
        help,
    }
}

const FLUSH: &[OptionSpec] = &[flag(
    "flush",
    "Flush the cache driver instead of deleting entries one by one",
)];

const FILTER: OptionSpec = multi("filter", "Only process entities whose name matches");

static OPERATIONS: &[OperationDescriptor] = &[
    OperationDescriptor {
        name: "clear-cache-metadata",
        group: Group::ClearCache,
        summary: "Clear all metadata cache of the various cache drivers",
        command: "orm:clear-cache:metadata",
        options: FLUSH,
        args: &[],
    },
    OperationDescriptor {
        name: "clear-cache-query",
        group: Group::ClearCache,
        summary: "Clear all query cache of the various cache drivers",
        command: "orm:clear-cache:query",
        options: FLUSH,
        args: &[],
    },
    OperationDescriptor {
        name: "clear-cache-result",
        group: Group::ClearCache,
        summary: "Clear all result cache of the various cache drivers",
        command: "orm:clear-cache:result",
        options: FLUSH,
        args: &[],
    },
    OperationDescriptor {
        name: "schema-create",
        group: Group::Schema,
        summary: "Create the database schema from mapping metadata, or dump its SQL",
        command: "orm:schema-tool:create",
        options: &[flag("dump-sql", "Print the SQL instead of executing it")],
        args: &[],
    },
    OperationDescriptor {
        name: "schema-update",
        group: Group::Schema,
        summary: "Execute (or dump) the SQL needed to bring the schema in line with the mapping metadata",
        command: "orm:schema-tool:update",
        options: &[
            flag("dump-sql", "Print the SQL instead of executing it"),
            flag("force", "Execute the SQL against the database"),
            flag("complete", "Also drop assets not described by the metadata"),
        ],
        args: &[],
    },
    OperationDescriptor {
        name: "schema-drop",
        group: Group::Schema,
        summary: "Drop the database schema, or dump the corresponding SQL",
        command: "orm:schema-tool:drop",
        options: &[
            flag("dump-sql", "Print the SQL instead of executing it"),
            flag("force", "Execute the SQL against the database"),
            flag("full-database", "Drop every asset in the database, not only mapped ones"),
        ],
        args: &[],
    },
    OperationDescriptor {
        name: "schema-validate",
        group: Group::Schema,
        summary: "Validate the mapping files and their sync with the database",
        command: "orm:validate-schema",
        options: &[
            flag("skip-mapping", "Skip the mapping validation check"),
            flag("skip-sync", "Skip checking if the mapping is in sync with the database"),
        ],
        args: &[],
    },
    OperationDescriptor {
        name: "ensure-production-settings",
        group: Group::Diagnostics,
        summary: "Verify that the ORM is properly configured for production",
        command: "orm:ensure-production-settings",
        options: &[flag("complete", "Also check the database connection")],
        args: &[],
    },
    OperationDescriptor {
        name: "info",
        group: Group::Diagnostics,
        summary: "Show basic information about all mapped entities",
        command: "orm:info",
        options: &[],
        args: &[],
    },
    OperationDescriptor {
        name: "mapping-describe",
        group: Group::Diagnostics,
        summary: "Display the full mapping of one entity",
        command: "orm:mapping:describe",
        options: &[],
        args: &[required("entity-name", "Full or partial entity class name")],
    },
    OperationDescriptor {
        name: "generate-entities",
        group: Group::Generate,
        summary: "Generate entity classes and method stubs from mapping information",
        command: "orm:generate-entities",
        options: &[
            FILTER,
            value("generate-annotations", "Generate annotation metadata on entities"),
            value("generate-methods", "Generate stub methods on entities"),
            value("regenerate-entities", "Regenerate entity classes that already exist"),
            value("update-entities", "Only update existing entity classes"),
            value("extend", "Class every generated entity extends"),
            value("num-spaces", "Spaces used for indentation"),
            flag("no-backup", "Do not back up existing entity files"),
        ],
        args: &[required("dest-path", "Directory the entity classes are written to")],
    },
    OperationDescriptor {
        name: "generate-proxies",
        group: Group::Generate,
        summary: "Generate proxy classes for entity classes",
        command: "orm:generate-proxies",
        options: &[FILTER],
        args: &[optional(
            "dest-path",
            "Directory the proxies are written to (defaults to the configured proxy dir)",
        )],
    },
    OperationDescriptor {
        name: "generate-repositories",
        group: Group::Generate,
        summary: "Generate repository classes from mapping information",
        command: "orm:generate-repositories",
        options: &[FILTER],
        args: &[required("dest-path", "Directory the repository classes are written to")],
    },
    OperationDescriptor {
        name: "convert-mapping",
        group: Group::Mapping,
        summary: "Convert mapping information between supported formats",
        command: "orm:convert-mapping",
        options: &[
            FILTER,
            flag("force", "Overwrite existing mapping files"),
            flag("from-database", "Read mapping information from the database"),
            value("extend", "Class generated entities extend (annotation output)"),
            value("num-spaces", "Spaces used for indentation"),
            value("namespace", "Namespace for entities read from the database"),
        ],
        args: &[
            required("to-type", "Target mapping type (xml, yaml, annotation, php)"),
            required("dest-path", "Directory the converted mapping is written to"),
        ],
    },
    OperationDescriptor {
        name: "run-dql",
        group: Group::Query,
        summary: "Execute arbitrary DQL directly from the command line",
        command: "orm:run-dql",
        options: &[
            value("hydrate", "Hydration mode (object, array, scalar, single-scalar)"),
            value("first-result", "First result offset"),
            value("max-result", "Maximum number of results"),
            value("depth", "Dump depth of the result"),
            flag("show-sql", "Dump the generated SQL instead of executing"),
        ],
        args: &[required("dql", "The DQL to execute")],
    },
];

/* ---- Lookup ---- */

pub fn all() -> &'static [OperationDescriptor] {
    OPERATIONS
}

pub fn find(name: &str) -> Option<&'static OperationDescriptor> {
    let norm = name.trim();
    OPERATIONS.iter().find(|op| op.name == norm)
}

pub fn names() -> impl Iterator<Item = &'static str> {
    OPERATIONS.iter().map(|op| op.name)
}

pub fn in_group(group: Group) -> impl Iterator<Item = &'static OperationDescriptor> {
    OPERATIONS.iter().filter(move |op| op.group == group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn operation_names_unique() {
        let mut seen = HashSet::new();
        for op in all() {
            assert!(seen.insert(op.name), "duplicate operation {}", op.name);
        }
    }

    #[test]
    fn console_commands_unique() {
        let mut seen = HashSet::new();
        for op in all() {
            assert!(seen.insert(op.command), "duplicate command {}", op.command);
        }
    }

    #[test]
    fn option_and_arg_names_unique_per_operation() {
        for op in all() {
            let mut opts = HashSet::new();
            for o in op.options {
                assert!(opts.insert(o.name), "{}: duplicate option {}", op.name, o.name);
            }
            let mut args = HashSet::new();
            for a in op.args {
                assert!(args.insert(a.name), "{}: duplicate arg {}", op.name, a.name);
            }
        }
    }

    #[test]
    fn required_args_come_first() {
        for op in all() {
            let mut optional_seen = false;
            for a in op.args {
                if !a.required {
                    optional_seen = true;
                } else {
                    assert!(!optional_seen, "{}: required '{}' after optional", op.name, a.name);
                }
            }
        }
    }

    #[test]
    fn every_group_populated() {
        for g in Group::variants() {
            assert!(in_group(*g).next().is_some(), "group {g} has no operations");
        }
    }

    #[test]
    fn schema_update_options() {
        let op = find("schema-update").unwrap();
        assert_eq!(op.command, "orm:schema-tool:update");
        let accepted: Vec<_> = op.accepted_options().collect();
        assert_eq!(accepted, vec!["dump-sql", "force", "complete"]);
        assert!(op.accepts("force"));
        assert!(!op.accepts("full-database"));
    }

    #[test]
    fn generate_entities_requires_dest_path() {
        let op = find("generate-entities").unwrap();
        let req: Vec<_> = op.required_args().map(|a| a.name).collect();
        assert_eq!(req, vec!["dest-path"]);
        assert_eq!(op.option("filter").map(|o| o.kind), Some(OptionKind::Multi));
    }

    #[test]
    fn convert_mapping_positional_order() {
        let op = find("convert-mapping").unwrap();
        let order: Vec<_> = op.args.iter().map(|a| a.name).collect();
        assert_eq!(order, vec!["to-type", "dest-path"]);
    }

    #[test]
    fn find_trims_and_rejects_unknown() {
        assert!(find(" info ").is_some());
        assert!(find("orm:info").is_none());
        assert!(find("nope").is_none());
    }
}
