use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;
mod utils;

use cmd::{ExecArgs, GetArgs, ListArgs};
use orm_tasks::config::{Overrides, Settings};

/// ORM Tasks - run ORM console commands from one operation table
///
/// Command layout:
///   orm-tasks list [--group GROUP] [--json]
///   orm-tasks get  <OPERATION> [--json]
///   orm-tasks exec <OPERATION> [--opt KEY[=VALUE]]... [--arg KEY=VALUE]... [VALUE]... [--json]
///
/// Global flags / env:
///   -v / -vv          Increase verbosity: debug, trace (logs go to stderr)
///   -q / --quiet      Errors only
///   -c / --console    Console command line (or ORM_CONSOLE; default vendor/bin/doctrine)
///   --config          Config file (or ORM_TASKS_CONFIG; default ./orm-tasks.yaml if present)
///   --database-url    Connection exported to the console (or DATABASE_URL)
///   --em              Entity manager name (or ORM_ENTITY_MANAGER)
///   -C / --working-dir  Directory the console runs in
///
/// Options the operation does not accept are dropped before the console runs.
///
/// Examples:
///   orm-tasks exec schema-update --opt dump-sql
///   orm-tasks exec schema-update --opt force --opt complete -c "php bin/console"
///   orm-tasks exec generate-entities src/Entity --opt filter=User --opt no-backup
///   orm-tasks exec run-dql "SELECT u FROM App\Entity\User u" --opt hydrate=array --json
#[derive(Parser, Debug)]
#[command(
    name = "orm-tasks",
    version,
    author,
    about = "ORM Tasks - schema, cache, codegen and DQL operations over the ORM console",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Console command line (e.g. "php bin/console")
    #[arg(short = 'c', long = "console", global = true, value_name = "CMDLINE")]
    console: Option<String>,

    /// Config file (YAML or JSON)
    #[arg(long = "config", global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Database URL exported to the console as DATABASE_URL
    #[arg(long = "database-url", global = true, value_name = "URL")]
    database_url: Option<String>,

    /// Entity manager name
    #[arg(long = "em", global = true, value_name = "NAME")]
    entity_manager: Option<String>,

    /// Directory the console runs in
    #[arg(short = 'C', long = "working-dir", global = true, value_name = "DIR")]
    working_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List operations
    List(ListArgs),

    /// Show one operation's options and arguments
    Get(GetArgs),

    /// Run an operation through the ORM console
    Exec(ExecArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    utils::init_logging(utils::derive_level(cli.verbose, cli.quiet));

    let code = match cli.command {
        Commands::List(args) => cmd::execute_list(args)?,
        Commands::Get(args) => cmd::execute_get(args)?,
        Commands::Exec(args) => {
            let overrides = Overrides {
                console: cli.console,
                config: cli.config,
                working_dir: cli.working_dir,
                database_url: cli.database_url,
                entity_manager: cli.entity_manager,
            };
            let settings = match Settings::resolve(&overrides) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Invalid configuration: {e}");
                    std::process::exit(2);
                }
            };
            tracing::debug!(
                console = %settings.console,
                database = settings.helpers.redacted_database_url().as_deref(),
                config = ?settings.source,
                "resolved settings"
            );
            cmd::execute_exec(args, &settings)?
        }
    };
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
