/*!
Subcommand modules for the `orm-tasks` binary.

  list.rs    ListArgs + execute_list   (operation table)
  get.rs     GetArgs  + execute_get    (one operation's options / arguments)
  exec.rs    ExecArgs + execute_exec   (build request, dispatch, relay result)
  shared.rs  option / argument parsing shared by exec
  format.rs  box / table / color helpers for human output

Conventions:
  - Each subcommand module exposes one public `execute_*` function.
  - Argument structs derive `clap::Args` and are kept minimal.
  - Everything that is not CLI plumbing lives in the `orm_tasks` library.
*/

pub mod exec;
pub mod format;
pub mod get;
pub mod list;
pub mod shared;

pub use exec::{ExecArgs, execute_exec};
pub use get::{GetArgs, execute_get};
pub use list::{ListArgs, execute_list};
