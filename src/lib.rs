//! ORM task adapter.
//!
//! Runs pre-built ORM console commands (schema tool, cache clearing, code
//! generation, mapping conversion, DQL) from one declarative operation table.
//!
//!   registry  -> OperationDescriptor table (what each operation accepts)
//!   dispatch  -> Dispatcher (filter options, bind args, run once)
//!   command   -> ConsoleCommand / CommandFactory capability traits
//!   context   -> HelperContext (connection + metadata handle, forwarded only)
//!   console   -> process-backed CommandFactory for the ORM console executable
//!   config    -> layered resolution of console target + helper context

pub mod command;
pub mod config;
pub mod console;
pub mod context;
pub mod dispatch;
pub mod registry;

pub use command::{CommandFactory, ConsoleCommand, ExecutionResult, OptionValue};
pub use context::HelperContext;
pub use dispatch::{DispatchError, Dispatcher, InvocationRequest};
pub use registry::{ArgSpec, OperationDescriptor, OptionKind, OptionSpec};
