//! Tool invoker for external converter executables.
//!
//! Every external program (chdman, DolphinTool, maxcso, 7-Zip, an optional
//! trash command) runs through a [`ToolRunner`]. The runner captures standard
//! output and standard error into a single buffer in arrival order and reports
//! the exit status in an [`InvocationResult`]. A non-zero exit is *not* an
//! error at this level; callers decide what it means.
//!
//! Errors are reserved for cases where no exit status exists: the executable
//! is missing or not executable, the job was cancelled, or the optional
//! timeout fired. In the last two cases the child process is killed first.
//!
//! # Example
//!
//! ```ignore
//! use ozconv_core::invoker::{InvocationContext, ProcessInvoker, ToolCommand, ToolRunner};
//!
//! let invoker = ProcessInvoker::with_defaults();
//! let command = ToolCommand::new("chdman").arg("info").arg("-i").arg("/games/game.chd");
//! let result = invoker.run(command, &InvocationContext::default()).await?;
//! if !result.success() {
//!     eprintln!("chdman failed:\n{}", result.output);
//! }
//! ```

mod catalog;
mod config;
mod error;
mod process;
mod traits;
mod types;

pub use catalog::{Tool, ToolCatalog, ToolStatus};
pub use config::InvokerConfig;
pub use error::InvokerError;
pub use process::ProcessInvoker;
pub use traits::ToolRunner;
pub use types::{describe_exit, InvocationContext, InvocationResult, ToolCommand};
