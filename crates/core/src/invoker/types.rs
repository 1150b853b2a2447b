//! Types for the invoker module.

use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A fully built command line for an external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Appends `flag value`.
    pub fn opt(self, flag: &str, value: impl AsRef<OsStr>) -> Self {
        self.arg(flag).arg(value)
    }

    /// Appends `--name=value` as a single argument.
    pub fn eq_opt(self, name: &str, value: impl AsRef<OsStr>) -> Self {
        let mut joined = OsString::from(name);
        joined.push("=");
        joined.push(value.as_ref());
        self.arg(joined)
    }

    /// Runs the tool from this directory instead of the caller's.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arg_list(&self) -> &[OsString] {
        &self.args
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Whether any argument equals `arg` exactly.
    #[cfg(test)]
    pub(crate) fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Returns the argument following `flag`, if present.
    pub fn value_of(&self, flag: &str) -> Option<&OsStr> {
        let idx = self.args.iter().position(|a| a == flag)?;
        self.args.get(idx + 1).map(|a| a.as_os_str())
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Outcome of one external tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResult {
    /// The command line, for diagnostics.
    pub command: String,
    /// Exit code. `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Standard output and standard error, merged in arrival order.
    pub output: String,
    /// Wall-clock duration in milliseconds.
    pub elapsed_ms: u64,
}

impl InvocationResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// `exit code 2`, or `terminated by signal` when there is no code.
pub fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Per-call context: cancellation and an optional live output feed.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    /// Cancelling this token kills the running tool.
    pub cancel: CancellationToken,
    /// Receives each captured output line as it arrives.
    pub output_tx: Option<mpsc::Sender<String>>,
}

impl InvocationContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            output_tx: None,
        }
    }

    pub fn with_output(mut self, tx: mpsc::Sender<String>) -> Self {
        self.output_tx = Some(tx);
        self
    }
}
