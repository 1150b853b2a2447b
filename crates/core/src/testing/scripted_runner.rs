//! Scripted tool runner for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::invoker::{InvocationContext, InvocationResult, InvokerError, ToolCommand, ToolRunner};

type Effect = Arc<dyn Fn(&ToolCommand) -> std::io::Result<()> + Send + Sync>;

/// One scripted response.
pub struct ScriptedStep {
    exit_code: Option<i32>,
    output: String,
    effect: Option<Effect>,
    error: Option<InvokerError>,
    wait_for_cancel: bool,
}

impl ScriptedStep {
    /// Exit 0 with the given output.
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            output: output.into(),
            effect: None,
            error: None,
            wait_for_cancel: false,
        }
    }

    /// Exit with `code` and the given output.
    pub fn failure(code: i32, output: impl Into<String>) -> Self {
        Self {
            exit_code: Some(code),
            ..Self::success(output)
        }
    }

    /// Return `error` instead of a result.
    pub fn error(error: InvokerError) -> Self {
        Self {
            error: Some(error),
            ..Self::success("")
        }
    }

    /// Block until the job's cancellation token fires, then report
    /// [`InvokerError::Cancelled`].
    pub fn hang() -> Self {
        Self {
            wait_for_cancel: true,
            ..Self::success("")
        }
    }

    /// Write `contents` to the command's output path before returning.
    pub fn writing_output(mut self, contents: impl Into<Vec<u8>>) -> Self {
        let contents = contents.into();
        self.effect = Some(Arc::new(move |cmd: &ToolCommand| {
            let target = output_target(cmd).ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "no output argument")
            })?;
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(target, &contents)
        }));
        self
    }

    /// Run an arbitrary side effect against the command before returning.
    pub fn with_effect<F>(mut self, effect: F) -> Self
    where
        F: Fn(&ToolCommand) -> std::io::Result<()> + Send + Sync + 'static,
    {
        self.effect = Some(Arc::new(effect));
        self
    }
}

impl fmt::Debug for ScriptedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedStep")
            .field("exit_code", &self.exit_code)
            .field("output", &self.output)
            .field("has_effect", &self.effect.is_some())
            .field("error", &self.error)
            .field("wait_for_cancel", &self.wait_for_cancel)
            .finish()
    }
}

/// Recording [`ToolRunner`] that plays back scripted responses in order.
///
/// Once the script is exhausted every call succeeds with empty output.
///
/// # Example
///
/// ```rust,ignore
/// use ozconv_core::testing::{ScriptedRunner, ScriptedStep};
///
/// let runner = ScriptedRunner::new();
/// runner.push(ScriptedStep::success("done").writing_output(b"chd".to_vec())).await;
/// runner.push_failure(1, "Error: file not found").await;
///
/// // Hand `Arc::new(runner.clone())` to the code under test, then:
/// let calls = runner.recorded_commands().await;
/// assert_eq!(calls.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    /// Pending responses.
    script: Arc<RwLock<VecDeque<ScriptedStep>>>,
    /// Every command received, in order.
    commands: Arc<RwLock<Vec<ToolCommand>>>,
}

impl ScriptedRunner {
    /// Create a runner with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    pub async fn push(&self, step: ScriptedStep) {
        self.script.write().await.push_back(step);
    }

    /// Queue a clean exit with the given output.
    pub async fn push_success(&self, output: &str) {
        self.push(ScriptedStep::success(output)).await;
    }

    /// Queue a failing exit with the given output.
    pub async fn push_failure(&self, code: i32, output: &str) {
        self.push(ScriptedStep::failure(code, output)).await;
    }

    /// Queue a successful call that writes `files` into its `-o<dir>` target,
    /// the way `7z x` does.
    pub async fn on_extract(&self, files: Vec<(String, Vec<u8>)>) {
        self.push(ScriptedStep::success("Everything is Ok").with_effect(move |cmd| {
            let dir = output_target(cmd).ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "no -o argument")
            })?;
            for (name, contents) in &files {
                let path = dir.join(name);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, contents)?;
            }
            Ok(())
        }))
        .await;
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: InvokerError) {
        self.push(ScriptedStep::error(error)).await;
    }

    /// Get all recorded commands.
    pub async fn recorded_commands(&self) -> Vec<ToolCommand> {
        self.commands.read().await.clone()
    }

    /// Number of responses not yet consumed.
    pub async fn remaining(&self) -> usize {
        self.script.read().await.len()
    }
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn run(
        &self,
        command: ToolCommand,
        ctx: &InvocationContext,
    ) -> Result<InvocationResult, InvokerError> {
        self.commands.write().await.push(command.clone());
        let step = self
            .script
            .write()
            .await
            .pop_front()
            .unwrap_or_else(|| ScriptedStep::success(""));

        let cancelled = || InvokerError::Cancelled {
            program: command.program().to_path_buf(),
        };
        if step.wait_for_cancel {
            ctx.cancel.cancelled().await;
            return Err(cancelled());
        }
        if ctx.cancel.is_cancelled() {
            return Err(cancelled());
        }
        if let Some(err) = step.error {
            return Err(err);
        }
        if let Some(effect) = step.effect {
            effect(&command)?;
        }

        if let Some(ref tx) = ctx.output_tx {
            for line in step.output.lines() {
                let _ = tx.send(line.to_string()).await;
            }
        }

        Ok(InvocationResult {
            command: command.to_string(),
            exit_code: step.exit_code,
            output: step.output,
            elapsed_ms: 0,
        })
    }
}

/// Finds the output path in a tool command line.
///
/// Recognises `-o X`, `--output X`, `--output=X`, a glued `-oX` and, for
/// `7z a`, the archive name.
pub fn output_target(cmd: &ToolCommand) -> Option<PathBuf> {
    if let Some(value) = cmd.value_of("-o").or_else(|| cmd.value_of("--output")) {
        return Some(PathBuf::from(value));
    }

    let args = cmd.arg_list();
    for arg in args {
        let Some(text) = arg.to_str() else { continue };
        if let Some(value) = text.strip_prefix("--output=") {
            return Some(PathBuf::from(value));
        }
        if let Some(value) = text.strip_prefix("-o").filter(|v| !v.is_empty()) {
            return Some(PathBuf::from(value));
        }
    }

    if args.first().map(|a| a.as_os_str()) == Some(OsStr::new("a")) {
        return args
            .iter()
            .skip(1)
            .find(|a| !a.to_string_lossy().starts_with('-'))
            .map(|a| resolve(cmd.cwd(), Path::new(a)));
    }
    None
}

fn resolve(cwd: Option<&Path>, path: &Path) -> PathBuf {
    match cwd {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    }
}
