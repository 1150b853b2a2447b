//! Process-backed tool runner.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::Duration;
use tracing::{debug, warn};

use super::config::InvokerConfig;
use super::error::InvokerError;
use super::traits::ToolRunner;
use super::types::{describe_exit, InvocationContext, InvocationResult, ToolCommand};

static ANSI_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("valid regex"));

/// Runs tools as child processes with `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct ProcessInvoker {
    config: InvokerConfig,
}

impl ProcessInvoker {
    /// Creates a new invoker with the given configuration.
    pub fn new(config: InvokerConfig) -> Self {
        Self { config }
    }

    /// Creates a new invoker with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(InvokerConfig::default())
    }

    /// Turns raw bytes from a pipe into one log line.
    ///
    /// Progress meters redraw with `\r`; only the last redraw is kept.
    fn clean_line(&self, raw: &[u8]) -> Option<String> {
        let text = String::from_utf8_lossy(raw);
        let text = if self.config.strip_ansi {
            ANSI_ESCAPE.replace_all(&text, "").into_owned()
        } else {
            text.into_owned()
        };
        let last = text
            .split('\r')
            .rev()
            .find(|part| !part.trim().is_empty())?;
        Some(last.trim_end().to_string())
    }

    async fn push_line(&self, output: &mut String, raw: Vec<u8>, ctx: &InvocationContext) {
        let Some(line) = self.clean_line(&raw) else {
            return;
        };
        debug!("tool> {}", line);
        output.push_str(&line);
        output.push('\n');
        if let Some(ref tx) = ctx.output_tx {
            let _ = tx.send(line).await;
        }
    }
}

async fn wait_for_deadline(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

#[async_trait]
impl ToolRunner for ProcessInvoker {
    fn name(&self) -> &str {
        "process"
    }

    async fn run(
        &self,
        command: ToolCommand,
        ctx: &InvocationContext,
    ) -> Result<InvocationResult, InvokerError> {
        let program = command.program().to_path_buf();
        if ctx.cancel.is_cancelled() {
            return Err(InvokerError::Cancelled { program });
        }

        let start = Instant::now();
        let command_line = command.to_string();
        debug!("Running: {}", command_line);

        let mut cmd = Command::new(&program);
        cmd.args(command.arg_list())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = command.cwd() {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| InvokerError::from_spawn(&program, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("stderr was not captured"))?;
        let mut stdout_lines = BufReader::new(stdout).split(b'\n');
        let mut stderr_lines = BufReader::new(stderr).split(b'\n');
        let mut stdout_open = true;
        let mut stderr_open = true;

        let deadline = self
            .config
            .timeout_secs
            .map(|secs| tokio::time::Instant::now() + Duration::from_secs(secs));
        let mut output = String::new();

        let status = loop {
            tokio::select! {
                segment = stdout_lines.next_segment(), if stdout_open => match segment {
                    Ok(Some(raw)) => self.push_line(&mut output, raw, ctx).await,
                    Ok(None) => stdout_open = false,
                    Err(e) => {
                        debug!("stdout read error from {}: {}", command_line, e);
                        stdout_open = false;
                    }
                },
                segment = stderr_lines.next_segment(), if stderr_open => match segment {
                    Ok(Some(raw)) => self.push_line(&mut output, raw, ctx).await,
                    Ok(None) => stderr_open = false,
                    Err(e) => {
                        debug!("stderr read error from {}: {}", command_line, e);
                        stderr_open = false;
                    }
                },
                status = child.wait(), if !stdout_open && !stderr_open => break status?,
                _ = ctx.cancel.cancelled() => {
                    let _ = child.kill().await;
                    warn!("Cancelled: {}", command_line);
                    return Err(InvokerError::Cancelled { program });
                }
                _ = wait_for_deadline(deadline) => {
                    let _ = child.kill().await;
                    let timeout_secs = self.config.timeout_secs.unwrap_or_default();
                    warn!("Timed out after {}s: {}", timeout_secs, command_line);
                    return Err(InvokerError::Timeout { program, timeout_secs });
                }
            }
        };

        let result = InvocationResult {
            command: command_line,
            exit_code: status.code(),
            output,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        debug!(
            "Finished in {} ms ({}): {}",
            result.elapsed_ms,
            describe_exit(&result.exit_code),
            result.command
        );
        Ok(result)
    }
}
