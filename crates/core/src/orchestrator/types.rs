//! Types for the job orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::converter::Conversion;
use crate::staging::archive_stem;

/// Where a job's artifacts go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "path", rename_all = "snake_case")]
pub enum OutputTarget {
    /// The directory containing the original input.
    #[default]
    SameAsInput,
    Directory(PathBuf),
}

/// One unit of work submitted to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// Identifier carried by every event for this job.
    #[serde(default = "new_job_id")]
    pub id: String,
    /// The file to convert.
    pub input: PathBuf,
    pub conversion: Conversion,
    #[serde(default)]
    pub output: OutputTarget,
    /// Replace existing files instead of picking a suffixed name.
    #[serde(default)]
    pub overwrite: bool,
    /// Remove the input (and its dependents) after a successful job.
    #[serde(default)]
    pub delete_source: bool,
    /// Overrides the artifact base name, which defaults to the input stem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_stem: Option<String>,
}

fn new_job_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl JobDescriptor {
    pub fn new(input: impl Into<PathBuf>, conversion: Conversion) -> Self {
        Self {
            id: new_job_id(),
            input: input.into(),
            conversion,
            output: OutputTarget::SameAsInput,
            overwrite: false,
            delete_source: false,
            output_stem: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output = OutputTarget::Directory(dir.into());
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_delete_source(mut self, delete: bool) -> Self {
        self.delete_source = delete;
        self
    }

    pub fn with_output_stem(mut self, stem: impl Into<String>) -> Self {
        self.output_stem = Some(stem.into());
        self
    }

    /// The directory artifacts are placed into.
    pub fn destination_dir(&self) -> Option<PathBuf> {
        match self.output {
            OutputTarget::Directory(ref dir) => Some(dir.clone()),
            OutputTarget::SameAsInput => self
                .input
                .parent()
                .map(|p| if p.as_os_str().is_empty() { Path::new(".") } else { p })
                .map(Path::to_path_buf),
        }
    }

    /// Base name for artifacts: the override, or the input stem without any
    /// archive extension.
    pub fn base_name(&self) -> String {
        self.output_stem
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| archive_stem(&self.input))
            .unwrap_or_else(|| "output".to_string())
    }
}

/// Lifecycle of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Staging,
    Converting,
    Verifying,
    Placing,
    Cleaning,
    Done,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Pending => "pending",
            JobState::Staging => "staging",
            JobState::Converting => "converting",
            JobState::Verifying => "verifying",
            JobState::Placing => "placing",
            JobState::Cleaning => "cleaning",
            JobState::Done => "done",
        };
        f.write_str(s)
    }
}

/// Which cleanup step produced a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupKind {
    StagingDirectory,
    SourceFile,
}

/// A non-fatal cleanup problem. Never turns a success into a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupWarning {
    pub kind: CleanupKind,
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            CleanupKind::StagingDirectory => "staging directory",
            CleanupKind::SourceFile => "source file",
        };
        write!(f, "Could not remove {} {}: {}", what, self.path.display(), self.message)
    }
}

/// Progress and log events streamed to the caller while a job runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JobEvent {
    StateChanged {
        job_id: String,
        state: JobState,
    },
    /// One line of tool output.
    Log {
        job_id: String,
        line: String,
    },
    Warning {
        job_id: String,
        message: String,
    },
    Completed {
        job_id: String,
        artifacts: Vec<PathBuf>,
        #[serde(skip_serializing_if = "Option::is_none")]
        report: Option<String>,
    },
    Failed {
        job_id: String,
        classification: String,
        diagnostic: String,
        failed_state: JobState,
    },
}

/// Terminal result of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum JobOutcome {
    Success {
        /// Final paths of the placed artifacts.
        artifacts: Vec<PathBuf>,
        /// Captured text for info/verify jobs.
        #[serde(skip_serializing_if = "Option::is_none")]
        report: Option<String>,
    },
    Failure {
        /// One-line error class, e.g. `tool_invocation_error`.
        classification: String,
        /// Error message followed by the captured tool output, if any.
        diagnostic: String,
        failed_state: JobState,
    },
}

/// Everything known about a finished job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: String,
    pub input: PathBuf,
    pub outcome: JobOutcome,
    /// Cleanup problems that did not affect the outcome.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<CleanupWarning>,
    /// Non-fatal notes from the conversion routine.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, JobOutcome::Success { .. })
    }

    /// Placed artifact paths; empty for failures.
    pub fn artifacts(&self) -> &[PathBuf] {
        match self.outcome {
            JobOutcome::Success { ref artifacts, .. } => artifacts,
            JobOutcome::Failure { .. } => &[],
        }
    }

    /// Diagnostic text; `None` for successes.
    pub fn diagnostic(&self) -> Option<&str> {
        match self.outcome {
            JobOutcome::Failure { ref diagnostic, .. } => Some(diagnostic),
            JobOutcome::Success { .. } => None,
        }
    }
}
