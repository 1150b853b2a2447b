//! The per-job state machine.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::converter::{ConversionOutcome, ConversionRunner};
use crate::descriptor::{resolve_dependents, DescriptorKind};
use crate::invoker::{InvocationContext, ToolRunner};
use crate::placer::FsPlacer;
use crate::staging::{StagingArea, StagingManager};

use super::error::JobError;
use super::trash::{CommandTrash, SourceRemover, Trash};
use super::types::{
    CleanupKind, CleanupWarning, JobDescriptor, JobEvent, JobOutcome, JobReport, JobState,
};

/// Buffered tool output lines per job before the tool is slowed down.
const LOG_CHANNEL_CAPACITY: usize = 256;

/// Drives jobs through staging, conversion, placement and cleanup.
///
/// Holds no per-job state; one instance can run any number of jobs, and
/// several instances can run side by side.
pub struct JobOrchestrator {
    staging: StagingManager,
    converter: ConversionRunner,
    placer: FsPlacer,
    remover: SourceRemover,
}

impl JobOrchestrator {
    /// Builds the pipeline from configuration. Uses the configured trash
    /// command, if any, for source deletion.
    pub fn new(config: &Config, runner: Arc<dyn ToolRunner>) -> Self {
        let trash = CommandTrash::from_catalog(&config.tools, Arc::clone(&runner))
            .map(|t| Arc::new(t) as Arc<dyn Trash>);
        Self {
            staging: StagingManager::new(
                config.staging.clone(),
                config.tools.clone(),
                Arc::clone(&runner),
            ),
            converter: ConversionRunner::new(
                config.converter.clone(),
                config.tools.clone(),
                runner,
            ),
            placer: FsPlacer::new(config.placement.clone()),
            remover: SourceRemover::new(trash),
        }
    }

    /// Replaces the trash collaborator.
    pub fn with_trash(mut self, trash: Option<Arc<dyn Trash>>) -> Self {
        self.remover = SourceRemover::new(trash);
        self
    }

    /// Runs one job to a terminal state.
    ///
    /// Never returns an error: every failure is captured in the report. The
    /// staging area is removed on every path, including cancellation.
    pub async fn run(
        &self,
        job: &JobDescriptor,
        events: Option<mpsc::Sender<JobEvent>>,
        cancel: CancellationToken,
    ) -> JobReport {
        let started_at = Utc::now();
        let start = Instant::now();
        let sink = EventSink {
            job_id: job.id.clone(),
            tx: events,
        };
        info!(
            "Job {}: {} for {}",
            job.id,
            job.conversion,
            job.input.display()
        );

        let mut warnings = Vec::new();
        let mut notices = Vec::new();

        let outcome = if cancel.is_cancelled() {
            failure(&sink.job_id, JobError::Cancelled, JobState::Pending)
        } else {
            let (ctx, forwarder) = sink.invocation_context(cancel.clone());
            let mut state = JobState::Pending;
            let mut area = None;

            let result = self
                .execute(job, &sink, &ctx, &mut state, &mut area, &mut notices)
                .await;

            // Close the output channel so the forwarder drains and exits
            // before the terminal event.
            drop(ctx);
            if let Some(handle) = forwarder {
                let _ = handle.await;
            }

            sink.state(JobState::Cleaning).await;
            if let Some(mut area) = area {
                if let Err(e) = area.cleanup().await {
                    let warning = CleanupWarning {
                        kind: CleanupKind::StagingDirectory,
                        path: area.root().to_path_buf(),
                        message: e.to_string(),
                    };
                    warn!("{}", warning);
                    sink.warning(warning.to_string()).await;
                    warnings.push(warning);
                }
            }

            match result {
                Ok((artifacts, report)) => {
                    if job.delete_source && !job.conversion.is_text_only() {
                        for warning in self.delete_source(&job.input, &artifacts).await {
                            warn!("{}", warning);
                            sink.warning(warning.to_string()).await;
                            warnings.push(warning);
                        }
                    }
                    JobOutcome::Success { artifacts, report }
                }
                Err(e) => failure(&sink.job_id, e, state),
            }
        };

        // Done always precedes the terminal event.
        sink.state(JobState::Done).await;
        match outcome {
            JobOutcome::Success {
                ref artifacts,
                ref report,
            } => {
                info!("Job {} succeeded with {} artifact(s)", job.id, artifacts.len());
                sink.send(JobEvent::Completed {
                    job_id: job.id.clone(),
                    artifacts: artifacts.clone(),
                    report: report.clone(),
                })
                .await;
            }
            JobOutcome::Failure {
                ref classification,
                ref diagnostic,
                failed_state,
            } => {
                sink.send(JobEvent::Failed {
                    job_id: job.id.clone(),
                    classification: classification.clone(),
                    diagnostic: diagnostic.clone(),
                    failed_state,
                })
                .await;
            }
        }

        JobReport {
            job_id: job.id.clone(),
            input: job.input.clone(),
            outcome,
            warnings,
            notices,
            started_at,
            finished_at: Utc::now(),
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Runs jobs one after another. A failed job never stops the batch; once
    /// `cancel` fires the remaining jobs are reported as cancelled without
    /// being staged.
    pub async fn run_batch(
        &self,
        jobs: &[JobDescriptor],
        events: Option<mpsc::Sender<JobEvent>>,
        cancel: CancellationToken,
    ) -> Vec<JobReport> {
        let mut reports = Vec::with_capacity(jobs.len());
        for (idx, job) in jobs.iter().enumerate() {
            info!("Batch job {}/{}", idx + 1, jobs.len());
            reports.push(self.run(job, events.clone(), cancel.clone()).await);
        }
        reports
    }

    /// Pending through Placing. Leaves the staging area in `area` so the
    /// caller can always clean it up.
    async fn execute(
        &self,
        job: &JobDescriptor,
        sink: &EventSink,
        ctx: &InvocationContext,
        state: &mut JobState,
        area: &mut Option<StagingArea>,
        notices: &mut Vec<String>,
    ) -> Result<(Vec<PathBuf>, Option<String>), JobError> {
        let dest_dir = job
            .destination_dir()
            .ok_or_else(|| JobError::NoDestination {
                path: job.input.clone(),
            })?;

        *state = JobState::Staging;
        sink.state(*state).await;
        let policy = job.conversion.input_policy();
        let staged = area.insert(self.staging.allocate(&job.input).await?);
        let primary = self
            .staging
            .populate(staged, &job.input, &policy, ctx)
            .await?;
        check_cancel(ctx)?;

        *state = JobState::Converting;
        sink.state(*state).await;
        let base_name = job.base_name();
        let result = self
            .converter
            .convert(&job.conversion, &primary, staged.root(), &base_name, ctx)
            .await;
        let outcome: ConversionOutcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                if e.is_verification_failure() {
                    *state = JobState::Verifying;
                    sink.state(*state).await;
                }
                return Err(e.into());
            }
        };
        *state = JobState::Verifying;
        sink.state(*state).await;
        for warning in &outcome.warnings {
            sink.warning(warning.clone()).await;
        }
        notices.extend(outcome.warnings.iter().cloned());
        check_cancel(ctx)?;

        *state = JobState::Placing;
        sink.state(*state).await;
        let artifact_paths: Vec<PathBuf> =
            outcome.artifacts.iter().map(|a| a.path.clone()).collect();
        let placed = self
            .placer
            .place_group(&artifact_paths, &dest_dir, job.overwrite)
            .await?;

        Ok((placed, outcome.report))
    }

    /// Removes the input and, for CUE/GDI inputs, every dependent file.
    /// Paths that were just written as artifacts are kept.
    async fn delete_source(&self, input: &Path, placed: &[PathBuf]) -> Vec<CleanupWarning> {
        let mut targets = Vec::new();
        if DescriptorKind::from_path(input).is_some() {
            match resolve_dependents(input).await {
                Ok(set) => targets.extend(set.paths()),
                Err(e) => warn!("Could not list dependents of {}: {}", input.display(), e),
            }
        }
        targets.push(input.to_path_buf());
        info!(
            "Removing {} source file(s) {}",
            targets.len(),
            if self.remover.has_trash() {
                "via trash"
            } else {
                "permanently"
            }
        );

        let mut warnings = Vec::new();
        for path in targets {
            if placed.contains(&path) {
                warn!("Keeping {}: it was replaced by an artifact", path.display());
                continue;
            }
            if let Err(warning) = self.remover.remove(&path).await {
                warnings.push(warning);
            }
        }
        warnings
    }
}

fn failure(job_id: &str, error: JobError, state: JobState) -> JobOutcome {
    error!("Job {} failed while {}: {}", job_id, state, error);
    JobOutcome::Failure {
        classification: error.classification().to_string(),
        diagnostic: error.diagnostic(),
        failed_state: state,
    }
}

fn check_cancel(ctx: &InvocationContext) -> Result<(), JobError> {
    if ctx.cancel.is_cancelled() {
        return Err(JobError::Cancelled);
    }
    Ok(())
}

/// Tags events with the job id and drops them when nobody listens.
struct EventSink {
    job_id: String,
    tx: Option<mpsc::Sender<JobEvent>>,
}

impl EventSink {
    async fn send(&self, event: JobEvent) {
        if let Some(ref tx) = self.tx {
            let _ = tx.send(event).await;
        }
    }

    async fn state(&self, state: JobState) {
        self.send(JobEvent::StateChanged {
            job_id: self.job_id.clone(),
            state,
        })
        .await;
    }

    async fn warning(&self, message: String) {
        self.send(JobEvent::Warning {
            job_id: self.job_id.clone(),
            message,
        })
        .await;
    }

    /// Context whose tool output lines are forwarded as [`JobEvent::Log`].
    fn invocation_context(
        &self,
        cancel: CancellationToken,
    ) -> (InvocationContext, Option<JoinHandle<()>>) {
        let ctx = InvocationContext::new(cancel);
        let Some(events) = self.tx.clone() else {
            return (ctx, None);
        };

        let (line_tx, mut line_rx) = mpsc::channel::<String>(LOG_CHANNEL_CAPACITY);
        let job_id = self.job_id.clone();
        let handle = tokio::spawn(async move {
            while let Some(line) = line_rx.recv().await {
                let _ = events
                    .send(JobEvent::Log {
                        job_id: job_id.clone(),
                        line,
                    })
                    .await;
            }
        });
        (ctx.with_output(line_tx), Some(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{CdImageFormat, ChdCreateOptions, Conversion};
    use crate::staging::StagingConfig;
    use crate::testing::{MockTrash, ScriptedRunner, ScriptedStep};
    use tempfile::TempDir;

    struct Fixture {
        temp_root: TempDir,
        roms: TempDir,
        runner: ScriptedRunner,
        trash: MockTrash,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                temp_root: TempDir::new().unwrap(),
                roms: TempDir::new().unwrap(),
                runner: ScriptedRunner::new(),
                trash: MockTrash::new(),
            }
        }

        fn orchestrator(&self) -> JobOrchestrator {
            let config = Config {
                staging: StagingConfig::default()
                    .with_temp_root(self.temp_root.path().to_path_buf()),
                ..Config::default()
            };
            JobOrchestrator::new(&config, Arc::new(self.runner.clone()))
                .with_trash(Some(Arc::new(self.trash.clone())))
        }

        fn write(&self, name: &str, contents: &[u8]) -> PathBuf {
            let path = self.roms.path().join(name);
            std::fs::write(&path, contents).unwrap();
            path
        }

        fn cue_pair(&self) -> PathBuf {
            self.write("game.bin", b"sectors");
            self.write("game.cue", b"FILE \"game.bin\" BINARY\n  TRACK 01 MODE1/2352\n")
        }

        fn staging_dirs(&self) -> usize {
            std::fs::read_dir(self.temp_root.path()).unwrap().count()
        }
    }

    async fn collect(mut rx: mpsc::Receiver<JobEvent>) -> Vec<JobEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    fn states(events: &[JobEvent]) -> Vec<JobState> {
        events
            .iter()
            .filter_map(|e| match e {
                JobEvent::StateChanged { state, .. } => Some(*state),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_success_walks_every_state() {
        let fx = Fixture::new();
        let cue = fx.cue_pair();
        fx.runner
            .push(ScriptedStep::success("Compressing, 100% complete").writing_output(b"MComprHD".to_vec()))
            .await;

        let (tx, rx) = mpsc::channel(64);
        let job = JobDescriptor::new(&cue, Conversion::CompressCd(ChdCreateOptions::default()));
        let report = fx
            .orchestrator()
            .run(&job, Some(tx), CancellationToken::new())
            .await;
        let events = collect(rx).await;

        assert!(report.is_success());
        assert_eq!(report.artifacts(), &[fx.roms.path().join("game.chd")]);
        assert_eq!(
            states(&events),
            vec![
                JobState::Staging,
                JobState::Converting,
                JobState::Verifying,
                JobState::Placing,
                JobState::Cleaning,
                JobState::Done,
            ]
        );
        assert!(events.iter().any(|e| matches!(
            e,
            JobEvent::Log { line, .. } if line == "Compressing, 100% complete"
        )));
        assert!(matches!(events.last(), Some(JobEvent::Completed { .. })));
        assert_eq!(fx.staging_dirs(), 0);
        // Source kept without delete_source.
        assert!(cue.exists());
    }

    #[tokio::test]
    async fn test_delete_source_removes_dependents() {
        let fx = Fixture::new();
        let cue = fx.cue_pair();
        fx.runner
            .push(ScriptedStep::success("").writing_output(b"MComprHD".to_vec()))
            .await;

        let job = JobDescriptor::new(&cue, Conversion::CompressCd(ChdCreateOptions::default()))
            .with_delete_source(true);
        let report = fx
            .orchestrator()
            .run(&job, None, CancellationToken::new())
            .await;

        assert!(report.is_success());
        assert!(!cue.exists());
        assert!(!fx.roms.path().join("game.bin").exists());
        assert_eq!(
            fx.trash.trashed_paths().await,
            vec![fx.roms.path().join("game.bin"), cue]
        );
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_tool_failure_keeps_source() {
        let fx = Fixture::new();
        let cue = fx.cue_pair();
        fx.runner
            .push_failure(1, "Error parsing input file (game.cue): Invalid argument")
            .await;

        let (tx, rx) = mpsc::channel(64);
        let job = JobDescriptor::new(&cue, Conversion::CompressCd(ChdCreateOptions::default()))
            .with_delete_source(true);
        let report = fx
            .orchestrator()
            .run(&job, Some(tx), CancellationToken::new())
            .await;
        let events = collect(rx).await;

        // Done comes first, the terminal event last, as on success.
        assert!(matches!(
            &events[events.len() - 2..],
            [
                JobEvent::StateChanged { state: JobState::Done, .. },
                JobEvent::Failed { failed_state: JobState::Converting, .. },
            ]
        ));
        match report.outcome {
            JobOutcome::Failure {
                ref classification,
                ref diagnostic,
                failed_state,
            } => {
                assert_eq!(classification, "tool_invocation_error");
                assert!(diagnostic.contains("Invalid argument"));
                assert_eq!(failed_state, JobState::Converting);
            }
            ref other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(cue.exists());
        assert!(fx.trash.trashed_paths().await.is_empty());
        assert_eq!(fx.staging_dirs(), 0);
    }

    #[tokio::test]
    async fn test_missing_dependent_fails_before_conversion() {
        let fx = Fixture::new();
        let cue = fx.write("game.cue", b"FILE \"game.bin\" BINARY\n");

        let job = JobDescriptor::new(&cue, Conversion::CompressCd(ChdCreateOptions::default()));
        let report = fx
            .orchestrator()
            .run(&job, None, CancellationToken::new())
            .await;

        assert!(!report.is_success());
        assert!(matches!(
            report.outcome,
            JobOutcome::Failure { failed_state: JobState::Staging, ref classification, .. }
                if classification == "staging_error"
        ));
        assert!(fx.runner.recorded_commands().await.is_empty());
        assert_eq!(fx.staging_dirs(), 0);
    }

    #[tokio::test]
    async fn test_empty_artifact_fails_in_verifying() {
        let fx = Fixture::new();
        let iso = fx.write("game.iso", b"iso");
        fx.runner
            .push(ScriptedStep::success("done").writing_output(Vec::new()))
            .await;

        let (tx, rx) = mpsc::channel(64);
        let job = JobDescriptor::new(&iso, Conversion::CompressDvd(ChdCreateOptions::default()));
        let report = fx
            .orchestrator()
            .run(&job, Some(tx), CancellationToken::new())
            .await;
        let events = collect(rx).await;

        assert!(matches!(
            report.outcome,
            JobOutcome::Failure { failed_state: JobState::Verifying, ref classification, .. }
                if classification == "artifact_verification_error"
        ));
        assert_eq!(
            states(&events),
            vec![
                JobState::Staging,
                JobState::Converting,
                JobState::Verifying,
                JobState::Cleaning,
                JobState::Done,
            ]
        );
        assert!(!fx.roms.path().join("game.chd").exists());
    }

    #[tokio::test]
    async fn test_placement_collision_and_output_dir() {
        let fx = Fixture::new();
        let chd = fx.write("game.chd", b"MComprHD");
        let out = fx.roms.path().join("extracted");
        std::fs::create_dir(&out).unwrap();
        std::fs::write(out.join("game.cue"), b"old").unwrap();

        fx.runner
            .push(ScriptedStep::success("").with_effect(|cmd| {
                let cue = crate::testing::output_target(cmd).unwrap();
                std::fs::write(&cue, b"FILE \"game.bin\" BINARY\n")?;
                std::fs::write(cue.with_extension("bin"), b"sectors")
            }))
            .await;

        let job = JobDescriptor::new(
            &chd,
            Conversion::ExtractCd {
                format: CdImageFormat::Cue,
            },
        )
        .with_output_dir(&out);
        let config = Config {
            staging: StagingConfig::default().with_temp_root(fx.temp_root.path().to_path_buf()),
            converter: crate::converter::ConverterConfig::default().with_verify_before_extract(false),
            ..Config::default()
        };
        let report = JobOrchestrator::new(&config, Arc::new(fx.runner.clone()))
            .run(&job, None, CancellationToken::new())
            .await;

        assert_eq!(
            report.artifacts(),
            &[out.join("game_1.cue"), out.join("game_1.bin")]
        );
        assert_eq!(std::fs::read(out.join("game.cue")).unwrap(), b"old");
        assert_eq!(
            std::fs::read_to_string(out.join("game_1.cue")).unwrap(),
            "FILE \"game_1.bin\" BINARY\n"
        );
    }

    #[tokio::test]
    async fn test_extracted_pair_avoids_unrelated_track() {
        let fx = Fixture::new();
        let chd = fx.write("game.chd", b"MComprHD");
        let other = fx.write("game.bin", b"OLD OTHER DISC");

        fx.runner
            .push(ScriptedStep::success("").with_effect(|cmd| {
                let cue = crate::testing::output_target(cmd).unwrap();
                std::fs::write(&cue, b"FILE \"game.bin\" BINARY\n")?;
                std::fs::write(cue.with_extension("bin"), b"sectors")
            }))
            .await;

        let job = JobDescriptor::new(
            &chd,
            Conversion::ExtractCd {
                format: CdImageFormat::Cue,
            },
        );
        let config = Config {
            staging: StagingConfig::default().with_temp_root(fx.temp_root.path().to_path_buf()),
            converter: crate::converter::ConverterConfig::default().with_verify_before_extract(false),
            ..Config::default()
        };
        let report = JobOrchestrator::new(&config, Arc::new(fx.runner.clone()))
            .run(&job, None, CancellationToken::new())
            .await;

        let placed_cue = fx.roms.path().join("game_1.cue");
        let placed_bin = fx.roms.path().join("game_1.bin");
        assert_eq!(report.artifacts(), &[placed_cue.clone(), placed_bin.clone()]);
        assert_eq!(
            std::fs::read_to_string(&placed_cue).unwrap(),
            "FILE \"game_1.bin\" BINARY\n"
        );
        assert_eq!(std::fs::read(&placed_bin).unwrap(), b"sectors");
        assert_eq!(std::fs::read(&other).unwrap(), b"OLD OTHER DISC");
    }

    #[tokio::test]
    async fn test_info_report_places_nothing() {
        let fx = Fixture::new();
        let chd = fx.write("game.chd", b"MComprHD");
        fx.runner.push_success("Logical size: 650 MB").await;

        let job = JobDescriptor::new(&chd, Conversion::ChdInfo).with_delete_source(true);
        let report = fx
            .orchestrator()
            .run(&job, None, CancellationToken::new())
            .await;

        assert_eq!(
            report.outcome,
            JobOutcome::Success {
                artifacts: vec![],
                report: Some("Logical size: 650 MB".to_string()),
            }
        );
        // Text-only jobs never delete their input.
        assert!(chd.exists());
    }

    #[tokio::test]
    async fn test_cancel_kills_tool_and_cleans_up() {
        let fx = Fixture::new();
        let iso = fx.write("game.iso", b"iso");
        fx.runner.push(ScriptedStep::hang()).await;

        let cancel = CancellationToken::new();
        let orchestrator = fx.orchestrator();
        let job = JobDescriptor::new(&iso, Conversion::CompressCso);

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            trigger.cancel();
        });
        let report = orchestrator.run(&job, None, cancel).await;

        assert!(matches!(
            report.outcome,
            JobOutcome::Failure { ref classification, .. } if classification == "cancelled"
        ));
        assert_eq!(fx.staging_dirs(), 0);
    }

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let fx = Fixture::new();
        let bad = fx.write("bad.chd", b"x");
        let good = fx.write("good.chd", b"x");
        fx.runner.push_failure(1, "Error: file is not a CHD").await;
        fx.runner.push_success("ok").await;

        let jobs = vec![
            JobDescriptor::new(&bad, Conversion::ChdVerify { fix: false }),
            JobDescriptor::new(&good, Conversion::ChdVerify { fix: false }),
        ];
        let reports = fx
            .orchestrator()
            .run_batch(&jobs, None, CancellationToken::new())
            .await;

        assert_eq!(reports.len(), 2);
        assert!(!reports[0].is_success());
        assert!(reports[1].is_success());
    }

    #[tokio::test]
    async fn test_batch_after_cancel_skips_staging() {
        let fx = Fixture::new();
        let chd = fx.write("game.chd", b"x");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let jobs = vec![JobDescriptor::new(&chd, Conversion::ChdInfo); 2];
        let reports = fx.orchestrator().run_batch(&jobs, None, cancel).await;

        assert!(reports.iter().all(|r| matches!(
            r.outcome,
            JobOutcome::Failure { failed_state: JobState::Pending, .. }
        )));
        assert!(fx.runner.recorded_commands().await.is_empty());
        assert_eq!(fx.staging_dirs(), 0);
    }
}
