//! Job lifecycle integration tests.
//!
//! These drive the orchestrator end to end against the real process invoker,
//! with small shell scripts standing in for chdman:
//! - Staging of descriptor sets and their dependents
//! - Tool failures carrying the tool's stderr into the diagnostic
//! - Artifact verification of empty outputs
//! - Staging cleanup on every exit path, cancellation included
//! - Source deletion through the trash collaborator

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use ozconv_core::{
    converter::ChdCreateOptions,
    invoker::{Tool, ToolCatalog},
    staging::StagingConfig,
    testing::{fixtures, MockTrash},
    Config, Conversion, JobDescriptor, JobEvent, JobOrchestrator, JobOutcome, JobState,
    ProcessInvoker,
};

/// Copies the `-i` input to the `-o` path, like a very lazy chdman.
const COPYING_CHDMAN: &str = r#"#!/bin/sh
in=""
out=""
while [ $# -gt 0 ]; do
    case "$1" in
        -i) in="$2"; shift ;;
        -o) out="$2"; shift ;;
    esac
    shift
done
echo "Compressing $(basename "$in")"
echo "Compression complete ... final ratio = 42.0%"
cp "$in" "$out"
"#;

const FAILING_CHDMAN: &str = r#"#!/bin/sh
echo "chdman - MAME Compressed Hunks of Data (CHD) manager"
echo "Error: unsupported track type in input" >&2
exit 2
"#;

/// Exits cleanly but leaves a zero-byte output behind.
const EMPTY_CHDMAN: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
    case "$1" in
        -o) out="$2"; shift ;;
    esac
    shift
done
: > "$out"
"#;

const HANGING_CHDMAN: &str = r#"#!/bin/sh
echo "Compressing, 0.1% complete..."
exec sleep 30
"#;

/// Test helper wiring an orchestrator to a stub chdman.
struct TestHarness {
    orchestrator: JobOrchestrator,
    trash: MockTrash,
    temp_root: TempDir,
    roms: TempDir,
    _bin: TempDir,
}

impl TestHarness {
    fn new(chdman_script: &str) -> Self {
        let bin = TempDir::new().expect("Failed to create bin dir");
        let temp_root = TempDir::new().expect("Failed to create temp root");
        let roms = TempDir::new().expect("Failed to create roms dir");

        let chdman = write_script(bin.path(), "chdman", chdman_script);
        let config = Config {
            tools: ToolCatalog::default().with_tool(Tool::Chdman, chdman),
            staging: StagingConfig::default().with_temp_root(temp_root.path().to_path_buf()),
            ..Config::default()
        };

        let trash = MockTrash::new();
        let runner = Arc::new(ProcessInvoker::new(config.invoker.clone()));
        let orchestrator =
            JobOrchestrator::new(&config, runner).with_trash(Some(Arc::new(trash.clone())));

        Self {
            orchestrator,
            trash,
            temp_root,
            roms,
            _bin: bin,
        }
    }

    fn roms(&self) -> &Path {
        self.roms.path()
    }

    fn staging_dirs(&self) -> usize {
        std::fs::read_dir(self.temp_root.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    async fn run_collecting(&self, job: &JobDescriptor) -> (ozconv_core::JobReport, Vec<JobEvent>) {
        let (tx, mut rx) = mpsc::channel(256);
        let report = self
            .orchestrator
            .run(job, Some(tx), CancellationToken::new())
            .await;
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        (report, events)
    }
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("Failed to write stub");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to chmod stub");
    path
}

fn compress_cd() -> Conversion {
    Conversion::CompressCd(ChdCreateOptions::default())
}

// =============================================================================
// Successful jobs
// =============================================================================

#[tokio::test]
async fn test_cue_set_compresses_and_places_output() {
    let harness = TestHarness::new(COPYING_CHDMAN);
    let cue = fixtures::write_cue_set(harness.roms(), "game", &["game (Track 1).bin"])
        .expect("Failed to write cue set");

    let job = JobDescriptor::new(&cue, compress_cd()).with_output_stem("out");
    let (report, events) = harness.run_collecting(&job).await;

    assert!(report.is_success(), "diagnostic: {:?}", report.diagnostic());
    let placed = harness.roms().join("out.chd");
    assert_eq!(report.artifacts(), &[placed.clone()]);
    let original = std::fs::read(&cue).expect("cue should still exist");
    assert_eq!(std::fs::read(&placed).unwrap(), original);

    assert!(events.iter().any(|e| matches!(
        e,
        JobEvent::Log { line, .. } if line == "Compressing game.cue"
    )));
    assert!(matches!(events.last(), Some(JobEvent::Completed { .. })));
    assert_eq!(harness.staging_dirs(), 0);
}

#[tokio::test]
async fn test_gdi_delete_source_trashes_every_track() {
    let harness = TestHarness::new(COPYING_CHDMAN);
    let gdi = fixtures::write_gdi_set(
        harness.roms(),
        "disc",
        &["track01.bin", "track02.raw", "track 03.bin"],
    )
    .expect("Failed to write gdi set");

    let job = JobDescriptor::new(&gdi, compress_cd()).with_delete_source(true);
    let (report, _) = harness.run_collecting(&job).await;

    assert!(report.is_success(), "diagnostic: {:?}", report.diagnostic());
    assert!(report.warnings.is_empty());
    assert!(harness.roms().join("disc.chd").exists());

    let mut trashed = harness.trash.trashed_paths().await;
    trashed.sort();
    let mut expected = vec![
        harness.roms().join("disc.gdi"),
        harness.roms().join("track01.bin"),
        harness.roms().join("track02.raw"),
        harness.roms().join("track 03.bin"),
    ];
    expected.sort();
    assert_eq!(trashed, expected);
}

#[tokio::test]
async fn test_trash_failure_falls_back_to_delete() {
    let harness = TestHarness::new(COPYING_CHDMAN);
    harness.trash.set_fail(true).await;
    let iso = harness.roms().join("game.iso");
    std::fs::write(&iso, b"data track").unwrap();

    let job = JobDescriptor::new(&iso, compress_cd()).with_delete_source(true);
    let (report, _) = harness.run_collecting(&job).await;

    // The permanent-delete fallback still removes the file.
    assert!(report.is_success());
    assert!(!iso.exists());
    assert!(report.warnings.is_empty());
    assert!(harness.trash.trashed_paths().await.is_empty());
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_tool_failure_reports_stderr_and_keeps_source() {
    let harness = TestHarness::new(FAILING_CHDMAN);
    let cue = fixtures::write_cue_set(harness.roms(), "game", &["game.bin"]).unwrap();

    let job = JobDescriptor::new(&cue, compress_cd()).with_delete_source(true);
    let (report, events) = harness.run_collecting(&job).await;

    match report.outcome {
        JobOutcome::Failure {
            ref classification,
            ref diagnostic,
            failed_state,
        } => {
            assert_eq!(classification, "tool_invocation_error");
            assert_eq!(failed_state, JobState::Converting);
            assert!(diagnostic.contains("Error: unsupported track type in input"));
        }
        ref other => panic!("expected failure, got {:?}", other),
    }
    assert!(matches!(events.last(), Some(JobEvent::Failed { .. })));
    assert!(cue.exists());
    assert!(harness.roms().join("game.bin").exists());
    assert!(!harness.roms().join("game.chd").exists());
    assert!(harness.trash.trashed_paths().await.is_empty());
    assert_eq!(harness.staging_dirs(), 0);
}

#[tokio::test]
async fn test_missing_dependent_never_invokes_tool() {
    let harness = TestHarness::new(FAILING_CHDMAN);
    let cue = fixtures::write_cue_set(harness.roms(), "game", &["game.bin"]).unwrap();
    std::fs::remove_file(harness.roms().join("game.bin")).unwrap();

    let (report, events) = harness.run_collecting(&JobDescriptor::new(&cue, compress_cd())).await;

    assert!(matches!(
        report.outcome,
        JobOutcome::Failure { ref classification, failed_state: JobState::Staging, .. }
            if classification == "staging_error"
    ));
    assert!(report.diagnostic().unwrap().contains("game.bin"));
    // The failing stub would have logged its banner if it had run.
    assert!(!events.iter().any(|e| matches!(e, JobEvent::Log { .. })));
    assert_eq!(harness.staging_dirs(), 0);
}

#[tokio::test]
async fn test_empty_output_fails_verification() {
    let harness = TestHarness::new(EMPTY_CHDMAN);
    let iso = harness.roms().join("game.iso");
    std::fs::write(&iso, b"data track").unwrap();

    let job = JobDescriptor::new(&iso, compress_cd()).with_delete_source(true);
    let (report, _) = harness.run_collecting(&job).await;

    assert!(matches!(
        report.outcome,
        JobOutcome::Failure { ref classification, failed_state: JobState::Verifying, .. }
            if classification == "artifact_verification_error"
    ));
    assert!(iso.exists());
    assert!(!harness.roms().join("game.chd").exists());
    assert_eq!(harness.staging_dirs(), 0);
}

// =============================================================================
// Cancellation and batches
// =============================================================================

#[tokio::test]
async fn test_cancel_terminates_tool_and_cleans_up() {
    let harness = TestHarness::new(HANGING_CHDMAN);
    let iso = harness.roms().join("game.iso");
    std::fs::write(&iso, b"data track").unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let job = JobDescriptor::new(&iso, compress_cd());
    let report = tokio::time::timeout(
        Duration::from_secs(10),
        harness.orchestrator.run(&job, None, cancel),
    )
    .await
    .expect("cancelled job should finish promptly");

    assert!(matches!(
        report.outcome,
        JobOutcome::Failure { ref classification, .. } if classification == "cancelled"
    ));
    assert!(iso.exists());
    assert_eq!(harness.staging_dirs(), 0);
}

#[tokio::test]
async fn test_batch_continues_after_failure() {
    let harness = TestHarness::new(COPYING_CHDMAN);
    let missing = harness.roms().join("missing.cue");
    let good = fixtures::write_cue_set(harness.roms(), "good", &["good.bin"]).unwrap();

    let jobs = vec![
        JobDescriptor::new(&missing, compress_cd()),
        JobDescriptor::new(&good, compress_cd()),
    ];
    let reports = harness
        .orchestrator
        .run_batch(&jobs, None, CancellationToken::new())
        .await;

    assert_eq!(reports.len(), 2);
    assert!(!reports[0].is_success());
    assert!(reports[1].is_success());
    assert!(harness.roms().join("good.chd").exists());
    assert_eq!(harness.staging_dirs(), 0);
}
