//! Job orchestrator: runs one conversion job from submission to a terminal
//! result.
//!
//! Each job walks `Pending -> Staging -> Converting -> Verifying -> Placing ->
//! Cleaning -> Done`. A failure in any step jumps to Cleaning, so the staging
//! area is removed on every path, including cancellation. Source deletion
//! happens only after success and its problems are reported as
//! [`CleanupWarning`]s, never as failures.
//!
//! # Example
//!
//! ```ignore
//! use ozconv_core::orchestrator::{JobDescriptor, JobOrchestrator};
//!
//! let orchestrator = JobOrchestrator::new(&config, Arc::new(ProcessInvoker::new(config.invoker.clone())));
//! let job = JobDescriptor::new("/roms/game.cue", conversion).with_delete_source(true);
//!
//! let (tx, mut rx) = mpsc::channel(64);
//! tokio::spawn(async move {
//!     while let Some(event) = rx.recv().await {
//!         println!("{}", serde_json::to_string(&event).unwrap());
//!     }
//! });
//! let report = orchestrator.run(&job, Some(tx), CancellationToken::new()).await;
//! ```

mod error;
mod runner;
mod trash;
mod types;

pub use error::{JobError, TrashError};
pub use runner::JobOrchestrator;
pub use trash::{CommandTrash, Removal, SourceRemover, Trash};
pub use types::{
    CleanupKind, CleanupWarning, JobDescriptor, JobEvent, JobOutcome, JobReport, JobState,
    OutputTarget,
};
