//! Testing utilities and mock implementations.
//!
//! These stand in for the external tools and the trash collaborator so the
//! pipeline can be exercised without chdman, 7-Zip or a desktop session.
//!
//! # Example
//!
//! ```rust,ignore
//! use ozconv_core::testing::{MockTrash, ScriptedRunner, ScriptedStep};
//!
//! let runner = ScriptedRunner::new();
//! runner.push(ScriptedStep::success("ok").writing_output(b"MComprHD".to_vec())).await;
//!
//! let orchestrator = JobOrchestrator::new(&config, Arc::new(runner.clone()))
//!     .with_trash(Some(Arc::new(MockTrash::new())));
//! ```

mod mock_trash;
mod scripted_runner;

pub use mock_trash::MockTrash;
pub use scripted_runner::{output_target, ScriptedRunner, ScriptedStep};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    /// Writes `game.cue` and one track file per name into `dir`.
    pub fn write_cue_set(dir: &Path, stem: &str, tracks: &[&str]) -> std::io::Result<PathBuf> {
        let mut sheet = String::new();
        for (idx, track) in tracks.iter().enumerate() {
            sheet.push_str(&format!(
                "FILE \"{}\" BINARY\n  TRACK {:02} MODE2/2352\n    INDEX 01 00:00:00\n",
                track,
                idx + 1
            ));
            std::fs::write(dir.join(track), b"\0\xff\xff\xff\xff\xff\xff\xff\xff\xff\xff\0")?;
        }
        let cue = dir.join(format!("{}.cue", stem));
        std::fs::write(&cue, sheet)?;
        Ok(cue)
    }

    /// Writes a GDI sheet and its track files into `dir`.
    pub fn write_gdi_set(dir: &Path, stem: &str, tracks: &[&str]) -> std::io::Result<PathBuf> {
        let mut sheet = format!("{}\n", tracks.len());
        for (idx, track) in tracks.iter().enumerate() {
            let name = if track.contains(' ') {
                format!("\"{}\"", track)
            } else {
                track.to_string()
            };
            sheet.push_str(&format!("{} {} 4 2352 {} 0\n", idx + 1, idx * 450, name));
            std::fs::write(dir.join(track), b"track")?;
        }
        let gdi = dir.join(format!("{}.gdi", stem));
        std::fs::write(&gdi, sheet)?;
        Ok(gdi)
    }
}
