//! Conversion routines for disc images and archives.
//!
//! Each supported conversion is a variant of [`Conversion`] carrying its own
//! typed parameters. [`ConversionRunner`] turns a variant into one or more
//! external tool calls (chdman, DolphinTool, maxcso, 7-Zip), stops at the first
//! failing step, and then checks that every declared artifact exists with a
//! non-zero size.
//!
//! # Example
//!
//! ```ignore
//! use ozconv_core::converter::{ChdCreateOptions, ChdMedia, Conversion, ConversionRunner};
//!
//! let converter = ConversionRunner::new(config.converter.clone(), config.tools.clone(), runner);
//! let conversion = Conversion::CompressCd(ChdCreateOptions::preset_for(ChdMedia::Cd));
//!
//! let outcome = converter
//!     .convert(&conversion, area.primary().unwrap(), area.root(), "game", &ctx)
//!     .await?;
//! for artifact in &outcome.artifacts {
//!     println!("{} ({} bytes)", artifact.path.display(), artifact.size_bytes);
//! }
//! ```

mod chdman;
mod config;
mod dolphin;
mod error;
mod maxcso;
mod options;
mod runner;
mod sevenzip;
mod types;
mod verify;

pub use config::ConverterConfig;
pub use error::ConversionError;
pub use options::{
    CdImageFormat, ChdCreateOptions, ChdMedia, Chs, DiskImageFormat, DolphinFormat,
    DolphinOptions, HardDiskOptions, LaserDiscOptions,
};
pub use runner::{ConversionRunner, OUTPUT_DIR};
pub use types::{Artifact, ArtifactRole, Conversion, ConversionOutcome};
