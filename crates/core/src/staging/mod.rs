//! Staging area manager.
//!
//! Each job gets its own temporary directory. The input is copied (or, for
//! archives, extracted) into it together with every file a CUE/GDI
//! descriptor references, so the conversion routine only ever touches files
//! under the staging root.
//!
//! Allocation and population are separate steps so that a half-populated
//! area is still owned by the caller, which removes it on every exit path:
//!
//! ```ignore
//! let mut area = manager.allocate(&input).await?;
//! let staged = manager.populate(&mut area, &input, &policy, &ctx).await;
//! // ... convert ...
//! area.cleanup().await?;
//! ```

mod archive;
mod area;
mod config;
mod error;
mod manager;
mod types;

pub use archive::{archive_stem, find_primary, is_archive, ARCHIVE_EXTENSIONS};
pub use area::StagingArea;
pub use config::StagingConfig;
pub use error::StagingError;
pub use manager::StagingManager;
pub use types::{ArchiveHandling, InputPolicy};
