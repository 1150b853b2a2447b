//! Placer module for moving verified artifacts to their destination.
//!
//! # Features
//!
//! - Collision-safe naming (`name.ext`, `name_1.ext`, `name_2.ext`, ...) with a
//!   configurable cap
//! - Atomic replacement when overwriting
//! - Fallback to a buffered copy when the destination is on another filesystem
//! - Files and whole directories
//!
//! # Example
//!
//! ```ignore
//! use ozconv_core::placer::{FsPlacer, PlacerConfig};
//!
//! let placer = FsPlacer::new(PlacerConfig::default());
//! let final_path = placer
//!     .place(Path::new("/tmp/ozconv/game_1a2b3c4d_temp/output/game.chd"), Path::new("/roms"), false)
//!     .await?;
//! println!("Placed at {}", final_path.display());
//! ```

mod config;
mod error;
mod fs_placer;

pub use config::PlacerConfig;
pub use error::PlacementError;
pub use fs_placer::FsPlacer;
