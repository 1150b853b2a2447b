//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::staging::{ArchiveHandling, InputPolicy};

use super::options::{
    CdImageFormat, ChdCreateOptions, DiskImageFormat, DolphinOptions, HardDiskOptions,
    LaserDiscOptions,
};

/// Every supported conversion, each with its own parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Conversion {
    /// CUE/GDI/TOC/ISO CD image to CHD.
    CompressCd(ChdCreateOptions),
    /// DVD ISO to CHD.
    CompressDvd(ChdCreateOptions),
    /// Hard disk image to CHD.
    CompressHardDisk {
        #[serde(default)]
        chd: ChdCreateOptions,
        #[serde(default)]
        disk: HardDiskOptions,
    },
    /// LaserDisc capture to CHD.
    CompressLaserDisc {
        #[serde(default)]
        chd: ChdCreateOptions,
        #[serde(default)]
        frames: LaserDiscOptions,
    },
    /// Raw image to CHD.
    CompressRaw(ChdCreateOptions),
    /// GameCube/Wii image to RVZ, GCZ or WIA.
    CompressGameCube(DolphinOptions),
    /// PSP ISO to CSO.
    CompressCso,
    ExtractCd {
        #[serde(default)]
        format: CdImageFormat,
    },
    ExtractDvd,
    ExtractHardDisk {
        #[serde(default)]
        format: DiskImageFormat,
    },
    ExtractLaserDisc,
    ExtractRaw {
        #[serde(default)]
        format: DiskImageFormat,
    },
    /// RVZ/GCZ/WIA back to ISO.
    ExtractGameCube,
    /// Any supported archive to a maximum-compression 7z.
    RepackArchive,
    /// Any supported archive to a plain folder.
    ExtractArchive,
    /// `chdman info`, text only.
    ChdInfo,
    /// `chdman verify`, text only.
    ChdVerify {
        #[serde(default)]
        fix: bool,
    },
}

const CD_INPUT: &[&str] = &["cue", "gdi", "toc", "iso", "img"];
const DVD_INPUT: &[&str] = &["iso"];
const HD_INPUT: &[&str] = &["img"];
const LD_INPUT: &[&str] = &["raw", "avi"];
const RAW_INPUT: &[&str] = &["img", "raw", "bin"];
const DOLPHIN_INPUT: &[&str] = &["iso", "gcm", "rvz", "gcz", "wia", "wbfs", "ciso"];
const DOLPHIN_COMPRESSED: &[&str] = &["rvz", "gcz", "wia"];
const CHD_INPUT: &[&str] = &["chd"];

impl Conversion {
    /// What this conversion accepts as input.
    pub fn input_policy(&self) -> InputPolicy {
        use ArchiveHandling::{LocatePrimary, Reject, WholeTree};
        match self {
            Conversion::CompressCd(_) => InputPolicy::new(CD_INPUT, LocatePrimary),
            Conversion::CompressDvd(_) => InputPolicy::new(DVD_INPUT, LocatePrimary),
            Conversion::CompressHardDisk { .. } => InputPolicy::new(HD_INPUT, LocatePrimary),
            Conversion::CompressLaserDisc { .. } => InputPolicy::new(LD_INPUT, LocatePrimary),
            Conversion::CompressRaw(_) => InputPolicy::new(RAW_INPUT, LocatePrimary),
            Conversion::CompressGameCube(_) => InputPolicy::new(DOLPHIN_INPUT, LocatePrimary),
            Conversion::CompressCso => InputPolicy::new(DVD_INPUT, LocatePrimary),
            Conversion::ExtractGameCube => InputPolicy::new(DOLPHIN_COMPRESSED, Reject),
            Conversion::ExtractCd { .. }
            | Conversion::ExtractDvd
            | Conversion::ExtractHardDisk { .. }
            | Conversion::ExtractLaserDisc
            | Conversion::ExtractRaw { .. }
            | Conversion::ChdInfo
            | Conversion::ChdVerify { .. } => InputPolicy::new(CHD_INPUT, Reject),
            Conversion::RepackArchive | Conversion::ExtractArchive => {
                InputPolicy::new(&[], WholeTree)
            }
        }
    }

    /// Extension of the main output file. `None` for text-only and folder
    /// outputs.
    pub fn primary_extension(&self) -> Option<&'static str> {
        match self {
            Conversion::CompressCd(_)
            | Conversion::CompressDvd(_)
            | Conversion::CompressHardDisk { .. }
            | Conversion::CompressLaserDisc { .. }
            | Conversion::CompressRaw(_) => Some("chd"),
            Conversion::CompressGameCube(opts) => Some(opts.format.extension()),
            Conversion::CompressCso => Some("cso"),
            Conversion::ExtractCd { format } => Some(format.extension()),
            Conversion::ExtractDvd | Conversion::ExtractGameCube => Some("iso"),
            Conversion::ExtractHardDisk { format } | Conversion::ExtractRaw { format } => {
                Some(format.extension())
            }
            Conversion::ExtractLaserDisc => Some("raw"),
            Conversion::RepackArchive => Some("7z"),
            Conversion::ExtractArchive | Conversion::ChdInfo | Conversion::ChdVerify { .. } => {
                None
            }
        }
    }

    /// Extensions of companion files written next to the primary output.
    pub fn secondary_extensions(&self) -> &'static [&'static str] {
        match self {
            Conversion::ExtractCd { format } => format.track_extensions(),
            _ => &[],
        }
    }

    /// Whether the routine only reports text and places nothing.
    pub fn is_text_only(&self) -> bool {
        matches!(self, Conversion::ChdInfo | Conversion::ChdVerify { .. })
    }

    /// Whether the output is a directory rather than a file.
    pub fn produces_directory(&self) -> bool {
        matches!(self, Conversion::ExtractArchive)
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Conversion::CompressCd(_) => "CD image to CHD".to_string(),
            Conversion::CompressDvd(_) => "DVD image to CHD".to_string(),
            Conversion::CompressHardDisk { .. } => "hard disk image to CHD".to_string(),
            Conversion::CompressLaserDisc { .. } => "LaserDisc image to CHD".to_string(),
            Conversion::CompressRaw(_) => "raw image to CHD".to_string(),
            Conversion::CompressGameCube(opts) => {
                format!("GameCube/Wii image to {}", opts.format.extension().to_uppercase())
            }
            Conversion::CompressCso => "ISO to CSO".to_string(),
            Conversion::ExtractCd { format } => {
                format!("CHD to CD image ({})", format.extension().to_uppercase())
            }
            Conversion::ExtractDvd => "CHD to DVD ISO".to_string(),
            Conversion::ExtractHardDisk { format } => {
                format!("CHD to hard disk image ({})", format.extension().to_uppercase())
            }
            Conversion::ExtractLaserDisc => "CHD to LaserDisc image".to_string(),
            Conversion::ExtractRaw { format } => {
                format!("CHD to raw image ({})", format.extension().to_uppercase())
            }
            Conversion::ExtractGameCube => "GameCube/Wii image to ISO".to_string(),
            Conversion::RepackArchive => "archive to 7z".to_string(),
            Conversion::ExtractArchive => "archive to folder".to_string(),
            Conversion::ChdInfo => "CHD info".to_string(),
            Conversion::ChdVerify { .. } => "CHD verify".to_string(),
        };
        f.write_str(&label)
    }
}

/// Role of an artifact within a conversion's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactRole {
    Primary,
    Secondary,
}

/// A verified output file (or folder) in the staging area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub role: ArtifactRole,
    /// File size, or entry count for directories.
    pub size_bytes: u64,
    #[serde(default)]
    pub is_dir: bool,
}

/// Result of a successful conversion routine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionOutcome {
    /// Artifacts to place, primary first. Empty for text-only routines.
    pub artifacts: Vec<Artifact>,
    /// Captured tool text for info/verify routines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    /// Non-fatal problems noticed along the way.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Routine duration in milliseconds.
    pub duration_ms: u64,
}
