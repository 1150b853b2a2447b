//! Typed parameter sets for the conversion variants.

use serde::{Deserialize, Serialize};

/// Media families chdman distinguishes when creating a CHD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChdMedia {
    Cd,
    Dvd,
    HardDisk,
    LaserDisc,
    Raw,
}

/// Hunk size and codec list for `chdman create*`.
///
/// Unset fields are omitted from the command line so chdman uses its own
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChdCreateOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hunk_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
}

impl ChdCreateOptions {
    /// Tuned hunk size and codecs for each media family.
    pub fn preset_for(media: ChdMedia) -> Self {
        let (hunk_size, compression) = match media {
            ChdMedia::Cd => (18816, "cdlz,cdzl,cdfl"),
            ChdMedia::Dvd | ChdMedia::HardDisk | ChdMedia::Raw => (4096, "lzma,zlib,huff,flac"),
            ChdMedia::LaserDisc => (4096, "avhu"),
        };
        Self {
            hunk_size: Some(hunk_size),
            compression: Some(compression.to_string()),
        }
    }

    pub fn with_hunk_size(mut self, bytes: u32) -> Self {
        self.hunk_size = Some(bytes);
        self
    }

    pub fn with_compression(mut self, codecs: impl Into<String>) -> Self {
        self.compression = Some(codecs.into());
        self
    }
}

/// Cylinder/head/sector geometry for hard disk CHDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chs {
    pub cylinders: u32,
    pub heads: u32,
    pub sectors: u32,
}

/// Extra `chdman createhd` parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardDiskOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chs: Option<Chs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

/// Extra `chdman createld` parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaserDiscOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_start_frame: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_frames: Option<u64>,
}

/// Target container for DolphinTool compression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DolphinFormat {
    #[default]
    Rvz,
    Gcz,
    Wia,
}

impl DolphinFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            DolphinFormat::Rvz => "rvz",
            DolphinFormat::Gcz => "gcz",
            DolphinFormat::Wia => "wia",
        }
    }
}

/// DolphinTool `convert` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DolphinOptions {
    #[serde(default)]
    pub format: DolphinFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_size: Option<u32>,
}

impl DolphinOptions {
    pub fn defaults_for(format: DolphinFormat) -> Self {
        match format {
            DolphinFormat::Rvz => Self {
                format,
                compression: Some("zstd".to_string()),
                compression_level: Some(5),
                block_size: Some(131072),
            },
            DolphinFormat::Wia => Self {
                format,
                compression: Some("none".to_string()),
                compression_level: Some(5),
                block_size: None,
            },
            DolphinFormat::Gcz => Self {
                format,
                compression: None,
                compression_level: None,
                block_size: Some(131072),
            },
        }
    }
}

impl Default for DolphinOptions {
    fn default() -> Self {
        Self::defaults_for(DolphinFormat::Rvz)
    }
}

/// Image layout produced by `chdman extractcd`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CdImageFormat {
    #[default]
    Cue,
    Toc,
    Gdi,
    Iso,
}

impl CdImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            CdImageFormat::Cue => "cue",
            CdImageFormat::Toc => "toc",
            CdImageFormat::Gdi => "gdi",
            CdImageFormat::Iso => "iso",
        }
    }

    /// Track files written next to the descriptor.
    pub fn track_extensions(&self) -> &'static [&'static str] {
        match self {
            CdImageFormat::Cue | CdImageFormat::Toc => &["bin"],
            CdImageFormat::Gdi => &["bin", "raw"],
            CdImageFormat::Iso => &[],
        }
    }
}

/// Image extension produced by `chdman extracthd`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiskImageFormat {
    #[default]
    Img,
    Raw,
}

impl DiskImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            DiskImageFormat::Img => "img",
            DiskImageFormat::Raw => "raw",
        }
    }
}
