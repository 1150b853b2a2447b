//! Command-line definitions and their mapping onto job descriptors.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use ozconv_core::converter::{
    CdImageFormat, ChdCreateOptions, ChdMedia, Chs, DiskImageFormat, DolphinFormat,
    DolphinOptions, HardDiskOptions, LaserDiscOptions,
};
use ozconv_core::{Conversion, JobDescriptor};

#[derive(Debug, Parser)]
#[command(name = "ozconv", version, about = "Batch converter for disc images and archives")]
pub struct Cli {
    /// Configuration file (TOML). Built-in defaults are used when omitted.
    #[arg(long, global = true, env = "OZCONV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print job events and reports as JSON lines.
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Report where each external tool was found and exit.
    #[arg(long)]
    pub check_tools: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compress images into CHD, RVZ/GCZ/WIA or CSO.
    Compress {
        #[command(subcommand)]
        target: CompressTarget,
    },
    /// Extract CHD, RVZ/GCZ/WIA images back to plain images.
    Extract {
        #[command(subcommand)]
        target: ExtractTarget,
    },
    /// Repack or unpack archives.
    Archive {
        #[command(subcommand)]
        action: ArchiveAction,
    },
    /// Print CHD metadata.
    Info(JobArgs),
    /// Check CHD integrity.
    Verify {
        #[command(flatten)]
        job: JobArgs,
        /// Repair the SHA1 metadata if it does not match.
        #[arg(long)]
        fix: bool,
    },
}

/// Inputs and placement flags shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct JobArgs {
    /// Files to convert; each becomes one job.
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Destination directory. Defaults to the directory of each input.
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Replace existing outputs instead of picking a numbered name.
    #[arg(long)]
    pub overwrite: bool,

    /// Remove the input and its dependent files after a successful job.
    #[arg(long)]
    pub delete_source: bool,
}

/// chdman hunk size and codec flags.
#[derive(Debug, Clone, Default, Args)]
pub struct ChdArgs {
    /// Start from the tuned hunk size and codecs for this media.
    #[arg(long)]
    pub preset: bool,

    #[arg(long, value_name = "BYTES")]
    pub hunk_size: Option<u32>,

    /// Comma-separated codec list, e.g. `cdlz,cdzl,cdfl`.
    #[arg(long, value_name = "CODECS")]
    pub compression: Option<String>,
}

impl ChdArgs {
    fn options(&self, media: ChdMedia) -> ChdCreateOptions {
        let mut opts = if self.preset {
            ChdCreateOptions::preset_for(media)
        } else {
            ChdCreateOptions::default()
        };
        if let Some(hunk) = self.hunk_size {
            opts = opts.with_hunk_size(hunk);
        }
        if let Some(ref codecs) = self.compression {
            opts = opts.with_compression(codecs.clone());
        }
        opts
    }
}

#[derive(Debug, Subcommand)]
pub enum CompressTarget {
    /// CUE/GDI/TOC/ISO CD image to CHD.
    Cd {
        #[command(flatten)]
        job: JobArgs,
        #[command(flatten)]
        chd: ChdArgs,
    },
    /// DVD ISO to CHD.
    Dvd {
        #[command(flatten)]
        job: JobArgs,
        #[command(flatten)]
        chd: ChdArgs,
    },
    /// Hard disk image to CHD.
    Hd {
        #[command(flatten)]
        job: JobArgs,
        #[command(flatten)]
        chd: ChdArgs,
        #[arg(long, value_name = "BYTES")]
        sector_size: Option<u32>,
        /// Geometry as `CYLINDERS,HEADS,SECTORS`.
        #[arg(long, value_parser = parse_chs)]
        chs: Option<Chs>,
        /// chdman hard disk template index.
        #[arg(long)]
        template: Option<String>,
    },
    /// LaserDisc capture to CHD.
    Ld {
        #[command(flatten)]
        job: JobArgs,
        #[command(flatten)]
        chd: ChdArgs,
        #[arg(long)]
        input_start_frame: Option<u64>,
        #[arg(long)]
        input_frames: Option<u64>,
    },
    /// Raw image to CHD.
    Raw {
        #[command(flatten)]
        job: JobArgs,
        #[command(flatten)]
        chd: ChdArgs,
    },
    /// GameCube/Wii image to RVZ, GCZ or WIA.
    Gc {
        #[command(flatten)]
        job: JobArgs,
        #[arg(long, value_enum, default_value_t = DolphinFormatArg::Rvz)]
        format: DolphinFormatArg,
        #[arg(long)]
        compression: Option<String>,
        #[arg(long)]
        compression_level: Option<u32>,
        #[arg(long, value_name = "BYTES")]
        block_size: Option<u32>,
    },
    /// PSP ISO to CSO.
    Cso {
        #[command(flatten)]
        job: JobArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum ExtractTarget {
    /// CHD to CUE/BIN, GDI, TOC or ISO.
    Cd {
        #[command(flatten)]
        job: JobArgs,
        #[arg(long, value_enum, default_value_t = CdFormatArg::Cue)]
        format: CdFormatArg,
    },
    /// CHD to DVD ISO.
    Dvd {
        #[command(flatten)]
        job: JobArgs,
    },
    /// CHD to hard disk image.
    Hd {
        #[command(flatten)]
        job: JobArgs,
        #[arg(long, value_enum, default_value_t = DiskFormatArg::Img)]
        format: DiskFormatArg,
    },
    /// CHD to LaserDisc raw video.
    Ld {
        #[command(flatten)]
        job: JobArgs,
    },
    /// CHD to raw image.
    Raw {
        #[command(flatten)]
        job: JobArgs,
        #[arg(long, value_enum, default_value_t = DiskFormatArg::Img)]
        format: DiskFormatArg,
    },
    /// RVZ/GCZ/WIA to ISO.
    Gc {
        #[command(flatten)]
        job: JobArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum ArchiveAction {
    /// Any supported archive to a maximum-compression 7z.
    Repack(JobArgs),
    /// Any supported archive to a folder.
    Extract(JobArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DolphinFormatArg {
    Rvz,
    Gcz,
    Wia,
}

impl From<DolphinFormatArg> for DolphinFormat {
    fn from(arg: DolphinFormatArg) -> Self {
        match arg {
            DolphinFormatArg::Rvz => DolphinFormat::Rvz,
            DolphinFormatArg::Gcz => DolphinFormat::Gcz,
            DolphinFormatArg::Wia => DolphinFormat::Wia,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CdFormatArg {
    Cue,
    Toc,
    Gdi,
    Iso,
}

impl From<CdFormatArg> for CdImageFormat {
    fn from(arg: CdFormatArg) -> Self {
        match arg {
            CdFormatArg::Cue => CdImageFormat::Cue,
            CdFormatArg::Toc => CdImageFormat::Toc,
            CdFormatArg::Gdi => CdImageFormat::Gdi,
            CdFormatArg::Iso => CdImageFormat::Iso,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DiskFormatArg {
    Img,
    Raw,
}

impl From<DiskFormatArg> for DiskImageFormat {
    fn from(arg: DiskFormatArg) -> Self {
        match arg {
            DiskFormatArg::Img => DiskImageFormat::Img,
            DiskFormatArg::Raw => DiskImageFormat::Raw,
        }
    }
}

fn parse_chs(s: &str) -> Result<Chs, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [c, h, sec] = parts.as_slice() else {
        return Err(format!("expected CYLINDERS,HEADS,SECTORS, got '{}'", s));
    };
    let num = |v: &str| {
        v.parse::<u32>()
            .map_err(|e| format!("invalid number '{}': {}", v, e))
    };
    Ok(Chs {
        cylinders: num(*c)?,
        heads: num(*h)?,
        sectors: num(*sec)?,
    })
}

impl Command {
    /// The conversion and shared job flags this command describes.
    pub fn conversion(&self) -> (Conversion, &JobArgs) {
        match self {
            Command::Compress { target } => target.conversion(),
            Command::Extract { target } => target.conversion(),
            Command::Archive { action } => match action {
                ArchiveAction::Repack(job) => (Conversion::RepackArchive, job),
                ArchiveAction::Extract(job) => (Conversion::ExtractArchive, job),
            },
            Command::Info(job) => (Conversion::ChdInfo, job),
            Command::Verify { job, fix } => (Conversion::ChdVerify { fix: *fix }, job),
        }
    }

    /// One descriptor per input, in command-line order.
    pub fn jobs(&self) -> Vec<JobDescriptor> {
        let (conversion, args) = self.conversion();
        args.inputs
            .iter()
            .map(|input| {
                let job = JobDescriptor::new(input.clone(), conversion.clone())
                    .with_overwrite(args.overwrite)
                    .with_delete_source(args.delete_source);
                match args.out {
                    Some(ref dir) => job.with_output_dir(dir.clone()),
                    None => job,
                }
            })
            .collect()
    }
}

impl CompressTarget {
    fn conversion(&self) -> (Conversion, &JobArgs) {
        match self {
            CompressTarget::Cd { job, chd } => {
                (Conversion::CompressCd(chd.options(ChdMedia::Cd)), job)
            }
            CompressTarget::Dvd { job, chd } => {
                (Conversion::CompressDvd(chd.options(ChdMedia::Dvd)), job)
            }
            CompressTarget::Hd {
                job,
                chd,
                sector_size,
                chs,
                template,
            } => (
                Conversion::CompressHardDisk {
                    chd: chd.options(ChdMedia::HardDisk),
                    disk: HardDiskOptions {
                        sector_size: *sector_size,
                        chs: *chs,
                        template: template.clone(),
                    },
                },
                job,
            ),
            CompressTarget::Ld {
                job,
                chd,
                input_start_frame,
                input_frames,
            } => (
                Conversion::CompressLaserDisc {
                    chd: chd.options(ChdMedia::LaserDisc),
                    frames: LaserDiscOptions {
                        input_start_frame: *input_start_frame,
                        input_frames: *input_frames,
                    },
                },
                job,
            ),
            CompressTarget::Raw { job, chd } => {
                (Conversion::CompressRaw(chd.options(ChdMedia::Raw)), job)
            }
            CompressTarget::Gc {
                job,
                format,
                compression,
                compression_level,
                block_size,
            } => {
                let mut opts = DolphinOptions::defaults_for((*format).into());
                if compression.is_some() {
                    opts.compression = compression.clone();
                }
                if compression_level.is_some() {
                    opts.compression_level = *compression_level;
                }
                if block_size.is_some() {
                    opts.block_size = *block_size;
                }
                (Conversion::CompressGameCube(opts), job)
            }
            CompressTarget::Cso { job } => (Conversion::CompressCso, job),
        }
    }
}

impl ExtractTarget {
    fn conversion(&self) -> (Conversion, &JobArgs) {
        match self {
            ExtractTarget::Cd { job, format } => (
                Conversion::ExtractCd {
                    format: (*format).into(),
                },
                job,
            ),
            ExtractTarget::Dvd { job } => (Conversion::ExtractDvd, job),
            ExtractTarget::Hd { job, format } => (
                Conversion::ExtractHardDisk {
                    format: (*format).into(),
                },
                job,
            ),
            ExtractTarget::Ld { job } => (Conversion::ExtractLaserDisc, job),
            ExtractTarget::Raw { job, format } => (
                Conversion::ExtractRaw {
                    format: (*format).into(),
                },
                job,
            ),
            ExtractTarget::Gc { job } => (Conversion::ExtractGameCube, job),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use ozconv_core::orchestrator::OutputTarget;

    fn parse(args: &[&str]) -> Command {
        let mut argv = vec!["ozconv"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().command.unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_compress_cd_preset_with_override() {
        let cmd = parse(&["compress", "cd", "--preset", "--hunk-size", "2448", "a.cue"]);
        let (conversion, _) = cmd.conversion();
        assert_eq!(
            conversion,
            Conversion::CompressCd(ChdCreateOptions {
                hunk_size: Some(2448),
                compression: Some("cdlz,cdzl,cdfl".to_string()),
            })
        );
    }

    #[test]
    fn test_compress_hd_geometry() {
        let cmd = parse(&[
            "compress", "hd", "--chs", "615,4,17", "--sector-size", "512", "disk.img",
        ]);
        match cmd.conversion().0 {
            Conversion::CompressHardDisk { chd, disk } => {
                assert_eq!(chd, ChdCreateOptions::default());
                assert_eq!(disk.sector_size, Some(512));
                assert_eq!(
                    disk.chs,
                    Some(Chs {
                        cylinders: 615,
                        heads: 4,
                        sectors: 17
                    })
                );
            }
            other => panic!("unexpected conversion: {:?}", other),
        }
    }

    #[test]
    fn test_parse_chs_rejects_garbage() {
        assert!(parse_chs("1,2").is_err());
        assert!(parse_chs("a,b,c").is_err());
        assert!(parse_chs("1, 2, 3").is_ok());
    }

    #[test]
    fn test_compress_gc_overrides() {
        let cmd = parse(&["compress", "gc", "--format", "wia", "--compression", "lzma", "g.iso"]);
        match cmd.conversion().0 {
            Conversion::CompressGameCube(opts) => {
                assert_eq!(opts.format, DolphinFormat::Wia);
                assert_eq!(opts.compression.as_deref(), Some("lzma"));
                assert_eq!(opts.compression_level, Some(5));
            }
            other => panic!("unexpected conversion: {:?}", other),
        }
    }

    #[test]
    fn test_extract_cd_format() {
        let cmd = parse(&["extract", "cd", "--format", "gdi", "game.chd"]);
        assert_eq!(
            cmd.conversion().0,
            Conversion::ExtractCd {
                format: CdImageFormat::Gdi
            }
        );
    }

    #[test]
    fn test_jobs_per_input() {
        let cmd = parse(&[
            "archive",
            "repack",
            "--out",
            "/tmp/out",
            "--delete-source",
            "a.zip",
            "b.rar",
        ]);
        let jobs = cmd.jobs();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].input, PathBuf::from("a.zip"));
        assert_eq!(jobs[1].input, PathBuf::from("b.rar"));
        assert!(jobs.iter().all(|j| j.delete_source && !j.overwrite));
        assert_eq!(
            jobs[0].output,
            OutputTarget::Directory(PathBuf::from("/tmp/out"))
        );
        assert_ne!(jobs[0].id, jobs[1].id);
    }

    #[test]
    fn test_verify_fix() {
        let cmd = parse(&["verify", "--fix", "game.chd"]);
        let jobs = cmd.jobs();
        assert_eq!(jobs[0].conversion, Conversion::ChdVerify { fix: true });
        assert_eq!(jobs[0].output, OutputTarget::SameAsInput);
    }

    #[test]
    fn test_input_required() {
        assert!(Cli::try_parse_from(["ozconv", "info"]).is_err());
    }
}
