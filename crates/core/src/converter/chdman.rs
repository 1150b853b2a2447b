//! chdman command lines.

use std::path::Path;

use crate::invoker::ToolCommand;

use super::config::ConverterConfig;
use super::options::{ChdCreateOptions, ChdMedia, HardDiskOptions, LaserDiscOptions};

/// chdman extraction subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChdExtract {
    Cd,
    Dvd,
    HardDisk,
    LaserDisc,
}

fn create_subcommand(media: ChdMedia) -> &'static str {
    match media {
        ChdMedia::Cd => "createcd",
        ChdMedia::Dvd => "createdvd",
        // Raw images go through createhd without geometry.
        ChdMedia::HardDisk | ChdMedia::Raw => "createhd",
        ChdMedia::LaserDisc => "createld",
    }
}

fn extract_subcommand(kind: ChdExtract) -> &'static str {
    match kind {
        ChdExtract::Cd => "extractcd",
        ChdExtract::Dvd => "extractdvd",
        ChdExtract::HardDisk => "extracthd",
        ChdExtract::LaserDisc => "extractld",
    }
}

fn with_processors(command: ToolCommand, config: &ConverterConfig) -> ToolCommand {
    match config.num_processors {
        Some(count) => command.opt("--numprocessors", count.to_string()),
        None => command,
    }
}

/// `chdman create* -i <input> -o <output> [options]`
pub fn create(
    program: &Path,
    media: ChdMedia,
    input: &Path,
    output: &Path,
    options: &ChdCreateOptions,
    config: &ConverterConfig,
) -> ToolCommand {
    let mut command = ToolCommand::new(program)
        .arg(create_subcommand(media))
        .opt("-i", input)
        .opt("-o", output);
    command = with_processors(command, config);

    if let Some(hunk_size) = options.hunk_size.filter(|h| *h > 0) {
        command = command.opt("--hunksize", hunk_size.to_string());
    }
    if let Some(ref codecs) = options.compression {
        if !codecs.is_empty() {
            command = command.opt("--compression", codecs);
        }
    }
    command
}

/// Appends hard disk geometry options to a `createhd` command.
pub fn with_hard_disk(mut command: ToolCommand, disk: &HardDiskOptions) -> ToolCommand {
    if let Some(sector_size) = disk.sector_size {
        command = command.opt("--sectorsize", sector_size.to_string());
    }
    if let Some(chs) = disk.chs {
        command = command.opt(
            "--chs",
            format!("{},{},{}", chs.cylinders, chs.heads, chs.sectors),
        );
    }
    if let Some(ref template) = disk.template {
        command = command.opt("--template", template);
    }
    command
}

/// Appends frame range options to a `createld` command.
pub fn with_laserdisc(mut command: ToolCommand, frames: &LaserDiscOptions) -> ToolCommand {
    if let Some(start) = frames.input_start_frame {
        command = command.opt("--inputstartframe", start.to_string());
    }
    if let Some(count) = frames.input_frames {
        command = command.opt("--inputframes", count.to_string());
    }
    command
}

/// `chdman extract* -i <input> -o <output>`
pub fn extract(
    program: &Path,
    kind: ChdExtract,
    input: &Path,
    output: &Path,
    config: &ConverterConfig,
) -> ToolCommand {
    let command = ToolCommand::new(program)
        .arg(extract_subcommand(kind))
        .opt("-i", input)
        .opt("-o", output);
    with_processors(command, config)
}

/// `chdman verify -i <input> [--fix]`
pub fn verify(program: &Path, input: &Path, fix: bool) -> ToolCommand {
    let command = ToolCommand::new(program).arg("verify").opt("-i", input);
    if fix {
        command.arg("--fix")
    } else {
        command
    }
}

/// `chdman info -i <input>`
pub fn info(program: &Path, input: &Path) -> ToolCommand {
    ToolCommand::new(program).arg("info").opt("-i", input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::options::Chs;
    use std::ffi::OsStr;

    #[test]
    fn test_create_cd_minimal() {
        let cmd = create(
            Path::new("chdman"),
            ChdMedia::Cd,
            Path::new("/s/game.cue"),
            Path::new("/s/output/game.chd"),
            &ChdCreateOptions::default(),
            &ConverterConfig::default(),
        );
        assert_eq!(cmd.to_string(), "chdman createcd -i /s/game.cue -o /s/output/game.chd");
    }

    #[test]
    fn test_create_with_tuning() {
        let cmd = create(
            Path::new("chdman"),
            ChdMedia::Dvd,
            Path::new("in.iso"),
            Path::new("out.chd"),
            &ChdCreateOptions::preset_for(ChdMedia::Dvd),
            &ConverterConfig::default().with_num_processors(4),
        );
        assert!(cmd.has_arg("createdvd"));
        assert_eq!(cmd.value_of("--numprocessors"), Some(OsStr::new("4")));
        assert_eq!(cmd.value_of("--hunksize"), Some(OsStr::new("4096")));
        assert_eq!(
            cmd.value_of("--compression"),
            Some(OsStr::new("lzma,zlib,huff,flac"))
        );
    }

    #[test]
    fn test_raw_uses_createhd() {
        let cmd = create(
            Path::new("chdman"),
            ChdMedia::Raw,
            Path::new("in.img"),
            Path::new("out.chd"),
            &ChdCreateOptions::default(),
            &ConverterConfig::default(),
        );
        assert!(cmd.has_arg("createhd"));
        assert!(!cmd.has_arg("--chs"));
    }

    #[test]
    fn test_hard_disk_geometry() {
        let base = ToolCommand::new("chdman").arg("createhd");
        let cmd = with_hard_disk(
            base,
            &HardDiskOptions {
                sector_size: Some(512),
                chs: Some(Chs {
                    cylinders: 1024,
                    heads: 16,
                    sectors: 63,
                }),
                template: Some("2".to_string()),
            },
        );
        assert_eq!(cmd.value_of("--sectorsize"), Some(OsStr::new("512")));
        assert_eq!(cmd.value_of("--chs"), Some(OsStr::new("1024,16,63")));
        assert_eq!(cmd.value_of("--template"), Some(OsStr::new("2")));
    }

    #[test]
    fn test_laserdisc_frames() {
        let cmd = with_laserdisc(
            ToolCommand::new("chdman").arg("createld"),
            &LaserDiscOptions {
                input_start_frame: Some(100),
                input_frames: None,
            },
        );
        assert_eq!(cmd.value_of("--inputstartframe"), Some(OsStr::new("100")));
        assert!(!cmd.has_arg("--inputframes"));
    }

    #[test]
    fn test_extract_verify_info() {
        let cmd = extract(
            Path::new("chdman"),
            ChdExtract::HardDisk,
            Path::new("g.chd"),
            Path::new("g.img"),
            &ConverterConfig::default(),
        );
        assert_eq!(cmd.to_string(), "chdman extracthd -i g.chd -o g.img");

        assert!(verify(Path::new("chdman"), Path::new("g.chd"), true).has_arg("--fix"));
        assert!(!verify(Path::new("chdman"), Path::new("g.chd"), false).has_arg("--fix"));
        assert_eq!(
            info(Path::new("chdman"), Path::new("g.chd")).to_string(),
            "chdman info -i g.chd"
        );
    }
}
