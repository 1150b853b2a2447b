//! DolphinTool command lines.

use std::path::Path;

use crate::invoker::ToolCommand;

use super::options::{DolphinFormat, DolphinOptions};

fn is_disabled(compression: &str) -> bool {
    compression.is_empty() || compression.eq_ignore_ascii_case("none")
}

/// `dolphintool convert --input=<in> --output=<out> --format=<fmt> [options]`
pub fn compress(program: &Path, input: &Path, output: &Path, options: &DolphinOptions) -> ToolCommand {
    let mut command = convert(program, input, output, options.format.extension());
    let level = options.compression_level.filter(|l| *l > 0);
    let block_size = options.block_size.filter(|b| *b > 0);

    match options.format {
        DolphinFormat::Rvz => {
            if let Some(ref compression) = options.compression {
                if !is_disabled(compression) {
                    command = command.opt("--compression", compression);
                    if let Some(level) = level {
                        command = command.eq_opt("--compression_level", level.to_string());
                    }
                }
            }
            if let Some(block_size) = block_size {
                command = command.eq_opt("--block_size", block_size.to_string());
            }
        }
        DolphinFormat::Wia => {
            if let Some(ref compression) = options.compression {
                if !is_disabled(compression) {
                    command = command.opt("--compression", compression);
                    if !compression.eq_ignore_ascii_case("purge") {
                        if let Some(level) = level {
                            command = command.eq_opt("--compression_level", level.to_string());
                        }
                    }
                }
            }
        }
        DolphinFormat::Gcz => {
            if let Some(block_size) = block_size {
                command = command.eq_opt("--block_size", block_size.to_string());
            }
        }
    }
    command
}

/// `dolphintool convert --input=<in> --output=<out> --format=iso`
pub fn decompress(program: &Path, input: &Path, output: &Path) -> ToolCommand {
    convert(program, input, output, "iso")
}

fn convert(program: &Path, input: &Path, output: &Path, format: &str) -> ToolCommand {
    ToolCommand::new(program)
        .arg("convert")
        .eq_opt("--input", input)
        .eq_opt("--output", output)
        .eq_opt("--format", format)
}
