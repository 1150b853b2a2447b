//! maxcso command lines.

use std::path::Path;

use crate::invoker::ToolCommand;

/// `maxcso <in> --output <out>`
pub fn compress(program: &Path, input: &Path, output: &Path) -> ToolCommand {
    ToolCommand::new(program).arg(input).opt("--output", output)
}
