//! 7-Zip command lines used by the archive routines.

use std::path::Path;

use crate::invoker::ToolCommand;

/// `7za a -t7z -mx9 -md=128m <out> .`, run from the directory to pack.
pub fn pack(program: &Path, content_dir: &Path, output: &Path) -> ToolCommand {
    ToolCommand::new(program)
        .args(["a", "-t7z", "-mx9", "-md=128m"])
        .arg(output)
        .arg(".")
        .current_dir(content_dir)
}

/// `7za t <archive>`
pub fn test(program: &Path, archive: &Path) -> ToolCommand {
    ToolCommand::new(program).arg("t").arg(archive)
}
