//! The catalog of external tool locations.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// External tools the pipeline knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    Chdman,
    DolphinTool,
    Maxcso,
    SevenZip,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::Chdman, Tool::DolphinTool, Tool::Maxcso, Tool::SevenZip];

    /// Configuration key of this tool.
    pub fn key(&self) -> &'static str {
        match self {
            Tool::Chdman => "chdman",
            Tool::DolphinTool => "dolphintool",
            Tool::Maxcso => "maxcso",
            Tool::SevenZip => "sevenzip",
        }
    }
}

/// Read-only map from tool to executable path, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCatalog {
    #[serde(default = "default_chdman")]
    pub chdman: PathBuf,

    #[serde(default = "default_dolphintool")]
    pub dolphintool: PathBuf,

    #[serde(default = "default_maxcso")]
    pub maxcso: PathBuf,

    #[serde(default = "default_sevenzip")]
    pub sevenzip: PathBuf,

    /// Program plus leading arguments used to move files to the trash,
    /// e.g. `["gio", "trash"]`. The file path is appended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trash: Option<Vec<String>>,
}

fn default_chdman() -> PathBuf {
    PathBuf::from("chdman")
}

fn default_dolphintool() -> PathBuf {
    PathBuf::from("dolphin-tool")
}

fn default_maxcso() -> PathBuf {
    PathBuf::from("maxcso")
}

fn default_sevenzip() -> PathBuf {
    PathBuf::from("7za")
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self {
            chdman: default_chdman(),
            dolphintool: default_dolphintool(),
            maxcso: default_maxcso(),
            sevenzip: default_sevenzip(),
            trash: None,
        }
    }
}

/// Availability of one tool, as reported by [`ToolCatalog::check_all`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolStatus {
    pub tool: Tool,
    pub configured: PathBuf,
    /// Where the executable was found, if anywhere.
    pub resolved: Option<PathBuf>,
}

impl ToolCatalog {
    pub fn path(&self, tool: Tool) -> &Path {
        match tool {
            Tool::Chdman => &self.chdman,
            Tool::DolphinTool => &self.dolphintool,
            Tool::Maxcso => &self.maxcso,
            Tool::SevenZip => &self.sevenzip,
        }
    }

    /// Replaces the path of one tool.
    pub fn with_tool(mut self, tool: Tool, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match tool {
            Tool::Chdman => self.chdman = path,
            Tool::DolphinTool => self.dolphintool = path,
            Tool::Maxcso => self.maxcso = path,
            Tool::SevenZip => self.sevenzip = path,
        }
        self
    }

    /// Sets the trash command.
    pub fn with_trash(mut self, command: Vec<String>) -> Self {
        self.trash = Some(command);
        self
    }

    /// `(key, path)` pairs for every tool.
    pub fn entries(&self) -> Vec<(&'static str, &Path)> {
        Tool::ALL
            .iter()
            .map(|tool| (tool.key(), self.path(*tool)))
            .collect()
    }

    /// Finds the executable for `tool`.
    ///
    /// A configured path with a directory component must exist as given; a
    /// bare name is searched on `PATH`.
    pub fn locate(&self, tool: Tool) -> Option<PathBuf> {
        locate_program(self.path(tool))
    }

    pub fn check_all(&self) -> Vec<ToolStatus> {
        Tool::ALL
            .iter()
            .map(|tool| ToolStatus {
                tool: *tool,
                configured: self.path(*tool).to_path_buf(),
                resolved: self.locate(*tool),
            })
            .collect()
    }
}

fn locate_program(program: &Path) -> Option<PathBuf> {
    let has_dir = program
        .parent()
        .map(|p| !p.as_os_str().is_empty())
        .unwrap_or(false);
    if program.is_absolute() || has_dir {
        return program.is_file().then(|| program.to_path_buf());
    }

    let search_path = std::env::var_os("PATH")?;
    std::env::split_paths(&search_path).find_map(|dir| {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        if cfg!(windows) {
            let exe = candidate.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}
