//! External tool detection and management.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::{Error, Result};

/// Information about an external tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check if a tool is available and get its information.
///
/// # Example
///
/// ```no_run
/// use packsmith_codecs::check_tool;
///
/// let info = check_tool("cjxl");
/// if info.available {
///     println!("cjxl version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(name: &str) -> ToolInfo {
    check_tool_with_arg(name, "--version")
}

/// Check if a tool is available using a custom version argument.
pub fn check_tool_with_arg(name: &str, version_arg: &str) -> ToolInfo {
    let result = Command::new(name).arg(version_arg).output();

    match result {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.to_string());

            let path = which::which(name).ok();

            ToolInfo {
                name: name.to_string(),
                available: true,
                version,
                path,
            }
        }
        _ => ToolInfo {
            // realesrgan-ncnn-vulkan has no version flag at all; presence on
            // PATH is the best signal we get.
            name: name.to_string(),
            available: which::which(name).is_ok(),
            version: None,
            path: which::which(name).ok(),
        },
    }
}

/// Check all external tools the pipeline may invoke.
///
/// Returns information about ffmpeg, ffprobe, cjxl, realesrgan-ncnn-vulkan,
/// and 7z.
pub fn check_tools() -> Vec<ToolInfo> {
    vec![
        check_tool_with_arg("ffmpeg", "-version"),
        check_tool_with_arg("ffprobe", "-version"),
        check_tool("cjxl"),
        check_tool("realesrgan-ncnn-vulkan"),
        check_tool_with_arg("7z", "i"),
    ]
}

/// Require that a tool is available, returning its path.
///
/// # Errors
///
/// Returns an error if the tool is not found.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}

/// Get the path to a tool, preferring a configured path over PATH lookup.
pub fn get_tool_path(name: &str, config_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
    }

    require_tool(name)
}

/// Resolved paths for every tool a full run can touch.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub cjxl: PathBuf,
    pub realesrgan: PathBuf,
    pub sevenzip: PathBuf,
}

impl Toolchain {
    /// Resolve every tool from PATH, with optional per-tool overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolNotFound`] naming the first missing tool.
    pub fn discover(overrides: &ToolOverrides) -> Result<Self> {
        Ok(Self {
            ffmpeg: get_tool_path("ffmpeg", overrides.ffmpeg.as_deref())?,
            ffprobe: get_tool_path("ffprobe", overrides.ffprobe.as_deref())?,
            cjxl: get_tool_path("cjxl", overrides.cjxl.as_deref())?,
            realesrgan: get_tool_path("realesrgan-ncnn-vulkan", overrides.realesrgan.as_deref())?,
            sevenzip: get_tool_path("7z", overrides.sevenzip.as_deref())?,
        })
    }
}

/// Optional configured tool locations, all falling back to PATH lookup.
#[derive(Debug, Clone, Default)]
pub struct ToolOverrides {
    pub ffmpeg: Option<PathBuf>,
    pub ffprobe: Option<PathBuf>,
    pub cjxl: Option<PathBuf>,
    pub realesrgan: Option<PathBuf>,
    pub sevenzip: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tool_not_found() {
        let info = check_tool("nonexistent_tool_12345");
        assert!(!info.available);
        assert!(info.version.is_none());
        assert!(info.path.is_none());
    }

    #[test]
    fn test_require_tool_not_found() {
        let result = require_tool("nonexistent_tool_12345");
        assert!(matches!(result, Err(Error::ToolNotFound { .. })));
    }

    #[test]
    fn test_get_tool_path_prefers_override() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = get_tool_path("nonexistent_tool_12345", Some(tmp.path())).unwrap();
        assert_eq!(path, tmp.path());
    }
}
