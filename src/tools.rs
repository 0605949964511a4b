//! Discovery of the external command-line tools.
//!
//! Downloads shell out to `yt-dlp` (search and audio stream) and `ffmpeg`
//! (MP3 transcode). Both are looked up on PATH and a few common install
//! locations unless the config names an explicit path.
//!
//! Install:
//! - Windows: `winget install yt-dlp.yt-dlp Gyan.FFmpeg`
//! - macOS: `brew install yt-dlp ffmpeg`
//! - Linux: `pipx install yt-dlp` and `apt install ffmpeg`

use std::path::{Path, PathBuf};
use std::process::Command;

/// Common installation paths for yt-dlp
#[cfg(windows)]
const YT_DLP_PATHS: &[&str] = &[
    "yt-dlp", // In PATH
    r"C:\Program Files\yt-dlp\yt-dlp.exe",
    r"C:\ProgramData\chocolatey\bin\yt-dlp.exe",
];

#[cfg(not(windows))]
const YT_DLP_PATHS: &[&str] = &[
    "yt-dlp", // In PATH
    "/usr/bin/yt-dlp",
    "/usr/local/bin/yt-dlp",
    "/opt/homebrew/bin/yt-dlp",
];

/// Common installation paths for ffmpeg
#[cfg(windows)]
const FFMPEG_PATHS: &[&str] = &[
    "ffmpeg", // In PATH
    r"C:\Program Files\ffmpeg\bin\ffmpeg.exe",
    r"C:\ProgramData\chocolatey\bin\ffmpeg.exe",
];

#[cfg(not(windows))]
const FFMPEG_PATHS: &[&str] = &[
    "ffmpeg", // In PATH
    "/usr/bin/ffmpeg",
    "/usr/local/bin/ffmpeg",
    "/opt/homebrew/bin/ffmpeg",
];

/// A required executable could not be found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{name} not found (tried {tried})")]
pub struct ToolNotFound {
    pub name: &'static str,
    pub tried: String,
}

/// Resolved executable paths for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub yt_dlp: PathBuf,
    pub ffmpeg: PathBuf,
}

impl Toolchain {
    /// Locate both tools, preferring the configured paths.
    pub fn discover(yt_dlp: Option<&Path>, ffmpeg: Option<&Path>) -> Result<Self, ToolNotFound> {
        Ok(Self {
            yt_dlp: find_yt_dlp(yt_dlp)?,
            ffmpeg: find_ffmpeg(ffmpeg)?,
        })
    }
}

/// Locate yt-dlp, preferring `configured` when set.
pub fn find_yt_dlp(configured: Option<&Path>) -> Result<PathBuf, ToolNotFound> {
    find_tool("yt-dlp", configured, YT_DLP_PATHS, "--version")
}

/// Locate ffmpeg, preferring `configured` when set.
pub fn find_ffmpeg(configured: Option<&Path>) -> Result<PathBuf, ToolNotFound> {
    find_tool("ffmpeg", configured, FFMPEG_PATHS, "-version")
}

/// Find an executable that answers its version flag.
fn find_tool(
    name: &'static str,
    configured: Option<&Path>,
    candidates: &[&str],
    version_flag: &str,
) -> Result<PathBuf, ToolNotFound> {
    let configured = configured.map(Path::to_path_buf);
    let candidates: Vec<PathBuf> = match configured {
        Some(path) => vec![path],
        None => candidates.iter().map(PathBuf::from).collect(),
    };

    candidates
        .iter()
        .find(|path| runs(path, version_flag))
        .cloned()
        .ok_or_else(|| ToolNotFound {
            name,
            tried: candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
}

fn runs(program: &Path, version_flag: &str) -> bool {
    Command::new(program)
        .arg(version_flag)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Get yt-dlp's version string (for `check-tools`)
pub fn yt_dlp_version(program: &Path) -> Option<String> {
    version_line(program, "--version")
}

/// Get ffmpeg's version line (for `check-tools`)
pub fn ffmpeg_version(program: &Path) -> Option<String> {
    version_line(program, "-version")
}

fn version_line(program: &Path, flag: &str) -> Option<String> {
    Command::new(program)
        .arg(flag)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| {
            String::from_utf8_lossy(&o.stdout)
                .lines()
                .next()
                .map(|l| l.trim().to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_configured_tool_is_reported() {
        let missing = Path::new("/definitely/not/here/yt-dlp");
        let err = find_tool("yt-dlp", Some(missing), YT_DLP_PATHS, "--version").unwrap_err();
        assert_eq!(err.name, "yt-dlp");
        assert!(err.tried.contains("/definitely/not/here/yt-dlp"));
        assert!(err.to_string().starts_with("yt-dlp not found"));
    }

    #[test]
    fn test_configured_path_replaces_candidates() {
        let missing = Path::new("/nope/ffmpeg");
        let err = find_tool("ffmpeg", Some(missing), FFMPEG_PATHS, "-version").unwrap_err();
        assert!(!err.tried.contains("/usr/bin/ffmpeg"));
    }

    #[test]
    fn test_version_of_missing_program() {
        assert_eq!(yt_dlp_version(Path::new("/nope/yt-dlp")), None);
        assert_eq!(ffmpeg_version(Path::new("/nope/ffmpeg")), None);
    }

    #[test]
    fn test_discover_does_not_panic() {
        // Result depends on the machine
        let _ = Toolchain::discover(None, None);
    }
}
