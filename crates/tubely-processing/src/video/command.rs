//! Helpers for invoking the external media tools.

use anyhow::{anyhow, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Validate that a tool path doesn't contain shell metacharacters or dangerous sequences
pub fn validate_tool_path(path: &str) -> Result<()> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.is_empty() {
        return Err(anyhow!("Tool path is empty"));
    }
    if path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(anyhow!("Path contains dangerous characters: {}", path));
    }
    if path.contains("..") {
        return Err(anyhow!("Path contains directory traversal: {}", path));
    }
    if !path
        .chars()
        .all(|c| c.is_alphanumeric() || c == '/' || c == '-' || c == '_' || c == '.' || c == '\\')
    {
        return Err(anyhow!("Tool path contains unsafe characters: {}", path));
    }
    Ok(())
}

/// Canonical absolute path of an existing input file.
///
/// Absolute paths can never be mistaken for a command-line option.
pub fn canonical_input(path: &Path) -> Result<PathBuf> {
    path.canonicalize()
        .map_err(|e| anyhow!("Failed to canonicalize {}: {}", path.display(), e))
}

/// `input` with `suffix` appended to the full file name (`a.mp4` -> `a.mp4.faststart.mp4`).
pub fn sibling_with_suffix(input: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Last lines of a tool's stderr, enough to diagnose a failure.
pub fn stderr_tail(stderr: &[u8]) -> String {
    const MAX_LINES: usize = 20;
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(MAX_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_paths() {
        assert!(validate_tool_path("ffmpeg").is_ok());
        assert!(validate_tool_path("/usr/local/bin/ffprobe").is_ok());
        assert!(validate_tool_path("ffmpeg; rm -rf /").is_err());
        assert!(validate_tool_path("../ffmpeg").is_err());
        assert!(validate_tool_path("").is_err());
        assert!(validate_tool_path("ff mpeg").is_err());
    }

    #[test]
    fn suffix_is_appended_to_full_name() {
        let out = sibling_with_suffix(Path::new("/tmp/run/tubely-upload-1.mp4"), ".faststart.mp4");
        assert_eq!(out, PathBuf::from("/tmp/run/tubely-upload-1.mp4.faststart.mp4"));
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let stderr: String = (0..30).map(|i| format!("line {}\n", i)).collect();
        let tail = stderr_tail(stderr.as_bytes());
        assert!(tail.starts_with("line 10"));
        assert!(tail.ends_with("line 29"));
    }
}
