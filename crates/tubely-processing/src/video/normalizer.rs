//! Fast-start normalization
//!
//! Moves the `moov` atom to the front of an MP4 so playback can begin before
//! the whole file is downloaded. A stream-copy remux is tried first; if ffmpeg
//! rejects it (odd sample aspect ratios are the usual cause) the video is
//! re-encoded with H.264 and the audio copied.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::Semaphore;

use super::command::{canonical_input, sibling_with_suffix, stderr_tail, validate_tool_path};

const REMUX_SUFFIX: &str = ".faststart.mp4";
const REENCODE_SUFFIX: &str = ".reencode.mp4";

/// Which ffmpeg invocation produced the normalized file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FastStartPath {
    Remux,
    Reencode,
}

/// Result of one normalization attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeOutcome {
    Remuxed(PathBuf),
    Reencoded(PathBuf),
    /// Both invocations failed; carries both diagnostics.
    Failed(String),
}

impl NormalizeOutcome {
    /// The normalized file and the path that produced it, or the combined
    /// diagnostic when both invocations failed.
    pub fn output(&self) -> Result<(&Path, FastStartPath), &str> {
        match self {
            NormalizeOutcome::Remuxed(path) => Ok((path.as_path(), FastStartPath::Remux)),
            NormalizeOutcome::Reencoded(path) => Ok((path.as_path(), FastStartPath::Reencode)),
            NormalizeOutcome::Failed(diagnostic) => Err(diagnostic),
        }
    }
}

/// Produces a fast-start copy of a video next to the input.
#[async_trait]
pub trait FastStartNormalizer: Send + Sync {
    async fn normalize(&self, input: &Path) -> NormalizeOutcome;
}

pub struct FfmpegNormalizer {
    ffmpeg_path: String,
    permits: Arc<Semaphore>,
}

impl FfmpegNormalizer {
    /// `max_concurrent` bounds how many ffmpeg processes this normalizer runs at once.
    pub fn new(ffmpeg_path: impl Into<String>, max_concurrent: usize) -> Result<Self> {
        let ffmpeg_path = ffmpeg_path.into();
        validate_tool_path(&ffmpeg_path).context("Invalid ffmpeg_path")?;
        Ok(Self {
            ffmpeg_path,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        })
    }

    fn remux_args(input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.into()];
        args.extend(
            ["-map", "0:v", "-map", "0:a?", "-c", "copy", "-movflags", "faststart"]
                .into_iter()
                .map(Into::into),
        );
        args.push(output.into());
        args
    }

    fn reencode_args(input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.into()];
        args.extend(
            [
                "-vf",
                "setsar=1",
                "-c:v",
                "libx264",
                "-crf",
                "18",
                "-preset",
                "veryfast",
                "-c:a",
                "copy",
                "-movflags",
                "faststart",
            ]
            .into_iter()
            .map(Into::into),
        );
        args.push(output.into());
        args
    }

    /// Run ffmpeg once; `Err` carries a diagnostic.
    async fn run_ffmpeg(&self, args: Vec<OsString>, output: &Path) -> Result<(), String> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| format!("ffmpeg permit unavailable: {}", e))?;

        let result = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        let diagnostic = match result {
            Ok(out) if out.status.success() => return Ok(()),
            Ok(out) => format!("exit status {}: {}", out.status, stderr_tail(&out.stderr)),
            Err(e) => format!("failed to execute ffmpeg: {}", e),
        };

        if let Err(e) = tokio::fs::remove_file(output).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %e, path = %output.display(), "Failed to remove partial ffmpeg output");
            }
        }

        Err(diagnostic)
    }
}

#[async_trait]
impl FastStartNormalizer for FfmpegNormalizer {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    async fn normalize(&self, input: &Path) -> NormalizeOutcome {
        let start = std::time::Instant::now();

        let input = match canonical_input(input) {
            Ok(path) => path,
            Err(e) => return NormalizeOutcome::Failed(e.to_string()),
        };

        let remuxed = sibling_with_suffix(&input, REMUX_SUFFIX);
        let remux_error = match self
            .run_ffmpeg(Self::remux_args(&input, &remuxed), &remuxed)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    duration_ms = start.elapsed().as_millis() as u64,
                    output = %remuxed.display(),
                    "Fast-start remux completed"
                );
                return NormalizeOutcome::Remuxed(remuxed);
            }
            Err(diagnostic) => diagnostic,
        };

        tracing::warn!(error = %remux_error, "Fast-start remux failed, falling back to re-encode");

        let reencoded = sibling_with_suffix(&input, REENCODE_SUFFIX);
        match self
            .run_ffmpeg(Self::reencode_args(&input, &reencoded), &reencoded)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    duration_ms = start.elapsed().as_millis() as u64,
                    output = %reencoded.display(),
                    "Fast-start re-encode completed"
                );
                NormalizeOutcome::Reencoded(reencoded)
            }
            Err(reencode_error) => {
                tracing::error!(
                    duration_ms = start.elapsed().as_millis() as u64,
                    remux_error = %remux_error,
                    reencode_error = %reencode_error,
                    "Fast-start normalization failed"
                );
                NormalizeOutcome::Failed(format!(
                    "remux failed: {}; re-encode failed: {}",
                    remux_error, reencode_error
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn remux_arguments() {
        let args = FfmpegNormalizer::remux_args(Path::new("/t/in.mp4"), Path::new("/t/in.mp4.faststart.mp4"));
        assert_eq!(
            to_strings(args),
            vec![
                "-y", "-i", "/t/in.mp4", "-map", "0:v", "-map", "0:a?", "-c", "copy", "-movflags",
                "faststart", "/t/in.mp4.faststart.mp4"
            ]
        );
    }

    #[test]
    fn reencode_arguments() {
        let args = FfmpegNormalizer::reencode_args(Path::new("/t/in.mp4"), Path::new("/t/out.mp4"));
        let args = to_strings(args);
        assert_eq!(&args[..3], ["-y", "-i", "/t/in.mp4"]);
        assert!(args.windows(2).any(|w| w == ["-vf", "setsar=1"]));
        assert!(args.windows(2).any(|w| w == ["-c:v", "libx264"]));
        assert!(args.windows(2).any(|w| w == ["-crf", "18"]));
        assert!(args.windows(2).any(|w| w == ["-c:a", "copy"]));
        assert_eq!(args.last().map(String::as_str), Some("/t/out.mp4"));
    }

    #[tokio::test]
    async fn missing_tool_fails_both_paths() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        tokio::fs::write(&input, b"abcd").await.unwrap();

        let normalizer = FfmpegNormalizer::new("/nonexistent/bin/ffmpeg", 1).unwrap();
        match normalizer.normalize(&input).await {
            NormalizeOutcome::Failed(diagnostic) => {
                assert!(diagnostic.contains("remux failed"));
                assert!(diagnostic.contains("re-encode failed"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn outcome_output() {
        let remuxed = NormalizeOutcome::Remuxed(PathBuf::from("/t/a"));
        assert_eq!(remuxed.output(), Ok((Path::new("/t/a"), FastStartPath::Remux)));

        let reencoded = NormalizeOutcome::Reencoded(PathBuf::from("/t/b"));
        assert_eq!(reencoded.output(), Ok((Path::new("/t/b"), FastStartPath::Reencode)));

        let failed = NormalizeOutcome::Failed("remux failed: a; re-encode failed: b".into());
        assert_eq!(failed.output(), Err("remux failed: a; re-encode failed: b"));
    }
}
