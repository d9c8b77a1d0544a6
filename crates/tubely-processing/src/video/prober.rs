//! Container probing via ffprobe

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::command::{canonical_input, stderr_tail, validate_tool_path};
use crate::metadata::ProbeResult;

/// Reports the display dimensions of a media file.
#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, path: &Path) -> ProbeResult;
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

/// Parse ffprobe's JSON report. Only the first stream is considered.
pub fn parse_probe_output(stdout: &[u8]) -> ProbeResult {
    let output: ProbeOutput = match serde_json::from_slice(stdout) {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!(error = %e, "Unparsable ffprobe output");
            return ProbeResult::Indeterminate;
        }
    };

    match output.streams.first() {
        Some(stream) => ProbeResult::from_dimensions(stream.width, stream.height),
        None => ProbeResult::Indeterminate,
    }
}

pub struct FfprobeProber {
    ffprobe_path: String,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<String>) -> Result<Self> {
        let ffprobe_path = ffprobe_path.into();
        validate_tool_path(&ffprobe_path).context("Invalid ffprobe_path")?;
        Ok(Self { ffprobe_path })
    }

    async fn run(&self, path: &Path) -> Result<Vec<u8>> {
        let input = canonical_input(path)?;

        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(&input)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .context("Failed to execute ffprobe")?;

        if !output.status.success() {
            return Err(anyhow!("ffprobe failed: {}", stderr_tail(&output.stderr)));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn probe(&self, path: &Path) -> ProbeResult {
        let start = std::time::Instant::now();

        let result = match self.run(path).await {
            Ok(stdout) => parse_probe_output(&stdout),
            Err(e) => {
                tracing::warn!(error = %e, "Probe failed, treating dimensions as indeterminate");
                ProbeResult::Indeterminate
            }
        };

        tracing::info!(
            duration_ms = start.elapsed().as_millis() as u64,
            result = ?result,
            "Video probe completed"
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_stream_dimensions() {
        let json = br#"{"streams":[{"index":0,"codec_type":"video","width":1920,"height":1080},{"width":640,"height":360}]}"#;
        assert_eq!(
            parse_probe_output(json),
            ProbeResult::Dimensions {
                width: 1920,
                height: 1080
            }
        );
    }

    #[test]
    fn no_streams_is_indeterminate() {
        assert_eq!(parse_probe_output(br#"{"streams":[]}"#), ProbeResult::Indeterminate);
        assert_eq!(parse_probe_output(br#"{}"#), ProbeResult::Indeterminate);
    }

    #[test]
    fn missing_or_zero_dimensions_are_indeterminate() {
        assert_eq!(
            parse_probe_output(br#"{"streams":[{"codec_type":"audio"}]}"#),
            ProbeResult::Indeterminate
        );
        assert_eq!(
            parse_probe_output(br#"{"streams":[{"width":0,"height":720}]}"#),
            ProbeResult::Indeterminate
        );
    }

    #[test]
    fn garbage_is_indeterminate() {
        assert_eq!(parse_probe_output(b"not json"), ProbeResult::Indeterminate);
        assert_eq!(parse_probe_output(b""), ProbeResult::Indeterminate);
    }

    #[tokio::test]
    async fn missing_tool_is_indeterminate() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        tokio::fs::write(&input, b"abcd").await.unwrap();

        let prober = FfprobeProber::new("/nonexistent/bin/ffprobe").unwrap();
        assert_eq!(prober.probe(&input).await, ProbeResult::Indeterminate);
    }

    #[test]
    fn unsafe_tool_path_rejected() {
        assert!(FfprobeProber::new("ffprobe && echo").is_err());
    }
}
