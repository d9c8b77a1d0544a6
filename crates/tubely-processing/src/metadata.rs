use serde::{Deserialize, Serialize};

/// What the prober learned about a container's first video stream.
///
/// Probing never fails the pipeline: anything ffprobe cannot answer is
/// `Indeterminate`, which classifies as `other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeResult {
    Dimensions { width: u32, height: u32 },
    Indeterminate,
}

impl ProbeResult {
    /// `Dimensions` when both sides are non-zero, `Indeterminate` otherwise.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            ProbeResult::Indeterminate
        } else {
            ProbeResult::Dimensions { width, height }
        }
    }

    /// Width divided by height, if known
    pub fn aspect_ratio(&self) -> Option<f64> {
        match *self {
            ProbeResult::Dimensions { width, height } => Some(width as f64 / height as f64),
            ProbeResult::Indeterminate => None,
        }
    }
}
