pub mod classifier;
pub mod command;
pub mod normalizer;
pub mod prober;

pub use classifier::classify;
pub use normalizer::{FastStartNormalizer, FastStartPath, FfmpegNormalizer, NormalizeOutcome};
pub use prober::{parse_probe_output, FfprobeProber, MediaProber};
