//! Tubely Processing Library
//!
//! Turns an uploaded byte stream into a stored, fast-start MP4: staging into a
//! run-scoped temp directory, probing with ffprobe, orientation classification,
//! faststart normalization with ffmpeg, and the final store + record update.
//! Thumbnail uploads go through a smaller pipeline of their own.

pub mod metadata;
pub mod upload;
pub mod video;

pub use metadata::ProbeResult;
pub use upload::{
    RunScope, StagedFile, ThumbnailUploadOutcome, ThumbnailUploadPipeline, ThumbnailUploadRequest,
    UploadPipelineConfig, UploadPipelineError, VideoUploadOutcome, VideoUploadPipeline,
    VideoUploadRequest,
};
pub use video::{
    classify, FastStartNormalizer, FastStartPath, FfmpegNormalizer, FfprobeProber, MediaProber,
    NormalizeOutcome,
};
