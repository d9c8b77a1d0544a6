//! Upload pipelines: stage → probe → normalize → store → record.

pub mod error;
pub mod pipeline;
pub mod scope;
pub mod stager;
pub mod thumbnail;
pub mod types;

pub use error::UploadPipelineError;
pub use pipeline::VideoUploadPipeline;
pub use scope::RunScope;
pub use stager::{read_bounded, stage, StagedFile};
pub use thumbnail::ThumbnailUploadPipeline;
pub use types::{
    ThumbnailUploadOutcome, ThumbnailUploadRequest, UploadBody, UploadPipelineConfig,
    VideoUploadOutcome, VideoUploadRequest,
};
