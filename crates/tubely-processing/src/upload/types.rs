use serde::Serialize;
use std::path::PathBuf;
use tokio::io::AsyncRead;
use tubely_core::{Config, Orientation, StorageObject, VideoRecord};
use uuid::Uuid;

use crate::metadata::ProbeResult;
use crate::video::FastStartPath;

/// Request body stream
pub type UploadBody = Box<dyn AsyncRead + Send + Unpin>;

/// Limits and locations shared by the upload pipelines
#[derive(Debug, Clone)]
pub struct UploadPipelineConfig {
    pub max_video_bytes: u64,
    pub max_thumbnail_bytes: u64,
    /// Parent directory for per-run temp directories
    pub temp_dir: PathBuf,
}

impl From<&Config> for UploadPipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_video_bytes: config.max_video_size_bytes(),
            max_thumbnail_bytes: config.max_thumbnail_size_bytes(),
            temp_dir: config.upload_temp_dir(),
        }
    }
}

pub struct VideoUploadRequest {
    pub user_id: Uuid,
    pub video_id: Uuid,
    /// Declared content type, parameters allowed (`video/mp4; codecs=...`)
    pub content_type: String,
    /// Client filename; only its extension is used
    pub filename: Option<String>,
    pub body: UploadBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoUploadOutcome {
    pub record: VideoRecord,
    pub object: StorageObject,
    pub orientation: Orientation,
    pub probe: ProbeResult,
    pub fast_start: FastStartPath,
    pub staged_bytes: u64,
}

pub struct ThumbnailUploadRequest {
    pub user_id: Uuid,
    pub video_id: Uuid,
    pub content_type: String,
    pub body: UploadBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThumbnailUploadOutcome {
    pub record: VideoRecord,
    pub object: StorageObject,
}
