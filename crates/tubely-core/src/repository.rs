//! Record store seam
//!
//! The metadata store lives outside this workspace. The pipelines only need
//! to read a record and write it back once, which is what this trait exposes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::VideoRecord;

/// Video record operations needed by the upload pipelines
#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Create a draft record (title and description only, no files yet)
    async fn create_video(
        &self,
        owner_id: Uuid,
        title: &str,
        description: &str,
    ) -> Result<VideoRecord, AppError>;

    /// Get a record by ID
    async fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError>;

    /// Replace a record as a whole
    async fn update_video(&self, video: &VideoRecord) -> Result<(), AppError>;
}

/// In-process record store used by the CLI and tests.
#[derive(Default)]
pub struct InMemoryVideoRepository {
    videos: Mutex<HashMap<Uuid, VideoRecord>>,
    updates: Mutex<HashMap<Uuid, usize>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record as-is
    pub fn insert(&self, video: VideoRecord) {
        self.lock_videos().insert(video.id, video);
    }

    /// Number of `update_video` calls that targeted `id`.
    pub fn update_count(&self, id: Uuid) -> usize {
        self.lock_updates().get(&id).copied().unwrap_or(0)
    }

    fn lock_videos(&self) -> MutexGuard<'_, HashMap<Uuid, VideoRecord>> {
        self.videos.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_updates(&self) -> MutexGuard<'_, HashMap<Uuid, usize>> {
        self.updates.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn create_video(
        &self,
        owner_id: Uuid,
        title: &str,
        description: &str,
    ) -> Result<VideoRecord, AppError> {
        let video = VideoRecord::new(owner_id, title, description);
        self.insert(video.clone());
        Ok(video)
    }

    async fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        Ok(self.lock_videos().get(&id).cloned())
    }

    async fn update_video(&self, video: &VideoRecord) -> Result<(), AppError> {
        let mut videos = self.lock_videos();
        if !videos.contains_key(&video.id) {
            return Err(AppError::NotFound(format!("Video {} not found", video.id)));
        }
        videos.insert(video.id, video.clone());
        *self.lock_updates().entry(video.id).or_insert(0) += 1;
        Ok(())
    }
}
