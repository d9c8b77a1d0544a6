//! Video upload pipeline

use std::sync::Arc;
use tubely_core::constants::{DEFAULT_VIDEO_EXTENSION, VIDEO_MEDIA_TYPE};
use tubely_core::{parse_media_type, StorageObject, VideoRecord, VideoRepository};
use tubely_storage::keys::{derive_key, extension_from_filename};
use tubely_storage::Storage;
use uuid::Uuid;

use super::error::UploadPipelineError;
use super::scope::RunScope;
use super::stager::stage;
use super::types::{UploadPipelineConfig, VideoUploadOutcome, VideoUploadRequest};
use crate::video::{classify, FastStartNormalizer, MediaProber};

/// Look up a record and check that `user_id` owns it.
pub(crate) async fn owned_record(
    repository: &dyn VideoRepository,
    user_id: Uuid,
    video_id: Uuid,
) -> Result<VideoRecord, UploadPipelineError> {
    let record = repository
        .get_video(video_id)
        .await
        .map_err(UploadPipelineError::Record)?
        .ok_or(UploadPipelineError::VideoNotFound(video_id))?;

    if !record.is_owned_by(user_id) {
        return Err(UploadPipelineError::NotOwner { user_id, video_id });
    }

    Ok(record)
}

/// Persist `updated`. If the write fails the just-stored object is deleted
/// again (best effort).
pub(crate) async fn commit_record(
    repository: &dyn VideoRepository,
    storage: &dyn Storage,
    updated: &VideoRecord,
    object: &StorageObject,
) -> Result<(), UploadPipelineError> {
    if let Err(e) = repository.update_video(updated).await {
        if let Err(delete_err) = storage.delete(&object.key).await {
            tracing::warn!(
                error = %delete_err,
                bucket = %object.bucket,
                key = %object.key,
                "Failed to delete object after record update failure"
            );
        }
        return Err(UploadPipelineError::Record(e));
    }
    Ok(())
}

/// Stages, normalizes and stores an MP4, then points the record at it.
pub struct VideoUploadPipeline {
    repository: Arc<dyn VideoRepository>,
    storage: Arc<dyn Storage>,
    prober: Arc<dyn MediaProber>,
    normalizer: Arc<dyn FastStartNormalizer>,
    config: UploadPipelineConfig,
}

impl VideoUploadPipeline {
    pub fn new(
        repository: Arc<dyn VideoRepository>,
        storage: Arc<dyn Storage>,
        prober: Arc<dyn MediaProber>,
        normalizer: Arc<dyn FastStartNormalizer>,
        config: UploadPipelineConfig,
    ) -> Self {
        Self {
            repository,
            storage,
            prober,
            normalizer,
            config,
        }
    }

    /// Run one upload.
    ///
    /// The media type is checked before anything is read. Every temporary
    /// file lives in one run scope that is released on all exit paths, and
    /// the record is written at most once, after the object is stored.
    #[tracing::instrument(skip(self, request), fields(
        user_id = %request.user_id,
        video_id = %request.video_id,
    ))]
    pub async fn run(
        &self,
        request: VideoUploadRequest,
    ) -> Result<VideoUploadOutcome, UploadPipelineError> {
        let start = std::time::Instant::now();

        let media_type = parse_media_type(&request.content_type)
            .map_err(|_| UploadPipelineError::UnsupportedMediaType(request.content_type.clone()))?;
        if media_type != VIDEO_MEDIA_TYPE {
            return Err(UploadPipelineError::UnsupportedMediaType(media_type));
        }

        let record =
            owned_record(self.repository.as_ref(), request.user_id, request.video_id).await?;

        let mut scope = RunScope::new(&self.config.temp_dir).map_err(UploadPipelineError::Staging)?;
        let result = self.process(request, record, &mut scope).await;

        if let Err(e) = scope.close() {
            tracing::warn!(error = %e, "Failed to remove upload run directory");
        }

        match &result {
            Ok(outcome) => tracing::info!(
                bucket = %outcome.object.bucket,
                key = %outcome.object.key,
                orientation = %outcome.orientation,
                fast_start = ?outcome.fast_start,
                size_bytes = outcome.staged_bytes,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Video upload completed"
            ),
            Err(e) => tracing::warn!(
                error = %e,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Video upload failed"
            ),
        }

        result
    }

    async fn process(
        &self,
        mut request: VideoUploadRequest,
        record: VideoRecord,
        scope: &mut RunScope,
    ) -> Result<VideoUploadOutcome, UploadPipelineError> {
        let staged = stage(&mut request.body, self.config.max_video_bytes, scope).await?;

        let probe = self.prober.probe(staged.path()).await;
        let orientation = classify(&probe);

        let outcome = self.normalizer.normalize(staged.path()).await;
        let (normalized, fast_start) = outcome
            .output()
            .map_err(|diagnostic| UploadPipelineError::Normalize(diagnostic.to_string()))?;
        scope.track(normalized);

        let extension = request
            .filename
            .as_deref()
            .and_then(extension_from_filename)
            .unwrap_or_else(|| DEFAULT_VIDEO_EXTENSION.to_string());
        let key = derive_key(orientation, &extension);

        let object = self
            .storage
            .upload_file(&key, normalized, VIDEO_MEDIA_TYPE)
            .await?;

        let updated = record.with_video(object.clone());
        commit_record(
            self.repository.as_ref(),
            self.storage.as_ref(),
            &updated,
            &object,
        )
        .await?;

        Ok(VideoUploadOutcome {
            record: updated,
            object,
            orientation,
            probe,
            fast_start,
            staged_bytes: staged.size_bytes(),
        })
    }
}
