//! Thumbnail upload pipeline

use std::sync::Arc;
use tubely_core::constants::THUMBNAIL_MEDIA_TYPES;
use tubely_core::{parse_media_type, VideoRepository};
use tubely_storage::keys::derive_thumbnail_key;
use tubely_storage::Storage;

use super::error::UploadPipelineError;
use super::pipeline::{commit_record, owned_record};
use super::stager::read_bounded;
use super::types::{ThumbnailUploadOutcome, ThumbnailUploadRequest, UploadPipelineConfig};

/// Extension for an accepted thumbnail media type.
fn thumbnail_extension(media_type: &str) -> Option<&'static str> {
    THUMBNAIL_MEDIA_TYPES
        .iter()
        .find(|(accepted, _)| *accepted == media_type)
        .map(|(_, ext)| *ext)
}

/// Stores a PNG or JPEG thumbnail on the asset storage and points the record at it.
pub struct ThumbnailUploadPipeline {
    repository: Arc<dyn VideoRepository>,
    assets: Arc<dyn Storage>,
    config: UploadPipelineConfig,
}

impl ThumbnailUploadPipeline {
    pub fn new(
        repository: Arc<dyn VideoRepository>,
        assets: Arc<dyn Storage>,
        config: UploadPipelineConfig,
    ) -> Self {
        Self {
            repository,
            assets,
            config,
        }
    }

    #[tracing::instrument(skip(self, request), fields(
        user_id = %request.user_id,
        video_id = %request.video_id,
    ))]
    pub async fn run(
        &self,
        mut request: ThumbnailUploadRequest,
    ) -> Result<ThumbnailUploadOutcome, UploadPipelineError> {
        let start = std::time::Instant::now();

        let media_type = parse_media_type(&request.content_type)
            .map_err(|_| UploadPipelineError::UnsupportedMediaType(request.content_type.clone()))?;
        let extension = thumbnail_extension(&media_type)
            .ok_or_else(|| UploadPipelineError::UnsupportedMediaType(media_type.clone()))?;

        let record =
            owned_record(self.repository.as_ref(), request.user_id, request.video_id).await?;

        let data = read_bounded(&mut request.body, self.config.max_thumbnail_bytes).await?;
        let size = data.len();

        let key = derive_thumbnail_key(extension);
        let object = self.assets.upload_with_key(&key, data, &media_type).await?;

        let updated = record.with_thumbnail(object.clone());
        commit_record(
            self.repository.as_ref(),
            self.assets.as_ref(),
            &updated,
            &object,
        )
        .await?;

        tracing::info!(
            bucket = %object.bucket,
            key = %object.key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Thumbnail upload completed"
        );

        Ok(ThumbnailUploadOutcome {
            record: updated,
            object,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_thumbnail_types() {
        assert_eq!(thumbnail_extension("image/png"), Some(".png"));
        assert_eq!(thumbnail_extension("image/jpeg"), Some(".jpg"));
        assert_eq!(thumbnail_extension("image/gif"), None);
        assert_eq!(thumbnail_extension("video/mp4"), None);
    }
}
