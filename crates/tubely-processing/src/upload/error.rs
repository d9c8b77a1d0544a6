use thiserror::Error;
use tubely_core::AppError;
use tubely_storage::StorageError;
use uuid::Uuid;

/// Upload pipeline errors. Every variant aborts the run.
#[derive(Debug, Error)]
pub enum UploadPipelineError {
    #[error("Video {0} not found")]
    VideoNotFound(Uuid),

    #[error("User {user_id} does not own video {video_id}")]
    NotOwner { user_id: Uuid, video_id: Uuid },

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Upload exceeds maximum size of {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("Failed to stage upload: {0}")]
    Staging(#[source] std::io::Error),

    #[error("Failed to normalize video: {0}")]
    Normalize(String),

    #[error("Failed to upload to storage: {0}")]
    Upload(#[from] StorageError),

    #[error("Record store error: {0}")]
    Record(#[source] AppError),
}

impl From<UploadPipelineError> for AppError {
    fn from(err: UploadPipelineError) -> Self {
        match err {
            UploadPipelineError::VideoNotFound(_) => AppError::NotFound(err.to_string()),
            UploadPipelineError::NotOwner { .. } => AppError::Forbidden(err.to_string()),
            UploadPipelineError::UnsupportedMediaType(media_type) => {
                AppError::UnsupportedMediaType(media_type)
            }
            UploadPipelineError::PayloadTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            UploadPipelineError::Staging(e) => AppError::Internal(format!("Staging failed: {}", e)),
            UploadPipelineError::Normalize(msg) => AppError::MediaConversionError(msg),
            UploadPipelineError::Upload(e) => AppError::Storage(e.to_string()),
            UploadPipelineError::Record(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubely_core::ErrorMetadata;

    #[test]
    fn maps_to_client_statuses() {
        let id = Uuid::new_v4();
        assert_eq!(AppError::from(UploadPipelineError::VideoNotFound(id)).http_status_code(), 404);
        assert_eq!(
            AppError::from(UploadPipelineError::NotOwner {
                user_id: Uuid::new_v4(),
                video_id: id
            })
            .http_status_code(),
            403
        );
        assert_eq!(
            AppError::from(UploadPipelineError::PayloadTooLarge { limit: 10 }).http_status_code(),
            413
        );
        assert_eq!(
            AppError::from(UploadPipelineError::UnsupportedMediaType("image/png".into()))
                .http_status_code(),
            415
        );
        assert_eq!(
            AppError::from(UploadPipelineError::Normalize("boom".into())).http_status_code(),
            422
        );
    }
}
