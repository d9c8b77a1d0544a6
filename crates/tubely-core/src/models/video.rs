use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::storage::StorageObject;

/// A video record as kept by the metadata store.
///
/// The upload pipelines only ever touch `video` and `thumbnail`, each in a
/// single update after the object has been stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<StorageObject>,
    pub video: Option<StorageObject>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    pub fn new(owner_id: Uuid, title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title: title.into(),
            description: description.into(),
            thumbnail: None,
            video: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// Copy of this record pointing at a newly stored video.
    pub fn with_video(&self, object: StorageObject) -> Self {
        Self {
            video: Some(object),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Copy of this record pointing at a newly stored thumbnail.
    pub fn with_thumbnail(&self, object: StorageObject) -> Self {
        Self {
            thumbnail: Some(object),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}

/// Client representation of a record with references resolved to URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoView {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
