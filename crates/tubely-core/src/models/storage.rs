//! Durable storage reference: the value persisted in a record instead of a URL.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Identifies an object in durable storage.
///
/// This, not a resolved URL, is what records keep: signed URLs expire and
/// are minted again on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageObject {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
}

impl StorageObject {
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            content_type: content_type.into(),
        }
    }

    /// Textual `bucket,key` form used by older records.
    pub fn to_reference(&self) -> String {
        format!("{},{}", self.bucket, self.key)
    }

    /// Parse a `bucket,key` reference. The content type is not part of the
    /// textual form and must be supplied by the caller.
    pub fn parse_reference(reference: &str, content_type: &str) -> Result<Self, AppError> {
        let (bucket, key) = reference.split_once(',').ok_or_else(|| {
            AppError::InvalidInput(format!("Invalid storage reference: {}", reference))
        })?;

        if bucket.is_empty() || key.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Invalid storage reference: {}",
                reference
            )));
        }

        Ok(Self::new(bucket, key, content_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_round_trip() {
        let object = StorageObject::new("tubely-videos", "landscape/abc.mp4", "video/mp4");
        let reference = object.to_reference();
        assert_eq!(reference, "tubely-videos,landscape/abc.mp4");
        assert_eq!(
            StorageObject::parse_reference(&reference, "video/mp4").unwrap(),
            object
        );
    }

    #[test]
    fn key_may_contain_commas() {
        let object = StorageObject::parse_reference("bucket,other/a,b.mp4", "video/mp4").unwrap();
        assert_eq!(object.bucket, "bucket");
        assert_eq!(object.key, "other/a,b.mp4");
    }

    #[test]
    fn malformed_references_are_rejected() {
        assert!(StorageObject::parse_reference("no-separator", "video/mp4").is_err());
        assert!(StorageObject::parse_reference(",key.mp4", "video/mp4").is_err());
        assert!(StorageObject::parse_reference("bucket,", "video/mp4").is_err());
    }
}
