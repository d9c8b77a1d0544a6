//! Locator resolution
//!
//! Records persist a `StorageObject`, never a URL. Every read turns the
//! reference into a client URL: a deterministic public (or CDN) URL in static
//! mode, or a freshly minted presigned GET in signed mode.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tubely_core::constants::PRESIGNED_URL_TTL;
use tubely_core::{AppError, Config, StorageObject, UrlMode, VideoRecord, VideoView};

use crate::traits::{Storage, StorageError};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Failed to sign URL for {key}: {message}")]
    Signing { key: String, message: String },

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Bucket {0} is not served by this deployment")]
    UnknownBucket(String),
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Signing { .. } => AppError::UrlSigning(err.to_string()),
            ResolveError::NotFound(key) => AppError::NotFound(format!("Object not found: {}", key)),
            ResolveError::UnknownBucket(_) => AppError::Storage(err.to_string()),
        }
    }
}

/// Resolver settings
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub mode: UrlMode,
    pub cdn_base_url: Option<String>,
    pub signed_url_ttl: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            mode: UrlMode::Signed,
            cdn_base_url: None,
            signed_url_ttl: PRESIGNED_URL_TTL,
        }
    }
}

impl From<&Config> for ResolverConfig {
    fn from(config: &Config) -> Self {
        Self {
            mode: config.url_mode(),
            cdn_base_url: config.cdn_base_url().map(String::from),
            signed_url_ttl: PRESIGNED_URL_TTL,
        }
    }
}

/// Turns stored references into client URLs.
pub struct LocatorResolver {
    videos: Arc<dyn Storage>,
    assets: Option<Arc<dyn Storage>>,
    config: ResolverConfig,
}

impl LocatorResolver {
    pub fn new(videos: Arc<dyn Storage>, config: ResolverConfig) -> Self {
        Self {
            videos,
            assets: None,
            config,
        }
    }

    /// Also serve objects from the asset store (thumbnails).
    pub fn with_assets(mut self, assets: Arc<dyn Storage>) -> Self {
        self.assets = Some(assets);
        self
    }

    pub fn mode(&self) -> UrlMode {
        self.config.mode
    }

    /// Resolve a video reference in the configured mode.
    ///
    /// Signed URLs are minted on every call; nothing is cached.
    pub async fn resolve(&self, object: &StorageObject) -> Result<String, ResolveError> {
        match self.config.mode {
            UrlMode::Static => self.static_url(object),
            UrlMode::Signed => self.signed_url(object).await,
        }
    }

    /// Deterministic URL of an object. The CDN base applies to video objects only.
    pub fn static_url(&self, object: &StorageObject) -> Result<String, ResolveError> {
        let storage = self.storage_for(object)?;

        if object.bucket == self.videos.bucket() {
            if let Some(cdn) = self.config.cdn_base_url.as_deref() {
                return Ok(format!("{}/{}", cdn.trim_end_matches('/'), object.key));
            }
        }

        Ok(storage.public_url(&object.key))
    }

    async fn signed_url(&self, object: &StorageObject) -> Result<String, ResolveError> {
        let storage = self.storage_for(object)?;

        storage
            .get_presigned_url(&object.key, self.config.signed_url_ttl)
            .await
            .map_err(|e| match e {
                StorageError::NotFound(key) => ResolveError::NotFound(key),
                other => ResolveError::Signing {
                    key: object.key.clone(),
                    message: other.to_string(),
                },
            })
    }

    fn storage_for(&self, object: &StorageObject) -> Result<&Arc<dyn Storage>, ResolveError> {
        if object.bucket == self.videos.bucket() {
            return Ok(&self.videos);
        }
        match &self.assets {
            Some(assets) if object.bucket == assets.bucket() => Ok(assets),
            _ => Err(ResolveError::UnknownBucket(object.bucket.clone())),
        }
    }

    /// Client view of a record: the video reference resolved in the configured
    /// mode, the thumbnail statically.
    pub async fn present(&self, record: &VideoRecord) -> Result<VideoView, ResolveError> {
        let video_url = match &record.video {
            Some(object) => Some(self.resolve(object).await?),
            None => None,
        };
        let thumbnail_url = match &record.thumbnail {
            Some(object) => Some(self.static_url(object)?),
            None => None,
        };

        Ok(VideoView {
            id: record.id,
            owner_id: record.owner_id,
            title: record.title.clone(),
            description: record.description.clone(),
            thumbnail_url,
            video_url,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}
