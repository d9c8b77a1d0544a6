//! Configuration module
//!
//! This module provides the configuration for the upload service: storage
//! backend selection, URL visibility mode, size limits, and the paths of the
//! external media tools. Values are read from the environment (a `.env` file
//! is loaded first when present).

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::{
    ASSETS_BUCKET, DEFAULT_MAX_THUMBNAIL_SIZE_BYTES, DEFAULT_MAX_VIDEO_SIZE_BYTES,
};
use crate::storage_types::StorageBackend;

const MAX_CONCURRENT_FFMPEG: usize = 2;

/// How stored video references are turned into client URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UrlMode {
    /// Deterministic public URL (bucket URL or CDN host).
    Static,
    /// Time-limited presigned URL minted on every read.
    #[default]
    Signed,
}

impl FromStr for UrlMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "static" | "public" => Ok(UrlMode::Static),
            "signed" | "presigned" => Ok(UrlMode::Signed),
            _ => Err(anyhow::anyhow!("Invalid URL mode: {}", s)),
        }
    }
}

impl Display for UrlMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UrlMode::Static => write!(f, "static"),
            UrlMode::Signed => write!(f, "signed"),
        }
    }
}

/// Settings shared by every Tubely binary
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub environment: String,
    pub service_name: String,
}

/// Upload service configuration
#[derive(Clone, Debug)]
pub struct UploadServiceConfig {
    pub base: BaseConfig,
    // Video storage
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, R2, ...)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub local_storage_bucket: String,
    // URL materialization
    pub url_mode: UrlMode,
    pub cdn_base_url: Option<String>,
    // Limits
    pub max_video_size_bytes: u64,
    pub max_thumbnail_size_bytes: u64,
    // External tools
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub max_concurrent_ffmpeg: usize,
    pub upload_temp_dir: Option<PathBuf>,
    // Thumbnail assets (always local)
    pub assets_path: String,
    pub assets_base_url: String,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<UploadServiceConfig>);

impl Config {
    fn inner(&self) -> &UploadServiceConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = UploadServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    /// Read the environment without backend checks (tool-only commands).
    pub fn load_env() -> Result<Self, anyhow::Error> {
        let config = UploadServiceConfig::load_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.inner().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn service_name(&self) -> &str {
        &self.inner().base.service_name
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.inner().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn local_storage_bucket(&self) -> &str {
        &self.inner().local_storage_bucket
    }

    pub fn url_mode(&self) -> UrlMode {
        self.inner().url_mode
    }

    pub fn cdn_base_url(&self) -> Option<&str> {
        self.inner().cdn_base_url.as_deref()
    }

    pub fn max_video_size_bytes(&self) -> u64 {
        self.inner().max_video_size_bytes
    }

    pub fn max_thumbnail_size_bytes(&self) -> u64 {
        self.inner().max_thumbnail_size_bytes
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.inner().ffmpeg_path
    }

    pub fn ffprobe_path(&self) -> &str {
        &self.inner().ffprobe_path
    }

    pub fn max_concurrent_ffmpeg(&self) -> usize {
        self.inner().max_concurrent_ffmpeg
    }

    /// Directory under which per-run temp directories are created.
    pub fn upload_temp_dir(&self) -> PathBuf {
        self.inner()
            .upload_temp_dir
            .clone()
            .unwrap_or_else(env::temp_dir)
    }

    pub fn assets_path(&self) -> &str {
        &self.inner().assets_path
    }

    pub fn assets_base_url(&self) -> &str {
        &self.inner().assets_base_url
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

/// Parse a numeric setting; unset means `default`, unparsable is an error.
fn parse_setting<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, anyhow::Error> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number, got {:?}", key, value)),
        None => Ok(default),
    }
}

fn setting_or<T: FromStr>(key: &str, default: T) -> Result<T, anyhow::Error> {
    parse_setting(key, non_empty(key), default)
}

impl UploadServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = Self::load_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let storage_backend = match non_empty("STORAGE_BACKEND") {
            Some(value) => Some(value.parse::<StorageBackend>()?),
            None => None,
        };

        let url_mode = match non_empty("URL_MODE") {
            Some(value) => value.parse::<UrlMode>()?,
            None => UrlMode::default(),
        };

        let config = UploadServiceConfig {
            base: BaseConfig {
                environment,
                service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| "tubely".to_string()),
            },
            storage_backend,
            s3_bucket: non_empty("S3_BUCKET"),
            s3_region: non_empty("S3_REGION"),
            s3_endpoint: non_empty("S3_ENDPOINT"),
            aws_region: non_empty("AWS_REGION"),
            local_storage_path: non_empty("LOCAL_STORAGE_PATH"),
            local_storage_base_url: non_empty("LOCAL_STORAGE_BASE_URL"),
            local_storage_bucket: env::var("LOCAL_STORAGE_BUCKET")
                .unwrap_or_else(|_| "local".to_string()),
            url_mode,
            cdn_base_url: non_empty("CDN_BASE_URL"),
            max_video_size_bytes: setting_or("MAX_VIDEO_SIZE_BYTES", DEFAULT_MAX_VIDEO_SIZE_BYTES)?,
            max_thumbnail_size_bytes: setting_or(
                "MAX_THUMBNAIL_SIZE_BYTES",
                DEFAULT_MAX_THUMBNAIL_SIZE_BYTES,
            )?,
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            max_concurrent_ffmpeg: setting_or("MAX_CONCURRENT_FFMPEG", MAX_CONCURRENT_FFMPEG)?,
            upload_temp_dir: non_empty("UPLOAD_TEMP_DIR").map(PathBuf::from),
            assets_path: env::var("ASSETS_PATH").unwrap_or_else(|_| "./assets".to_string()),
            assets_base_url: env::var("ASSETS_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8091/assets".to_string()),
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_video_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "MAX_VIDEO_SIZE_BYTES must be greater than zero"
            ));
        }

        if self.max_thumbnail_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "MAX_THUMBNAIL_SIZE_BYTES must be greater than zero"
            ));
        }

        if self.max_concurrent_ffmpeg == 0 {
            return Err(anyhow::anyhow!(
                "MAX_CONCURRENT_FFMPEG must be at least 1"
            ));
        }

        if let Some(ref cdn) = self.cdn_base_url {
            if !cdn.starts_with("https://") && !cdn.starts_with("http://") {
                return Err(anyhow::anyhow!(
                    "CDN_BASE_URL must be an absolute http(s) URL"
                ));
            }
        }

        let backend = self.storage_backend.unwrap_or(StorageBackend::S3);
        match backend {
            StorageBackend::S3 => {
                match self.s3_bucket.as_deref() {
                    None => {
                        return Err(anyhow::anyhow!(
                            "S3_BUCKET must be set when using S3 storage backend"
                        ));
                    }
                    Some(ASSETS_BUCKET) => {
                        return Err(anyhow::anyhow!(
                            "S3_BUCKET must not be \"{}\", which names the thumbnail asset store",
                            ASSETS_BUCKET
                        ));
                    }
                    Some(_) => {}
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
                if self.local_storage_bucket == ASSETS_BUCKET {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BUCKET must not be \"{}\", which names the thumbnail asset store",
                        ASSETS_BUCKET
                    ));
                }
            }
        }

        Ok(())
    }
}
