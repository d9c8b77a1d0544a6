//! Fixed values shared across crates.

use std::time::Duration;

/// The only media type accepted by the video upload pipeline.
pub const VIDEO_MEDIA_TYPE: &str = "video/mp4";

/// Extension used for video keys when the upload carries no usable filename.
pub const DEFAULT_VIDEO_EXTENSION: &str = ".mp4";

/// Media types accepted for thumbnails, with the extension each maps to.
pub const THUMBNAIL_MEDIA_TYPES: &[(&str, &str)] = &[("image/png", ".png"), ("image/jpeg", ".jpg")];

/// Default upper bound for a video upload (1 GiB).
pub const DEFAULT_MAX_VIDEO_SIZE_BYTES: u64 = 1 << 30;

/// Default upper bound for a thumbnail upload (10 MiB).
pub const DEFAULT_MAX_THUMBNAIL_SIZE_BYTES: u64 = 10 << 20;

/// Validity window of every signed video URL.
pub const PRESIGNED_URL_TTL: Duration = Duration::from_secs(15 * 60);

/// Number of random bytes behind each storage key token.
pub const STORAGE_KEY_ENTROPY_BYTES: usize = 32;

/// Key prefix for thumbnails on the assets storage.
pub const THUMBNAIL_KEY_PREFIX: &str = "thumbnails/";

/// Prefix of staged upload files inside a run directory.
pub const STAGED_FILE_PREFIX: &str = "tubely-upload-";

/// Prefix of the per-run temporary directory.
pub const RUN_DIR_PREFIX: &str = "tubely-run-";

/// Logical bucket name of the local asset store (thumbnails).
pub const ASSETS_BUCKET: &str = "assets";
