//! Shared key generation for storage backends.
//!
//! Video keys: `{orientation}/{token}{ext}`. Thumbnail keys: `thumbnails/{token}{ext}`.
//! The token is 32 bytes from the thread-local CSPRNG, URL-safe base64 without padding.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use std::path::Path;
use tubely_core::constants::{STORAGE_KEY_ENTROPY_BYTES, THUMBNAIL_KEY_PREFIX};
use tubely_core::Orientation;

const MAX_EXTENSION_LEN: usize = 8;

/// 43-character URL-safe random token.
pub fn random_token() -> String {
    let mut bytes = [0u8; STORAGE_KEY_ENTROPY_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Lowercased `.ext` from a client-supplied filename.
///
/// Returns `None` when the name has no extension or the extension is not a
/// short alphanumeric token; callers fall back to a default.
pub fn extension_from_filename(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}

/// Storage key for a video of the given orientation.
pub fn derive_key(orientation: Orientation, extension: &str) -> String {
    format!("{}{}{}", orientation.key_prefix(), random_token(), extension)
}

/// Storage key for a thumbnail image.
pub fn derive_thumbnail_key(extension: &str) -> String {
    format!("{}{}{}", THUMBNAIL_KEY_PREFIX, random_token(), extension)
}
