//! Media type parsing for declared `Content-Type` values.

use crate::error::AppError;

/// Parse a declared content type into a bare, lowercase media type.
///
/// Parameters after `;` are dropped (`video/mp4; codecs="avc1"` becomes
/// `video/mp4`). The type must have the `type/subtype` shape.
pub fn parse_media_type(content_type: &str) -> Result<String, AppError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let mut parts = essence.splitn(2, '/');
    let (kind, subtype) = (parts.next().unwrap_or(""), parts.next().unwrap_or(""));

    let is_token = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c))
    };

    if !is_token(kind) || !is_token(subtype) {
        return Err(AppError::InvalidInput(format!(
            "Invalid Content-Type: {:?}",
            content_type
        )));
    }

    Ok(essence)
}
