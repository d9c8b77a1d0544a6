use std::path::Path;

/// Content type for a local file, guessed from its extension.
pub fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_from_extension() {
        assert_eq!(guess_content_type(Path::new("clip.mp4")), "video/mp4");
        assert_eq!(guess_content_type(Path::new("CLIP.MP4")), "video/mp4");
        assert_eq!(guess_content_type(Path::new("thumb.png")), "image/png");
        assert_eq!(guess_content_type(Path::new("thumb.JPEG")), "image/jpeg");
        assert_eq!(guess_content_type(Path::new("clip.mov")), "video/quicktime");
        assert_eq!(guess_content_type(Path::new("noext")), "application/octet-stream");
    }
}
