//! Bounded staging of request bodies

use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tubely_core::constants::STAGED_FILE_PREFIX;

use super::error::UploadPipelineError;
use super::scope::RunScope;

/// A request body written verbatim to a file inside a run scope.
#[derive(Debug, Clone)]
pub struct StagedFile {
    path: PathBuf,
    size_bytes: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

/// Copy `reader` into a new `tubely-upload-*.mp4` file in `scope`.
///
/// At most `max_bytes + 1` bytes are read. Going over the limit fails with
/// `PayloadTooLarge` and leaves the rest of the stream unread.
pub async fn stage<R>(
    reader: &mut R,
    max_bytes: u64,
    scope: &mut RunScope,
) -> Result<StagedFile, UploadPipelineError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let (file, path) = tempfile::Builder::new()
        .prefix(STAGED_FILE_PREFIX)
        .suffix(".mp4")
        .tempfile_in(scope.path())
        .and_then(|named| named.keep().map_err(|e| e.error))
        .map_err(UploadPipelineError::Staging)?;
    scope.track(&path);

    let mut file = tokio::fs::File::from_std(file);
    let mut limited = reader.take(max_bytes.saturating_add(1));

    let size_bytes = tokio::io::copy(&mut limited, &mut file)
        .await
        .map_err(UploadPipelineError::Staging)?;

    if size_bytes > max_bytes {
        return Err(UploadPipelineError::PayloadTooLarge { limit: max_bytes });
    }

    file.flush().await.map_err(UploadPipelineError::Staging)?;
    file.sync_all().await.map_err(UploadPipelineError::Staging)?;

    tracing::debug!(
        path = %path.display(),
        size_bytes = size_bytes,
        "Upload staged"
    );

    Ok(StagedFile { path, size_bytes })
}

/// Read `reader` into memory, failing once more than `max_bytes` arrive.
pub async fn read_bounded<R>(reader: &mut R, max_bytes: u64) -> Result<Vec<u8>, UploadPipelineError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut data = Vec::new();
    reader
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut data)
        .await
        .map_err(UploadPipelineError::Staging)?;

    if data.len() as u64 > max_bytes {
        return Err(UploadPipelineError::PayloadTooLarge { limit: max_bytes });
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stages_bytes_verbatim() {
        let parent = tempfile::tempdir().unwrap();
        let mut scope = RunScope::new(parent.path()).unwrap();
        let mut body: &[u8] = b"\x00\x00\x00\x18ftypmp42";

        let staged = stage(&mut body, 1024, &mut scope).await.unwrap();

        assert_eq!(staged.size_bytes(), 12);
        assert!(staged.path().starts_with(scope.path()));
        let name = staged.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("tubely-upload-"));
        assert!(name.ends_with(".mp4"));
        assert_eq!(
            tokio::fs::read(staged.path()).await.unwrap(),
            b"\x00\x00\x00\x18ftypmp42"
        );
        assert_eq!(scope.artifacts(), [staged.path().to_path_buf()]);
    }

    #[tokio::test]
    async fn exactly_max_bytes_is_accepted() {
        let parent = tempfile::tempdir().unwrap();
        let mut scope = RunScope::new(parent.path()).unwrap();
        let mut body: &[u8] = &[7u8; 16];

        let staged = stage(&mut body, 16, &mut scope).await.unwrap();
        assert_eq!(staged.size_bytes(), 16);
    }

    #[tokio::test]
    async fn over_limit_fails_without_draining() {
        let parent = tempfile::tempdir().unwrap();
        let mut scope = RunScope::new(parent.path()).unwrap();
        let data = vec![1u8; 64];
        let mut body: &[u8] = &data;

        let result = stage(&mut body, 16, &mut scope).await;

        assert!(matches!(
            result,
            Err(UploadPipelineError::PayloadTooLarge { limit: 16 })
        ));
        // Only limit + 1 bytes were consumed.
        assert_eq!(body.len(), 64 - 17);
    }

    #[tokio::test]
    async fn read_bounded_limits() {
        let mut ok: &[u8] = b"png";
        assert_eq!(read_bounded(&mut ok, 3).await.unwrap(), b"png");

        let mut too_big: &[u8] = b"jpeg";
        assert!(matches!(
            read_bounded(&mut too_big, 3).await,
            Err(UploadPipelineError::PayloadTooLarge { limit: 3 })
        ));
    }
}
