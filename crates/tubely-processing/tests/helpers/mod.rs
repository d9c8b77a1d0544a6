//! Test doubles for the upload pipelines

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, ReadBuf};
use tubely_core::{
    AppError, InMemoryVideoRepository, StorageBackend, StorageObject, VideoRecord, VideoRepository,
};
use tubely_processing::{FastStartNormalizer, MediaProber, NormalizeOutcome, ProbeResult};
use tubely_storage::{Storage, StorageError, StorageResult};
use uuid::Uuid;

pub const TEST_BUCKET: &str = "test-bucket";

/// Mock storage implementation that stores objects in memory
pub struct MockStorage {
    files: Arc<Mutex<HashMap<String, (Vec<u8>, String)>>>,
    bucket: String,
    fail_uploads: bool,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::with_bucket(TEST_BUCKET)
    }

    pub fn with_bucket(bucket: &str) -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            bucket: bucket.to_string(),
            fail_uploads: false,
        }
    }

    /// Storage whose uploads always fail
    pub fn failing() -> Self {
        Self {
            fail_uploads: true,
            ..Self::new()
        }
    }

    pub fn has_file(&self, key: &str) -> bool {
        self.files.lock().unwrap().contains_key(key)
    }

    /// Get object data (for test assertions)
    pub fn get_file(&self, key: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(key).map(|(data, _)| data.clone())
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.files.lock().unwrap().get(key).map(|(_, ct)| ct.clone())
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<StorageObject> {
        if self.fail_uploads {
            return Err(StorageError::UploadFailed("injected failure".to_string()));
        }
        self.files
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, content_type.to_string()));
        Ok(StorageObject::new(&self.bucket, key, content_type))
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn upload_file(
        &self,
        storage_key: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<StorageObject> {
        let data = tokio::fs::read(path).await?;
        self.put(storage_key, data, content_type)
    }

    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<StorageObject> {
        self.put(storage_key, data, content_type)
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.get_file(storage_key)
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.files.lock().unwrap().remove(storage_key);
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.has_file(storage_key))
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        Ok(format!(
            "https://example.com/presigned/{}?expires={}",
            storage_key,
            expires_in.as_secs()
        ))
    }

    fn public_url(&self, storage_key: &str) -> String {
        format!("https://example.com/{}/{}", self.bucket, storage_key)
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

/// Prober returning a fixed answer
pub struct FixedProber {
    result: ProbeResult,
    probed: Mutex<Vec<PathBuf>>,
}

impl FixedProber {
    pub fn new(result: ProbeResult) -> Self {
        Self {
            result,
            probed: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.probed.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaProber for FixedProber {
    async fn probe(&self, path: &Path) -> ProbeResult {
        self.probed.lock().unwrap().push(path.to_path_buf());
        self.result
    }
}

/// What the scripted normalizer does
#[derive(Clone)]
pub enum NormalizerScript {
    /// Copy the input to `IN.faststart.mp4`
    RemuxSucceeds,
    /// Remux fails; write these bytes to `IN.reencode.mp4`
    ReencodeSucceeds(Vec<u8>),
    /// Both invocations fail
    BothFail,
    /// Write a partial `IN.faststart.mp4`, then never finish
    Hangs,
}

pub struct ScriptedNormalizer {
    script: NormalizerScript,
    calls: AtomicUsize,
}

impl ScriptedNormalizer {
    pub fn new(script: NormalizerScript) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn with_suffix(input: &Path, suffix: &str) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

#[async_trait]
impl FastStartNormalizer for ScriptedNormalizer {
    async fn normalize(&self, input: &Path) -> NormalizeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            NormalizerScript::RemuxSucceeds => {
                let output = with_suffix(input, ".faststart.mp4");
                tokio::fs::copy(input, &output).await.unwrap();
                NormalizeOutcome::Remuxed(output)
            }
            NormalizerScript::ReencodeSucceeds(bytes) => {
                let output = with_suffix(input, ".reencode.mp4");
                tokio::fs::write(&output, bytes).await.unwrap();
                NormalizeOutcome::Reencoded(output)
            }
            NormalizerScript::BothFail => {
                NormalizeOutcome::Failed("remux failed: bad; re-encode failed: worse".to_string())
            }
            NormalizerScript::Hangs => {
                let output = with_suffix(input, ".faststart.mp4");
                tokio::fs::write(&output, b"partial").await.unwrap();
                tokio::time::sleep(Duration::from_secs(3600)).await;
                NormalizeOutcome::Remuxed(output)
            }
        }
    }
}

/// Repository whose updates always fail
#[derive(Default)]
pub struct FailingUpdateRepository {
    pub inner: InMemoryVideoRepository,
}

#[async_trait]
impl VideoRepository for FailingUpdateRepository {
    async fn create_video(
        &self,
        owner_id: Uuid,
        title: &str,
        description: &str,
    ) -> Result<VideoRecord, AppError> {
        self.inner.create_video(owner_id, title, description).await
    }

    async fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        self.inner.get_video(id).await
    }

    async fn update_video(&self, _video: &VideoRecord) -> Result<(), AppError> {
        Err(AppError::Record("connection reset".to_string()))
    }
}

/// Reader that fails the test if it is ever polled
pub struct UntouchedReader;

impl AsyncRead for UntouchedReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        panic!("request body must not be read");
    }
}

/// Entries left in a directory
pub fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
