use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use std::path::Path;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tubely_core::constants::PRESIGNED_URL_TTL;
use tubely_core::StorageObject;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    http_client: reqwest::Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    ///
    /// Credentials come from the standard AWS environment variables.
    pub fn new(bucket: String, region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Self::with_builder(
            AmazonS3Builder::from_env(),
            http_client,
            bucket,
            region,
            endpoint_url,
        )
    }

    fn with_builder(
        builder: AmazonS3Builder,
        http_client: reqwest::Client,
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = builder
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            http_client,
            bucket,
            region,
            endpoint_url,
        })
    }

    /// Generate public URL for S3 object
    ///
    /// For AWS S3, uses the standard format: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers, uses path-style on the endpoint: {endpoint}/{bucket}/{key}
    fn generate_url(&self, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }

    /// Single put with the object's Content-Type attribute set.
    async fn put_object(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<StorageObject> {
        let size = data.len() as u64;
        let location = ObjectPath::from(storage_key.to_string());
        let start = std::time::Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let result: ObjectResult<_> = self
            .store
            .put_opts(&location, PutPayload::from(data), options)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(StorageObject::new(&self.bucket, storage_key, content_type))
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload_file(
        &self,
        storage_key: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<StorageObject> {
        // One PUT against a presigned URL with the file as a streamed body.
        // S3 rejects chunked transfer encoding, so the length is sent up front.
        let start = std::time::Instant::now();
        let location = ObjectPath::from(storage_key.to_string());

        let file = tokio::fs::File::open(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;
        let size = file
            .metadata()
            .await
            .map_err(|e| {
                StorageError::UploadFailed(format!("Failed to stat file {}: {}", path.display(), e))
            })?
            .len();

        let url_result: ObjectResult<_> = self
            .store
            .signed_url(Method::PUT, &location, PRESIGNED_URL_TTL)
            .await;
        let url = url_result
            .map_err(|e| StorageError::UploadFailed(format!("Failed to sign upload: {}", e)))?;

        let response = self
            .http_client
            .put(url.as_str())
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, size)
            .body(reqwest::Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                bucket = %self.bucket,
                key = %storage_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload rejected"
            );
            return Err(StorageError::UploadFailed(format!(
                "S3 responded {}: {}",
                status, body
            )));
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(StorageObject::new(&self.bucket, storage_key, content_type))
    }

    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<StorageObject> {
        self.put_object(storage_key, Bytes::from(data), content_type)
            .await
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let start = std::time::Instant::now();
        let location = ObjectPath::from(storage_key.to_string());

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(storage_key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = bytes.len() as u64,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(bytes.to_vec())
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let location = ObjectPath::from(storage_key.to_string());

        let result: ObjectResult<_> = self.store.delete(&location).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 delete failed"
            );
            StorageError::DeleteFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let location = ObjectPath::from(storage_key.to_string());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let location = ObjectPath::from(storage_key.to_string());
        let url_result: ObjectResult<_> = self
            .store
            .signed_url(Method::GET, &location, expires_in)
            .await;

        let url = url_result
            .map_err(|e| {
                tracing::warn!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    "S3 URL signing failed"
                );
                StorageError::BackendError(e.to_string())
            })?
            .to_string();

        Ok(url)
    }

    fn public_url(&self, storage_key: &str) -> String {
        self.generate_url(storage_key)
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    struct ReceivedRequest {
        request_line: String,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    }

    impl ReceivedRequest {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        }
    }

    /// Accepts one HTTP/1.1 request with a Content-Length body and answers it
    async fn answer_one(listener: TcpListener, response: &'static [u8]) -> ReceivedRequest {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 8192];

        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8(buf[..header_end].to_vec()).unwrap();
        let mut lines = head.split("\r\n");
        let request_line = lines.next().unwrap().to_string();
        let headers: Vec<(String, String)> = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
            .collect();

        let length: usize = headers
            .iter()
            .find(|(k, _)| k == "content-length")
            .map(|(_, v)| v.parse().unwrap())
            .expect("request must carry content-length");

        let mut body = buf[header_end..].to_vec();
        while body.len() < length {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed mid-body");
            body.extend_from_slice(&chunk[..n]);
        }

        socket.write_all(response).await.unwrap();
        socket.shutdown().await.unwrap();

        ReceivedRequest {
            request_line,
            headers,
            body,
        }
    }

    fn storage_at(endpoint: &str) -> S3Storage {
        let builder = AmazonS3Builder::new()
            .with_access_key_id("test-access-key")
            .with_secret_access_key("test-secret-key");
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        S3Storage::with_builder(
            builder,
            client,
            "tubely-videos".to_string(),
            "us-east-1".to_string(),
            Some(endpoint.to_string()),
        )
        .unwrap()
    }

    async fn staged_video(len: usize) -> (tempfile::TempDir, std::path::PathBuf, Vec<u8>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.faststart.mp4");
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        tokio::fs::write(&path, &data).await.unwrap();
        (dir, path, data)
    }

    #[tokio::test]
    async fn upload_file_streams_one_signed_put() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(answer_one(
            listener,
            b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n",
        ));

        let (_dir, path, data) = staged_video(300 * 1024).await;
        let s3 = storage_at(&endpoint);
        let object = s3
            .upload_file("landscape/abc.mp4", &path, "video/mp4")
            .await
            .unwrap();

        let request = server.await.unwrap();
        assert!(
            request
                .request_line
                .starts_with("PUT /tubely-videos/landscape/abc.mp4?"),
            "unexpected request line: {}",
            request.request_line
        );
        assert!(request.request_line.contains("X-Amz-Signature="));
        assert_eq!(request.header("content-type"), Some("video/mp4"));
        assert_eq!(
            request.header("content-length"),
            Some(data.len().to_string().as_str())
        );
        assert_eq!(request.header("transfer-encoding"), None);
        assert_eq!(request.body, data);

        assert_eq!(object.bucket, "tubely-videos");
        assert_eq!(object.key, "landscape/abc.mp4");
        assert_eq!(object.content_type, "video/mp4");
    }

    #[tokio::test]
    async fn rejected_put_is_an_upload_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(answer_one(
            listener,
            b"HTTP/1.1 403 Forbidden\r\nContent-Length: 13\r\n\r\nAccessDenied!",
        ));

        let (_dir, path, _) = staged_video(1024).await;
        let s3 = storage_at(&endpoint);
        let result = s3.upload_file("other/abc.mp4", &path, "video/mp4").await;

        server.await.unwrap();
        match result {
            Err(StorageError::UploadFailed(message)) => {
                assert!(message.contains("403"), "message: {}", message);
                assert!(message.contains("AccessDenied"), "message: {}", message);
            }
            other => panic!("expected upload failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_source_file_is_an_upload_failure() {
        let s3 = storage_at("http://127.0.0.1:9");
        let result = s3
            .upload_file("other/abc.mp4", Path::new("/nonexistent/clip.mp4"), "video/mp4")
            .await;
        assert!(matches!(result, Err(StorageError::UploadFailed(_))));
    }

    fn storage(endpoint: Option<&str>) -> S3Storage {
        S3Storage::new(
            "tubely-videos".to_string(),
            "us-east-1".to_string(),
            endpoint.map(String::from),
        )
        .unwrap()
    }

    #[test]
    fn aws_public_url_is_virtual_hosted() {
        let s3 = storage(None);
        assert_eq!(
            s3.public_url("landscape/abc.mp4"),
            "https://tubely-videos.s3.us-east-1.amazonaws.com/landscape/abc.mp4"
        );
    }

    #[test]
    fn custom_endpoint_public_url_is_path_style() {
        let s3 = storage(Some("http://localhost:9000/"));
        assert_eq!(
            s3.public_url("portrait/abc.mp4"),
            "http://localhost:9000/tubely-videos/portrait/abc.mp4"
        );
        assert_eq!(s3.bucket(), "tubely-videos");
        assert_eq!(s3.backend_type(), StorageBackend::S3);
    }
}
