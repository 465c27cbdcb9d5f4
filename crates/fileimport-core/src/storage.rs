//! Object storage uploads (MinIO or any S3-compatible endpoint).

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use fileimport_common::settings::MinioSettings;
use fileimport_common::{ImportError, Result, validate_file_name};
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload, PutResult, WriteMultipart};
use tokio::io::AsyncReadExt;
use tracing::{debug, error, info, instrument, warn};

/// Key probed by [`ObjectUploader::health_check`]
const HEALTH_PROBE_KEY: &str = ".fileimport-health";

/// Files larger than this are streamed as a multipart upload.
pub const DEFAULT_MULTIPART_THRESHOLD: u64 = 16 * 1024 * 1024;

/// S3 rejects parts smaller than 5 MiB, except the last one.
const MULTIPART_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Parts in flight per file.
const MAX_PART_UPLOADS: usize = 4;

const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub bucket: String,
    pub key: String,
    pub size: u64,
    pub e_tag: Option<String>,
}

/// Uploads staged files into a single bucket
#[derive(Clone)]
pub struct ObjectUploader {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    multipart_threshold: u64,
}

impl std::fmt::Debug for ObjectUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectUploader")
            .field("store", &self.store.to_string())
            .field("bucket", &self.bucket)
            .field("multipart_threshold", &self.multipart_threshold)
            .finish()
    }
}

impl ObjectUploader {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            multipart_threshold: DEFAULT_MULTIPART_THRESHOLD,
        }
    }

    pub fn with_multipart_threshold(mut self, bytes: u64) -> Self {
        self.multipart_threshold = bytes;
        self
    }

    /// Build an S3 client for a MinIO endpoint.
    ///
    /// MinIO serves buckets under the path (`http://host:9000/bucket/key`),
    /// so virtual-hosted addressing is turned off.
    pub fn from_settings(settings: &MinioSettings) -> Result<Self> {
        let store = AmazonS3Builder::new()
            .with_endpoint(settings.endpoint.as_str())
            .with_region(settings.region.as_str())
            .with_bucket_name(settings.bucket_name.as_str())
            .with_access_key_id(settings.access_key.as_str())
            .with_secret_access_key(settings.secret_key.as_str())
            .with_virtual_hosted_style_request(false)
            .with_allow_http(settings.endpoint.starts_with("http://"))
            .build()
            .map_err(|e| ImportError::storage(format!("invalid object store settings: {e}")))?;

        info!(
            endpoint = %settings.endpoint,
            bucket = %settings.bucket_name,
            "object store client initialized"
        );
        Ok(Self::new(Arc::new(store), settings.bucket_name.clone()))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Upload `path` under its file name.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn upload_file(&self, path: &Path) -> Result<UploadedObject> {
        let key = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ImportError::illegal_argument(format!("{} has no usable file name", path.display()))
            })?
            .to_string();
        validate_file_name(&key)?;

        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| ImportError::io(path, e))?
            .len();
        let location = ObjectPath::from(key.as_str());

        let result = if size > self.multipart_threshold {
            debug!(file = %key, size, "streaming multipart upload");
            self.put_multipart(&location, path, &key).await?
        } else {
            let data: Bytes = tokio::fs::read(path)
                .await
                .map_err(|e| ImportError::io(path, e))?
                .into();
            self.store
                .put(&location, PutPayload::from(data))
                .await
                .map_err(|e| upload_error(&key, e))?
        };

        info!(file = %key, size, "file uploaded");
        Ok(UploadedObject {
            bucket: self.bucket.clone(),
            key,
            size,
            e_tag: result.e_tag,
        })
    }

    async fn put_multipart(&self, location: &ObjectPath, path: &Path, key: &str) -> Result<PutResult> {
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| ImportError::io(path, e))?;
        let upload = self
            .store
            .put_multipart(location)
            .await
            .map_err(|e| upload_error(key, e))?;
        let mut writer = WriteMultipart::new_with_chunk_size(upload, MULTIPART_CHUNK_SIZE);

        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        loop {
            let n = match file.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    abort_upload(writer, key).await;
                    return Err(ImportError::io(path, e));
                }
            };
            if let Err(e) = writer.wait_for_capacity(MAX_PART_UPLOADS).await {
                abort_upload(writer, key).await;
                return Err(upload_error(key, e));
            }
            writer.write(&buf[..n]);
        }

        writer.finish().await.map_err(|e| upload_error(key, e))
    }

    /// Cheap round trip to the store; a missing probe object still proves the
    /// bucket is reachable with the configured credentials.
    pub async fn health_check(&self) -> Result<()> {
        match self.store.head(&ObjectPath::from(HEALTH_PROBE_KEY)).await {
            Ok(_) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(ImportError::storage(e.to_string())),
        }
    }
}

fn upload_error(key: &str, e: object_store::Error) -> ImportError {
    error!(file = %key, error = %e, "failed to upload file");
    ImportError::storage(format!("failed to upload file {key}: {e}"))
}

async fn abort_upload(writer: WriteMultipart, key: &str) {
    if let Err(e) = writer.abort().await {
        warn!(file = %key, error = %e, "failed to abort multipart upload");
    }
}
