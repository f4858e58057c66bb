use async_trait::async_trait;
use aws_sdk_s3 as s3;
use axum::body::Bytes;
use s3::primitives::ByteStream;
use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object storage error: {0}")]
    S3(String),

    #[error("refusing to touch a location outside the upload area: {0}")]
    OutsideRoot(String),

    #[error("mock storage error: {0}")]
    Simulated(String),
}

// 1. StorageService Contract
/// StorageService
///
/// Abstract contract for resume storage. Handlers and services only see this trait, so
/// the local-disk backend, the S3 backend and the test mock are interchangeable.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Prepares the backend (creates the upload directory or bucket). Safe to call repeatedly.
    async fn ensure_ready(&self) -> Result<(), StorageError>;

    /// Writes `data` under `key` and returns the location to persist on the application row.
    ///
    /// # Arguments
    /// * `key`: a server-generated object key, see [`resume_key`].
    /// * `content_type`: the MIME type the client declared, if any.
    async fn store(
        &self,
        key: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<String, StorageError>;

    /// Deletes a previously stored object by the location `store` returned.
    async fn remove(&self, location: &str) -> Result<(), StorageError>;
}

/// StorageState
///
/// The concrete type used to share the storage service across the application state.
pub type StorageState = Arc<dyn StorageService>;

/// sanitize_key
///
/// Removes directory navigation components (`..`, `.`, empty segments) from a key.
pub fn sanitize_key(key: &str) -> String {
    key.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Reduces a client filename to its last path component, for display only.
pub fn display_filename(original: &str) -> String {
    original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(255)
        .collect()
}

/// resume_key
///
/// Generates the storage key for an uploaded resume: a fresh UUID plus the original
/// extension when it is short and ASCII-alphanumeric. The client filename never becomes
/// part of a filesystem path, which rules out traversal and overwrites.
pub fn resume_key(original_filename: &str) -> String {
    let extension = Path::new(&display_filename(original_filename))
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase());

    match extension {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}

// 2. Local Disk Implementation (default)
/// LocalStorage
///
/// Writes resumes into a server-controlled directory, creating it on first use.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl StorageService for LocalStorage {
    async fn ensure_ready(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    async fn store(
        &self,
        key: &str,
        _content_type: Option<&str>,
        data: Bytes,
    ) -> Result<String, StorageError> {
        // Flattened so every file lands directly inside `root`.
        let name = sanitize_key(key).replace('/', "_");
        if name.is_empty() {
            return Err(StorageError::OutsideRoot(key.to_string()));
        }

        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(name);
        tokio::fs::write(&path, &data).await?;

        tracing::debug!(path = %path.display(), bytes = data.len(), "resume stored");
        Ok(path.to_string_lossy().into_owned())
    }

    async fn remove(&self, location: &str) -> Result<(), StorageError> {
        let path = Path::new(location);
        let inside_root = path.parent() == Some(self.root.as_path())
            && path.file_name().is_some_and(|name| name != "..");
        if !inside_root {
            return Err(StorageError::OutsideRoot(location.to_string()));
        }
        tokio::fs::remove_file(path).await?;
        Ok(())
    }
}

// 3. S3-Compatible Implementation
/// S3StorageClient
///
/// Stores resumes in an S3-compatible bucket (MinIO locally).
/// `force_path_style(true)` is required by MinIO and most S3 gateways.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
    pub fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    /// CreateBucket is idempotent; an "already owned" failure is not an error here.
    async fn ensure_ready(&self) -> Result<(), StorageError> {
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!("create_bucket skipped: {e}");
        }
        Ok(())
    }

    async fn store(
        &self,
        key: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<String, StorageError> {
        let key = format!("resumes/{}", sanitize_key(key));
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .set_content_type(content_type.map(str::to_string))
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;
        Ok(key)
    }

    async fn remove(&self, location: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(sanitize_key(location))
            .send()
            .await
            .map_err(|e| StorageError::S3(e.to_string()))?;
        Ok(())
    }
}

// 4. The Mock Implementation (For Tests)
/// MockStorageService
///
/// In-memory stand-in used by the test suites. Records every stored and removed location
/// and can be told to fail every operation.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    stored: Arc<Mutex<Vec<String>>>,
    removed: Arc<Mutex<Vec<String>>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn stored(&self) -> Vec<String> {
        self.stored.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_ready(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn store(
        &self,
        key: &str,
        _content_type: Option<&str>,
        _data: Bytes,
    ) -> Result<String, StorageError> {
        if self.should_fail {
            return Err(StorageError::Simulated("store requested to fail".to_string()));
        }
        let location = format!("mock://uploads/{}", sanitize_key(key));
        if let Ok(mut stored) = self.stored.lock() {
            stored.push(location.clone());
        }
        Ok(location)
    }

    async fn remove(&self, location: &str) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(StorageError::Simulated("remove requested to fail".to_string()));
        }
        if let Ok(mut removed) = self.removed.lock() {
            removed.push(location.to_string());
        }
        Ok(())
    }
}
