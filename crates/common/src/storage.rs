//! Object storage for the attachment bucket.
//!
//! Objects live under a single bucket namespace. The local backend maps it to
//! `{base_path}/{bucket}/`, the S3 backend to a real bucket.

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use bytes::Bytes;
use tokio::sync::RwLock;

use crate::{
    AppError, AppResult,
    config::{StorageConfig, StorageKind},
};

/// Metadata of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object key within the bucket.
    pub key: String,
    /// Public URL to access the object.
    pub url: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Upload an object, overwriting any existing object with the same key.
    async fn upload(&self, key: &str, data: Bytes, content_type: &str)
    -> AppResult<StoredObject>;

    /// Download the bytes of an object.
    async fn download(&self, key: &str) -> AppResult<Bytes>;

    /// Remove objects. Missing keys are ignored.
    async fn remove(&self, keys: &[String]) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;

    /// Check if an object exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Reject keys that could escape the bucket.
fn check_key(key: &str) -> AppResult<()> {
    let escapes = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if escapes {
        return Err(AppError::BadRequest(format!("Invalid storage key: {key}")));
    }
    Ok(())
}

fn join_url(base: &str, bucket: &str, key: &str) -> String {
    format!("{}/{}/{}", base.trim_end_matches('/'), bucket, key)
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    root: PathBuf,
    bucket: String,
    public_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend rooted at `{base_path}/{bucket}`.
    #[must_use]
    pub fn new(base_path: PathBuf, bucket: String, public_url: String) -> Self {
        Self {
            root: base_path.join(&bucket),
            bucket,
            public_url,
        }
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> AppResult<StoredObject> {
        check_key(key)?;
        let path = self.root.join(key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        Ok(StoredObject {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
        })
    }

    async fn download(&self, key: &str) -> AppResult<Bytes> {
        check_key(key)?;
        match tokio::fs::read(self.root.join(key)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("Object not found: {key}")))
            }
            Err(e) => Err(AppError::Storage(format!("Failed to read file: {e}"))),
        }
    }

    async fn remove(&self, keys: &[String]) -> AppResult<()> {
        // Every key is attempted; the first failure is reported afterwards.
        let mut first_error = None;
        for key in keys {
            let result = match check_key(key) {
                Ok(()) => match tokio::fs::remove_file(self.root.join(key)).await {
                    Ok(()) => Ok(()),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                    Err(e) => Err(AppError::Storage(format!("Failed to delete {key}: {e}"))),
                },
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                tracing::warn!(storage_key = %key, error = %e, "Failed to remove object");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.public_url, &self.bucket, key)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        check_key(key)?;
        tokio::fs::try_exists(self.root.join(key))
            .await
            .map_err(|e| AppError::Storage(e.to_string()))
    }
}

/// In-memory storage backend for development and tests.
#[derive(Default)]
pub struct MemoryStorage {
    bucket: String,
    public_url: String,
    objects: RwLock<HashMap<String, (Bytes, String)>>,
}

impl MemoryStorage {
    /// Create an empty in-memory bucket.
    #[must_use]
    pub fn new(bucket: impl Into<String>, public_url: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            public_url: public_url.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether the bucket is empty.
    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Stored keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryStorage {
    async fn upload(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> AppResult<StoredObject> {
        check_key(key)?;
        let size = data.len() as u64;
        self.objects
            .write()
            .await
            .insert(key.to_string(), (data, content_type.to_string()));

        Ok(StoredObject {
            key: key.to_string(),
            url: self.public_url(key),
            size,
            content_type: content_type.to_string(),
        })
    }

    async fn download(&self, key: &str) -> AppResult<Bytes> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| AppError::NotFound(format!("Object not found: {key}")))
    }

    async fn remove(&self, keys: &[String]) -> AppResult<()> {
        let mut objects = self.objects.write().await;
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.public_url, &self.bucket, key)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.objects.read().await.contains_key(key))
    }
}

/// S3-compatible object storage backend.
#[cfg(feature = "s3")]
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_url: String,
    prefix: Option<String>,
}

#[cfg(feature = "s3")]
impl S3Storage {
    /// Create a new S3 storage backend.
    #[must_use]
    pub fn new(
        settings: &crate::config::S3Config,
        bucket: String,
        public_url: String,
    ) -> Self {
        use aws_config::Region;
        use aws_sdk_s3::config::Credentials;

        let credentials = Credentials::new(
            &settings.access_key_id,
            &settings.secret_access_key,
            None,
            None,
            "aac-site",
        );

        let config = aws_sdk_s3::Config::builder()
            .endpoint_url(&settings.endpoint)
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .behavior_version_latest()
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(config),
            bucket,
            public_url,
            prefix: settings.prefix.clone(),
        }
    }

    fn full_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), key),
            None => key.to_string(),
        }
    }
}

#[cfg(feature = "s3")]
#[async_trait::async_trait]
impl StorageBackend for S3Storage {
    async fn upload(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> AppResult<StoredObject> {
        use aws_sdk_s3::primitives::ByteStream;

        check_key(key)?;
        let size = data.len() as u64;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

        Ok(StoredObject {
            key: key.to_string(),
            url: self.public_url(key),
            size,
            content_type: content_type.to_string(),
        })
    }

    async fn download(&self, key: &str) -> AppResult<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
            .map_err(|e| {
                let err = e.into_service_error();
                if err.is_no_such_key() {
                    AppError::NotFound(format!("Object not found: {key}"))
                } else {
                    AppError::Storage(format!("S3 download failed: {err}"))
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| AppError::Storage(format!("S3 read failed: {e}")))?;
        Ok(data.into_bytes())
    }

    async fn remove(&self, keys: &[String]) -> AppResult<()> {
        for key in keys {
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(self.full_key(key))
                .send()
                .await
                .map_err(|e| AppError::Storage(format!("S3 delete failed: {e}")))?;
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url.trim_end_matches('/'), self.full_key(key))
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let err = e.into_service_error();
                if err.is_not_found() {
                    Ok(false)
                } else {
                    Err(AppError::Storage(format!("S3 head_object failed: {err}")))
                }
            }
        }
    }
}

/// Build the configured storage backend.
pub fn build_storage(config: &StorageConfig) -> AppResult<Arc<dyn StorageBackend>> {
    match config.backend {
        StorageKind::Local => Ok(Arc::new(LocalStorage::new(
            config.base_path.clone(),
            config.bucket.clone(),
            config.public_url.clone(),
        ))),
        StorageKind::Memory => Ok(Arc::new(MemoryStorage::new(
            config.bucket.clone(),
            config.public_url.clone(),
        ))),
        #[cfg(feature = "s3")]
        StorageKind::S3 => {
            let settings = config
                .s3
                .as_ref()
                .ok_or_else(|| AppError::Config("storage.s3 section is required".to_string()))?;
            Ok(Arc::new(S3Storage::new(
                settings,
                config.bucket.clone(),
                config.public_url.clone(),
            )))
        }
        #[cfg(not(feature = "s3"))]
        StorageKind::S3 => Err(AppError::Config(
            "S3 storage requires the `s3` feature".to_string(),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_check_key_rejects_traversal() {
        assert!(check_key("abc/123_x.png").is_ok());
        assert!(check_key("../etc/passwd").is_err());
        assert!(check_key("/abs.png").is_err());
        assert!(check_key("a//b.png").is_err());
        assert!(check_key("").is_err());
    }

    #[tokio::test]
    async fn test_local_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(
            dir.path().to_path_buf(),
            "news-attachments".to_string(),
            "/files".to_string(),
        );

        let stored = storage
            .upload("n1/1_abc.pdf", Bytes::from_static(b"%PDF-1.4"), "application/pdf")
            .await
            .unwrap();
        assert_eq!(stored.size, 8);
        assert_eq!(stored.url, "/files/news-attachments/n1/1_abc.pdf");
        assert!(dir.path().join("news-attachments/n1/1_abc.pdf").exists());

        let data = storage.download("n1/1_abc.pdf").await.unwrap();
        assert_eq!(&data[..], b"%PDF-1.4");

        storage
            .remove(&["n1/1_abc.pdf".to_string(), "n1/missing.png".to_string()])
            .await
            .unwrap();
        assert!(!storage.exists("n1/1_abc.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_local_remove_attempts_every_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(
            dir.path().to_path_buf(),
            "news-attachments".to_string(),
            "/files".to_string(),
        );
        // A directory cannot be removed as a file.
        tokio::fs::create_dir_all(dir.path().join("news-attachments/n1/sub"))
            .await
            .unwrap();
        storage
            .upload("n1/a.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();

        let err = storage
            .remove(&[
                "n1/sub".to_string(),
                "../outside.png".to_string(),
                "n1/a.png".to_string(),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
        assert!(!storage.exists("n1/a.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_local_download_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf(), "b".into(), "/files".into());
        let err = storage.download("nope.png").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new("news-attachments", "http://localhost:3000/files/");
        storage
            .upload("n1/a.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();
        assert_eq!(storage.len().await, 1);
        assert_eq!(
            storage.public_url("n1/a.png"),
            "http://localhost:3000/files/news-attachments/n1/a.png"
        );

        storage.remove(&["n1/a.png".to_string()]).await.unwrap();
        assert!(storage.is_empty().await);
    }

    #[test]
    fn test_build_storage_memory() {
        let config = StorageConfig {
            backend: StorageKind::Memory,
            ..StorageConfig::default()
        };
        let storage = build_storage(&config).unwrap();
        assert_eq!(
            storage.public_url("x/y.pdf"),
            "/files/news-attachments/x/y.pdf"
        );
    }
}
