use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{Error, Result};

/// Object storage used for listing photos.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `bytes` under `key` and returns the public URL of the object.
    async fn store(&self, bytes: Bytes, content_type: &str, key: &str) -> Result<String>;
}

/// Builds the storage key for an uploaded listing photo.
pub fn property_photo_key(original_name: &str) -> String {
    format!("properties/{}-{}", Uuid::now_v7(), sanitize_file_name(original_name))
}

/// Keeps ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `-`.
pub fn sanitize_file_name(name: &str) -> String {
    // Drop any directory part the client sent along
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();

    let sanitized = sanitized.trim_matches(|c| c == '.' || c == '-');
    if sanitized.is_empty() {
        "file".to_string()
    } else {
        sanitized.to_string()
    }
}

/// Stores objects on the local filesystem and serves them from a public URL prefix.
pub struct FilesystemObjectStorage {
    base_path: PathBuf,
    public_base_url: String,
}

impl FilesystemObjectStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            base_path: PathBuf::from(&config.base_path),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Initializes storage directory structure
    pub async fn init(&self) -> Result<()> {
        if !self.base_path.exists() {
            fs::create_dir_all(&self.base_path).await.map_err(|e| {
                Error::Storage(format!(
                    "Failed to create storage directory {:?}: {}",
                    self.base_path, e
                ))
            })?;
        }
        Ok(())
    }

    fn object_path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key.trim_start_matches('/'));
        // Keys must stay inside the base directory
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(Error::Storage(format!("Invalid object key: {}", key)));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl ObjectStorage for FilesystemObjectStorage {
    async fn store(&self, bytes: Bytes, content_type: &str, key: &str) -> Result<String> {
        let path = self.object_path(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::Storage(format!("Failed to create directory {:?}: {}", parent, e))
            })?;
        }

        fs::write(&path, &bytes).await.map_err(|e| {
            Error::Storage(format!("Failed to write object {:?}: {}", path, e))
        })?;

        tracing::debug!(key, content_type, size = bytes.len(), "Stored object");

        Ok(format!("{}/{}", self.public_base_url, key.trim_start_matches('/')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("front door.jpg"), "front-door.jpg");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\photos\\kitchen.png"), "kitchen.png");
        assert_eq!(sanitize_file_name("..."), "file");
    }

    #[test]
    fn test_property_photo_key_layout() {
        let key = property_photo_key("living room.jpg");
        assert!(key.starts_with("properties/"));
        assert!(key.ends_with("-living-room.jpg"));
    }

    #[tokio::test]
    async fn test_store_writes_under_base_path() {
        let dir = TempDir::new().unwrap();
        let storage = FilesystemObjectStorage::new(&StorageConfig {
            base_path: dir.path().to_string_lossy().to_string(),
            public_base_url: "https://cdn.example.com/".to_string(),
        });

        let url = storage
            .store(Bytes::from_static(b"jpeg"), "image/jpeg", "properties/a.jpg")
            .await
            .unwrap();

        assert_eq!(url, "https://cdn.example.com/properties/a.jpg");
        let written = std::fs::read(dir.path().join("properties/a.jpg")).unwrap();
        assert_eq!(written, b"jpeg");
    }

    #[tokio::test]
    async fn test_store_rejects_escaping_keys() {
        let dir = TempDir::new().unwrap();
        let storage = FilesystemObjectStorage::new(&StorageConfig {
            base_path: dir.path().to_string_lossy().to_string(),
            public_base_url: "https://cdn.example.com".to_string(),
        });

        let err = storage
            .store(Bytes::from_static(b"x"), "text/plain", "../outside.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
