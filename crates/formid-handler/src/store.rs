//! Document stores holding uploaded forms and their JSON records.

use std::path::{Component, Path, PathBuf};

use aws_sdk_s3::{
    Client,
    config::{Credentials, Region},
    primitives::ByteStream,
};
use tracing::debug;

use formid_core::models::config::StoreConfig;

use crate::error::{StoreError, StoreResult};

/// Content type of written records.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Object store trait
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short store name for logs.
    fn name(&self) -> &str;

    /// Retrieve an object as bytes
    async fn get(&self, bucket: &str, key: &str) -> StoreResult<Vec<u8>>;

    /// Store an object
    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>, content_type: &str) -> StoreResult<()>;
}

/// AWS S3 (or S3-compatible) store.
pub struct S3DocumentStore {
    client: Client,
}

impl S3DocumentStore {
    /// Create a client from store configuration and the standard
    /// `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, and `AWS_SESSION_TOKEN`
    /// variables. `AWS_REGION` overrides the configured region.
    pub fn from_env(config: &StoreConfig) -> StoreResult<Self> {
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID")
            .map_err(|_| StoreError::Config("AWS_ACCESS_KEY_ID is not set".to_string()))?;
        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY")
            .map_err(|_| StoreError::Config("AWS_SECRET_ACCESS_KEY is not set".to_string()))?;
        let session_token = std::env::var("AWS_SESSION_TOKEN").ok();
        let region = std::env::var("AWS_REGION").unwrap_or_else(|_| config.region.clone());

        Ok(Self::new(
            Credentials::new(access_key_id, secret_access_key, session_token, None, "formid-env"),
            region,
            config.endpoint.clone(),
        ))
    }

    pub fn new(credentials: Credentials, region: String, endpoint: Option<String>) -> Self {
        let mut builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(region))
            .behavior_version_latest();

        // MinIO and LocalStack need path-style addressing
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for S3DocumentStore {
    fn name(&self) -> &str {
        "s3"
    }

    async fn get(&self, bucket: &str, key: &str) -> StoreResult<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("NoSuchKey") {
                    StoreError::NotFound(format!("s3://{}/{}", bucket, key))
                } else {
                    StoreError::S3(e.to_string())
                }
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StoreError::S3(e.to_string()))?;

        debug!("Downloaded s3://{}/{}", bucket, key);
        Ok(bytes.to_vec())
    }

    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>, content_type: &str) -> StoreResult<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StoreError::S3(e.to_string()))?;

        debug!("Uploaded s3://{}/{}", bucket, key);
        Ok(())
    }
}

/// Directory-backed store; objects live at `root/bucket/key`.
pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an object to a path that stays inside the root.
    fn object_path(&self, bucket: &str, key: &str) -> StoreResult<PathBuf> {
        let relative = Path::new(bucket).join(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || bucket.is_empty() || key.is_empty() {
            return Err(StoreError::Config(format!("invalid object path {}/{}", bucket, key)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl DocumentStore for LocalDocumentStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn get(&self, bucket: &str, key: &str) -> StoreResult<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>, _content_type: &str) -> StoreResult<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_local_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path());

        store
            .put("forms", "output/a.json", b"{}".to_vec(), JSON_CONTENT_TYPE)
            .await
            .unwrap();

        assert_eq!(store.get("forms", "output/a.json").await.unwrap(), b"{}".to_vec());
        assert!(dir.path().join("forms/output/a.json").exists());
    }

    #[tokio::test]
    async fn test_local_missing_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path());

        let err = store.get("forms", "nope.pdf").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_local_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path());

        for key in ["../secret.pdf", "/etc/passwd", ""] {
            let err = store.get("forms", key).await.unwrap_err();
            assert!(matches!(err, StoreError::Config(_)), "{:?}", key);
        }
    }
}
