use async_trait::async_trait;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("store configuration error: {0}")]
    Configuration(String),
    #[error("bucket operation failed: {0}")]
    Bucket(String),
    #[error("object operation failed: {0}")]
    Object(String),
    #[error("local file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Object keys are never absolute-path-rooted; strip a single leading separator.
pub fn normalize_object_key(key: &str) -> &str {
    key.strip_prefix('/').unwrap_or(key)
}

/// Repository for the S3-compatible object store holding published audio.
///
/// Bucket operations are administrative and sit outside the request path;
/// object operations default to the configured bucket when `bucket` is `None`
/// and normalize keys with [`normalize_object_key`].
#[async_trait]
pub trait ObjectStoreRepository: Send + Sync {
    /// Create the bucket, optionally with an expiration lifecycle and an
    /// anonymous-read policy. No-op returning `false` when it already exists.
    async fn create_bucket(
        &self,
        bucket: Option<&str>,
        expiration_days: i32,
        anonymous: bool,
    ) -> Result<bool, ObjectStoreError>;

    /// Delete the bucket; with `force`, delete its objects first.
    async fn delete_bucket(&self, bucket: Option<&str>, force: bool)
        -> Result<(), ObjectStoreError>;

    async fn exists_bucket(&self, bucket: Option<&str>) -> Result<bool, ObjectStoreError>;

    /// Lifecycle rule deleting objects older than `days`.
    async fn set_expiration_policy(
        &self,
        bucket: Option<&str>,
        days: i32,
    ) -> Result<(), ObjectStoreError>;

    /// Bucket policy granting anonymous GET on every object.
    async fn set_anonymous_read_policy(&self, bucket: Option<&str>)
        -> Result<(), ObjectStoreError>;

    async fn upload_file(
        &self,
        local: &Path,
        key: &str,
        bucket: Option<&str>,
    ) -> Result<(), ObjectStoreError>;

    async fn download_file(
        &self,
        key: &str,
        local: &Path,
        bucket: Option<&str>,
    ) -> Result<(), ObjectStoreError>;

    async fn delete_file(&self, key: &str, bucket: Option<&str>) -> Result<(), ObjectStoreError>;

    async fn exists_file(&self, key: &str, bucket: Option<&str>) -> Result<bool, ObjectStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_one_leading_separator() {
        assert_eq!(normalize_object_key("/tmp/x.aiff"), "tmp/x.aiff");
        assert_eq!(normalize_object_key("tmp/x.aiff"), "tmp/x.aiff");
    }

    #[test]
    fn test_normalize_strips_only_one_separator() {
        assert_eq!(normalize_object_key("//tmp/x.aiff"), "/tmp/x.aiff");
    }

    #[test]
    fn test_normalize_leaves_inner_separators_alone() {
        assert_eq!(normalize_object_key("a/b/c.txt"), "a/b/c.txt");
        assert_eq!(normalize_object_key(""), "");
    }
}
