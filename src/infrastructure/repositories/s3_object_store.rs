use super::object_store::{normalize_object_key, ObjectStoreError, ObjectStoreRepository};
use crate::infrastructure::config::StoreSettings;
use async_trait::async_trait;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLifecycleConfiguration, ExpirationStatus, LifecycleExpiration, LifecycleRule,
    LifecycleRuleFilter,
};
use aws_sdk_s3::Client;
use serde_json::json;
use std::path::Path;

/// S3 implementation of the object store repository, pointed at a
/// MinIO-compatible endpoint (path-style addressing, static credentials).
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build the client. A missing or unparseable endpoint is fatal here;
    /// nothing else in this repository propagates construction-style errors.
    pub async fn new(settings: &StoreSettings) -> Result<Self, ObjectStoreError> {
        let endpoint = settings.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ObjectStoreError::Configuration(
                "store endpoint is empty".to_string(),
            ));
        }
        let endpoint_url = if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            let scheme = if settings.secure { "https" } else { "http" };
            format!("{scheme}://{endpoint}")
        };

        let credentials = Credentials::new(
            settings.access_key.clone(),
            settings.secret_key.clone(),
            None,
            None,
            "speechrelay",
        );
        let base = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;
        let config = aws_sdk_s3::config::Builder::from(&base)
            .endpoint_url(endpoint_url)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(config),
            bucket: settings.bucket.clone(),
        })
    }

    fn bucket_or_default<'a>(&'a self, bucket: Option<&'a str>) -> &'a str {
        bucket.unwrap_or(&self.bucket)
    }
}

#[async_trait]
impl ObjectStoreRepository for S3ObjectStore {
    async fn create_bucket(
        &self,
        bucket: Option<&str>,
        expiration_days: i32,
        anonymous: bool,
    ) -> Result<bool, ObjectStoreError> {
        let bucket = self.bucket_or_default(bucket);
        if self.exists_bucket(Some(bucket)).await? {
            return Ok(false);
        }

        self.client
            .create_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| {
                let message = format!("{}", DisplayErrorContext(&e));
                tracing::error!(error = %message, bucket = %bucket, "failed to create bucket");
                ObjectStoreError::Bucket(message)
            })?;
        tracing::info!(bucket = %bucket, "bucket created");

        if expiration_days > 0 {
            self.set_expiration_policy(Some(bucket), expiration_days)
                .await?;
        }
        if anonymous {
            self.set_anonymous_read_policy(Some(bucket)).await?;
        }
        Ok(true)
    }

    async fn delete_bucket(
        &self,
        bucket: Option<&str>,
        force: bool,
    ) -> Result<(), ObjectStoreError> {
        let bucket = self.bucket_or_default(bucket);

        if force {
            let mut pages = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .into_paginator()
                .send();
            while let Some(page) = pages.next().await {
                let page = page.map_err(|e| {
                    let message = format!("{}", DisplayErrorContext(&e));
                    tracing::error!(error = %message, bucket = %bucket, "failed to list objects");
                    ObjectStoreError::Bucket(message)
                })?;
                for object in page.contents() {
                    let Some(key) = object.key() else { continue };
                    self.delete_file(key, Some(bucket)).await?;
                }
            }
            tracing::info!(bucket = %bucket, "objects in bucket deleted");
        }

        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| {
                let message = format!("{}", DisplayErrorContext(&e));
                tracing::error!(error = %message, bucket = %bucket, "failed to delete bucket");
                ObjectStoreError::Bucket(message)
            })?;
        tracing::info!(bucket = %bucket, "bucket deleted");
        Ok(())
    }

    async fn exists_bucket(&self, bucket: Option<&str>) -> Result<bool, ObjectStoreError> {
        let bucket = self.bucket_or_default(bucket);
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    let message = format!("{}", DisplayErrorContext(&service_error));
                    tracing::error!(error = %message, bucket = %bucket, "failed to check bucket");
                    Err(ObjectStoreError::Bucket(message))
                }
            }
        }
    }

    async fn set_expiration_policy(
        &self,
        bucket: Option<&str>,
        days: i32,
    ) -> Result<(), ObjectStoreError> {
        let bucket = self.bucket_or_default(bucket);

        let rule = LifecycleRule::builder()
            .id(format!("expire-all-{days}-days"))
            .status(ExpirationStatus::Enabled)
            .filter(LifecycleRuleFilter::builder().prefix("").build())
            .expiration(LifecycleExpiration::builder().days(days).build())
            .build()
            .map_err(|e| ObjectStoreError::Bucket(e.to_string()))?;
        let lifecycle = BucketLifecycleConfiguration::builder()
            .rules(rule)
            .build()
            .map_err(|e| ObjectStoreError::Bucket(e.to_string()))?;

        self.client
            .put_bucket_lifecycle_configuration()
            .bucket(bucket)
            .lifecycle_configuration(lifecycle)
            .send()
            .await
            .map_err(|e| {
                let message = format!("{}", DisplayErrorContext(&e));
                tracing::error!(error = %message, bucket = %bucket, "failed to set lifecycle");
                ObjectStoreError::Bucket(message)
            })?;
        tracing::info!(
            bucket = %bucket,
            days = days,
            "lifecycle set: objects expire after {days} days"
        );
        Ok(())
    }

    async fn set_anonymous_read_policy(
        &self,
        bucket: Option<&str>,
    ) -> Result<(), ObjectStoreError> {
        let bucket = self.bucket_or_default(bucket);

        // "AWS": "*" grants to anyone, the principal type is just S3 policy syntax.
        let policy = json!({
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Effect": "Allow",
                    "Principal": {"AWS": ["*"]},
                    "Action": ["s3:GetObject"],
                    "Resource": [format!("arn:aws:s3:::{bucket}/*")]
                }
            ]
        });

        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy.to_string())
            .send()
            .await
            .map_err(|e| {
                let message = format!("{}", DisplayErrorContext(&e));
                tracing::error!(error = %message, bucket = %bucket, "failed to set read policy");
                ObjectStoreError::Bucket(message)
            })?;
        tracing::info!(bucket = %bucket, "public read access enabled");
        Ok(())
    }

    async fn upload_file(
        &self,
        local: &Path,
        key: &str,
        bucket: Option<&str>,
    ) -> Result<(), ObjectStoreError> {
        let bucket = self.bucket_or_default(bucket);
        let key = normalize_object_key(key);

        let body = ByteStream::from_path(local).await.map_err(|e| {
            tracing::error!(error = %e, local = %local.display(), "failed to read upload source");
            ObjectStoreError::Object(e.to_string())
        })?;
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                let message = format!("{}", DisplayErrorContext(&e));
                tracing::error!(error = %message, bucket = %bucket, key = %key, "failed to upload object");
                ObjectStoreError::Object(message)
            })?;
        tracing::info!(
            local = %local.display(),
            bucket = %bucket,
            key = %key,
            "object uploaded"
        );
        Ok(())
    }

    async fn download_file(
        &self,
        key: &str,
        local: &Path,
        bucket: Option<&str>,
    ) -> Result<(), ObjectStoreError> {
        let bucket = self.bucket_or_default(bucket);
        let key = normalize_object_key(key);

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let message = format!("{}", DisplayErrorContext(&e));
                tracing::error!(error = %message, bucket = %bucket, key = %key, "failed to download object");
                ObjectStoreError::Object(message)
            })?;
        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| ObjectStoreError::Object(e.to_string()))?;
        tokio::fs::write(local, bytes.into_bytes()).await?;
        tracing::info!(
            bucket = %bucket,
            key = %key,
            local = %local.display(),
            "object downloaded"
        );
        Ok(())
    }

    async fn delete_file(&self, key: &str, bucket: Option<&str>) -> Result<(), ObjectStoreError> {
        let bucket = self.bucket_or_default(bucket);
        let key = normalize_object_key(key);

        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let message = format!("{}", DisplayErrorContext(&e));
                tracing::error!(error = %message, bucket = %bucket, key = %key, "failed to delete object");
                ObjectStoreError::Object(message)
            })?;
        tracing::info!(bucket = %bucket, key = %key, "object deleted");
        Ok(())
    }

    async fn exists_file(&self, key: &str, bucket: Option<&str>) -> Result<bool, ObjectStoreError> {
        let bucket = self.bucket_or_default(bucket);
        let key = normalize_object_key(key);

        match self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    let message = format!("{}", DisplayErrorContext(&service_error));
                    tracing::error!(error = %message, bucket = %bucket, key = %key, "failed to check object");
                    Err(ObjectStoreError::Object(message))
                }
            }
        }
    }
}
