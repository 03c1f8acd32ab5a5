//! One-time bucket provisioning: recreate the configured bucket with the
//! configured expiration lifecycle and anonymous-read policy. Runs outside
//! the request path; destructive when the bucket already exists.

use speechrelay::infrastructure::config::{init_logging, Config};
use speechrelay::infrastructure::repositories::{ObjectStoreRepository, S3ObjectStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    init_logging(&config);

    let store = S3ObjectStore::new(&config.store).await?;

    if store.exists_bucket(None).await? {
        tracing::info!(bucket = %config.store.bucket, "bucket exists, recreating");
        store.delete_bucket(None, true).await?;
    }
    store
        .create_bucket(
            None,
            config.store.bucket_expiration_days,
            config.store.bucket_anonymous,
        )
        .await?;

    tracing::info!(
        bucket = %config.store.bucket,
        expiration_days = config.store.bucket_expiration_days,
        anonymous = config.store.bucket_anonymous,
        "bucket provisioned"
    );
    Ok(())
}
