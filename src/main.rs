use std::path::PathBuf;
use std::sync::Arc;

use speechrelay::controllers::SpeechController;
use speechrelay::domain::speech::{SpeechService, SpeechSettings};
use speechrelay::infrastructure::config::{init_logging, Config};
use speechrelay::infrastructure::http::start_http_server;
use speechrelay::infrastructure::repositories::{
    ObjectStoreRepository, RemoteExecRepository, S3ObjectStore, SshRemoteExec,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!("Starting speechrelay on {}:{}", config.host, config.port);

    // Construct the two external collaborators. A failure here is logged and
    // leaves the collaborator unset; the pipeline then fails fast per request
    // instead of attempting partial operation.
    let remote: Option<Arc<dyn RemoteExecRepository>> =
        match SshRemoteExec::connect(config.remote.clone()).await {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize remote execution client");
                None
            }
        };

    let store: Option<Arc<dyn ObjectStoreRepository>> = match init_store(&config).await {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize object store client");
            None
        }
    };

    let settings = SpeechSettings {
        local_working_path: PathBuf::from(&config.local_working_path),
        remote_working_path: config.remote.working_path.clone(),
        store_working_path: config.store.working_path.clone(),
        bucket: config.store.bucket.clone(),
        public_base_url: config.store.public_url.clone(),
    };

    // Dependency injection: service, then controller, then HTTP
    let speech_service = Arc::new(SpeechService::new(remote, store, settings));
    let speech_controller = Arc::new(SpeechController::new(speech_service.clone()));

    start_http_server(Arc::new(config), speech_service, speech_controller).await?;

    Ok(())
}

/// Build the store client and make sure the configured bucket exists with
/// anonymous read access, as the pipeline publishes objects by public URL.
async fn init_store(
    config: &Config,
) -> Result<Arc<dyn ObjectStoreRepository>, Box<dyn std::error::Error>> {
    let store = S3ObjectStore::new(&config.store).await?;
    store
        .create_bucket(None, 0, config.store.bucket_anonymous)
        .await?;
    Ok(Arc::new(store))
}
