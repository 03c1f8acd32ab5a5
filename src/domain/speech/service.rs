use super::error::SpeechServiceError;
use super::fingerprint::ContentKey;
use super::paths::{SpeechSettings, StagingPaths};
use crate::infrastructure::repositories::{ObjectStoreRepository, RemoteExecRepository};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Orchestrates the synthesis pipeline: stage text on the remote host, run the
/// synthesis command there, retrieve the audio and publish it to the object
/// store, cleaning up every transient artifact whatever the outcome.
///
/// Collaborators are optional: when one failed to initialize at startup every
/// call fails fast with [`SpeechServiceError::NotInitialized`] naming it.
pub struct SpeechService {
    remote: Option<Arc<dyn RemoteExecRepository>>,
    store: Option<Arc<dyn ObjectStoreRepository>>,
    settings: SpeechSettings,
}

/// Which staging artifacts a pipeline run has (possibly) created so far.
/// Cleanup consults these flags instead of inferring existence from scope.
#[derive(Default)]
struct StagedArtifacts {
    local_text: bool,
    remote_text: bool,
    remote_audio: bool,
    local_audio: bool,
}

impl SpeechService {
    pub fn new(
        remote: Option<Arc<dyn RemoteExecRepository>>,
        store: Option<Arc<dyn ObjectStoreRepository>>,
        settings: SpeechSettings,
    ) -> Self {
        Self {
            remote,
            store,
            settings,
        }
    }

    pub fn remote_initialized(&self) -> bool {
        self.remote.is_some()
    }

    pub fn store_initialized(&self) -> bool {
        self.store.is_some()
    }

    fn remote(&self) -> Result<&Arc<dyn RemoteExecRepository>, SpeechServiceError> {
        self.remote
            .as_ref()
            .ok_or(SpeechServiceError::NotInitialized("remote execution client"))
    }

    fn store(&self) -> Result<&Arc<dyn ObjectStoreRepository>, SpeechServiceError> {
        self.store
            .as_ref()
            .ok_or(SpeechServiceError::NotInitialized("object store client"))
    }

    /// Turn `text` into a published audio object and return its key and public
    /// URL. Identical text yields the identical key and URL; a repeated call
    /// overwrites the published object rather than duplicating it.
    pub async fn synthesize(
        &self,
        text: &str,
    ) -> Result<(ContentKey, String), SpeechServiceError> {
        let remote = self.remote()?.clone();
        let store = self.store()?.clone();

        let key = ContentKey::from_text(text);
        let paths = StagingPaths::new(&key, &self.settings);
        tracing::info!(key = %key, chars = text.len(), "starting synthesis pipeline");

        let mut staged = StagedArtifacts::default();
        let outcome = self
            .run_pipeline(remote.as_ref(), store.as_ref(), text, &paths, &mut staged)
            .await;

        // Cleanup always runs; its failures are logged but never mask the
        // pipeline outcome. The published object is never touched here.
        self.cleanup(remote.as_ref(), &paths, &staged).await;

        match outcome {
            Ok(()) => {
                tracing::info!(key = %key, url = %paths.public_url, "audio published");
                Ok((key, paths.public_url))
            }
            Err(e) => {
                tracing::error!(error = %e, key = %key, "synthesis pipeline failed");
                Err(e)
            }
        }
    }

    /// The "tts" entry point: resolve a public object-store URL back into
    /// bucket and key, fetch the text it points at and synthesize it.
    pub async fn resolve_and_synthesize(
        &self,
        url: &str,
    ) -> Result<(ContentKey, String), SpeechServiceError> {
        let store = self.store()?.clone();
        self.remote()?;

        let (bucket, object_key) = resolve_object_url(url, &self.settings.public_base_url)?;
        let download_path = self
            .settings
            .local_working_path
            .join(format!("{}.txt", Uuid::new_v4()));

        let fetched = async {
            store
                .download_file(&object_key, &download_path, Some(&bucket))
                .await
                .map_err(|e| {
                    SpeechServiceError::Pipeline(format!("downloading text object: {e}"))
                })?;
            let bytes = tokio::fs::read(&download_path)
                .await
                .map_err(|e| SpeechServiceError::StagingIo(e.to_string()))?;
            String::from_utf8(bytes)
                .map_err(|e| SpeechServiceError::StagingIo(format!("object is not UTF-8: {e}")))
        }
        .await;

        remove_local(&download_path, "resolver temp file").await;

        let text = fetched?;
        tracing::info!(
            bucket = %bucket,
            key = %object_key,
            chars = text.len(),
            "resolved text object"
        );
        self.synthesize(&text).await
    }

    async fn run_pipeline(
        &self,
        remote: &dyn RemoteExecRepository,
        store: &dyn ObjectStoreRepository,
        text: &str,
        paths: &StagingPaths,
        staged: &mut StagedArtifacts,
    ) -> Result<(), SpeechServiceError> {
        // Local staging failure aborts before any remote I/O happens.
        tokio::fs::write(&paths.local_text, text)
            .await
            .map_err(|e| SpeechServiceError::StagingIo(e.to_string()))?;
        staged.local_text = true;
        tracing::debug!(path = %paths.local_text.display(), "text staged locally");

        remote
            .upload_file(&paths.local_text, &paths.remote_text)
            .await
            .map_err(|e| {
                SpeechServiceError::Pipeline(format!("uploading text to synthesis host: {e}"))
            })?;
        staged.remote_text = true;

        // The synthesis command is best-effort: its result is not inspected,
        // success is verified by the download that follows.
        let command = format!("say -f {} -o {}", paths.remote_text, paths.remote_audio);
        staged.remote_audio = true;
        if let Err(e) = remote.run_command(&command).await {
            tracing::warn!(error = %e, "synthesis command reported an error, verifying output");
        }

        staged.local_audio = true;
        remote
            .download_file(&paths.remote_audio, &paths.local_audio)
            .await
            .map_err(|e| {
                SpeechServiceError::Pipeline(format!("retrieving synthesized audio: {e}"))
            })?;

        store
            .upload_file(&paths.local_audio, &paths.object_key, None)
            .await
            .map_err(|e| SpeechServiceError::Pipeline(format!("publishing audio: {e}")))?;

        Ok(())
    }

    async fn cleanup(
        &self,
        remote: &dyn RemoteExecRepository,
        paths: &StagingPaths,
        staged: &StagedArtifacts,
    ) {
        if staged.local_text {
            remove_local(&paths.local_text, "staged text").await;
        }
        if staged.local_audio {
            remove_local(&paths.local_audio, "staged audio").await;
        }
        if staged.remote_text {
            remove_remote(remote, &paths.remote_text).await;
        }
        if staged.remote_audio {
            remove_remote(remote, &paths.remote_audio).await;
        }
    }
}

async fn remove_local(path: &Path, what: &str) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(error = %e, path = %path.display(), "failed to remove {what}");
        }
    }
}

async fn remove_remote(remote: &dyn RemoteExecRepository, path: &str) {
    match remote.exists_file(path).await {
        Ok(true) => {
            if let Err(e) = remote.delete_file(path).await {
                tracing::warn!(error = %e, path = %path, "failed to remove remote staging file");
            }
        }
        Ok(false) => {}
        Err(e) => {
            tracing::warn!(error = %e, path = %path, "could not check remote staging file");
        }
    }
}

/// Split a public object URL into bucket and object key.
///
/// The bucket is the first path segment after the public base URL and the key
/// is everything after it; the bucket name reappearing inside the key is fine.
pub fn resolve_object_url(
    url: &str,
    public_base_url: &str,
) -> Result<(String, String), SpeechServiceError> {
    let rest = url
        .strip_prefix(public_base_url.trim_end_matches('/'))
        .ok_or_else(|| SpeechServiceError::UrlResolution {
            url: url.to_string(),
            reason: "URL does not start with the configured public base URL".to_string(),
        })?;

    let rest = rest.trim_start_matches('/');
    let (bucket, key) = rest
        .split_once('/')
        .filter(|(bucket, key)| !bucket.is_empty() && !key.is_empty())
        .ok_or_else(|| SpeechServiceError::UrlResolution {
            url: url.to_string(),
            reason: "expected /{bucket}/{object key} after the public base URL".to_string(),
        })?;

    Ok((bucket.to_string(), key.to_string()))
}
