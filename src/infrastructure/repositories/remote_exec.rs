use async_trait::async_trait;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum RemoteExecError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("command failed: {0}")]
    Command(String),
    #[error("file transfer failed: {0}")]
    Transfer(String),
    #[error("blocking task failed: {0}")]
    Task(String),
}

/// Repository for executing commands and moving files on the remote synthesis host.
/// Abstracts the underlying transport (SSH/SFTP in production).
///
/// Implementations are responsible for:
/// - Keeping a live session and reconnecting transparently when it dies
/// - Logging every failed operation before returning the error
///
/// Callers decide whether a failure is load-bearing (abort the pipeline) or
/// best-effort (cleanup, tolerated).
#[async_trait]
pub trait RemoteExecRepository: Send + Sync {
    /// Run a shell command and return its captured stdout.
    async fn run_command(&self, command: &str) -> Result<String, RemoteExecError>;

    /// Copy a local file to the given remote path.
    async fn upload_file(&self, local: &Path, remote: &str) -> Result<(), RemoteExecError>;

    /// Copy a remote file to the given local path.
    async fn download_file(&self, remote: &str, local: &Path) -> Result<(), RemoteExecError>;

    /// Whether a remote path exists.
    async fn exists_file(&self, remote: &str) -> Result<bool, RemoteExecError>;

    /// Remove a remote file.
    async fn delete_file(&self, remote: &str) -> Result<(), RemoteExecError>;

    /// Names of regular files in a remote directory.
    async fn list_files(&self, dir: &str) -> Result<Vec<String>, RemoteExecError>;

    /// Names of subdirectories in a remote directory.
    async fn list_directories(&self, dir: &str) -> Result<Vec<String>, RemoteExecError>;
}
