use super::remote_exec::{RemoteExecError, RemoteExecRepository};
use crate::infrastructure::config::RemoteSettings;
use async_trait::async_trait;
use ssh2::Session;
use std::io::Read;
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// SSH/SFTP implementation of the remote execution repository.
///
/// The session lives behind one mutex, so concurrent requests serialize on it and
/// only one caller at a time can observe a dead connection and reconnect.
pub struct SshRemoteExec {
    inner: Arc<Inner>,
}

struct Inner {
    settings: RemoteSettings,
    state: Mutex<ConnectionState>,
}

enum ConnectionState {
    Disconnected,
    Connected(Session),
}

impl SshRemoteExec {
    /// Connect eagerly so a bad host or bad credentials surface at startup.
    pub async fn connect(settings: RemoteSettings) -> Result<Self, RemoteExecError> {
        let connect_settings = settings.clone();
        let session = tokio::task::spawn_blocking(move || open_session(&connect_settings))
            .await
            .map_err(|e| RemoteExecError::Task(e.to_string()))??;

        tracing::info!(
            host = %settings.host,
            port = settings.port,
            "connected to synthesis host"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                settings,
                state: Mutex::new(ConnectionState::Connected(session)),
            }),
        })
    }

    /// Run `op` against a live session on a blocking thread, holding the
    /// connection lock for the liveness check, any reconnect and the operation.
    async fn with_session<T, F>(&self, op: F) -> Result<T, RemoteExecError>
    where
        T: Send + 'static,
        F: FnOnce(&Session) -> Result<T, RemoteExecError> + Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let mut state = inner.state.lock().unwrap_or_else(|e| e.into_inner());
            let session = inner.ensure_connected(&mut state)?;
            op(session)
        })
        .await
        .map_err(|e| RemoteExecError::Task(e.to_string()))?
    }
}

impl Inner {
    /// Probe the current session and reconnect with the original credentials
    /// when it is dead or absent.
    fn ensure_connected<'a>(
        &self,
        state: &'a mut ConnectionState,
    ) -> Result<&'a Session, RemoteExecError> {
        let alive = match &*state {
            ConnectionState::Connected(session) => session.keepalive_send().is_ok(),
            ConnectionState::Disconnected => false,
        };

        if !alive {
            if matches!(&*state, ConnectionState::Connected(_)) {
                tracing::info!("SSH connection lost, reconnecting");
            }
            match open_session(&self.settings) {
                Ok(session) => *state = ConnectionState::Connected(session),
                Err(e) => {
                    *state = ConnectionState::Disconnected;
                    return Err(e);
                }
            }
        }

        match &*state {
            ConnectionState::Connected(session) => Ok(session),
            ConnectionState::Disconnected => {
                Err(RemoteExecError::Connect("no live session".to_string()))
            }
        }
    }
}

fn open_session(settings: &RemoteSettings) -> Result<Session, RemoteExecError> {
    let connect = || -> Result<Session, RemoteExecError> {
        let tcp = TcpStream::connect((settings.host.as_str(), settings.port))
            .map_err(|e| RemoteExecError::Connect(e.to_string()))?;
        let mut session = Session::new().map_err(|e| RemoteExecError::Connect(e.to_string()))?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| RemoteExecError::Connect(e.to_string()))?;
        if let Some(key_file) = &settings.key_file {
            session
                .userauth_pubkey_file(&settings.user, None, Path::new(key_file), None)
                .map_err(|e| RemoteExecError::Connect(e.to_string()))?;
        } else {
            session
                .userauth_password(&settings.user, &settings.password)
                .map_err(|e| RemoteExecError::Connect(e.to_string()))?;
        }
        Ok(session)
    };

    let result = connect();
    if let Err(e) = &result {
        tracing::error!(
            error = %e,
            host = %settings.host,
            "failed to connect to synthesis host"
        );
    }
    result
}

fn sftp_names(
    session: &Session,
    dir: &str,
    directories: bool,
) -> Result<Vec<String>, RemoteExecError> {
    let sftp = session
        .sftp()
        .map_err(|e| RemoteExecError::Transfer(e.to_string()))?;
    let entries = sftp
        .readdir(Path::new(dir))
        .map_err(|e| RemoteExecError::Transfer(e.to_string()))?;

    Ok(entries
        .into_iter()
        .filter(|(_, stat)| if directories { stat.is_dir() } else { stat.is_file() })
        .filter_map(|(path, _)| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect())
}

#[async_trait]
impl RemoteExecRepository for SshRemoteExec {
    async fn run_command(&self, command: &str) -> Result<String, RemoteExecError> {
        let cmd = command.to_string();
        let result = self
            .with_session(move |session| {
                let mut channel = session
                    .channel_session()
                    .map_err(|e| RemoteExecError::Command(e.to_string()))?;
                channel
                    .exec(&cmd)
                    .map_err(|e| RemoteExecError::Command(e.to_string()))?;
                let mut stdout = String::new();
                channel
                    .read_to_string(&mut stdout)
                    .map_err(|e| RemoteExecError::Command(e.to_string()))?;
                channel
                    .wait_close()
                    .map_err(|e| RemoteExecError::Command(e.to_string()))?;
                if let Ok(status) = channel.exit_status() {
                    tracing::debug!(status = status, "remote command finished");
                }
                Ok(stdout)
            })
            .await;

        if let Err(e) = &result {
            tracing::error!(error = %e, command = %command, "failed to run remote command");
        }
        result
    }

    async fn upload_file(&self, local: &Path, remote: &str) -> Result<(), RemoteExecError> {
        let local_path: PathBuf = local.to_path_buf();
        let remote_path = remote.to_string();
        let result = self
            .with_session(move |session| {
                let mut source = std::fs::File::open(&local_path)
                    .map_err(|e| RemoteExecError::Transfer(e.to_string()))?;
                let sftp = session
                    .sftp()
                    .map_err(|e| RemoteExecError::Transfer(e.to_string()))?;
                let mut target = sftp
                    .create(Path::new(&remote_path))
                    .map_err(|e| RemoteExecError::Transfer(e.to_string()))?;
                std::io::copy(&mut source, &mut target)
                    .map_err(|e| RemoteExecError::Transfer(e.to_string()))?;
                Ok(())
            })
            .await;

        if let Err(e) = &result {
            tracing::error!(
                error = %e,
                local = %local.display(),
                remote = %remote,
                "failed to upload file to synthesis host"
            );
        }
        result
    }

    async fn download_file(&self, remote: &str, local: &Path) -> Result<(), RemoteExecError> {
        let local_path: PathBuf = local.to_path_buf();
        let remote_path = remote.to_string();
        let result = self
            .with_session(move |session| {
                let sftp = session
                    .sftp()
                    .map_err(|e| RemoteExecError::Transfer(e.to_string()))?;
                let mut source = sftp
                    .open(Path::new(&remote_path))
                    .map_err(|e| RemoteExecError::Transfer(e.to_string()))?;
                let mut target = std::fs::File::create(&local_path)
                    .map_err(|e| RemoteExecError::Transfer(e.to_string()))?;
                std::io::copy(&mut source, &mut target)
                    .map_err(|e| RemoteExecError::Transfer(e.to_string()))?;
                Ok(())
            })
            .await;

        if let Err(e) = &result {
            tracing::error!(
                error = %e,
                remote = %remote,
                local = %local.display(),
                "failed to download file from synthesis host"
            );
        }
        result
    }

    async fn exists_file(&self, remote: &str) -> Result<bool, RemoteExecError> {
        let remote_path = remote.to_string();
        self.with_session(move |session| {
            let sftp = session
                .sftp()
                .map_err(|e| RemoteExecError::Transfer(e.to_string()))?;
            Ok(sftp.stat(Path::new(&remote_path)).is_ok())
        })
        .await
    }

    async fn delete_file(&self, remote: &str) -> Result<(), RemoteExecError> {
        let remote_path = remote.to_string();
        let result = self
            .with_session(move |session| {
                let sftp = session
                    .sftp()
                    .map_err(|e| RemoteExecError::Transfer(e.to_string()))?;
                sftp.unlink(Path::new(&remote_path))
                    .map_err(|e| RemoteExecError::Transfer(e.to_string()))
            })
            .await;

        if let Err(e) = &result {
            tracing::error!(error = %e, remote = %remote, "failed to delete remote file");
        }
        result
    }

    async fn list_files(&self, dir: &str) -> Result<Vec<String>, RemoteExecError> {
        let dir_path = dir.to_string();
        let result = self
            .with_session(move |session| sftp_names(session, &dir_path, false))
            .await;

        if let Err(e) = &result {
            tracing::error!(error = %e, dir = %dir, "failed to list remote files");
        }
        result
    }

    async fn list_directories(&self, dir: &str) -> Result<Vec<String>, RemoteExecError> {
        let dir_path = dir.to_string();
        let result = self
            .with_session(move |session| sftp_names(session, &dir_path, true))
            .await;

        if let Err(e) = &result {
            tracing::error!(error = %e, dir = %dir, "failed to list remote directories");
        }
        result
    }
}
