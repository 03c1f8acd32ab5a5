// Shared test doubles for the synthesis pipeline: an in-memory remote host
// and an in-memory object store, both honoring the repository contracts.
// Not every test binary uses every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use speechrelay::controllers::SpeechController;
use speechrelay::domain::speech::{SpeechService, SpeechSettings};
use speechrelay::infrastructure::repositories::{
    normalize_object_key, ObjectStoreError, ObjectStoreRepository, RemoteExecError,
    RemoteExecRepository,
};

/// In-memory stand-in for the SSH synthesis host. `run_command` emulates the
/// `say` CLI: it reads the staged text file and writes `AIFF:<text>` to the
/// output path.
#[derive(Default)]
pub struct FakeRemoteExec {
    pub files: Mutex<HashMap<String, Vec<u8>>>,
    pub commands: Mutex<Vec<String>>,
    pub fail_upload: bool,
    pub fail_command: bool,
    pub fail_download: bool,
    /// Command "succeeds" without producing an output file.
    pub silent_command: bool,
}

impl FakeRemoteExec {
    pub fn remote_file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

fn parse_flag(command: &str, flag: &str) -> Option<String> {
    let mut tokens = command.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == flag {
            return tokens.next().map(|s| s.to_string());
        }
    }
    None
}

#[async_trait]
impl RemoteExecRepository for FakeRemoteExec {
    async fn run_command(&self, command: &str) -> Result<String, RemoteExecError> {
        if self.fail_command {
            return Err(RemoteExecError::Command("boom".to_string()));
        }
        self.commands.lock().unwrap().push(command.to_string());
        if self.silent_command {
            return Ok(String::new());
        }

        let input = parse_flag(command, "-f");
        let output = parse_flag(command, "-o");
        if let (Some(input), Some(output)) = (input, output) {
            let mut files = self.files.lock().unwrap();
            if let Some(text) = files.get(&input).cloned() {
                let mut audio = b"AIFF:".to_vec();
                audio.extend_from_slice(&text);
                files.insert(output, audio);
            }
        }
        Ok(String::new())
    }

    async fn upload_file(&self, local: &Path, remote: &str) -> Result<(), RemoteExecError> {
        if self.fail_upload {
            return Err(RemoteExecError::Transfer("upload refused".to_string()));
        }
        let bytes =
            std::fs::read(local).map_err(|e| RemoteExecError::Transfer(e.to_string()))?;
        self.files.lock().unwrap().insert(remote.to_string(), bytes);
        Ok(())
    }

    async fn download_file(&self, remote: &str, local: &Path) -> Result<(), RemoteExecError> {
        if self.fail_download {
            return Err(RemoteExecError::Transfer("download refused".to_string()));
        }
        let bytes = self
            .files
            .lock()
            .unwrap()
            .get(remote)
            .cloned()
            .ok_or_else(|| RemoteExecError::Transfer(format!("no such file: {remote}")))?;
        std::fs::write(local, bytes).map_err(|e| RemoteExecError::Transfer(e.to_string()))?;
        Ok(())
    }

    async fn exists_file(&self, remote: &str) -> Result<bool, RemoteExecError> {
        Ok(self.files.lock().unwrap().contains_key(remote))
    }

    async fn delete_file(&self, remote: &str) -> Result<(), RemoteExecError> {
        self.files
            .lock()
            .unwrap()
            .remove(remote)
            .map(|_| ())
            .ok_or_else(|| RemoteExecError::Transfer(format!("no such file: {remote}")))
    }

    async fn list_files(&self, dir: &str) -> Result<Vec<String>, RemoteExecError> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        Ok(self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(|rest| rest.to_string())
            .collect())
    }

    async fn list_directories(&self, _dir: &str) -> Result<Vec<String>, RemoteExecError> {
        Ok(Vec::new())
    }
}

/// In-memory stand-in for the S3-compatible store, keyed by (bucket, key).
pub struct FakeObjectStore {
    pub default_bucket: String,
    pub buckets: Mutex<HashSet<String>>,
    pub objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    pub fail_upload: bool,
    pub fail_download: bool,
}

impl FakeObjectStore {
    pub fn new(default_bucket: &str) -> Self {
        Self {
            default_bucket: default_bucket.to_string(),
            buckets: Mutex::new(HashSet::from([default_bucket.to_string()])),
            objects: Mutex::new(HashMap::new()),
            fail_upload: false,
            fail_download: false,
        }
    }

    pub fn put_object(&self, bucket: &str, key: &str, bytes: &[u8]) {
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), normalize_object_key(key).to_string()),
            bytes.to_vec(),
        );
    }

    pub fn get_object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), normalize_object_key(key).to_string()))
            .cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    fn bucket_or_default(&self, bucket: Option<&str>) -> String {
        bucket.unwrap_or(&self.default_bucket).to_string()
    }
}

#[async_trait]
impl ObjectStoreRepository for FakeObjectStore {
    async fn create_bucket(
        &self,
        bucket: Option<&str>,
        _expiration_days: i32,
        _anonymous: bool,
    ) -> Result<bool, ObjectStoreError> {
        let bucket = self.bucket_or_default(bucket);
        Ok(self.buckets.lock().unwrap().insert(bucket))
    }

    async fn delete_bucket(
        &self,
        bucket: Option<&str>,
        force: bool,
    ) -> Result<(), ObjectStoreError> {
        let bucket = self.bucket_or_default(bucket);
        if force {
            self.objects
                .lock()
                .unwrap()
                .retain(|(b, _), _| b != &bucket);
        }
        self.buckets.lock().unwrap().remove(&bucket);
        Ok(())
    }

    async fn exists_bucket(&self, bucket: Option<&str>) -> Result<bool, ObjectStoreError> {
        let bucket = self.bucket_or_default(bucket);
        Ok(self.buckets.lock().unwrap().contains(&bucket))
    }

    async fn set_expiration_policy(
        &self,
        _bucket: Option<&str>,
        _days: i32,
    ) -> Result<(), ObjectStoreError> {
        Ok(())
    }

    async fn set_anonymous_read_policy(
        &self,
        _bucket: Option<&str>,
    ) -> Result<(), ObjectStoreError> {
        Ok(())
    }

    async fn upload_file(
        &self,
        local: &Path,
        key: &str,
        bucket: Option<&str>,
    ) -> Result<(), ObjectStoreError> {
        if self.fail_upload {
            return Err(ObjectStoreError::Object("upload refused".to_string()));
        }
        let bytes = std::fs::read(local)?;
        let bucket = self.bucket_or_default(bucket);
        self.objects
            .lock()
            .unwrap()
            .insert((bucket, normalize_object_key(key).to_string()), bytes);
        Ok(())
    }

    async fn download_file(
        &self,
        key: &str,
        local: &Path,
        bucket: Option<&str>,
    ) -> Result<(), ObjectStoreError> {
        if self.fail_download {
            return Err(ObjectStoreError::Object("download refused".to_string()));
        }
        let bucket = self.bucket_or_default(bucket);
        let bytes = self
            .objects
            .lock()
            .unwrap()
            .get(&(bucket, normalize_object_key(key).to_string()))
            .cloned()
            .ok_or_else(|| ObjectStoreError::Object(format!("no such object: {key}")))?;
        std::fs::write(local, bytes)?;
        Ok(())
    }

    async fn delete_file(&self, key: &str, bucket: Option<&str>) -> Result<(), ObjectStoreError> {
        let bucket = self.bucket_or_default(bucket);
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket, normalize_object_key(key).to_string()));
        Ok(())
    }

    async fn exists_file(&self, key: &str, bucket: Option<&str>) -> Result<bool, ObjectStoreError> {
        let bucket = self.bucket_or_default(bucket);
        Ok(self
            .objects
            .lock()
            .unwrap()
            .contains_key(&(bucket, normalize_object_key(key).to_string())))
    }
}

pub const TEST_BUCKET: &str = "speech";
pub const TEST_PUBLIC_URL: &str = "http://store";

pub fn test_settings(local_dir: &Path) -> SpeechSettings {
    SpeechSettings {
        local_working_path: PathBuf::from(local_dir),
        remote_working_path: "/remote".to_string(),
        store_working_path: "tmp".to_string(),
        bucket: TEST_BUCKET.to_string(),
        public_base_url: TEST_PUBLIC_URL.to_string(),
    }
}

pub fn test_service(
    remote: Arc<FakeRemoteExec>,
    store: Arc<FakeObjectStore>,
    local_dir: &Path,
) -> SpeechService {
    SpeechService::new(
        Some(remote as Arc<dyn RemoteExecRepository>),
        Some(store as Arc<dyn ObjectStoreRepository>),
        test_settings(local_dir),
    )
}

pub fn test_controller(service: Arc<SpeechService>) -> Arc<SpeechController> {
    Arc::new(SpeechController::new(service))
}

pub fn local_file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}
