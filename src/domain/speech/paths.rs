use super::fingerprint::ContentKey;
use crate::infrastructure::repositories::normalize_object_key;
use std::path::PathBuf;

/// Static configuration the staging paths are derived from.
#[derive(Debug, Clone)]
pub struct SpeechSettings {
    pub local_working_path: PathBuf,
    pub remote_working_path: String,
    pub store_working_path: String,
    pub bucket: String,
    pub public_base_url: String,
}

/// Every transient and final location for one request, derived purely from the
/// content key and static configuration. Nothing here performs I/O.
#[derive(Debug, Clone)]
pub struct StagingPaths {
    pub local_text: PathBuf,
    pub local_audio: PathBuf,
    pub remote_text: String,
    pub remote_audio: String,
    pub object_key: String,
    pub public_url: String,
}

impl StagingPaths {
    pub fn new(key: &ContentKey, settings: &SpeechSettings) -> Self {
        let object_key =
            normalize_object_key(&format!("{}/{key}.aiff", settings.store_working_path))
                .to_string();
        let public_url = format!(
            "{}/{}/{object_key}",
            settings.public_base_url.trim_end_matches('/'),
            settings.bucket
        );

        Self {
            local_text: settings.local_working_path.join(format!("{key}.txt")),
            local_audio: settings.local_working_path.join(format!("{key}.aiff")),
            remote_text: format!("{}/{key}.txt", settings.remote_working_path),
            remote_audio: format!("{}/{key}.aiff", settings.remote_working_path),
            object_key,
            public_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn settings() -> SpeechSettings {
        SpeechSettings {
            local_working_path: PathBuf::from("/var/staging"),
            remote_working_path: "/tmp".to_string(),
            store_working_path: "tmp".to_string(),
            bucket: "speech".to_string(),
            public_base_url: "http://localhost:9000".to_string(),
        }
    }

    #[test]
    fn test_paths_derive_from_key_and_settings() {
        let key = ContentKey::from_text("hello world");
        let paths = StagingPaths::new(&key, &settings());

        assert_eq!(
            paths.local_text,
            PathBuf::from(format!("/var/staging/{key}.txt"))
        );
        assert_eq!(
            paths.local_audio,
            PathBuf::from(format!("/var/staging/{key}.aiff"))
        );
        assert_eq!(paths.remote_text, format!("/tmp/{key}.txt"));
        assert_eq!(paths.remote_audio, format!("/tmp/{key}.aiff"));
        assert_eq!(paths.object_key, format!("tmp/{key}.aiff"));
        assert_eq!(
            paths.public_url,
            format!("http://localhost:9000/speech/tmp/{key}.aiff")
        );
    }

    #[test]
    fn test_object_key_never_absolute() {
        let mut s = settings();
        s.store_working_path = "/tmp".to_string();
        let key = ContentKey::from_text("x");
        let paths = StagingPaths::new(&key, &s);
        assert_eq!(paths.object_key, format!("tmp/{key}.aiff"));
        assert_eq!(
            paths.public_url,
            format!("http://localhost:9000/speech/tmp/{key}.aiff")
        );
    }

    #[test]
    fn test_trailing_slash_in_base_url_does_not_double() {
        let mut s = settings();
        s.public_base_url = "http://store/".to_string();
        let key = ContentKey::from_text("x");
        let paths = StagingPaths::new(&key, &s);
        assert_eq!(paths.public_url, format!("http://store/speech/tmp/{key}.aiff"));
    }

    #[test]
    fn test_identical_text_identical_paths() {
        let s = settings();
        let a = StagingPaths::new(&ContentKey::from_text("same"), &s);
        let b = StagingPaths::new(&ContentKey::from_text("same"), &s);
        assert_eq!(a.object_key, b.object_key);
        assert_eq!(a.public_url, b.public_url);
        assert_eq!(a.local_text, b.local_text);
        assert_eq!(a.remote_audio, b.remote_audio);
    }
}
