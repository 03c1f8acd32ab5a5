use sha2::{Digest, Sha256};
use std::fmt;

/// Content-addressed identifier for one piece of input text.
///
/// The same text always hashes to the same key, so the text file, the audio
/// file and the published object share one name across all three systems and
/// repeated requests overwrite instead of duplicating.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentKey(String);

impl ContentKey {
    pub fn from_text(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        ContentKey(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
