pub mod error;
pub mod fingerprint;
pub mod paths;
pub mod service;

pub use error::SpeechServiceError;
pub use fingerprint::ContentKey;
pub use paths::{SpeechSettings, StagingPaths};
pub use service::{resolve_object_url, SpeechService};
