use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum SpeechServiceError {
    #[error("{0} is not initialized, check server logs for startup errors")]
    NotInitialized(&'static str),
    #[error("failed to stage file locally: {0}")]
    StagingIo(String),
    #[error("pipeline step failed: {0}")]
    Pipeline(String),
    #[error("cannot resolve object URL '{url}': {reason}")]
    UrlResolution { url: String, reason: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<SpeechServiceError> for AppError {
    fn from(err: SpeechServiceError) -> Self {
        match err {
            SpeechServiceError::NotInitialized(_) => AppError::ServiceUnavailable(err.to_string()),
            SpeechServiceError::UrlResolution { .. } => AppError::BadRequest(err.to_string()),
            SpeechServiceError::Pipeline(_) => AppError::ExternalService(err.to_string()),
            SpeechServiceError::StagingIo(_) | SpeechServiceError::Other(_) => {
                AppError::Internal(err.to_string())
            }
        }
    }
}
