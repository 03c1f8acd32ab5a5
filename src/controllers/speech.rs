use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::{
    domain::speech::SpeechService,
    error::{AppError, AppResult},
};

/// Request for POST /tools/say
#[derive(Debug, Serialize, Deserialize)]
pub struct SayRequest {
    pub text: String,
}

/// Request for POST /tools/tts
#[derive(Debug, Serialize, Deserialize)]
pub struct TtsRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SpeechResponse {
    pub key: String,
    pub url: String,
}

pub struct SpeechController {
    speech_service: Arc<SpeechService>,
}

impl SpeechController {
    pub fn new(speech_service: Arc<SpeechService>) -> Self {
        Self { speech_service }
    }

    /// POST /tools/say - synthesize raw text, return the public audio URL
    pub async fn say(
        State(controller): State<Arc<SpeechController>>,
        Json(request): Json<SayRequest>,
    ) -> AppResult<Json<SpeechResponse>> {
        let preview: String = request.text.chars().take(20).collect();
        tracing::info!(preview = %preview, chars = request.text.len(), "received text");

        if request.text.trim().is_empty() {
            return Err(AppError::BadRequest("Text cannot be empty".to_string()));
        }

        let (key, url) = controller.speech_service.synthesize(&request.text).await?;
        Ok(Json(SpeechResponse {
            key: key.to_string(),
            url,
        }))
    }

    /// POST /tools/tts - synthesize text stored behind a public object URL
    pub async fn tts(
        State(controller): State<Arc<SpeechController>>,
        Json(request): Json<TtsRequest>,
    ) -> AppResult<Json<SpeechResponse>> {
        tracing::info!(url = %request.url, "received URL");

        if request.url.trim().is_empty() {
            return Err(AppError::BadRequest("URL cannot be empty".to_string()));
        }

        let (key, url) = controller
            .speech_service
            .resolve_and_synthesize(&request.url)
            .await?;
        Ok(Json(SpeechResponse {
            key: key.to_string(),
            url,
        }))
    }

    /// GET /tools - discovery listing of the exposed tools
    pub async fn list_tools() -> Json<serde_json::Value> {
        Json(json!({
            "tools": [
                {
                    "name": "say",
                    "description": "Generate speech audio from raw text and return the public URL of the audio file."
                },
                {
                    "name": "tts",
                    "description": "Generate speech audio from a stored text object URL and return the public URL of the audio file."
                }
            ]
        }))
    }
}
