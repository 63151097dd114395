// OpenAI-compatible transcription API
// Works with api.openai.com and self-hosted servers exposing the same route

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, LocalizerError};
use crate::http::{build_client, error_detail};
use super::Transcriber;

/// `response_format=json` body
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

pub struct OpenAITranscriber {
    client: Client,
    endpoint: String,
    model: String,
    api_key_env: String,
    language: Option<String>,
}

impl OpenAITranscriber {
    pub fn new(config: &TranscriberConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key_env: config.api_key_env.clone(),
            language: config.language.clone(),
        })
    }

    fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|key| !key.is_empty())
    }
}

#[async_trait]
impl Transcriber for OpenAITranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        info!("Transcribing {} via {}", audio_path.display(), self.endpoint);

        let bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.wav".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")?;

        let mut form = Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "json");
        if let Some(lang) = &self.language {
            form = form.text("language", lang.clone());
        }

        let url = format!("{}/audio/transcriptions", self.endpoint);
        let mut request = self.client.post(&url).multipart(form);
        if let Some(key) = self.api_key() {
            request = request.bearer_auth(key);
        } else {
            debug!("${} not set, sending unauthenticated request", self.api_key_env);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LocalizerError::Transcriber(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(LocalizerError::Transcriber(format!(
                "Transcription API error {}",
                error_detail(response).await
            )));
        }

        let body: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| LocalizerError::Transcriber(format!("Failed to parse response: {}", e)))?;

        let text = body.text.trim().to_string();
        debug!("Transcript: {} chars", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transcriber(endpoint: &str) -> OpenAITranscriber {
        let mut config = Config::default().transcriber;
        config.endpoint = endpoint.to_string();
        config.api_key_env = "SCORM_LOCALIZER_TEST_UNSET_KEY".to_string();
        OpenAITranscriber::new(&config).unwrap()
    }

    #[tokio::test]
    async fn posts_audio_and_returns_trimmed_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .and(body_string_contains("name=\"language\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": " Welcome to the course. "})))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let wav = dir.path().join("clip.wav");
        std::fs::write(&wav, b"RIFF....WAVE").unwrap();

        let text = transcriber(&server.uri()).transcribe(&wav).await.unwrap();
        assert_eq!(text, "Welcome to the course.");
    }

    #[tokio::test]
    async fn api_errors_are_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let wav = dir.path().join("clip.wav");
        std::fs::write(&wav, b"RIFF").unwrap();

        let err = transcriber(&server.uri()).transcribe(&wav).await.unwrap_err();
        assert!(matches!(err, LocalizerError::Transcriber(_)));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn missing_audio_is_an_io_error() {
        let err = transcriber("http://127.0.0.1:9")
            .transcribe(Path::new("/nonexistent/clip.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, LocalizerError::Io(_)));
    }
}
