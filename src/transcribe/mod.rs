// Modular transcription architecture
//
// This module provides different transcription implementations through a factory pattern:
// - OpenAI: OpenAI-compatible `/audio/transcriptions` HTTP API
// - WhisperCpp: local whisper.cpp command line tool
//
// Both receive a 16 kHz mono WAV prepared by the media processor and return
// the plain transcript.

pub mod openai;
pub mod whisper_cpp;

use async_trait::async_trait;
use std::path::Path;

use crate::config::{TranscriberConfig, TranscriptionMode};
use crate::error::Result;

/// Speech to text for one narration clip. The spoken language hint comes
/// from `transcriber.language`; None lets the engine detect it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a WAV file
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}

/// Factory for creating transcriber instances
pub struct TranscriberFactory;

impl TranscriberFactory {
    /// Create the transcriber selected by `config.mode`
    pub fn create_transcriber(config: &TranscriberConfig) -> Result<Box<dyn Transcriber>> {
        let transcriber: Box<dyn Transcriber> = match config.mode {
            TranscriptionMode::Api => Box::new(openai::OpenAITranscriber::new(config)?),
            TranscriptionMode::Command => Box::new(whisper_cpp::WhisperCppTranscriber::new(config)),
        };
        Ok(transcriber)
    }

    /// One-line description used by the environment checks
    pub fn describe(config: &TranscriberConfig) -> String {
        match config.mode {
            TranscriptionMode::Api => {
                let key = if std::env::var(&config.api_key_env).is_ok_and(|v| !v.is_empty()) {
                    "key set"
                } else {
                    "no key"
                };
                format!("API {} (model {}, ${} {})", config.endpoint, config.model, config.api_key_env, key)
            }
            TranscriptionMode::Command => {
                format!("{} (model {})", config.binary_path, config.model_path)
            }
        }
    }
}
