// whisper.cpp command line transcription

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, LocalizerError};
use super::Transcriber;

/// whisper.cpp `-oj` output format
#[derive(Debug, Deserialize)]
pub struct WhisperCppOutput {
    #[serde(default)]
    pub transcription: Vec<WhisperCppSegment>,
}

#[derive(Debug, Deserialize)]
pub struct WhisperCppSegment {
    pub text: String,
}

impl WhisperCppOutput {
    /// Segment texts joined into one transcript
    pub fn text(&self) -> String {
        self.transcription
            .iter()
            .map(|seg| seg.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub struct WhisperCppTranscriber {
    binary_path: String,
    model_path: String,
    language: Option<String>,
}

impl WhisperCppTranscriber {
    pub fn new(config: &TranscriberConfig) -> Self {
        Self {
            binary_path: config.binary_path.clone(),
            model_path: config.model_path.clone(),
            language: config.language.clone(),
        }
    }

    fn build_command(&self, audio_path: &Path, output_base: &Path) -> Command {
        let mut cmd = Command::new(&self.binary_path);
        cmd.arg("-m").arg(&self.model_path)
            .arg("-f").arg(audio_path)
            .arg("-oj")
            .arg("-of").arg(output_base);

        if let Some(lang) = &self.language {
            cmd.arg("-l").arg(lang);
        }
        cmd
    }
}

#[async_trait]
impl Transcriber for WhisperCppTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        info!("Transcribing {} with {}", audio_path.display(), self.binary_path);

        let temp_dir = tempfile::tempdir()
            .map_err(|e| LocalizerError::Transcriber(format!("Failed to create temp directory: {}", e)))?;
        let output_base = temp_dir.path().join("transcript");

        let output = self
            .build_command(audio_path, &output_base)
            .output()
            .await
            .map_err(|e| LocalizerError::Transcriber(format!("Failed to execute {}: {}", self.binary_path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LocalizerError::Transcriber(format!("whisper.cpp failed: {}", stderr.trim())));
        }

        // whisper-cli appends .json to the -of base
        let json_file = output_base.with_extension("json");
        let json_content = tokio::fs::read_to_string(&json_file)
            .await
            .map_err(|e| LocalizerError::Transcriber(format!("Failed to read output: {}", e)))?;

        let parsed: WhisperCppOutput = serde_json::from_str(&json_content)
            .map_err(|e| LocalizerError::Transcriber(format!("Failed to parse whisper.cpp JSON: {}", e)))?;

        let text = parsed.text();
        debug!("Transcript: {} chars", text.len());
        Ok(text)
    }
}
