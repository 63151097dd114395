use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::SynthesizerConfig;
use crate::error::{Result, LocalizerError};
use crate::http::{build_client, error_detail};
use super::Synthesizer;

/// Google translate TTS endpoint. Requests are limited in length, so text is
/// sent in chunks and the returned MP3 frames are concatenated.
pub struct GoogleSynthesizer {
    client: Client,
    endpoint: String,
    slow: bool,
    chunk_size: usize,
}

impl GoogleSynthesizer {
    pub fn new(config: &SynthesizerConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            slow: config.slow,
            chunk_size: config.chunk_size.max(1),
        })
    }

    async fn fetch_chunk(&self, chunk: &str, language: &str, index: usize, total: usize) -> Result<Vec<u8>> {
        let url = format!("{}/translate_tts", self.endpoint);
        let speed = if self.slow { "0.3" } else { "1" };
        let total = total.to_string();
        let index = index.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("ie", "UTF-8"),
                ("q", chunk),
                ("tl", language),
                ("client", "tw-ob"),
                ("ttsspeed", speed),
                ("total", total.as_str()),
                ("idx", index.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await
            .map_err(|e| LocalizerError::Synthesis(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(LocalizerError::Synthesis(format!(
                "TTS endpoint error {}",
                error_detail(response).await
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LocalizerError::Synthesis(format!("Failed to read audio: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Synthesizer for GoogleSynthesizer {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>> {
        let chunks = split_text(text, self.chunk_size);
        if chunks.is_empty() {
            return Err(LocalizerError::Synthesis("No text to speak".to_string()));
        }
        debug!("Synthesizing {} chunk(s) in {}", chunks.len(), language);

        let mut audio = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            audio.extend(self.fetch_chunk(chunk, language, index, chunks.len()).await?);
        }

        if audio.is_empty() {
            return Err(LocalizerError::Synthesis("Empty audio received".to_string()));
        }
        Ok(audio)
    }
}

/// Split text into pieces of at most `max_chars` characters, breaking at
/// whitespace. Words longer than the limit are cut at character boundaries.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
