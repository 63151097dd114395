// Text to speech
//
// Implementations return MP3 bytes for a piece of text in a TTS language
// (see `language::tts_language`). Currently only Google's translate TTS
// endpoint is provided.

pub mod google;

use async_trait::async_trait;

use crate::config::SynthesizerConfig;
use crate::error::Result;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize `text` as MP3 audio
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>>;
}

/// Factory for creating synthesizer instances
pub struct SynthesizerFactory;

impl SynthesizerFactory {
    pub fn create_synthesizer(config: &SynthesizerConfig) -> Result<Box<dyn Synthesizer>> {
        Ok(Box::new(google::GoogleSynthesizer::new(config)?))
    }
}
