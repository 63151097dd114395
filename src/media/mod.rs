// Modular media processing architecture
//
// This module provides a clean abstraction over media processing operations:
// - Processor: ffmpeg-backed implementation of the trait below
// - Commands: command builders and abstractions

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// Main trait for media processing operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Decode any supported audio into 16 kHz mono PCM WAV for transcription
    async fn convert_to_wav(&self, input_path: &Path, output_path: &Path) -> Result<()>;

    /// Re-encode audio into the container implied by the output extension
    async fn transcode(&self, input_path: &Path, output_path: &Path) -> Result<()>;

    /// Check if media processor is available
    async fn check_availability(&self) -> Result<()>;

    /// Get media processor version information
    async fn get_version_info(&self) -> Result<String>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessorTrait> {
        Box::new(processor::MediaProcessorImpl::new(config))
    }
}
