use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

use crate::config::MediaConfig;
use crate::error::{Result, LocalizerError};
use super::{MediaProcessorTrait, MediaCommandBuilder};

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path);

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn convert_to_wav(&self, input_path: &Path, output_path: &Path) -> Result<()> {
        debug!("Converting {} to {}", input_path.display(), output_path.display());
        self.command_builder
            .convert_to_wav(input_path, output_path)
            .execute()
            .await?;
        Ok(())
    }

    async fn transcode(&self, input_path: &Path, output_path: &Path) -> Result<()> {
        info!("Transcoding {} -> {}", input_path.display(), output_path.display());
        self.command_builder
            .transcode(input_path, output_path, &self.config.transcode_options)
            .execute()
            .await?;
        Ok(())
    }

    async fn check_availability(&self) -> Result<()> {
        self.command_builder
            .version_check()
            .execute()
            .await
            .map_err(|e| LocalizerError::Media(format!("Media processor not found: {}", e)))?;
        info!("Media processor is available");
        Ok(())
    }

    async fn get_version_info(&self) -> Result<String> {
        debug!("Getting media processor version information");
        let stdout = self.command_builder.version_check().execute().await?;
        // The first line carries the version
        Ok(stdout.lines().next().unwrap_or("Unknown version").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_binary_is_reported() {
        let processor = MediaProcessorImpl::new(MediaConfig {
            binary_path: "/nonexistent/ffmpeg".to_string(),
            transcode_options: vec![],
        });
        assert!(processor.check_availability().await.is_err());
        assert!(processor.get_version_info().await.is_err());
    }
}
