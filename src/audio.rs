use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Result, LocalizerError};
use crate::language::tts_language;
use crate::media::MediaProcessorTrait;
use crate::synthesize::Synthesizer;
use crate::transcribe::Transcriber;
use crate::translate::TranslationService;

/// Narration formats picked up in course packages
pub const AUDIO_EXTENSIONS: [&str; 6] = ["mp3", "wav", "ogg", "m4a", "flac", "aac"];

/// Suffix of the copy kept while a clip is being replaced
pub const BACKUP_SUFFIX: &str = "original";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioReport {
    /// Clips replaced by translated narration
    pub translated: usize,
    /// Clips that failed and were put back from their backup
    pub restored: usize,
}

/// All audio files below `root`, sorted
pub fn find_audio_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_audio_file(path))
        .collect();
    files.sort();
    files
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_string_lossy().to_lowercase().as_str()))
        .unwrap_or(false)
}

/// `voice.mp3` -> `voice.mp3.original`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Replaces spoken narration with a synthesized translation:
/// convert to WAV, transcribe, translate, synthesize, write back.
pub struct AudioLocalizer {
    transcriber: Arc<dyn Transcriber>,
    translator: Arc<TranslationService>,
    synthesizer: Arc<dyn Synthesizer>,
    media: Arc<dyn MediaProcessorTrait>,
    temp_dir: PathBuf,
}

impl AudioLocalizer {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        translator: Arc<TranslationService>,
        synthesizer: Arc<dyn Synthesizer>,
        media: Arc<dyn MediaProcessorTrait>,
        temp_dir: PathBuf,
    ) -> Self {
        Self {
            transcriber,
            translator,
            synthesizer,
            media,
            temp_dir,
        }
    }

    /// Replace one clip. On any failure the original bytes are restored and
    /// the error returned; the backup never outlives the call.
    pub async fn localize_file(&self, path: &Path, target_language: &str) -> Result<()> {
        // No backup exists until the scratch directory does
        tokio::fs::create_dir_all(&self.temp_dir).await?;
        // Dropped at the end of this call, taking the intermediate files with it
        let work = tempfile::Builder::new()
            .prefix("clip-")
            .tempdir_in(&self.temp_dir)?;

        let backup = backup_path(path);
        tokio::fs::copy(path, &backup).await?;

        match self.replace_narration(path, target_language, work.path()).await {
            Ok(()) => {
                tokio::fs::remove_file(&backup).await?;
                info!("Translated audio {}", path.display());
                Ok(())
            }
            Err(e) => {
                warn!("Restoring {} after failure: {}", path.display(), e);
                tokio::fs::copy(&backup, path).await?;
                tokio::fs::remove_file(&backup).await?;
                Err(e)
            }
        }
    }

    async fn replace_narration(&self, path: &Path, target_language: &str, work: &Path) -> Result<()> {
        let wav = work.join("input.wav");
        self.media.convert_to_wav(path, &wav).await?;

        let transcript = self
            .transcriber
            .transcribe(&wav)
            .await?;
        if transcript.trim().is_empty() {
            return Err(LocalizerError::Transcriber(format!(
                "No speech recognized in {}",
                path.display()
            )));
        }
        debug!("Transcribed {}: {} chars", path.display(), transcript.len());

        // Narration is never re-voiced in the source language
        let translated = self.translator.translate(&transcript, target_language).await?;

        let speech = self
            .synthesizer
            .synthesize(&translated, tts_language(target_language))
            .await?;

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if extension == "mp3" {
            tokio::fs::write(path, &speech).await?;
        } else {
            let mp3 = work.join("speech.mp3");
            let converted = work.join(format!("speech.{}", extension));
            tokio::fs::write(&mp3, &speech).await?;
            self.media.transcode(&mp3, &converted).await?;
            tokio::fs::copy(&converted, path).await?;
        }
        Ok(())
    }

    /// Localize every clip in order. `on_progress(i, n)` runs before clip `i`.
    /// Failures are logged and counted; they never abort the batch.
    pub async fn localize_all<F>(&self, files: &[PathBuf], target_language: &str, mut on_progress: F) -> AudioReport
    where
        F: FnMut(usize, usize) + Send,
    {
        let mut report = AudioReport::default();
        let total = files.len();

        for (index, file) in files.iter().enumerate() {
            on_progress(index, total);
            match self.localize_file(file, target_language).await {
                Ok(()) => report.translated += 1,
                Err(e) => {
                    warn!("Audio translation failed for {}: {}", file.display(), e);
                    report.restored += 1;
                }
            }
        }

        info!(
            "Audio: {} translated, {} kept original",
            report.translated, report.restored
        );
        report
    }
}
