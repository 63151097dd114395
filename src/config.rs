use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, LocalizerError};

// Default values for sections that older config files may omit
fn default_complete_hold_secs() -> u64 {
    2
}

fn default_min_length() -> usize {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub workspace: WorkspaceConfig,
    pub translate: TranslateConfig,
    pub transcriber: TranscriberConfig,
    pub synthesizer: SynthesizerConfig,
    pub media: MediaConfig,
    pub rewriter: RewriterConfig,
    #[serde(default)]
    pub job: JobConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Directory holding uploads, extracted packages, archives and metadata
    pub root: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    /// Google Translate web endpoint
    Google,
    /// MyMemory translation memory API
    MyMemory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Provider tried first for every string
    pub provider: TranslationProvider,
    /// Provider used once the primary has exhausted its retries
    pub fallback: Option<TranslationProvider>,
    /// Source language code, or "auto" to let the provider detect it
    pub source_language: String,
    /// Base URL of the Google endpoint
    pub google_endpoint: String,
    /// Base URL of the MyMemory endpoint
    pub mymemory_endpoint: String,
    /// Attempts against the primary provider before falling back
    pub max_retries: u32,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Persist translations under the workspace cache directory
    pub cache: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionMode {
    /// OpenAI-compatible `/audio/transcriptions` HTTP API
    Api,
    /// Local whisper.cpp command line tool
    Command,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriberConfig {
    pub mode: TranscriptionMode,
    /// Base URL of the transcription API (API mode)
    pub endpoint: String,
    /// Environment variable holding the API key (API mode)
    pub api_key_env: String,
    /// Model name sent to the API (API mode)
    pub model: String,
    /// Path to whisper-cli binary (command mode)
    pub binary_path: String,
    /// Path to the ggml model file (command mode)
    pub model_path: String,
    /// Spoken language of the narration; None lets the engine detect it
    pub language: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesizerConfig {
    /// Base URL of the Google translate TTS endpoint
    pub endpoint: String,
    /// Slower speech rate
    pub slow: bool,
    /// Maximum characters sent per request
    pub chunk_size: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Additional encoding options used when re-encoding synthesized narration
    /// into a non-MP3 container, e.g. ["-b:a", "128k"]
    pub transcode_options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriterConfig {
    /// File names that are never rewritten (player runtime, not course text)
    pub excluded_files: Vec<String>,
    /// File extensions scanned for translatable text
    pub extensions: Vec<String>,
    /// Minimum trimmed length of a candidate string
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    /// Also translate any plain quoted literal. Off by default; it can hit
    /// identifiers and event names in player code.
    pub aggressive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Seconds the final job state stays visible before the tracker resets to idle
    #[serde(default = "default_complete_hold_secs")]
    pub complete_hold_secs: u64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            complete_hold_secs: default_complete_hold_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: WorkspaceConfig {
                root: PathBuf::from("."),
            },
            translate: TranslateConfig {
                provider: TranslationProvider::Google,
                fallback: Some(TranslationProvider::MyMemory),
                source_language: "auto".to_string(),
                google_endpoint: "https://translate.googleapis.com".to_string(),
                mymemory_endpoint: "https://api.mymemory.translated.net".to_string(),
                max_retries: 3,
                timeout_secs: 30,
                cache: true,
            },
            transcriber: TranscriberConfig {
                mode: TranscriptionMode::Api,
                endpoint: "https://api.openai.com/v1".to_string(),
                api_key_env: "OPENAI_API_KEY".to_string(),
                model: "whisper-1".to_string(),
                binary_path: "whisper-cli".to_string(),
                model_path: "models/ggml-base.bin".to_string(),
                language: Some("en".to_string()),
                timeout_secs: 300,
            },
            synthesizer: SynthesizerConfig {
                endpoint: "https://translate.google.com".to_string(),
                slow: false,
                chunk_size: 100,
                timeout_secs: 60,
            },
            media: MediaConfig {
                binary_path: "ffmpeg".to_string(),
                transcode_options: vec![],
            },
            rewriter: RewriterConfig {
                excluded_files: vec![
                    "data.js".to_string(),
                    "frame.js".to_string(),
                    "paths.js".to_string(),
                    "configuration.js".to_string(),
                ],
                extensions: vec!["js".to_string(), "html".to_string(), "htm".to_string()],
                min_length: default_min_length(),
                aggressive: false,
            },
            job: JobConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LocalizerError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| LocalizerError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LocalizerError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| LocalizerError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn paths(&self) -> WorkspacePaths {
        WorkspacePaths::new(&self.workspace.root)
    }
}

/// Resolved locations inside the workspace root
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    pub root: PathBuf,
    pub uploads: PathBuf,
    pub scorm_src: PathBuf,
    pub scorm_translated: PathBuf,
    pub zips: PathBuf,
    pub metadata: PathBuf,
    pub temp_audio: PathBuf,
    pub translation_cache: PathBuf,
    pub log_dir: PathBuf,
}

impl WorkspacePaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            uploads: root.join("uploads"),
            scorm_src: root.join("static").join("scorm"),
            scorm_translated: root.join("static").join("scorm_translated"),
            zips: root.join("zips"),
            metadata: root.join("metadata.json"),
            temp_audio: root.join("temp_audio"),
            translation_cache: root.join(".cache").join("translations"),
            log_dir: root.join(".scorm-localizer").join("log"),
            root,
        }
    }

    /// Extracted source package
    pub fn source_dir(&self, package_id: &str) -> PathBuf {
        self.scorm_src.join(package_id)
    }

    /// Translated copy of a package
    pub fn translated_dir(&self, package_id: &str, language_code: &str) -> PathBuf {
        self.scorm_translated.join(format!("{}_{}", package_id, language_code))
    }

    /// Downloadable archive of a translated package
    pub fn archive_path(&self, package_id: &str, language_code: &str) -> PathBuf {
        self.zips.join(archive_name(package_id, language_code))
    }

    /// Archive as uploaded
    pub fn upload_path(&self, package_id: &str) -> PathBuf {
        self.uploads.join(format!("{}.zip", package_id))
    }

    /// Directories that must exist before any job runs
    pub fn directories(&self) -> Vec<&Path> {
        vec![
            self.uploads.as_path(),
            self.scorm_src.as_path(),
            self.scorm_translated.as_path(),
            self.zips.as_path(),
            self.temp_audio.as_path(),
        ]
    }
}

pub fn archive_name(package_id: &str, language_code: &str) -> String {
    format!("{}_{}.zip", package_id, language_code)
}
