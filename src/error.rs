use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocalizerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Transcription error: {0}")]
    Transcriber(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Package not found: {0}")]
    PackageNotFound(String),

    #[error("No translation of {package} for language '{language}'")]
    TranslationNotFound { package: String, language: String },

    #[error("No valid launch file found in {0}")]
    LaunchFileNotFound(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Invalid package: {0}")]
    InvalidPackage(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, LocalizerError>;
