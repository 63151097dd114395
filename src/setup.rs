use std::path::Path;

use tracing::{info, warn};

use crate::config::{Config, TranscriptionMode, WorkspacePaths};
use crate::error::Result;
use crate::media::MediaProcessorTrait;
use crate::transcribe::TranscriberFactory;
use crate::translate::TranslationService;

/// Sentence used to probe the translation providers
pub const PROBE_TEXT: &str = "Hello, this is a test";
const PROBE_LANGUAGE: &str = "fr";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self { name, passed: true, detail: detail.into() }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self { name, passed: false, detail: detail.into() }
    }
}

pub struct SetupManager {
    paths: WorkspacePaths,
}

impl SetupManager {
    /// Create the workspace directory layout
    pub fn new(config: &Config) -> Result<Self> {
        let paths = config.paths();
        for dir in paths.directories() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::create_dir_all(&paths.translation_cache)?;
        info!("Workspace ready at {}", paths.root.display());
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &WorkspacePaths {
        &self.paths
    }

    /// Probe the external tools and services a translation job needs
    pub async fn run_checks(
        &self,
        config: &Config,
        translator: &TranslationService,
        media: &dyn MediaProcessorTrait,
    ) -> Vec<CheckResult> {
        let mut results = Vec::new();

        results.push(match media.get_version_info().await {
            Ok(version) => CheckResult::pass("ffmpeg", version),
            Err(e) => CheckResult::fail("ffmpeg", e.to_string()),
        });

        results.push(match translator.translate(PROBE_TEXT, PROBE_LANGUAGE).await {
            Ok(translated) => CheckResult::pass(
                "translation",
                format!("\"{}\" -> \"{}\"", PROBE_TEXT, translated),
            ),
            Err(e) => CheckResult::fail("translation", e.to_string()),
        });

        results.push(check_transcriber(config));

        for result in &results {
            if result.passed {
                info!("{}: ok ({})", result.name, result.detail);
            } else {
                warn!("{}: FAILED ({})", result.name, result.detail);
            }
        }
        results
    }
}

fn check_transcriber(config: &Config) -> CheckResult {
    let transcriber = &config.transcriber;
    let detail = TranscriberFactory::describe(transcriber);
    match transcriber.mode {
        TranscriptionMode::Command if !Path::new(&transcriber.model_path).is_file() => {
            CheckResult::fail("transcriber", format!("{}: model file not found", detail))
        }
        _ => CheckResult::pass("transcriber", detail),
    }
}
