use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::audio::{find_audio_files, AudioLocalizer, AudioReport};
use crate::config::{Config, WorkspacePaths};
use crate::error::{Result, LocalizerError};
use crate::language::{Language, LANGUAGES};
use crate::manifest::resolve_launch_file;
use crate::media::{MediaProcessorFactory, MediaProcessorTrait};
use crate::metadata::{CourseRecord, MetadataStore};
use crate::package::{copy_tree, extract_zip, remove_dir_if_exists, zip_dir};
use crate::progress::ProgressTracker;
use crate::rewrite::TextRewriter;
use crate::synthesize::{Synthesizer, SynthesizerFactory};
use crate::transcribe::{Transcriber, TranscriberFactory};
use crate::translate::TranslationService;

/// Text roots tried in order below a package copy; the package root is the last resort
const TEXT_ROOTS: [&str; 2] = ["story_content", "scormcontent"];

/// External services the job depends on
pub struct Services {
    pub translator: Arc<TranslationService>,
    pub transcriber: Arc<dyn Transcriber>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub media: Arc<dyn MediaProcessorTrait>,
}

impl Services {
    pub fn from_config(config: &Config) -> Result<Self> {
        let paths = config.paths();
        Ok(Self {
            translator: Arc::new(TranslationService::from_config(
                &config.translate,
                &paths.translation_cache,
            )?),
            transcriber: Arc::from(TranscriberFactory::create_transcriber(&config.transcriber)?),
            synthesizer: Arc::from(SynthesizerFactory::create_synthesizer(&config.synthesizer)?),
            media: Arc::from(MediaProcessorFactory::create_processor(config.media.clone())),
        })
    }
}

/// Outcome of one translation job
#[derive(Debug, Clone)]
pub struct TranslationSummary {
    pub package_id: String,
    pub language: Language,
    pub translated_dir: PathBuf,
    pub archive: PathBuf,
    pub text_files: usize,
    pub strings_replaced: usize,
    pub audio: AudioReport,
}

/// Drives imports and translation jobs over the workspace.
/// Cheap to clone; clones share services, metadata and progress.
#[derive(Clone)]
pub struct Workflow {
    config: Arc<Config>,
    paths: Arc<WorkspacePaths>,
    metadata: Arc<MetadataStore>,
    progress: ProgressTracker,
    translator: Arc<TranslationService>,
    rewriter: Arc<TextRewriter>,
    audio: Arc<AudioLocalizer>,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        let services = Services::from_config(&config)?;
        Self::with_services(config, services, ProgressTracker::new())
    }

    pub fn with_services(config: Config, services: Services, progress: ProgressTracker) -> Result<Self> {
        let paths = config.paths();
        let rewriter = TextRewriter::new(&config.rewriter, services.translator.clone())?;
        let audio = AudioLocalizer::new(
            services.transcriber,
            services.translator.clone(),
            services.synthesizer,
            services.media,
            paths.temp_audio.clone(),
        );

        Ok(Self {
            metadata: Arc::new(MetadataStore::new(&paths.metadata)),
            paths: Arc::new(paths),
            config: Arc::new(config),
            progress,
            translator: services.translator,
            rewriter: Arc::new(rewriter),
            audio: Arc::new(audio),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn paths(&self) -> &WorkspacePaths {
        &self.paths
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn translator(&self) -> &TranslationService {
        &self.translator
    }

    /// Store and extract an uploaded SCORM zip, detect its launch page and
    /// register it in the library
    pub async fn import_package(&self, zip_path: &Path) -> Result<CourseRecord> {
        let is_zip = zip_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
        if !is_zip {
            return Err(LocalizerError::InvalidPackage(format!(
                "{} is not a .zip file",
                zip_path.display()
            )));
        }
        if !zip_path.is_file() {
            return Err(LocalizerError::InvalidPackage(format!(
                "{} does not exist",
                zip_path.display()
            )));
        }

        let original_name = zip_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let filename = zip_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let package_id = new_package_id(&original_name);

        let upload = self.paths.upload_path(&package_id);
        let source_dir = self.paths.source_dir(&package_id);
        tokio::fs::create_dir_all(&self.paths.uploads).await?;
        tokio::fs::create_dir_all(&source_dir).await?;
        tokio::fs::copy(zip_path, &upload).await?;

        let extracted = {
            let upload = upload.clone();
            let source_dir = source_dir.clone();
            run_blocking(move || extract_zip(&upload, &source_dir)).await
        };
        let file_count = match extracted {
            Ok(count) => count,
            Err(e) => {
                warn!("Extraction of {} failed: {}", filename, e);
                let _ = remove_dir_if_exists(&source_dir);
                let _ = tokio::fs::remove_file(&upload).await;
                return Err(e);
            }
        };
        info!("Extracted {} files to {}", file_count, source_dir.display());

        let launch_file = resolve_launch_file(&source_dir).and_then(|p| relative_to(&p, &source_dir));
        match &launch_file {
            Some(launch) => info!("Cached launch file at import: {}", launch),
            None => warn!("No launch file detected for {}; will retry at launch", package_id),
        }

        self.metadata
            .add_course(&package_id, &filename, &original_name, launch_file.as_deref())
    }

    /// Copy a package, translate its text assets and optionally its narration,
    /// then zip the result and record it
    pub async fn translate_package(
        &self,
        package_id: &str,
        language: Language,
        translate_audio: bool,
    ) -> Result<TranslationSummary> {
        let source_dir = self.paths.source_dir(package_id);
        let target_dir = self.paths.translated_dir(package_id, language.code);

        if !source_dir.is_dir() {
            self.progress.set(package_id, "Source not found", 0);
            return Err(LocalizerError::PackageNotFound(package_id.to_string()));
        }
        info!("Translating {} into {}", package_id, language);

        self.progress.set(package_id, "Copying course files for translation...", 5);
        {
            let source_dir = source_dir.clone();
            let target_dir = target_dir.clone();
            run_blocking(move || {
                remove_dir_if_exists(&target_dir)?;
                copy_tree(&source_dir, &target_dir)
            })
            .await?;
        }

        self.progress.set(package_id, "Translating text files...", 15);
        let text_root = text_root(&target_dir);
        let text_files = self.rewriter.collect_text_files(&text_root);
        let total = text_files.len();
        let mut strings_replaced = 0;
        for (index, file) in text_files.iter().enumerate() {
            match self.rewriter.rewrite_file(file, language.code).await {
                Ok(report) => strings_replaced += report.replaced,
                Err(e) => warn!("Skipping {}: {}", file.display(), e),
            }
            let done = index + 1;
            self.progress.set(
                package_id,
                format!("Translated {}/{} text files...", done, total),
                (15 + done * 40 / total.max(1)) as u32,
            );
        }

        let audio = if translate_audio {
            let audio_files = find_audio_files(&target_dir);
            let progress = self.progress.clone();
            let job = package_id.to_string();
            self.audio
                .localize_all(&audio_files, language.code, move |index, total| {
                    let current = index + 1;
                    progress.set(
                        &job,
                        format!("Translating audio {}/{}...", current, total),
                        (60 + current * 30 / total.max(1)) as u32,
                    );
                })
                .await
        } else {
            AudioReport::default()
        };

        self.progress.set(package_id, "Packaging translated SCORM...", 95);
        let archive = self.paths.archive_path(package_id, language.code);
        {
            let target_dir = target_dir.clone();
            let archive = archive.clone();
            run_blocking(move || {
                if let Some(parent) = archive.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                zip_dir(&target_dir, &archive)
            })
            .await?;
        }

        self.metadata
            .add_translation(package_id, language.code, language.name, audio.translated)?;
        self.progress.set(
            package_id,
            format!("Translation complete ({})", language.name),
            100,
        );
        info!("Translation of {} into {} written to {}", package_id, language.name, archive.display());

        Ok(TranslationSummary {
            package_id: package_id.to_string(),
            language,
            translated_dir: target_dir,
            archive,
            text_files: total,
            strings_replaced,
            audio,
        })
    }

    /// Run `translate_package` on a background task. Failures are published
    /// as `Error: ...`; a finished job stays visible for
    /// `job.complete_hold_secs` before the tracker returns to idle.
    pub fn spawn_translation(
        &self,
        package_id: String,
        language: Language,
        translate_audio: bool,
    ) -> JoinHandle<Result<TranslationSummary>> {
        let workflow = self.clone();
        tokio::spawn(async move {
            let result = workflow
                .translate_package(&package_id, language, translate_audio)
                .await;

            match &result {
                Ok(_) => {
                    let hold = workflow.config.job.complete_hold_secs;
                    tokio::time::sleep(Duration::from_secs(hold)).await;
                    workflow.progress.reset(&package_id);
                }
                // "Source not found" is already published
                Err(LocalizerError::PackageNotFound(_)) => {}
                Err(e) => {
                    error!("Translation of {} failed: {}", package_id, e);
                    workflow.progress.set(&package_id, format!("Error: {}", e), 0);
                }
            }
            result
        })
    }

    /// Launch page of a package or one of its translations.
    ///
    /// The cached launch file is stored relative to the package folder, so
    /// it applies to translated copies as well. When it is missing the page
    /// is detected again and the cache refreshed.
    pub async fn launch_file(&self, package_id: &str, language_code: &str) -> Result<PathBuf> {
        let language = Language::resolve(language_code)?;
        let folder = if language.is_source() {
            self.paths.source_dir(package_id)
        } else {
            self.paths.translated_dir(package_id, language.code)
        };

        if !folder.is_dir() {
            return Err(if language.is_source() {
                LocalizerError::PackageNotFound(package_id.to_string())
            } else {
                LocalizerError::TranslationNotFound {
                    package: package_id.to_string(),
                    language: language.code.to_string(),
                }
            });
        }

        let cached = self
            .metadata
            .get_course(package_id)?
            .and_then(|record| record.launch_file);
        if let Some(relative) = cached {
            let candidate = folder.join(&relative);
            if candidate.is_file() {
                return Ok(candidate);
            }
            warn!("Cached launch file {} missing in {}", relative, folder.display());
        }

        let launch = resolve_launch_file(&folder)
            .ok_or_else(|| LocalizerError::LaunchFileNotFound(folder.display().to_string()))?;
        if let Some(relative) = relative_to(&launch, &folder) {
            self.metadata.set_launch_file(package_id, &relative)?;
        }
        Ok(launch)
    }

    /// Archive of a finished translation
    pub fn translation_archive(&self, package_id: &str, language_code: &str) -> Result<PathBuf> {
        let archive = self.paths.archive_path(package_id, language_code);
        if archive.is_file() {
            Ok(archive)
        } else {
            Err(LocalizerError::TranslationNotFound {
                package: package_id.to_string(),
                language: language_code.to_string(),
            })
        }
    }

    /// Remove a package with every translation, archive and its record.
    /// Returns the number of files and folders removed.
    pub async fn delete_course(&self, package_id: &str) -> Result<usize> {
        let mut removed = 0;

        let mut folders = vec![self.paths.source_dir(package_id)];
        let mut files = vec![self.paths.upload_path(package_id)];
        for language in LANGUAGES.iter() {
            folders.push(self.paths.translated_dir(package_id, language.code));
            files.push(self.paths.archive_path(package_id, language.code));
        }

        for folder in folders {
            if run_blocking(move || remove_dir_if_exists(&folder)).await? {
                removed += 1;
            }
        }
        for file in files {
            if file.is_file() {
                tokio::fs::remove_file(&file).await?;
                removed += 1;
            }
        }

        let record = self.metadata.remove_course(package_id)?;
        if record.is_none() && removed == 0 {
            return Err(LocalizerError::PackageNotFound(package_id.to_string()));
        }
        info!("Deleted {} ({} paths removed)", package_id, removed);
        Ok(removed)
    }

    /// Imported courses, most recent first
    pub fn library(&self) -> Result<Vec<CourseRecord>> {
        self.metadata.list_courses()
    }

    /// Translate a single string outside of any package
    pub async fn translate_snippet(&self, text: &str, language: Language) -> Result<String> {
        self.translator.translate(text, language.code).await
    }
}

/// `<stem>-<5 hex chars>`
fn new_package_id(stem: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", stem, &suffix[..5])
}

/// Directory whose script and markup assets are translated
fn text_root(package_dir: &Path) -> PathBuf {
    TEXT_ROOTS
        .iter()
        .map(|name| package_dir.join(name))
        .find(|dir| dir.is_dir())
        .unwrap_or_else(|| package_dir.to_path_buf())
}

/// `/`-separated path of `path` below `base`
fn relative_to(path: &Path, base: &Path) -> Option<String> {
    pathdiff::diff_paths(path, base).map(|p| {
        p.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    })
}

async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| LocalizerError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MockMediaProcessorTrait;
    use crate::progress::Progress;
    use crate::synthesize::MockSynthesizer;
    use crate::transcribe::MockTranscriber;
    use crate::translate::{MockTranslator, NamedTranslator};
    use assert_fs::prelude::*;
    use parking_lot::Mutex;

    fn config(root: &Path) -> Config {
        let mut config = Config::default();
        config.workspace.root = root.to_path_buf();
        config.job.complete_hold_secs = 0;
        config
    }

    fn service(translator: MockTranslator) -> Arc<TranslationService> {
        Arc::new(TranslationService::new(
            vec![NamedTranslator::new("mock", Box::new(translator))],
            1,
        ))
    }

    fn workflow(root: &Path) -> Workflow {
        let mut translator = MockTranslator::new();
        translator
            .expect_translate()
            .returning(|text, target| Ok(format!("[{}] {}", target, text)));

        let mut transcriber = MockTranscriber::new();
        transcriber.expect_transcribe().returning(|_| Ok(String::new()));

        let services = Services {
            translator: service(translator),
            transcriber: Arc::new(transcriber),
            synthesizer: Arc::new(MockSynthesizer::new()),
            media: Arc::new(MockMediaProcessorTrait::new()),
        };
        Workflow::with_services(config(root), services, ProgressTracker::new()).unwrap()
    }

    fn course_zip(dir: &assert_fs::TempDir) -> PathBuf {
        let course = dir.child("course");
        course
            .child("imsmanifest.xml")
            .write_str(
                r#"<manifest><resources><resource identifier="r1" adlcp:scormType="sco" href="story.html"/></resources></manifest>"#,
            )
            .unwrap();
        course.child("story.html").write_str("<h1>Safety basics</h1>").unwrap();
        course
            .child("story_content/user.js")
            .write_str(r#"var s = {"title": "Lesson one"};"#)
            .unwrap();
        let zip = dir.path().join("Safety Course.zip");
        zip_dir(course.path(), &zip).unwrap();
        zip
    }

    #[test]
    fn package_ids_carry_the_stem_and_five_hex_chars() {
        let id = new_package_id("Safety Course");
        let (stem, suffix) = id.rsplit_once('-').unwrap();
        assert_eq!(stem, "Safety Course");
        assert_eq!(suffix.len(), 5);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn text_root_prefers_storyline_content() {
        let temp = assert_fs::TempDir::new().unwrap();
        assert_eq!(text_root(temp.path()), temp.path());

        temp.child("scormcontent/index.html").write_str("").unwrap();
        assert_eq!(text_root(temp.path()), temp.path().join("scormcontent"));

        temp.child("story_content/user.js").write_str("").unwrap();
        assert_eq!(text_root(temp.path()), temp.path().join("story_content"));
    }

    #[tokio::test]
    async fn import_rejects_non_zip_files() {
        let temp = assert_fs::TempDir::new().unwrap();
        let notes = temp.child("notes.txt");
        notes.write_str("hello").unwrap();

        let err = workflow(temp.path()).import_package(notes.path()).await.unwrap_err();
        assert!(matches!(err, LocalizerError::InvalidPackage(_)));
    }

    #[tokio::test]
    async fn failed_extraction_leaves_nothing_behind() {
        let temp = assert_fs::TempDir::new().unwrap();
        let broken = temp.child("broken.zip");
        broken.write_binary(b"not a zip archive").unwrap();
        let workspace = temp.child("ws");

        let workflow = workflow(workspace.path());
        assert!(workflow.import_package(broken.path()).await.is_err());

        let leftovers = std::fs::read_dir(&workflow.paths().scorm_src).unwrap().count();
        assert_eq!(leftovers, 0);
        assert!(workflow.library().unwrap().is_empty());
    }

    #[tokio::test]
    async fn import_registers_course_with_launch_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let zip = course_zip(&temp);
        let workflow = workflow(&temp.path().join("ws"));

        let record = workflow.import_package(&zip).await.unwrap();
        assert!(record.id.starts_with("Safety Course-"));
        assert_eq!(record.original_name, "Safety Course");
        assert_eq!(record.filename, "Safety Course.zip");
        assert_eq!(record.launch_file.as_deref(), Some("story.html"));
        assert!(workflow.paths().upload_path(&record.id).is_file());

        let launch = workflow.launch_file(&record.id, "en").await.unwrap();
        assert_eq!(launch, workflow.paths().source_dir(&record.id).join("story.html"));
    }

    #[tokio::test]
    async fn translation_job_rewrites_zips_and_records() {
        let temp = assert_fs::TempDir::new().unwrap();
        let zip = course_zip(&temp);
        let workflow = workflow(&temp.path().join("ws"));
        let record = workflow.import_package(&zip).await.unwrap();
        let french = Language::resolve("French").unwrap();

        let summary = workflow
            .spawn_translation(record.id.clone(), french, false)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary.text_files, 1);
        assert_eq!(summary.strings_replaced, 1);
        assert!(summary.archive.is_file());
        let user_js = std::fs::read_to_string(summary.translated_dir.join("story_content/user.js")).unwrap();
        assert_eq!(user_js, r#"var s = {"title": "[fr] Lesson one"};"#);
        // Outside the text root
        let story = std::fs::read_to_string(summary.translated_dir.join("story.html")).unwrap();
        assert_eq!(story, "<h1>Safety basics</h1>");

        let stored = workflow.library().unwrap().remove(0);
        assert_eq!(stored.translations["fr"].zip_file, format!("{}_fr.zip", record.id));
        assert!(workflow.progress().get(&record.id).is_idle());

        let launch = workflow.launch_file(&record.id, "fr").await.unwrap();
        assert_eq!(launch, summary.translated_dir.join("story.html"));
        assert_eq!(workflow.translation_archive(&record.id, "fr").unwrap(), summary.archive);
    }

    #[tokio::test]
    async fn missing_source_publishes_progress() {
        let temp = assert_fs::TempDir::new().unwrap();
        let workflow = workflow(temp.path());
        let german = Language::resolve("de").unwrap();

        let result = workflow.spawn_translation("ghost-12345".to_string(), german, true).await.unwrap();
        assert!(matches!(result, Err(LocalizerError::PackageNotFound(_))));

        let progress = workflow.progress().get("ghost-12345");
        assert_eq!(progress.message, "Source not found");
        assert_eq!(progress.percent, 0);
    }

    #[tokio::test]
    async fn missing_translation_is_reported() {
        let temp = assert_fs::TempDir::new().unwrap();
        let zip = course_zip(&temp);
        let workflow = workflow(&temp.path().join("ws"));
        let record = workflow.import_package(&zip).await.unwrap();

        assert!(matches!(
            workflow.launch_file(&record.id, "ja").await,
            Err(LocalizerError::TranslationNotFound { .. })
        ));
        assert!(workflow.translation_archive(&record.id, "ja").is_err());
        assert!(matches!(
            workflow.launch_file(&record.id, "klingon").await,
            Err(LocalizerError::UnsupportedLanguage(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_every_artifact() {
        let temp = assert_fs::TempDir::new().unwrap();
        let zip = course_zip(&temp);
        let workflow = workflow(&temp.path().join("ws"));
        let record = workflow.import_package(&zip).await.unwrap();
        let spanish = Language::resolve("es").unwrap();
        workflow.translate_package(&record.id, spanish, false).await.unwrap();

        let removed = workflow.delete_course(&record.id).await.unwrap();
        assert_eq!(removed, 4);
        assert!(!workflow.paths().source_dir(&record.id).exists());
        assert!(!workflow.paths().translated_dir(&record.id, "es").exists());
        assert!(!workflow.paths().archive_path(&record.id, "es").exists());
        assert!(workflow.library().unwrap().is_empty());

        assert!(matches!(
            workflow.delete_course(&record.id).await,
            Err(LocalizerError::PackageNotFound(_))
        ));
    }

    #[tokio::test]
    async fn progress_follows_text_and_audio_files() {
        let temp = assert_fs::TempDir::new().unwrap();
        let course = temp.child("course");
        course.child("index.html").write_str("<p>Start</p>").unwrap();
        course.child("story_content/a.js").write_str(r#"{"text": "Lesson one"}"#).unwrap();
        course.child("story_content/b.js").write_str(r#"{"text": "Lesson two"}"#).unwrap();
        course.child("story_content/audio/1.mp3").write_binary(b"ONE").unwrap();
        course.child("story_content/audio/2.mp3").write_binary(b"TWO").unwrap();
        let zip = temp.path().join("Narrated.zip");
        zip_dir(course.path(), &zip).unwrap();

        // Each translation records the state published just before it
        let progress = ProgressTracker::new();
        let seen: Arc<Mutex<Vec<(String, Progress)>>> = Arc::default();
        let mut translator = MockTranslator::new();
        {
            let progress = progress.clone();
            let seen = seen.clone();
            translator.expect_translate().returning(move |text, _| {
                let state = progress.snapshot().into_values().next().unwrap_or_else(Progress::idle);
                seen.lock().push((text.to_string(), state));
                Ok(format!("FR {}", text))
            });
        }
        let mut transcriber = MockTranscriber::new();
        transcriber.expect_transcribe().returning(|_| Ok("Hello".to_string()));
        let mut synthesizer = MockSynthesizer::new();
        synthesizer.expect_synthesize().returning(|_, _| Ok(b"MP3-FR".to_vec()));
        let mut media = MockMediaProcessorTrait::new();
        media.expect_convert_to_wav().returning(|_, _| Ok(()));

        let services = Services {
            translator: service(translator),
            transcriber: Arc::new(transcriber),
            synthesizer: Arc::new(synthesizer),
            media: Arc::new(media),
        };
        let workflow =
            Workflow::with_services(config(&temp.path().join("ws")), services, progress.clone()).unwrap();
        let record = workflow.import_package(&zip).await.unwrap();
        let french = Language::resolve("fr").unwrap();

        let summary = workflow.translate_package(&record.id, french, true).await.unwrap();
        assert_eq!(summary.audio.translated, 2);

        let states: Vec<(String, String, u8)> = seen
            .lock()
            .iter()
            .map(|(text, p)| (text.clone(), p.message.clone(), p.percent))
            .collect();
        let expected = [
            ("Lesson one", "Translating text files...", 15),
            ("Lesson two", "Translated 1/2 text files...", 35),
            ("Hello", "Translating audio 1/2...", 75),
            ("Hello", "Translating audio 2/2...", 90),
        ];
        let expected: Vec<(String, String, u8)> = expected
            .iter()
            .map(|(t, m, p)| (t.to_string(), m.to_string(), *p))
            .collect();
        assert_eq!(states, expected);

        let last = progress.get(&record.id);
        assert_eq!(last.message, "Translation complete (French)");
        assert_eq!(last.percent, 100);
    }

    #[tokio::test]
    async fn failed_job_publishes_error_state() {
        let temp = assert_fs::TempDir::new().unwrap();
        let zip = course_zip(&temp);
        let workflow = workflow(&temp.path().join("ws"));
        let record = workflow.import_package(&zip).await.unwrap();
        // Archives cannot be written below a regular file
        std::fs::write(&workflow.paths().zips, b"occupied").unwrap();
        let korean = Language::resolve("ko").unwrap();

        let result = workflow.spawn_translation(record.id.clone(), korean, false).await.unwrap();
        assert!(matches!(result, Err(LocalizerError::Io(_))));

        let progress = workflow.progress().get(&record.id);
        assert!(progress.is_error(), "unexpected state {:?}", progress);
        assert!(progress.message.starts_with("Error: IO error"));
        assert_eq!(progress.percent, 0);
        assert!(workflow.library().unwrap()[0].translations.is_empty());
    }

    #[tokio::test]
    async fn snippets_go_through_the_translator() {
        let temp = assert_fs::TempDir::new().unwrap();
        let workflow = workflow(temp.path());
        let italian = Language::resolve("Italian").unwrap();
        assert_eq!(
            workflow.translate_snippet("Good luck", italian).await.unwrap(),
            "[it] Good luck"
        );
    }
}
