use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use assert_fs::prelude::*;
use async_trait::async_trait;
use tokio_test::assert_ok;

use scorm_localizer::config::Config;
use scorm_localizer::error::{LocalizerError, Result};
use scorm_localizer::language::Language;
use scorm_localizer::media::MediaProcessorTrait;
use scorm_localizer::package::zip_dir;
use scorm_localizer::progress::ProgressTracker;
use scorm_localizer::synthesize::Synthesizer;
use scorm_localizer::transcribe::Transcriber;
use scorm_localizer::translate::{NamedTranslator, TranslationService, Translator};
use scorm_localizer::workflow::{Services, Workflow};

struct BracketTranslator {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Translator for BracketTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.contains("untranslatable") {
            return Err(LocalizerError::Translation("refused".to_string()));
        }
        Ok(format!("[{}] {}", target_language, text))
    }
}

struct ScriptedTranscriber;

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        // The fake media processor copies the clip bytes into the WAV
        let spoken = tokio::fs::read_to_string(audio_path).await?;
        Ok(spoken)
    }
}

struct EchoSynthesizer;

#[async_trait]
impl Synthesizer for EchoSynthesizer {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>> {
        Ok(format!("MP3<{}>{}", language, text).into_bytes())
    }
}

struct CopyingMedia;

#[async_trait]
impl MediaProcessorTrait for CopyingMedia {
    async fn convert_to_wav(&self, input_path: &Path, output_path: &Path) -> Result<()> {
        tokio::fs::copy(input_path, output_path).await?;
        Ok(())
    }

    async fn transcode(&self, input_path: &Path, output_path: &Path) -> Result<()> {
        tokio::fs::copy(input_path, output_path).await?;
        Ok(())
    }

    async fn check_availability(&self) -> Result<()> {
        Ok(())
    }

    async fn get_version_info(&self) -> Result<String> {
        Ok("fake".to_string())
    }
}

fn workflow(root: &Path, calls: Arc<AtomicUsize>) -> Workflow {
    let mut config = Config::default();
    config.workspace.root = root.to_path_buf();
    config.job.complete_hold_secs = 0;

    let services = Services {
        translator: Arc::new(TranslationService::new(
            vec![NamedTranslator::new("bracket", Box::new(BracketTranslator { calls }))],
            2,
        )),
        transcriber: Arc::new(ScriptedTranscriber),
        synthesizer: Arc::new(EchoSynthesizer),
        media: Arc::new(CopyingMedia),
    };
    Workflow::with_services(config, services, ProgressTracker::new()).unwrap()
}

/// A small Storyline-style package
fn storyline_package(temp: &assert_fs::TempDir) -> PathBuf {
    let course = temp.child("build");
    course
        .child("imsmanifest.xml")
        .write_str(
            r#"<?xml version="1.0"?>
<manifest identifier="course" xmlns="http://www.imsglobal.org/xsd/imscp_v1p1">
  <resources>
    <resource identifier="res1" type="webcontent" xml:base="player/" href="index_lms.html">
      <file href="index_lms.html"/>
    </resource>
  </resources>
</manifest>"#,
        )
        .unwrap();
    course
        .child("player/index_lms.html")
        .write_str("<html><body><h1>Fire Safety</h1></body></html>")
        .unwrap();
    course
        .child("story_content/user.js")
        .write_str(r#"window.slides = [{"title": "Fire Safety"}, {"label": "untranslatable label"}];"#)
        .unwrap();
    course
        .child("story_content/frame.js")
        .write_str(r#"{"title": "Player frame"}"#)
        .unwrap();
    course
        .child("story_content/slide1.html")
        .write_str("<div>\n  Exit the building  \n</div><script>if (a > b) go();</script>")
        .unwrap();
    course
        .child("story_content/audio/intro.mp3")
        .write_str("Welcome to the course")
        .unwrap();
    course
        .child("story_content/audio/outro.wav")
        .write_str("untranslatable mumble")
        .unwrap();

    let zip = temp.path().join("Fire Safety.zip");
    zip_dir(course.path(), &zip).unwrap();
    zip
}

fn archive_entry(archive: &Path, name: &str) -> Option<String> {
    let file = std::fs::File::open(archive).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    let mut entry = zip.by_name(name).ok()?;
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    Some(content)
}

#[tokio::test]
async fn import_translate_and_launch() {
    let temp = assert_fs::TempDir::new().unwrap();
    let zip = storyline_package(&temp);
    let calls = Arc::new(AtomicUsize::new(0));
    let workflow = workflow(&temp.path().join("workspace"), calls.clone());

    let record = assert_ok!(workflow.import_package(&zip).await);
    assert_eq!(record.launch_file.as_deref(), Some("player/index_lms.html"));

    let french = Language::resolve("French").unwrap();
    let summary = assert_ok!(
        workflow
            .spawn_translation(record.id.clone(), french, true)
            .await
            .unwrap()
    );

    // Text root is story_content: user.js, frame.js (excluded) and slide1.html
    assert_eq!(summary.text_files, 3);
    assert_eq!(summary.strings_replaced, 2);
    assert_eq!(summary.audio.translated, 1);
    assert_eq!(summary.audio.restored, 1);
    // Failing strings are retried
    assert_eq!(calls.load(Ordering::SeqCst), 7);

    let archive = &summary.archive;
    assert_eq!(
        archive_entry(archive, "story_content/user.js").unwrap(),
        r#"window.slides = [{"title": "[fr] Fire Safety"}, {"label": "untranslatable label"}];"#
    );
    assert_eq!(
        archive_entry(archive, "story_content/frame.js").unwrap(),
        r#"{"title": "Player frame"}"#
    );
    assert_eq!(
        archive_entry(archive, "story_content/slide1.html").unwrap(),
        "<div>\n  [fr] Exit the building  \n</div><script>if (a > b) go();</script>"
    );
    // The launch page sits outside the text root
    assert_eq!(
        archive_entry(archive, "player/index_lms.html").unwrap(),
        "<html><body><h1>Fire Safety</h1></body></html>"
    );
    assert_eq!(
        archive_entry(archive, "story_content/audio/intro.mp3").unwrap(),
        "MP3<fr>[fr] Welcome to the course"
    );
    assert_eq!(
        archive_entry(archive, "story_content/audio/outro.wav").unwrap(),
        "untranslatable mumble"
    );
    assert!(archive_entry(archive, "story_content/audio/outro.wav.original").is_none());

    // The source package is untouched
    let source_js = workflow.paths().source_dir(&record.id).join("story_content/user.js");
    assert!(std::fs::read_to_string(source_js).unwrap().contains(r#""title": "Fire Safety""#));

    let library = assert_ok!(workflow.library());
    let translation = &library[0].translations["fr"];
    assert_eq!(translation.language, "French");
    assert_eq!(translation.audio_files_translated, 1);
    assert!(workflow.progress().get(&record.id).is_idle());

    let launch = assert_ok!(workflow.launch_file(&record.id, "fr").await);
    assert_eq!(
        launch,
        workflow.paths().translated_dir(&record.id, "fr").join("player/index_lms.html")
    );
}

#[tokio::test]
async fn retranslation_replaces_the_previous_copy() {
    let temp = assert_fs::TempDir::new().unwrap();
    let zip = storyline_package(&temp);
    let workflow = workflow(&temp.path().join("workspace"), Arc::new(AtomicUsize::new(0)));
    let record = workflow.import_package(&zip).await.unwrap();
    let german = Language::resolve("de").unwrap();

    workflow.translate_package(&record.id, german, false).await.unwrap();
    let stray = workflow.paths().translated_dir(&record.id, "de").join("stray.txt");
    std::fs::write(&stray, "left over").unwrap();

    let summary = workflow.translate_package(&record.id, german, false).await.unwrap();
    assert!(!stray.exists());
    assert_eq!(summary.audio.translated, 0);
    // Audio untouched when not requested
    let intro = summary.translated_dir.join("story_content/audio/intro.mp3");
    assert_eq!(std::fs::read_to_string(intro).unwrap(), "Welcome to the course");
}

#[tokio::test]
async fn progress_reports_final_state_before_reset() {
    let temp = assert_fs::TempDir::new().unwrap();
    let zip = storyline_package(&temp);
    let workflow = workflow(&temp.path().join("workspace"), Arc::new(AtomicUsize::new(0)));
    let record = workflow.import_package(&zip).await.unwrap();
    let korean = Language::resolve("Korean").unwrap();

    workflow.translate_package(&record.id, korean, false).await.unwrap();
    let progress = workflow.progress().get(&record.id);
    assert_eq!(progress.message, "Translation complete (Korean)");
    assert_eq!(progress.percent, 100);
}
