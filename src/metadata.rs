//! Flat-file JSON record of uploaded packages and their finished translations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::archive_name;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRecord {
    /// Display name of the target language
    pub language: String,
    pub created_at: DateTime<Local>,
    pub zip_file: String,
    pub audio_files_translated: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub id: String,
    pub original_name: String,
    pub filename: String,
    pub uploaded_at: DateTime<Local>,
    #[serde(default)]
    pub translations: BTreeMap<String, TranslationRecord>,
    /// Launch page relative to the package folder
    #[serde(default)]
    pub launch_file: Option<String>,
}

pub type MetadataMap = BTreeMap<String, CourseRecord>;

pub struct MetadataStore {
    path: PathBuf,
    // Serialises read-modify-write cycles within the process
    lock: Mutex<()>,
}

impl MetadataStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the whole document.
    ///
    /// A missing or empty file is an empty store. A file that does not parse
    /// is copied aside to `metadata.json.backup` and treated as empty, so one
    /// bad write never blocks new uploads.
    pub fn load(&self) -> Result<MetadataMap> {
        let _guard = self.lock.lock();
        self.load_unlocked()
    }

    pub fn save(&self, data: &MetadataMap) -> Result<()> {
        let _guard = self.lock.lock();
        self.save_unlocked(data)
    }

    /// Register an upload. Existing records keep their fields; only the
    /// launch file is refreshed when one is supplied.
    pub fn add_course(
        &self,
        id: &str,
        filename: &str,
        original_name: &str,
        launch_file: Option<&str>,
    ) -> Result<CourseRecord> {
        self.update(|meta| {
            let record = meta.entry(id.to_string()).or_insert_with(|| CourseRecord {
                id: id.to_string(),
                original_name: original_name.to_string(),
                filename: filename.to_string(),
                uploaded_at: Local::now(),
                translations: BTreeMap::new(),
                launch_file: None,
            });
            if let Some(launch) = launch_file {
                record.launch_file = Some(launch.to_string());
            }
            record.clone()
        })
    }

    /// Record a finished translation. Unknown packages are ignored.
    pub fn add_translation(
        &self,
        id: &str,
        language_code: &str,
        language_name: &str,
        audio_count: usize,
    ) -> Result<Option<CourseRecord>> {
        self.update(|meta| {
            let record = meta.get_mut(id)?;
            record.translations.insert(
                language_code.to_string(),
                TranslationRecord {
                    language: language_name.to_string(),
                    created_at: Local::now(),
                    zip_file: archive_name(id, language_code),
                    audio_files_translated: audio_count,
                },
            );
            Some(record.clone())
        })
    }

    pub fn set_launch_file(&self, id: &str, launch_file: &str) -> Result<()> {
        self.update(|meta| {
            if let Some(record) = meta.get_mut(id) {
                record.launch_file = Some(launch_file.to_string());
            }
        })
    }

    pub fn get_course(&self, id: &str) -> Result<Option<CourseRecord>> {
        Ok(self.load()?.remove(id))
    }

    pub fn remove_course(&self, id: &str) -> Result<Option<CourseRecord>> {
        self.update(|meta| meta.remove(id))
    }

    /// All courses, most recent upload first
    pub fn list_courses(&self) -> Result<Vec<CourseRecord>> {
        let mut courses: Vec<CourseRecord> = self.load()?.into_values().collect();
        courses.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(courses)
    }

    fn update<T>(&self, apply: impl FnOnce(&mut MetadataMap) -> T) -> Result<T> {
        let _guard = self.lock.lock();
        let mut meta = self.load_unlocked()?;
        let result = apply(&mut meta);
        self.save_unlocked(&meta)?;
        Ok(result)
    }

    fn load_unlocked(&self) -> Result<MetadataMap> {
        if !self.path.exists() {
            return Ok(MetadataMap::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(MetadataMap::new());
        }

        match serde_json::from_str(&content) {
            Ok(meta) => Ok(meta),
            Err(e) => {
                let backup = self.sibling("json.backup");
                std::fs::copy(&self.path, &backup)?;
                warn!("Corrupted metadata ({}) backed up to {}", e, backup.display());
                Ok(MetadataMap::new())
            }
        }
    }

    fn save_unlocked(&self, data: &MetadataMap) -> Result<()> {
        let content = serde_json::to_string_pretty(data)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        match std::fs::write(&self.path, &content) {
            Ok(()) => {
                debug!("Saved metadata for {} courses", data.len());
                Ok(())
            }
            Err(e) => {
                error!("Error saving metadata to {}: {}", self.path.display(), e);
                let emergency = self.sibling("json.emergency");
                match std::fs::write(&emergency, &content) {
                    Ok(()) => warn!("Metadata saved to emergency backup: {}", emergency.display()),
                    Err(e2) => error!("Emergency metadata backup failed: {}", e2),
                }
                Err(e.into())
            }
        }
    }

    fn sibling(&self, extension: &str) -> PathBuf {
        self.path.with_extension(extension)
    }
}
