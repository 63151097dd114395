use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{Result, LocalizerError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationCacheEntry {
    pub source_text: String,
    pub target_language: String,
    pub translation: String,
    pub provider: String,
    pub cached_at: u64,
}

/// Translations persisted as one JSON file per string, fronted by an
/// in-memory map for the lifetime of the process
pub struct TranslationCache {
    cache_dir: PathBuf,
    memory: Mutex<HashMap<String, String>>,
}

impl TranslationCache {
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Self {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        if let Err(e) = std::fs::create_dir_all(&cache_dir) {
            warn!("Failed to create translation cache directory: {}", e);
        }

        Self {
            cache_dir,
            memory: Mutex::new(HashMap::new()),
        }
    }

    /// Stable key for a source string and target language
    pub fn cache_key(source_text: &str, target_language: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(target_language.to_lowercase().as_bytes());
        hasher.update([0u8]);
        hasher.update(source_text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub async fn get(&self, source_text: &str, target_language: &str) -> Option<String> {
        let key = Self::cache_key(source_text, target_language);

        if let Some(hit) = self.memory.lock().get(&key).cloned() {
            return Some(hit);
        }

        let cache_file = self.entry_path(&key);
        let content = tokio::fs::read_to_string(&cache_file).await.ok()?;
        match serde_json::from_str::<TranslationCacheEntry>(&content) {
            Ok(entry) => {
                debug!("Translation cache hit: {}", key);
                self.memory.lock().insert(key, entry.translation.clone());
                Some(entry.translation)
            }
            Err(e) => {
                warn!("Failed to parse translation cache entry {}: {}", cache_file.display(), e);
                None
            }
        }
    }

    pub async fn put(
        &self,
        source_text: &str,
        target_language: &str,
        translation: &str,
        provider: &str,
    ) -> Result<()> {
        let key = Self::cache_key(source_text, target_language);
        self.memory.lock().insert(key.clone(), translation.to_string());

        let entry = TranslationCacheEntry {
            source_text: source_text.to_string(),
            target_language: target_language.to_string(),
            translation: translation.to_string(),
            provider: provider.to_string(),
            cached_at: now_secs(),
        };

        let content = serde_json::to_string_pretty(&entry)
            .map_err(|e| LocalizerError::Translation(format!("Failed to serialize translation cache: {}", e)))?;
        tokio::fs::write(self.entry_path(&key), content).await?;
        debug!("Saved translation to cache: {}", key);
        Ok(())
    }

    /// Persisted entries, newest first
    pub async fn list(&self) -> Result<Vec<TranslationCacheEntry>> {
        let mut entries = Vec::new();

        if let Ok(mut dir_entries) = tokio::fs::read_dir(&self.cache_dir).await {
            while let Ok(Some(entry)) = dir_entries.next_entry().await {
                if entry.path().extension().is_some_and(|ext| ext == "json") {
                    if let Ok(content) = tokio::fs::read_to_string(entry.path()).await {
                        if let Ok(cache_entry) = serde_json::from_str::<TranslationCacheEntry>(&content) {
                            entries.push(cache_entry);
                        }
                    }
                }
            }
        }

        entries.sort_by(|a, b| b.cached_at.cmp(&a.cached_at));
        Ok(entries)
    }

    /// Remove every persisted entry and forget the in-memory copies
    pub async fn clear(&self) -> Result<u64> {
        self.memory.lock().clear();

        let mut count = 0;
        if let Ok(mut entries) = tokio::fs::read_dir(&self.cache_dir).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                if entry.path().extension().is_some_and(|ext| ext == "json")
                    && tokio::fs::remove_file(entry.path()).await.is_ok()
                {
                    count += 1;
                }
            }
        }
        info!("Cleared {} translation cache entries", count);
        Ok(count)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Format an age in seconds for cache listings
pub fn format_duration(seconds: u64) -> String {
    let days = seconds / (24 * 60 * 60);
    let hours = (seconds % (24 * 60 * 60)) / (60 * 60);
    let minutes = (seconds % (60 * 60)) / 60;
    let secs = seconds % 60;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Seconds since a cache entry was written
pub fn age_secs(cached_at: u64) -> u64 {
    now_secs().saturating_sub(cached_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn keys_depend_on_text_and_language() {
        let a = TranslationCache::cache_key("Hello", "fr");
        assert_eq!(a, TranslationCache::cache_key("Hello", "FR"));
        assert_ne!(a, TranslationCache::cache_key("Hello", "de"));
        assert_ne!(a, TranslationCache::cache_key("Hello!", "fr"));
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn entries_survive_a_new_instance() {
        let dir = TempDir::new().unwrap();
        let cache = TranslationCache::new(dir.path());
        cache.put("Hello", "fr", "Bonjour", "google").await.unwrap();

        let reopened = TranslationCache::new(dir.path());
        assert_eq!(reopened.get("Hello", "fr").await.as_deref(), Some("Bonjour"));
        assert_eq!(reopened.get("Hello", "de").await, None);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let dir = TempDir::new().unwrap();
        let cache = TranslationCache::new(dir.path());
        cache.put("Hello", "fr", "Bonjour", "google").await.unwrap();
        cache.put("Yes", "fr", "Oui", "mymemory").await.unwrap();

        assert_eq!(cache.list().await.unwrap().len(), 2);
        assert_eq!(cache.clear().await.unwrap(), 2);
        assert_eq!(cache.get("Hello", "fr").await, None);
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(7260), "2h 1m");
        assert_eq!(format_duration(90000), "1d 1h");
    }
}
