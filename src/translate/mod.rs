// Modular translation architecture
//
// Providers implement the `Translator` trait and are created by the factory:
// - Google: Google Translate web endpoint
// - MyMemory: MyMemory translation memory API
//
// `TranslationService` chains a primary and an optional fallback provider,
// retries the primary and keeps a persistent cache of finished strings.

pub mod common;
pub mod google;
pub mod mymemory;

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, warn};

pub use common::*;
use crate::config::{TranslateConfig, TranslationProvider};
use crate::error::{Result, LocalizerError};

/// Single-string machine translation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into the language identified by `target_language`
    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;
}

/// A provider together with the name used in logs and cache entries
pub struct NamedTranslator {
    pub name: String,
    pub translator: Box<dyn Translator>,
}

impl NamedTranslator {
    pub fn new<S: Into<String>>(name: S, translator: Box<dyn Translator>) -> Self {
        Self {
            name: name.into(),
            translator,
        }
    }
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    pub fn create_translator(
        provider: TranslationProvider,
        config: &TranslateConfig,
    ) -> Result<NamedTranslator> {
        let translator: Box<dyn Translator> = match provider {
            TranslationProvider::Google => Box::new(google::GoogleTranslator::new(config)?),
            TranslationProvider::MyMemory => Box::new(mymemory::MyMemoryTranslator::new(config)?),
        };
        Ok(NamedTranslator::new(provider_name(provider), translator))
    }
}

pub fn provider_name(provider: TranslationProvider) -> &'static str {
    match provider {
        TranslationProvider::Google => "google",
        TranslationProvider::MyMemory => "mymemory",
    }
}

/// Retrying, falling-back, caching front for the translation providers
pub struct TranslationService {
    providers: Vec<NamedTranslator>,
    max_retries: u32,
    cache: Option<TranslationCache>,
}

impl TranslationService {
    pub fn new(providers: Vec<NamedTranslator>, max_retries: u32) -> Self {
        Self {
            providers,
            max_retries,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: TranslationCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn from_config(config: &TranslateConfig, cache_dir: &Path) -> Result<Self> {
        let mut providers = vec![TranslatorFactory::create_translator(config.provider, config)?];
        if let Some(fallback) = config.fallback {
            if fallback != config.provider {
                providers.push(TranslatorFactory::create_translator(fallback, config)?);
            }
        }

        let service = Self::new(providers, config.max_retries);
        if config.cache {
            Ok(service.with_cache(TranslationCache::new(cache_dir)))
        } else {
            Ok(service)
        }
    }

    pub fn cache(&self) -> Option<&TranslationCache> {
        self.cache.as_ref()
    }

    /// Translate one string.
    ///
    /// Blank input comes back unchanged. Otherwise the trimmed text is tried
    /// against the primary provider up to `max_retries` times and then once
    /// against each fallback.
    pub async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }
        let text = text.trim();

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(text, target_language).await {
                return Ok(hit);
            }
        }

        let mut last_error = None;
        for (index, provider) in self.providers.iter().enumerate() {
            let attempts = if index == 0 { self.max_retries.max(1) } else { 1 };

            for attempt in 1..=attempts {
                match provider.translator.translate(text, target_language).await {
                    Ok(translation) if !translation.trim().is_empty() => {
                        if let Some(cache) = &self.cache {
                            if let Err(e) = cache.put(text, target_language, &translation, &provider.name).await {
                                warn!("Failed to save translation to persistent cache: {}", e);
                            }
                        }
                        return Ok(translation);
                    }
                    Ok(_) => {
                        debug!("{} returned an empty translation (attempt {}/{})", provider.name, attempt, attempts);
                        last_error = Some(LocalizerError::Translation(format!(
                            "{} returned an empty translation",
                            provider.name
                        )));
                    }
                    Err(e) => {
                        debug!("{} failed (attempt {}/{}): {}", provider.name, attempt, attempts, e);
                        last_error = Some(e);
                    }
                }
            }

            if let Some(next) = self.providers.get(index + 1) {
                warn!("{} unavailable, using {} fallback", provider.name, next.name);
            }
        }

        Err(last_error.unwrap_or_else(|| {
            LocalizerError::Translation("No translation provider configured".to_string())
        }))
    }

    /// Best-effort translation: the source text is returned when every
    /// provider fails
    pub async fn translate_or_original(&self, text: &str, target_language: &str) -> String {
        match self.translate(text, target_language).await {
            Ok(translation) => translation,
            Err(e) => {
                warn!("Translation error: {}", e);
                text.to_string()
            }
        }
    }
}
