use std::fmt;

use crate::error::{Result, LocalizerError};

/// A target language offered for course localization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// Display name, as recorded in metadata
    pub name: &'static str,
    /// Code used for folder names, archive names and translation requests
    pub code: &'static str,
}

/// Language uploaded packages are authored in
pub const SOURCE_LANGUAGE: &str = "en";

pub const LANGUAGES: [Language; 12] = [
    Language { name: "English", code: "en" },
    Language { name: "French", code: "fr" },
    Language { name: "German", code: "de" },
    Language { name: "Hindi", code: "hi" },
    Language { name: "Russian", code: "ru" },
    Language { name: "Japanese", code: "ja" },
    Language { name: "Chinese", code: "zh-cn" },
    Language { name: "Spanish", code: "es" },
    Language { name: "Italian", code: "it" },
    Language { name: "Portuguese", code: "pt" },
    Language { name: "Korean", code: "ko" },
    Language { name: "Arabic", code: "ar" },
];

impl Language {
    pub fn from_name(name: &str) -> Option<Language> {
        LANGUAGES.iter().copied().find(|l| l.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn from_code(code: &str) -> Option<Language> {
        LANGUAGES.iter().copied().find(|l| l.code.eq_ignore_ascii_case(code.trim()))
    }

    /// Accept either a display name ("French") or a code ("fr")
    pub fn resolve(input: &str) -> Result<Language> {
        Self::from_name(input)
            .or_else(|| Self::from_code(input))
            .ok_or_else(|| LocalizerError::UnsupportedLanguage(input.to_string()))
    }

    /// Voice language for speech synthesis
    pub fn tts_code(&self) -> &'static str {
        tts_language(self.code)
    }

    pub fn is_source(&self) -> bool {
        self.code == SOURCE_LANGUAGE
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// Map a translation code to a TTS voice language, falling back to English
pub fn tts_language(code: &str) -> &'static str {
    match code.to_lowercase().as_str() {
        "en" => "en",
        "fr" => "fr",
        "de" => "de",
        "hi" => "hi",
        "ru" => "ru",
        "ja" => "ja",
        "zh-cn" => "zh-CN",
        "es" => "es",
        "it" => "it",
        "pt" => "pt",
        "ko" => "ko",
        "ar" => "ar",
        _ => "en",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_names_and_codes() {
        assert_eq!(Language::resolve("French").unwrap().code, "fr");
        assert_eq!(Language::resolve("french").unwrap().code, "fr");
        assert_eq!(Language::resolve("ZH-CN").unwrap().name, "Chinese");
        assert!(matches!(
            Language::resolve("Klingon"),
            Err(LocalizerError::UnsupportedLanguage(_))
        ));
    }

    #[test]
    fn tts_falls_back_to_english() {
        assert_eq!(tts_language("ja"), "ja");
        assert_eq!(tts_language("zh-cn"), "zh-CN");
        assert_eq!(tts_language("xx"), "en");
    }

    #[test]
    fn english_is_the_source() {
        assert!(Language::resolve("en").unwrap().is_source());
        assert!(!Language::resolve("de").unwrap().is_source());
    }
}
