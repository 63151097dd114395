// In-place translation of human-readable strings in course JS/HTML assets
//
// Each pattern designates its text group (`dq`/`sq` for quoted strings,
// `text` for markup); only that group is replaced, everything around it
// (keys, quotes, tags, whitespace) is kept byte for byte. Patterns run in
// order, each on the output of the previous. Script strings are decoded
// before translation and re-escaped on the way back.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::RewriterConfig;
use crate::error::Result;
use crate::translate::TranslationService;

const KEY_VALUE_PATTERN: &str = r#"["'](?:altText|title|text|label|caption|description|heading|content)["']\s*:\s*(?:"(?P<dq>[^"\\]*(?:\\.[^"\\]*)*)"|'(?P<sq>[^'\\]*(?:\\.[^'\\]*)*)')"#;
const TAG_TEXT_PATTERN: &str = r"(?s)>(?P<text>[^<>]+)<";
// `key` catches object keys so they can be passed over
const LITERAL_PATTERN: &str = r#"(?:"(?P<dq>[A-Za-z0-9 ,.!?;:\-']{3,})"|'(?P<sq>[A-Za-z0-9 ,.!?;:\-"]{3,})')(?P<key>\s*:)?"#;
const NON_TEXT_BLOCK_PATTERN: &str = r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<!--.*?-->";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Js,
    Html,
}

impl FileKind {
    /// `.html`/`.htm` are HTML, everything else is treated as script
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
            Some("html") | Some("htm") => FileKind::Html,
            _ => FileKind::Js,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escaping {
    /// Inside a quoted script string
    Quoted,
    /// Inside HTML text content
    Markup,
}

/// Regions of the input a pattern must not touch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Guard {
    None,
    /// `<script>`, `<style>` and comments
    NonTextBlocks,
    /// Key/value strings, already handled by the first pattern
    KeyValues,
}

struct TextPattern {
    name: &'static str,
    regex: Regex,
    html_only: bool,
    escaping: Escaping,
    guard: Guard,
}

/// Result of rewriting one piece of content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewrittenText {
    pub content: String,
    /// Matches that passed the length and letter checks
    pub candidates: usize,
    /// Candidates whose translation differs from the source
    pub replaced: usize,
    /// Candidates left untouched because translation failed
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    pub path: PathBuf,
    pub excluded: bool,
    pub candidates: usize,
    pub replaced: usize,
    pub skipped: usize,
}

impl RewriteReport {
    pub fn changed(&self) -> bool {
        self.replaced > 0
    }
}

struct Candidate {
    range: Range<usize>,
    /// Text sent to the translator, escapes decoded
    source: String,
    quote: Option<char>,
}

pub struct TextRewriter {
    translator: Arc<TranslationService>,
    patterns: Vec<TextPattern>,
    non_text_blocks: Regex,
    key_values: Regex,
    excluded: HashSet<String>,
    extensions: Vec<String>,
    min_length: usize,
}

impl TextRewriter {
    pub fn new(config: &RewriterConfig, translator: Arc<TranslationService>) -> Result<Self> {
        let key_values = Regex::new(KEY_VALUE_PATTERN)?;
        let mut patterns = vec![
            TextPattern {
                name: "key-value",
                regex: key_values.clone(),
                html_only: false,
                escaping: Escaping::Quoted,
                guard: Guard::None,
            },
            TextPattern {
                name: "tag-text",
                regex: Regex::new(TAG_TEXT_PATTERN)?,
                html_only: true,
                escaping: Escaping::Markup,
                guard: Guard::NonTextBlocks,
            },
        ];
        if config.aggressive {
            patterns.push(TextPattern {
                name: "literal",
                regex: Regex::new(LITERAL_PATTERN)?,
                html_only: false,
                escaping: Escaping::Quoted,
                guard: Guard::KeyValues,
            });
        }

        Ok(Self {
            translator,
            patterns,
            non_text_blocks: Regex::new(NON_TEXT_BLOCK_PATTERN)?,
            key_values,
            excluded: config.excluded_files.iter().map(|f| f.to_lowercase()).collect(),
            extensions: config.extensions.iter().map(|e| e.trim_start_matches('.').to_lowercase()).collect(),
            min_length: config.min_length,
        })
    }

    /// Player runtime files are never rewritten
    pub fn is_excluded(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| self.excluded.contains(&name.to_string_lossy().to_lowercase()))
            .unwrap_or(false)
    }

    /// Every file below `root` with a scanned extension, sorted
    pub fn collect_text_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.extension()
                    .map(|ext| self.extensions.contains(&ext.to_string_lossy().to_lowercase()))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        files
    }

    /// Rewrite one file in place. The file is written only when at least one
    /// candidate was replaced.
    pub async fn rewrite_file(&self, path: &Path, target_language: &str) -> Result<RewriteReport> {
        if self.is_excluded(path) {
            debug!("Skipping excluded file {}", path.display());
            return Ok(RewriteReport {
                path: path.to_path_buf(),
                excluded: true,
                ..Default::default()
            });
        }

        let bytes = tokio::fs::read(path).await?;
        let content = String::from_utf8_lossy(&bytes);
        let rewritten = self
            .rewrite_text(&content, FileKind::from_path(path), target_language)
            .await;

        if rewritten.replaced > 0 {
            tokio::fs::write(path, rewritten.content.as_bytes()).await?;
            info!(
                "Rewrote {}: {}/{} strings translated",
                path.display(),
                rewritten.replaced,
                rewritten.candidates
            );
        }

        Ok(RewriteReport {
            path: path.to_path_buf(),
            excluded: false,
            candidates: rewritten.candidates,
            replaced: rewritten.replaced,
            skipped: rewritten.skipped,
        })
    }

    /// Translate the candidates of every applicable pattern. Identical
    /// strings are sent to the translator once.
    pub async fn rewrite_text(&self, content: &str, kind: FileKind, target_language: &str) -> RewrittenText {
        let mut memo: HashMap<String, Option<String>> = HashMap::new();
        let mut result = RewrittenText {
            content: content.to_string(),
            ..Default::default()
        };

        for pattern in &self.patterns {
            if pattern.html_only && kind != FileKind::Html {
                continue;
            }
            let current = std::mem::take(&mut result.content);
            let rewritten = self
                .apply_pattern(pattern, &current, target_language, &mut memo, &mut result)
                .await;
            result.content = rewritten;
        }
        result
    }

    async fn apply_pattern(
        &self,
        pattern: &TextPattern,
        content: &str,
        target_language: &str,
        memo: &mut HashMap<String, Option<String>>,
        stats: &mut RewrittenText,
    ) -> String {
        let protected: Vec<Range<usize>> = match pattern.guard {
            Guard::None => Vec::new(),
            Guard::NonTextBlocks => self.non_text_blocks.find_iter(content).map(|m| m.range()).collect(),
            Guard::KeyValues => self.key_values.find_iter(content).map(|m| m.range()).collect(),
        };

        let candidates: Vec<Candidate> = pattern
            .regex
            .captures_iter(content)
            .filter_map(|caps| {
                if caps.name("key").is_some() {
                    return None;
                }
                let (text, quote) = if let Some(m) = caps.name("dq") {
                    (m, Some('"'))
                } else if let Some(m) = caps.name("sq") {
                    (m, Some('\''))
                } else {
                    (caps.name("text")?, None)
                };
                if protected.iter().any(|r| r.contains(&text.start())) {
                    return None;
                }
                let raw = text.as_str();
                let lead = raw.len() - raw.trim_start().len();
                let trail = raw.len() - raw.trim_end().len();
                if lead == raw.len() {
                    return None;
                }
                let range = text.start() + lead..text.end() - trail;
                let source = match pattern.escaping {
                    // Strings with malformed escapes are left alone
                    Escaping::Quoted => unescape_script(&content[range.clone()])?,
                    Escaping::Markup => content[range.clone()].to_string(),
                };
                if !self.is_candidate(&source) {
                    return None;
                }
                Some(Candidate { range, source, quote })
            })
            .collect();

        if candidates.is_empty() {
            return content.to_string();
        }
        debug!("{} pattern: {} candidate(s)", pattern.name, candidates.len());

        let mut output = String::with_capacity(content.len());
        let mut last = 0;
        for candidate in &candidates {
            let original = &content[candidate.range.clone()];
            let source = candidate.source.as_str();
            if !memo.contains_key(source) {
                let translated = match self.translator.translate(source, target_language).await {
                    Ok(t) => Some(t),
                    Err(e) => {
                        warn!("Leaving \"{}\" untranslated: {}", source, e);
                        None
                    }
                };
                memo.insert(source.to_string(), translated);
            }

            stats.candidates += 1;
            output.push_str(&content[last..candidate.range.start]);
            match memo.get(source).and_then(Option::as_deref) {
                Some(translated) if translated != source => {
                    output.push_str(&escape(translated, pattern.escaping, candidate.quote));
                    stats.replaced += 1;
                }
                Some(_) => output.push_str(original),
                None => {
                    output.push_str(original);
                    stats.skipped += 1;
                }
            }
            last = candidate.range.end;
        }
        output.push_str(&content[last..]);
        output
    }

    fn is_candidate(&self, text: &str) -> bool {
        if text.chars().count() < self.min_length || !text.chars().any(char::is_alphabetic) {
            return false;
        }
        // Lone entities such as &nbsp;
        !(text.starts_with('&') && text.ends_with(';') && !text.contains(char::is_whitespace))
    }
}

fn escape(text: &str, escaping: Escaping, quote: Option<char>) -> String {
    match escaping {
        Escaping::Quoted => {
            let mut out = String::with_capacity(text.len());
            for c in text.chars() {
                match c {
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    c if Some(c) == quote => {
                        out.push('\\');
                        out.push(c);
                    }
                    // Line terminators in JS source
                    '\u{2028}' | '\u{2029}' => out.push_str(&format!("\\u{:04x}", c as u32)),
                    c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
                    c => out.push(c),
                }
            }
            out
        }
        Escaping::Markup => text.replace('<', "&lt;").replace('>', "&gt;"),
    }
}

/// Decode the escape sequences of a JS string literal body. None when an
/// escape is malformed (bad hex, lone surrogate, trailing backslash).
fn unescape_script(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let (decoded, used) = decode_escape(&rest[pos + 1..])?;
        out.extend(decoded);
        rest = &rest[pos + 1 + used..];
    }
    out.push_str(rest);
    Some(out)
}

/// One escape after its backslash: the character (None for a line
/// continuation) and the bytes consumed
fn decode_escape(s: &str) -> Option<(Option<char>, usize)> {
    let c = s.chars().next()?;
    let decoded = match c {
        'n' => (Some('\n'), 1),
        't' => (Some('\t'), 1),
        'r' => (Some('\r'), 1),
        'b' => (Some('\u{8}'), 1),
        'f' => (Some('\u{c}'), 1),
        'v' => (Some('\u{b}'), 1),
        '0' if !s[1..].starts_with(|d: char| d.is_ascii_digit()) => (Some('\0'), 1),
        'x' => (Some(char::from_u32(hex_value(&s[1..], 2)?)?), 3),
        'u' => {
            let (ch, used) = decode_unicode(&s[1..])?;
            (Some(ch), used + 1)
        }
        '\n' => (None, 1),
        '\r' if s[1..].starts_with('\n') => (None, 2),
        '\r' => (None, 1),
        other => (Some(other), other.len_utf8()),
    };
    Some(decoded)
}

/// `XXXX`, `{X..}` or a `XXXX\uXXXX` surrogate pair
fn decode_unicode(s: &str) -> Option<(char, usize)> {
    if let Some(braced) = s.strip_prefix('{') {
        let end = braced.find('}')?;
        let ch = char::from_u32(hex_value(braced, end)?)?;
        return Some((ch, end + 2));
    }

    let unit = hex_value(s, 4)?;
    if (0xD800..0xDC00).contains(&unit) {
        let low = s[4..].strip_prefix("\\u").and_then(|r| hex_value(r, 4))?;
        if !(0xDC00..0xE000).contains(&low) {
            return None;
        }
        let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
        return Some((char::from_u32(code)?, 10));
    }
    Some((char::from_u32(unit)?, 4))
}

fn hex_value(s: &str, len: usize) -> Option<u32> {
    let digits = s.get(..len)?;
    if digits.is_empty() || len > 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}
