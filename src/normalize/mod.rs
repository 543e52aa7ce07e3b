//! Comment text normalization
//!
//! Every comment yields two strings:
//! - `model_text`: cleaned natural-language text fed to the classifier
//! - `visual_text`: `model_text` minus stopwords and very short tokens,
//!   used for term frequencies and word clouds
//!
//! Comments whose `model_text` is 10 characters or shorter are dropped.

mod stopwords;

use crate::youtube::RawComment;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// A comment must have more than this many characters after cleaning
pub const MIN_MODEL_TEXT_CHARS: usize = 10;

/// Visualization tokens must have more than this many characters
pub const MIN_TOKEN_CHARS: usize = 2;

static EMOJI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[\p{Extended_Pictographic}\p{Emoji_Modifier}\p{Regional_Indicator}\x{200D}\x{FE0E}\x{FE0F}\x{20E3}\x{E0020}-\x{E007F}]",
    )
    .expect("emoji pattern is valid")
});

static HTML_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("html tag pattern is valid"));

static HTML_ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:[A-Za-z][A-Za-z0-9]{1,31}|#[0-9]{1,7}|#[xX][0-9A-Fa-f]{1,6});")
        .expect("html entity pattern is valid")
});

static URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:https?://|www\.)\S+").expect("url pattern is valid"));

static APOSTROPHE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"['\x{2019}]").expect("apostrophe pattern is valid"));

// Anything that is not a letter, number, combining mark or whitespace
static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\p{M}\s]+").expect("punctuation pattern is valid"));

static NEWLINE_TAB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\n\r\t]+").expect("newline pattern is valid"));

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// A comment that survived cleaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedComment {
    pub model_text: String,
    pub visual_text: String,
    pub published_at: DateTime<Utc>,
    /// Index of the originating comment in the fetched list
    pub source_index: usize,
}

/// Output of normalizing a whole fetch
#[derive(Debug, Clone, Default)]
pub struct NormalizeOutput {
    pub comments: Vec<NormalizedComment>,
    /// Comments removed by the length rule
    pub dropped: usize,
}

/// Clean raw comment text into classifier input
///
/// Steps, in order: emoji, HTML tags and entities, URLs, punctuation and
/// symbols, newlines/tabs, repeated whitespace, trim, lowercase.
pub fn clean_text(text: &str) -> String {
    let text = EMOJI.replace_all(text, "");
    let text = HTML_TAG.replace_all(&text, " ");
    let text = HTML_ENTITY.replace_all(&text, "");
    let text = URL.replace_all(&text, "");
    let text = APOSTROPHE.replace_all(&text, "");
    let text = PUNCTUATION.replace_all(&text, " ");
    let text = NEWLINE_TAB.replace_all(&text, " ");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_lowercase()
}

/// Whether cleaned text is long enough to classify
pub fn is_long_enough(model_text: &str) -> bool {
    model_text.chars().count() > MIN_MODEL_TEXT_CHARS
}

/// Normalizer holding the stopword configuration
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    extra_stopwords: HashSet<String>,
}

impl TextNormalizer {
    /// Normalizer using only the built-in stopword set
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizer with additional stopwords (matched case-insensitively)
    pub fn with_extra_stopwords<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extra_stopwords: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    fn is_stopword(&self, token: &str) -> bool {
        stopwords::STOPWORDS.contains(token) || self.extra_stopwords.contains(token)
    }

    /// Derive visualization text from already-cleaned text
    pub fn visual_text(&self, model_text: &str) -> String {
        model_text
            .split_whitespace()
            .filter(|t| t.chars().count() > MIN_TOKEN_CHARS && !self.is_stopword(t))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Normalize one comment, or `None` when it is too short after cleaning
    pub fn normalize(&self, source_index: usize, raw: &RawComment) -> Option<NormalizedComment> {
        let model_text = clean_text(&raw.text);
        if !is_long_enough(&model_text) {
            return None;
        }

        let visual_text = self.visual_text(&model_text);
        Some(NormalizedComment {
            model_text,
            visual_text,
            published_at: raw.published_at,
            source_index,
        })
    }

    /// Normalize a fetch, preserving order and counting dropped comments
    pub fn normalize_all(&self, raw: &[RawComment]) -> NormalizeOutput {
        let comments: Vec<NormalizedComment> = raw
            .iter()
            .enumerate()
            .filter_map(|(i, c)| self.normalize(i, c))
            .collect();
        let dropped = raw.len() - comments.len();

        debug!(
            "Normalized {} comments - kept={}, dropped={}",
            raw.len(),
            comments.len(),
            dropped
        );

        NormalizeOutput { comments, dropped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(text: &str) -> RawComment {
        RawComment {
            text: text.to_string(),
            published_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_clean_scenario() {
        assert_eq!(
            clean_text("bagus banget videonya!!! 😊 http://x.com"),
            "bagus banget videonya"
        );
        assert_eq!(clean_text("jelek sekali"), "jelek sekali");
        assert_eq!(clean_text("biasa aja sih"), "biasa aja sih");
    }

    #[test]
    fn test_clean_html() {
        let text = "Mantap<br>keren &quot;sekali&quot; <a href=\"https://www.youtube.com/watch?v=x\">00:42</a>";
        assert_eq!(clean_text(text), "mantap keren sekali 00 42");
    }

    #[test]
    fn test_clean_whitespace_and_case() {
        assert_eq!(clean_text("  HALO\n\n\tSemua \r\n  Orang  "), "halo semua orang");
    }

    #[test]
    fn test_clean_emoji_sequences() {
        // ZWJ family, flag, skin tone, keycap
        let text = "keren 👨‍👩‍👧 🇮🇩 👍🏽 1️⃣ mantap";
        assert_eq!(clean_text(text), "keren 1 mantap");
    }

    #[test]
    fn test_clean_www_url() {
        assert_eq!(clean_text("cek www.contoh.com/abc sekarang"), "cek sekarang");
    }

    #[test]
    fn test_clean_is_idempotent() {
        let samples = [
            "bagus banget videonya!!! 😊 http://x.com",
            "İstanbul ÇOK güzel<br>&amp; https://t.co/x",
            "don't STOP — ever… 🚀🚀",
            "ΣΟΦΙΑ ΣΑΣ",
        ];
        for s in samples {
            let once = clean_text(s);
            assert_eq!(clean_text(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_length_boundary() {
        let normalizer = TextNormalizer::new();
        // exactly 10 characters
        assert!(normalizer.normalize(0, &raw("abcde fghi")).is_none());
        // 11 characters
        assert!(normalizer.normalize(0, &raw("abcde fghij")).is_some());
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        // 10 chars, more than 10 bytes
        assert!(!is_long_enough("éééééééééé"));
    }

    #[test]
    fn test_visual_text() {
        let normalizer = TextNormalizer::new();
        let visual = normalizer.visual_text("videonya bagus banget dan yang di ok lucu");
        assert_eq!(visual, "videonya bagus lucu");
    }

    #[test]
    fn test_extra_stopwords() {
        let normalizer = TextNormalizer::with_extra_stopwords(["Videonya", " "]);
        assert_eq!(normalizer.visual_text("videonya bagus"), "bagus");
    }

    #[test]
    fn test_normalize_all_counts_dropped() {
        let normalizer = TextNormalizer::new();
        let input = vec![
            raw("bagus banget videonya!!! 😊 http://x.com"),
            raw("😊😊😊"),
            raw("jelek sekali"),
            raw("ok"),
        ];
        let out = normalizer.normalize_all(&input);

        assert_eq!(out.comments.len(), 2);
        assert_eq!(out.dropped, 2);
        assert_eq!(out.comments[1].source_index, 2);
        assert_eq!(out.comments[1].model_text, "jelek sekali");
    }
}
