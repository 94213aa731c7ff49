//! Word lists, injected into games as a read-only lookup.
//!
//! Games never load files. They ask a [`WordSource`] for a language's
//! words when building round data, so tests and hosts decide where words
//! come from.

use std::collections::HashMap;
use std::sync::Arc;

/// Language used when a requested language has no usable words.
pub const FALLBACK_LANG: &str = "en";

/// Read-only lookup from language code to word list.
pub trait WordSource: Send + Sync {
    /// All words for `lang`, or `None` if the language is unknown.
    fn words(&self, lang: &str) -> Option<Arc<[String]>>;
}

/// In-memory [`WordSource`] built from newline-separated text.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    languages: HashMap<String, Arc<[String]>>,
}

impl WordList {
    pub fn new() -> Self {
        Self::default()
    }

    /// The small English and Norwegian lists shipped with the crate.
    pub fn builtin() -> Self {
        Self::new()
            .with_language("en", include_str!("../words/en.txt"))
            .with_language("no", include_str!("../words/no.txt"))
    }

    /// Adds (or replaces) a language from newline-separated text.
    ///
    /// Each line is trimmed and lowercased; blank lines are skipped.
    pub fn with_language(mut self, lang: &str, text: &str) -> Self {
        self.insert(lang, text);
        self
    }

    pub fn insert(&mut self, lang: &str, text: &str) {
        let words: Arc<[String]> = text
            .lines()
            .map(|line| line.trim().to_lowercase())
            .filter(|word| !word.is_empty())
            .collect();
        self.languages.insert(lang.trim().to_lowercase(), words);
    }

    /// Language codes with a list, sorted.
    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.languages.keys().map(String::as_str).collect();
        langs.sort_unstable();
        langs
    }
}

impl WordSource for WordList {
    fn words(&self, lang: &str) -> Option<Arc<[String]>> {
        self.languages.get(lang).cloned()
    }
}

/// Words of at least `min_len` letters for `lang`, falling back to
/// [`FALLBACK_LANG`] when that leaves nothing. Empty if neither has any.
pub(crate) fn word_pool(source: &dyn WordSource, lang: &str, min_len: usize) -> Vec<String> {
    let eligible = |lang: &str| -> Vec<String> {
        source
            .words(lang)
            .map(|words| {
                words
                    .iter()
                    .filter(|word| word.chars().count() >= min_len)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    };

    let pool = eligible(lang);
    if !pool.is_empty() || lang == FALLBACK_LANG {
        return pool;
    }
    tracing::debug!(lang, "no usable words, falling back to {FALLBACK_LANG}");
    eligible(FALLBACK_LANG)
}
