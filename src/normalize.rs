//! Language-aware text cleaning.
//!
//! The chain is order-sensitive: entities are decoded before whitespace is
//! collapsed, elongations are shortened before URLs are stripped, casing is
//! folded before punctuation is removed, and the language stage only ever sees
//! tokens.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use htmlentity::entity::{ICodedDataTrait, decode};
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::comment::{BucketedComment, NormalizedComment};
use crate::config::PipelineConfig;
use crate::lang::{Bucket, Language};

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://\S+|www\.\S+").unwrap());
static MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@\w+").unwrap());
static EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{Extended_Pictographic}\p{Emoji_Modifier}\x{FE0F}\x{200D}]").unwrap()
});
static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());
static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\p{L}\p{M}\p{N}]+").unwrap());

/// Splits text into maximal runs of letters, marks and digits.
pub fn tokenize(text: &str) -> Vec<&str> {
    TOKEN.find_iter(text).map(|m| m.as_str()).collect()
}

/// Reduces a word to its stem.
pub trait TokenStemmer: Send + Sync {
    fn stem<'a>(&self, token: &'a str) -> Cow<'a, str>;
}

/// Maps a token to a base-Latin spelling.
pub trait Transliterator: Send + Sync {
    fn transliterate(&self, token: &str) -> String;
}

/// Snowball stemmer from `rust-stemmers`.
pub struct SnowballStemmer(Stemmer);

impl SnowballStemmer {
    /// `None` for languages without a Snowball algorithm.
    pub fn for_language(language: Language) -> Option<Self> {
        let algorithm = match language {
            Language::Turkish => Algorithm::Turkish,
            Language::English => Algorithm::English,
            Language::German => Algorithm::German,
            Language::French => Algorithm::French,
            Language::Spanish => Algorithm::Spanish,
            Language::Italian => Algorithm::Italian,
            Language::Portuguese => Algorithm::Portuguese,
            Language::Russian => Algorithm::Russian,
            Language::Arabic => Algorithm::Arabic,
            Language::Japanese | Language::Korean | Language::Chinese => return None,
        };
        Some(SnowballStemmer(Stemmer::create(algorithm)))
    }
}

impl TokenStemmer for SnowballStemmer {
    fn stem<'a>(&self, token: &'a str) -> Cow<'a, str> {
        self.0.stem(token)
    }
}

/// Strips diacritics by canonical decomposition, plus a few letters that do
/// not decompose.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiacriticFolder;

impl Transliterator for DiacriticFolder {
    fn transliterate(&self, token: &str) -> String {
        let mut out = String::with_capacity(token.len());
        for c in token.nfd().filter(|c| !is_combining_mark(*c)) {
            match c {
                'ı' => out.push('i'),
                'ß' => out.push_str("ss"),
                'æ' => out.push_str("ae"),
                'œ' => out.push_str("oe"),
                'ø' => out.push('o'),
                'ł' => out.push('l'),
                'đ' | 'ð' => out.push('d'),
                'þ' => out.push_str("th"),
                _ => out.push(c),
            }
        }
        out
    }
}

/// Decodes HTML entities, leaving the text as is if decoding fails.
fn decode_entities(text: &str) -> String {
    decode(text.as_bytes())
        .to_string()
        .unwrap_or_else(|_| text.to_string())
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Shortens runs of four or more identical characters to two.
pub fn collapse_elongation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run: Option<(char, usize)> = None;
    for c in text.chars() {
        run = match run {
            Some((prev, n)) if prev == c => Some((c, n + 1)),
            _ => Some((c, 1)),
        };
        // a run of three is kept as is; the fourth character drops the third
        match run {
            Some((_, n)) if n <= 3 => out.push(c),
            Some((_, 4)) => {
                out.pop();
            }
            _ => {}
        }
    }
    out
}

/// Lowercases with Turkish dotted/dotless I rules.
pub fn turkish_lowercase(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'I' => out.push('ı'),
            'İ' => out.push('i'),
            _ => out.extend(c.to_lowercase()),
        }
    }
    out
}

/// Per-run cleaning stage. Holds the configuration and the injected
/// stemming and transliteration capabilities.
pub struct Normalizer<'a> {
    config: &'a PipelineConfig,
    stemmers: &'a HashMap<Language, Box<dyn TokenStemmer>>,
    transliterator: Option<&'a dyn Transliterator>,
}

impl<'a> Normalizer<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        stemmers: &'a HashMap<Language, Box<dyn TokenStemmer>>,
        transliterator: Option<&'a dyn Transliterator>,
    ) -> Self {
        Normalizer {
            config,
            stemmers,
            transliterator,
        }
    }

    /// Capabilities this bucket's language stage wants but cannot get.
    pub fn missing_capabilities(&self, bucket: &Bucket) -> Vec<&'static str> {
        let mut missing = Vec::new();
        match bucket.language() {
            Some(l @ (Language::Turkish | Language::English)) => {
                if l == Language::English && self.transliterator.is_none() {
                    missing.push("transliteration");
                }
                if self.config.stem && !self.stemmers.contains_key(&l) {
                    missing.push("stemming");
                }
            }
            _ => {}
        }
        missing
    }

    pub fn normalize(&self, raw_text: &str, bucket: &Bucket) -> String {
        let text = collapse_whitespace(&decode_entities(raw_text));
        let text = collapse_elongation(&text);

        let text = URL.replace_all(&text, " ");
        let text = MENTION.replace_all(&text, " ");
        let mut text = text.replace('#', "");

        if self.config.strip_emoji {
            text = EMOJI.replace_all(&text, " ").into_owned();
        }

        let text = match bucket.language() {
            Some(Language::Turkish) => turkish_lowercase(&text),
            _ => text.to_lowercase(),
        };
        let text = collapse_whitespace(&NON_WORD.replace_all(&text, " "));

        let tokens = tokenize(&text);
        let tokens: Vec<String> = match bucket.language() {
            Some(l @ Language::Turkish) => self.stop_and_stem(l, tokens.into_iter().map(String::from)),
            Some(l @ Language::English) => {
                let folded = tokens.into_iter().map(|t| match self.transliterator {
                    Some(tr) => tr.transliterate(t),
                    None => t.to_string(),
                });
                self.stop_and_stem(l, folded)
            }
            _ => tokens.into_iter().map(String::from).collect(),
        };
        tokens.join(" ")
    }

    fn stop_and_stem<I>(&self, language: Language, tokens: I) -> Vec<String>
    where
        I: Iterator<Item = String>,
    {
        let stopwords = self.config.stopwords_for(language);
        let stemmer = if self.config.stem {
            self.stemmers.get(&language)
        } else {
            None
        };
        tokens
            .filter(|t| !t.is_empty())
            .filter(|t| stopwords.is_none_or(|s| !s.contains(t)))
            .map(|t| match stemmer {
                Some(s) => s.stem(&t).into_owned(),
                None => t,
            })
            .collect()
    }

    pub fn apply(&self, comment: BucketedComment) -> NormalizedComment {
        let clean_text = self.normalize(&comment.raw.text, &comment.bucket);
        NormalizedComment {
            raw: comment.raw,
            detected_language: comment.detected_language,
            bucket: comment.bucket,
            clean_text,
        }
    }
}
