//! Language codes, detection labels and bucket names.

use std::fmt;

use serde::{Serialize, Serializer};

/// Closed set of languages the identifier is allowed to answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "&'static str")]
pub enum Language {
    Turkish,
    English,
    German,
    French,
    Spanish,
    Italian,
    Portuguese,
    Russian,
    Arabic,
    Japanese,
    Korean,
    Chinese,
}

impl Language {
    pub const ALL: [Language; 12] = [
        Language::Turkish,
        Language::English,
        Language::German,
        Language::French,
        Language::Spanish,
        Language::Italian,
        Language::Portuguese,
        Language::Russian,
        Language::Arabic,
        Language::Japanese,
        Language::Korean,
        Language::Chinese,
    ];

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Language::Turkish => "tr",
            Language::English => "en",
            Language::German => "de",
            Language::French => "fr",
            Language::Spanish => "es",
            Language::Italian => "it",
            Language::Portuguese => "pt",
            Language::Russian => "ru",
            Language::Arabic => "ar",
            Language::Japanese => "ja",
            Language::Korean => "ko",
            Language::Chinese => "zh",
        }
    }

    pub fn from_code(code: &str) -> Option<Language> {
        let code = code.trim().to_ascii_lowercase();
        Language::ALL.into_iter().find(|l| l.code() == code)
    }

    pub(crate) fn to_whatlang(self) -> whatlang::Lang {
        use whatlang::Lang;
        match self {
            Language::Turkish => Lang::Tur,
            Language::English => Lang::Eng,
            Language::German => Lang::Deu,
            Language::French => Lang::Fra,
            Language::Spanish => Lang::Spa,
            Language::Italian => Lang::Ita,
            Language::Portuguese => Lang::Por,
            Language::Russian => Lang::Rus,
            Language::Arabic => Lang::Ara,
            Language::Japanese => Lang::Jpn,
            Language::Korean => Lang::Kor,
            Language::Chinese => Lang::Cmn,
        }
    }

    pub(crate) fn from_whatlang(lang: whatlang::Lang) -> Option<Language> {
        Language::ALL.into_iter().find(|l| l.to_whatlang() == lang)
    }
}

impl From<Language> for &'static str {
    fn from(l: Language) -> Self {
        l.code()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of classifying one text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LanguageLabel {
    /// Confidently detected and part of the primary subset.
    Detected(Language),
    /// Confidently detected but outside the primary subset.
    Other,
    /// Too little signal or too little confidence.
    Unknown,
}

impl LanguageLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageLabel::Detected(l) => l.code(),
            LanguageLabel::Other => "other",
            LanguageLabel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LanguageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LanguageLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Final analysis group of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bucket {
    Language(Language),
    Others,
    Unknown,
}

impl Bucket {
    pub fn name(&self) -> &'static str {
        match self {
            Bucket::Language(l) => l.code(),
            Bucket::Others => "others",
            Bucket::Unknown => "unknown",
        }
    }

    pub fn language(&self) -> Option<Language> {
        match self {
            Bucket::Language(l) => Some(*l),
            _ => None,
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Bucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}
