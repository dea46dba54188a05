//! Record types flowing through the pipeline, from raw input to normalized output.

use serde::Serialize;

use crate::lang::{Bucket, LanguageLabel};

/// One comment as delivered by the connector.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RawComment {
    pub id: String,
    pub parent_id: Option<String>,
    pub author: Option<String>,
    pub like_count: Option<u64>,
    pub published_at: Option<String>,
    pub text: String,
}

impl RawComment {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        RawComment {
            id: id.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Columns a dataset carries. Optional artifacts are keyed off this, not off
/// individual records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub text: bool,
    pub author: bool,
    pub like_count: bool,
    pub published_at: bool,
}

impl Schema {
    /// Every column present.
    pub fn full() -> Self {
        Schema {
            text: true,
            author: true,
            like_count: true,
            published_at: true,
        }
    }

    /// Only the text column.
    pub fn text_only() -> Self {
        Schema {
            text: true,
            author: false,
            like_count: false,
            published_at: false,
        }
    }

    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut schema = Schema {
            text: false,
            author: false,
            like_count: false,
            published_at: false,
        };
        for h in headers {
            match h.trim() {
                "text" => schema.text = true,
                "author" => schema.author = true,
                "like_count" => schema.like_count = true,
                "published_at" => schema.published_at = true,
                _ => {}
            }
        }
        schema
    }
}

/// The batch handed to the pipeline, in stable input order.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub schema: Schema,
    pub comments: Vec<RawComment>,
}

impl Corpus {
    pub fn new(schema: Schema, comments: Vec<RawComment>) -> Self {
        Corpus { schema, comments }
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedComment {
    pub raw: RawComment,
    pub detected_language: LanguageLabel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BucketedComment {
    pub raw: RawComment,
    pub detected_language: LanguageLabel,
    pub bucket: Bucket,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedComment {
    pub raw: RawComment,
    pub detected_language: LanguageLabel,
    pub bucket: Bucket,
    pub clean_text: String,
}

impl NormalizedComment {
    /// Length of `clean_text` in characters.
    pub fn char_count(&self) -> usize {
        self.clean_text.chars().count()
    }

    pub fn word_count(&self) -> usize {
        self.clean_text.split_whitespace().count()
    }
}
