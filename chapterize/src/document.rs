//! Core document model: chapters, sections, and book metadata.
//!
//! The model is a strict tree. A `Document` owns its `Chapter`s, a `Chapter`
//! owns its `Section`s, and nothing holds a reference back to its parent;
//! "which chapter contains this paragraph" is answered by traversal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::normalize::Paragraph;

/// Language code used when nothing better is known.
pub const DEFAULT_LANGUAGE: &str = "en";

/// A chapter title, distinguishing author-supplied text from generated
/// fallbacks so downstream consumers (audio pacing, persistence) can tell
/// them apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChapterTitle {
    /// Taken from a structural marker line in the source text.
    Titled(String),
    /// Generated because the source supplied none.
    Synthetic(String),
}

impl ChapterTitle {
    pub fn as_str(&self) -> &str {
        match self {
            ChapterTitle::Titled(s) | ChapterTitle::Synthetic(s) => s,
        }
    }

    /// Whether the title came from the source text rather than a generator.
    pub fn is_authored(&self) -> bool {
        matches!(self, ChapterTitle::Titled(_))
    }
}

impl fmt::Display for ChapterTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A run of paragraphs within a chapter, optionally under its own heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Heading text, when the section was opened by one.
    pub title: Option<String>,
    pub paragraphs: Vec<Paragraph>,
}

impl Section {
    pub fn new(title: Option<String>) -> Self {
        Self {
            title,
            paragraphs: Vec::new(),
        }
    }

    /// Whitespace-delimited word count across all paragraphs.
    pub fn word_count(&self) -> usize {
        self.paragraphs.iter().map(Paragraph::word_count).sum()
    }

    /// Full section text, paragraphs separated by blank lines.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// A chapter recovered from the text stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// Sequential number assigned by the segmenter. 0 is a detected preface;
    /// printed ordinals from the source survive only inside the title.
    pub number: usize,
    pub title: ChapterTitle,
    /// Heading of the enclosing Part/Book grouping, when one is active.
    pub part: Option<String>,
    /// Ordered sections; never empty.
    pub sections: Vec<Section>,
}

impl Chapter {
    pub fn word_count(&self) -> usize {
        self.sections.iter().map(Section::word_count).sum()
    }

    /// Estimated narration time at the given reading rate.
    pub fn estimated_duration(&self, words_per_minute: f64) -> Duration {
        if !words_per_minute.is_finite() || words_per_minute <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.word_count() as f64 / words_per_minute * 60.0)
    }

    /// Full chapter text, sections separated by blank lines.
    pub fn text(&self) -> String {
        self.sections
            .iter()
            .map(Section::text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Book-level metadata. Every field is best-effort except `language`,
/// which always carries a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<u32>,
    pub isbn: Option<String>,
    pub language: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            title: None,
            author: None,
            publisher: None,
            year: None,
            isbn: None,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// A fully segmented document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub author: Option<String>,
    pub chapters: Vec<Chapter>,
    pub metadata: Metadata,
}

impl Document {
    /// Total word count across all chapters.
    pub fn word_count(&self) -> usize {
        self.chapters.iter().map(Chapter::word_count).sum()
    }

    /// Estimated narration time for the whole document.
    pub fn estimated_duration(&self, words_per_minute: f64) -> Duration {
        self.chapters
            .iter()
            .map(|c| c.estimated_duration(words_per_minute))
            .sum()
    }

    /// True when no chapters were recovered (empty or unusable input).
    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }
}
