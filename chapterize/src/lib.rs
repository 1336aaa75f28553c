//! chapterize: recover chapter/section structure from flat book text and
//! clean it for speech synthesis.
//!
//! The pipeline runs three pure, synchronous stages over one document:
//!
//! 1. [`normalize`] strips extraction artifacts (page numbers, running
//!    headers/footers), repairs line-break hyphenation, and reflows
//!    hard-wrapped lines into tagged paragraphs.
//! 2. [`segment`] scans the paragraphs once, left to right, classifying
//!    standalone lines against an ordered rule set and folding the stream
//!    into chapters and sections.
//! 3. [`enrich`] fills book metadata the format extractor could not
//!    supply (ISBN, title, author, copyright year), never overwriting an
//!    externally supplied field.
//!
//! Stages share no state across documents; callers may process documents
//! on independent threads without coordination. Format parsing, speech
//! synthesis, audio assembly, and persistence are collaborating components
//! outside this crate; its output is the [`Document`] tree they consume.
//!
//! ```
//! use chapterize::{Metadata, PipelineConfig, ProcessOutcome, RawText, process};
//!
//! let raw = RawText::from_text("Chapter 1\n\nIt was a dark and stormy night.");
//! let config = PipelineConfig::default();
//! match process(&raw, &config, &Metadata::default()).unwrap() {
//!     ProcessOutcome::Complete(document) => {
//!         assert_eq!(document.chapters.len(), 1);
//!     }
//!     ProcessOutcome::EmptyInput => unreachable!(),
//! }
//! ```

pub mod config;
pub mod document;
pub mod enrich;
pub mod error;
pub mod normalize;
pub mod segment;

pub use config::PipelineConfig;
pub use document::{Chapter, ChapterTitle, Document, Metadata, Section};
pub use enrich::enrich;
pub use error::{ChapterizeError, Result};
pub use normalize::{NormalizedText, Paragraph, ParagraphKind, RawText, normalize};
pub use segment::marker::{Marker, MarkerKind};
pub use segment::segment;

use log::info;

/// Result of running the full pipeline over one document.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// The document was segmented and its metadata enriched.
    Complete(Document),
    /// The input contained no usable text. Distinct from an error so batch
    /// callers can log and skip instead of aborting.
    EmptyInput,
}

impl ProcessOutcome {
    /// The completed document, if there was one.
    pub fn into_document(self) -> Option<Document> {
        match self {
            ProcessOutcome::Complete(document) => Some(document),
            ProcessOutcome::EmptyInput => None,
        }
    }
}

/// Run normalize → segment → enrich over one raw document.
///
/// Fails only on configuration errors; malformed input degrades to
/// [`ProcessOutcome::EmptyInput`].
pub fn process(
    raw: &RawText,
    config: &PipelineConfig,
    external: &Metadata,
) -> Result<ProcessOutcome> {
    config.validate()?;

    if raw.is_blank() {
        return Ok(ProcessOutcome::EmptyInput);
    }

    let normalized = normalize(raw, config);
    if normalized.is_empty() {
        return Ok(ProcessOutcome::EmptyInput);
    }

    let mut document = segment(&normalized, config);
    document.metadata = enrich(&document, external);

    if document.title.is_empty() {
        if let Some(title) = &document.metadata.title {
            document.title = title.clone();
        }
    }
    if document.author.is_none() {
        document.author = document.metadata.author.clone();
    }

    info!(
        "segmented {:?}: {} chapters, {} words",
        document.title,
        document.chapters.len(),
        document.word_count()
    );

    Ok(ProcessOutcome::Complete(document))
}
