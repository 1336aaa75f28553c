//! Structure segmentation: a single left-to-right pass that folds the
//! normalized paragraph stream into a tree of chapters and sections.
//!
//! Segmentation never fails. Text with no recognizable markers becomes a
//! single chapter holding everything; ambiguous lines resolve to body text
//! rather than to a boundary.

pub mod marker;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::PipelineConfig;
use crate::document::{Chapter, ChapterTitle, Document, Metadata, Section};
use crate::normalize::{NormalizedText, Paragraph, ParagraphKind};
use marker::{Marker, MarkerKind, classify};

/// Fold the paragraph stream into a document. Metadata is left at its
/// default; enrichment happens afterwards.
pub fn segment(text: &NormalizedText, config: &PipelineConfig) -> Document {
    let mut state = SegmentState::new(config);
    for paragraph in &text.paragraphs {
        state.step(paragraph);
    }
    state.finish()
}

/// Skips a leading heading ordinal ("3. ", "IV. ", "Chapter 1. ") so the
/// period it carries is not mistaken for a sentence break.
static MARKER_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(?:chapter|part|book)\s+)?\S{1,12}\.\s+").expect("valid regex")
});

/// A sentence-terminal character followed by whitespace marks prose.
static SENTENCE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s").expect("valid regex"));

/// A chapter under construction.
struct PendingChapter {
    title: Option<ChapterTitle>,
    part: Option<String>,
    sections: Vec<Section>,
    open: Section,
}

impl PendingChapter {
    fn new(title: Option<ChapterTitle>, part: Option<String>) -> Self {
        Self {
            title,
            part,
            sections: Vec::new(),
            open: Section::new(None),
        }
    }

    fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.open.paragraphs.push(paragraph);
    }

    fn open_section(&mut self, title: Option<String>) {
        self.flush_section();
        self.open = Section::new(title);
    }

    fn flush_section(&mut self) {
        if !self.open.paragraphs.is_empty() || self.open.title.is_some() {
            let section = std::mem::replace(&mut self.open, Section::new(None));
            self.sections.push(section);
        }
    }

    fn is_empty(&self) -> bool {
        self.open.paragraphs.is_empty() && self.sections.iter().all(|s| s.paragraphs.is_empty())
    }

    fn into_chapter(mut self, number: usize) -> Chapter {
        self.flush_section();
        if self.sections.is_empty() {
            // Every chapter owns at least one section.
            self.sections.push(Section::new(None));
        }
        let title = self
            .title
            .unwrap_or_else(|| ChapterTitle::Synthetic(format!("Chapter {number}")));
        Chapter {
            number,
            title,
            part: self.part,
            sections: self.sections,
        }
    }
}

/// Scan state threaded through the paragraph fold.
struct SegmentState<'a> {
    config: &'a PipelineConfig,
    document_title: Option<String>,
    part: Option<String>,
    /// Paragraphs seen before any chapter-level marker.
    leading: Vec<Paragraph>,
    chapters: Vec<PendingChapter>,
    current: Option<PendingChapter>,
    /// Whether the last content paragraph trails off mid-sentence; gates
    /// bare-number and bare-Roman markers.
    prev_ends_mid_sentence: bool,
}

impl<'a> SegmentState<'a> {
    fn new(config: &'a PipelineConfig) -> Self {
        Self {
            config,
            document_title: None,
            part: None,
            leading: Vec::new(),
            chapters: Vec::new(),
            current: None,
            prev_ends_mid_sentence: false,
        }
    }

    fn step(&mut self, paragraph: &Paragraph) {
        let marker = match self.marker_for(paragraph) {
            Some(marker) => marker,
            None => {
                self.push_content(paragraph.clone());
                return;
            }
        };

        // A standalone title line before any chapter names the document
        // rather than opening a boundary.
        if marker.kind == MarkerKind::TitleLine && self.chapters.is_empty() && self.current.is_none()
        {
            if self.document_title.is_none() {
                debug!("line {}: document title {:?}", marker.line, marker.raw);
                self.document_title = Some(marker.raw);
                self.prev_ends_mid_sentence = false;
            } else {
                self.push_content(paragraph.clone());
            }
            return;
        }

        self.apply_marker(marker);
        self.prev_ends_mid_sentence = false;
    }

    /// Decide whether a paragraph is a structural marker. Only short,
    /// standalone, single-line body paragraphs qualify.
    fn marker_for(&self, paragraph: &Paragraph) -> Option<Marker> {
        if paragraph.kind != ParagraphKind::Body || paragraph.source_lines != 1 {
            return None;
        }
        let text = paragraph.text();
        if text.chars().count() > self.config.marker_max_length {
            return None;
        }
        let rest = MARKER_PREFIX.replace(&text, "");
        if SENTENCE_BREAK.is_match(&rest) {
            return None;
        }

        let marker = classify(&text, paragraph.line, self.config)?;
        match marker.kind {
            MarkerKind::StandaloneNumber | MarkerKind::StandaloneRoman
                if self.prev_ends_mid_sentence =>
            {
                debug!(
                    "line {}: rejected bare marker {:?} after mid-sentence text",
                    marker.line, marker.raw
                );
                None
            }
            _ => Some(marker),
        }
    }

    fn apply_marker(&mut self, marker: Marker) {
        debug!("line {}: {:?} marker {:?}", marker.line, marker.kind, marker.raw);
        match marker.kind {
            MarkerKind::Part | MarkerKind::Book => {
                // Parts group subsequent chapters; they are not chapters.
                self.close_chapter();
                self.part = Some(marker.raw);
            }
            MarkerKind::Chapter
            | MarkerKind::NamedSection
            | MarkerKind::StandaloneNumber
            | MarkerKind::StandaloneRoman
            | MarkerKind::TitleLine => {
                self.open_chapter(Some(ChapterTitle::Titled(marker.raw)));
            }
            MarkerKind::SectionHeading => match self.current.as_mut() {
                Some(chapter) => chapter.open_section(Some(marker.raw)),
                None => self.open_chapter(Some(ChapterTitle::Titled(marker.raw))),
            },
        }
    }

    fn push_content(&mut self, paragraph: Paragraph) {
        self.prev_ends_mid_sentence = ends_mid_sentence(&paragraph);
        // Content after a Part/Book heading belongs to a chapter of that
        // part even when no chapter marker intervened.
        if self.current.is_none() && self.part.is_some() {
            self.current = Some(PendingChapter::new(None, self.part.clone()));
        }
        match self.current.as_mut() {
            Some(chapter) => chapter.push_paragraph(paragraph),
            None => self.leading.push(paragraph),
        }
    }

    fn open_chapter(&mut self, title: Option<ChapterTitle>) {
        self.close_chapter();
        self.current = Some(PendingChapter::new(title, self.part.clone()));
    }

    fn close_chapter(&mut self) {
        if let Some(chapter) = self.current.take() {
            if chapter.is_empty() {
                if let Some(title) = &chapter.title {
                    debug!("dropping empty chapter {:?}", title.as_str());
                }
                return;
            }
            self.chapters.push(chapter);
        }
    }

    fn finish(mut self) -> Document {
        self.close_chapter();

        let document_title = self.document_title.unwrap_or_default();

        if self.chapters.is_empty() {
            // Zero recognized markers: everything becomes one chapter.
            if self.leading.is_empty() {
                return Document {
                    title: document_title,
                    author: None,
                    chapters: Vec::new(),
                    metadata: Metadata::default(),
                };
            }
            let title = if document_title.is_empty() {
                None
            } else {
                Some(ChapterTitle::Titled(document_title.clone()))
            };
            let mut chapter = PendingChapter::new(title, None);
            for paragraph in self.leading.drain(..) {
                chapter.push_paragraph(paragraph);
            }
            return Document {
                title: document_title,
                author: None,
                chapters: vec![chapter.into_chapter(1)],
                metadata: Metadata::default(),
            };
        }

        let mut chapters = Vec::with_capacity(self.chapters.len() + 1);

        // Leading text before the first marker survives as a preface
        // chapter when substantial, and is dropped as front matter when not.
        let leading_words: usize = self.leading.iter().map(Paragraph::word_count).sum();
        if leading_words >= self.config.min_preface_words {
            let mut preface =
                PendingChapter::new(Some(ChapterTitle::Synthetic("Preface".to_string())), None);
            for paragraph in self.leading.drain(..) {
                preface.push_paragraph(paragraph);
            }
            chapters.push(preface.into_chapter(0));
        } else if !self.leading.is_empty() {
            debug!(
                "discarded {} words of front matter before the first marker",
                leading_words
            );
        }

        let mut number = 1;
        for pending in self.chapters {
            chapters.push(pending.into_chapter(number));
            number += 1;
        }

        Document {
            title: document_title,
            author: None,
            chapters,
            metadata: Metadata::default(),
        }
    }
}

/// Whether a paragraph trails off mid-sentence: its last character is a
/// lowercase letter or a comma.
fn ends_mid_sentence(paragraph: &Paragraph) -> bool {
    paragraph
        .sentences
        .last()
        .and_then(|s| s.trim_end().chars().last())
        .map(|c| c.is_lowercase() || c == ',')
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{RawText, normalize};

    fn segment_str(text: &str) -> Document {
        let config = PipelineConfig::default();
        segment(&normalize(&RawText::from_text(text), &config), &config)
    }

    fn titles(document: &Document) -> Vec<&str> {
        document.chapters.iter().map(|c| c.title.as_str()).collect()
    }

    #[test]
    fn test_full_scan_detects_all_marker_kinds() {
        let document = segment_str(
            "Chapter 1\n\nThe story begins in earnest.\n\nII\n\nThe middle part happens.\n\nEpilogue\n\nAnd so it ended.",
        );
        assert_eq!(document.chapters.len(), 3);
        assert_eq!(titles(&document), vec!["Chapter 1", "II", "Epilogue"]);
        let numbers: Vec<usize> = document.chapters.iter().map(|c| c.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(document.chapters.iter().all(|c| c.title.is_authored()));
    }

    #[test]
    fn test_embedded_reference_does_not_split() {
        let document = segment_str(
            "In Chapter 1, we discussed the war.\n\nThe discussion continued for many pages after that.",
        );
        assert_eq!(document.chapters.len(), 1);
        assert_eq!(document.chapters[0].number, 1);
        assert_eq!(document.chapters[0].sections[0].paragraphs.len(), 2);
    }

    #[test]
    fn test_zero_markers_yield_single_chapter() {
        let document = segment_str(
            "Just some ordinary text without any structure.\n\nAnother paragraph of plain prose follows here.",
        );
        assert_eq!(document.chapters.len(), 1);
        let chapter = &document.chapters[0];
        assert_eq!(chapter.number, 1);
        assert_eq!(chapter.title, ChapterTitle::Synthetic("Chapter 1".to_string()));
        assert_eq!(chapter.sections.len(), 1);
        assert_eq!(chapter.sections[0].paragraphs.len(), 2);
    }

    #[test]
    fn test_printed_ordinals_do_not_drive_numbering() {
        let document = segment_str(
            "Chapter 5\n\nContent of the first found chapter.\n\nChapter 2\n\nContent of the second found chapter.",
        );
        let numbers: Vec<usize> = document.chapters.iter().map(|c| c.number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(titles(&document), vec!["Chapter 5", "Chapter 2"]);
    }

    #[test]
    fn test_substantial_leading_text_becomes_preface() {
        let document = segment_str(
            "This opening text talks at length about the book and runs well past the twenty word preface threshold set by default.\n\nChapter 1\n\nThe story begins.",
        );
        assert_eq!(document.chapters.len(), 2);
        assert_eq!(document.chapters[0].number, 0);
        assert_eq!(
            document.chapters[0].title,
            ChapterTitle::Synthetic("Preface".to_string())
        );
        assert_eq!(document.chapters[1].number, 1);
    }

    #[test]
    fn test_short_leading_text_is_discarded() {
        let document = segment_str("Title Page\n\nChapter 1\n\nThe story begins.");
        assert_eq!(document.chapters.len(), 1);
        assert_eq!(document.chapters[0].number, 1);
        assert_eq!(document.chapters[0].title.as_str(), "Chapter 1");
    }

    #[test]
    fn test_part_groups_chapters_without_becoming_one() {
        let document = segment_str(
            "Part One\n\nChapter 1\n\nFirst chapter text.\n\nChapter 2\n\nSecond chapter text.\n\nPart Two\n\nChapter 3\n\nThird chapter text.",
        );
        assert_eq!(document.chapters.len(), 3);
        assert_eq!(document.chapters[0].part.as_deref(), Some("Part One"));
        assert_eq!(document.chapters[1].part.as_deref(), Some("Part One"));
        assert_eq!(document.chapters[2].part.as_deref(), Some("Part Two"));
        assert!(titles(&document).iter().all(|t| !t.starts_with("Part")));
    }

    #[test]
    fn test_content_after_part_without_chapter_marker() {
        let document = segment_str("Part One\n\nText that follows the part heading directly.");
        assert_eq!(document.chapters.len(), 1);
        let chapter = &document.chapters[0];
        assert_eq!(chapter.part.as_deref(), Some("Part One"));
        assert_eq!(chapter.title, ChapterTitle::Synthetic("Chapter 1".to_string()));
    }

    #[test]
    fn test_section_headings_split_sections() {
        let document = segment_str(
            "Chapter 1\n\nOpening words of the chapter.\n\n1. The Farm\n\nLife on the farm.\n\n2. The Road\n\nLeaving it behind.",
        );
        assert_eq!(document.chapters.len(), 1);
        let sections = &document.chapters[0].sections;
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].title, None);
        assert_eq!(sections[1].title.as_deref(), Some("1. The Farm"));
        assert_eq!(sections[2].title.as_deref(), Some("2. The Road"));
        assert_eq!(sections[1].paragraphs.len(), 1);
    }

    #[test]
    fn test_bare_number_after_mid_sentence_text_is_content() {
        let document = segment_str(
            "Chapter 1\n\nThe fighting continued through the\n\n42\n\nlong winter and into spring.",
        );
        assert_eq!(document.chapters.len(), 1);
        // The page-number-like line stays in the chapter body.
        let body = document.chapters[0].text();
        assert!(body.contains("42"));
    }

    #[test]
    fn test_bare_number_after_complete_sentence_starts_chapter() {
        let document = segment_str(
            "Chapter 1\n\nThe first chapter ended cleanly.\n\n2\n\nThe second chapter starts here.",
        );
        assert_eq!(document.chapters.len(), 2);
        assert_eq!(document.chapters[1].title.as_str(), "2");
    }

    #[test]
    fn test_named_sections_start_chapters() {
        let document = segment_str(
            "Prologue\n\nBefore it all began.\n\nChapter 1\n\nIt began.\n\nEpilogue\n\nAfter it was over.",
        );
        assert_eq!(titles(&document), vec!["Prologue", "Chapter 1", "Epilogue"]);
    }

    #[test]
    fn test_title_line_sets_document_title() {
        let document = segment_str(
            "THE GREAT ESCAPE\n\nChapter 1\n\nThe escape begins at midnight.",
        );
        assert_eq!(document.title, "THE GREAT ESCAPE");
        assert_eq!(document.chapters.len(), 1);
        assert_eq!(document.chapters[0].title.as_str(), "Chapter 1");
    }

    #[test]
    fn test_title_line_after_chapter_starts_new_chapter() {
        let document = segment_str(
            "Chapter 1\n\nThe first stretch of road.\n\nTHE LONG NIGHT\n\nDarkness fell quickly.",
        );
        assert_eq!(document.chapters.len(), 2);
        assert_eq!(document.chapters[1].title.as_str(), "THE LONG NIGHT");
    }

    #[test]
    fn test_zero_marker_fallback_uses_document_title() {
        let document = segment_str("THE QUIET HOUSE\n\nNobody had lived there for years.");
        assert_eq!(document.title, "THE QUIET HOUSE");
        assert_eq!(document.chapters.len(), 1);
        assert_eq!(
            document.chapters[0].title,
            ChapterTitle::Titled("THE QUIET HOUSE".to_string())
        );
    }

    #[test]
    fn test_empty_input_yields_empty_document() {
        let document = segment_str("");
        assert!(document.is_empty());
        assert_eq!(document.title, "");
    }

    #[test]
    fn test_marker_with_trailing_chapter_at_eof_is_dropped() {
        let document = segment_str("Chapter 1\n\nSome actual content.\n\nChapter 2");
        assert_eq!(document.chapters.len(), 1);
    }

    #[test]
    fn test_long_line_is_never_a_marker() {
        let config = PipelineConfig {
            marker_max_length: 10,
            ..PipelineConfig::default()
        };
        let normalized = normalize(&RawText::from_text("Chapter Eleven\n\nContent words."), &config);
        let document = segment(&normalized, &config);
        assert_eq!(document.chapters.len(), 1);
        assert_eq!(
            document.chapters[0].title,
            ChapterTitle::Synthetic("Chapter 1".to_string())
        );
    }

    #[test]
    fn test_completeness_no_paragraph_lost_or_duplicated() {
        let config = PipelineConfig::default();
        let source = "Chapter 1\n\nFirst paragraph of text.\n\nSecond paragraph of text.\n\nII\n\nThird paragraph of text.\n\nEpilogue\n\nFourth paragraph of text.";
        let normalized = normalize(&RawText::from_text(source), &config);
        let document = segment(&normalized, &config);

        let output: Vec<&Paragraph> = document
            .chapters
            .iter()
            .flat_map(|c| c.sections.iter())
            .flat_map(|s| s.paragraphs.iter())
            .collect();
        let expected: Vec<&Paragraph> = normalized
            .paragraphs
            .iter()
            .filter(|p| !p.text().starts_with("Chapter 1"))
            .filter(|p| p.text() != "II" && p.text() != "Epilogue")
            .collect();
        assert_eq!(output, expected);
    }

    proptest::proptest! {
        #[test]
        fn prop_numbering_is_monotonic_and_nothing_is_lost(
            chapters in proptest::collection::vec(
                proptest::collection::vec("[a-z]{2,8}( [a-z]{2,8}){2,8}\\.", 1..4),
                1..6,
            )
        ) {
            // Every chapter uses the same printed ordinal; numbering must
            // come from scan order alone.
            let source = chapters
                .iter()
                .map(|paragraphs| format!("Chapter 99\n\n{}", paragraphs.join("\n\n")))
                .collect::<Vec<_>>()
                .join("\n\n");
            let document = segment_str(&source);

            let numbers: Vec<usize> = document.chapters.iter().map(|c| c.number).collect();
            let expected_numbers: Vec<usize> = (1..=chapters.len()).collect();
            proptest::prop_assert_eq!(numbers, expected_numbers);

            let output_count: usize = document
                .chapters
                .iter()
                .flat_map(|c| c.sections.iter())
                .map(|s| s.paragraphs.len())
                .sum();
            let input_count: usize = chapters.iter().map(Vec::len).sum();
            proptest::prop_assert_eq!(output_count, input_count);
        }
    }
}
