//! Text normalization: strips extraction artifacts, repairs line-break
//! hyphenation, reflows hard-wrapped lines into paragraphs, and tags each
//! paragraph with a content kind.
//!
//! Normalization never fails. A line that cannot be confidently classified
//! is preserved as body content; losing text is worse than keeping noise.

mod artifacts;
mod sentences;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;

/// A single physical line of raw input.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// 1-based line number from the source document.
    pub number: usize,
    pub text: String,
}

/// Raw decoded text: an ordered sequence of numbered lines, as handed over
/// by a format-specific extractor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawText {
    pub lines: Vec<Line>,
}

impl RawText {
    pub fn new(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    /// Build from a text blob, numbering lines from 1. Windows line endings
    /// are normalized away.
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .split('\n')
            .enumerate()
            .map(|(i, line)| Line {
                number: i + 1,
                text: line.trim_end_matches('\r').to_string(),
            })
            .collect();
        Self { lines }
    }

    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.text.trim().is_empty())
    }
}

/// Content kind of a normalized paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphKind {
    Body,
    ListItem,
    Quote,
    Code,
}

/// A normalized paragraph.
///
/// Body paragraphs carry sentences produced by dialog-aware splitting;
/// list, quote, and code paragraphs keep one entry per physical line, text
/// verbatim, markers and fences included (tagging classifies, it does not
/// rewrite). Entries are never empty except for blank interior lines of a
/// code block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub kind: ParagraphKind,
    pub sentences: Vec<String>,
    /// Source line number of the paragraph's first line.
    pub line: usize,
    /// Number of physical lines the paragraph spanned in the source.
    pub source_lines: usize,
}

impl Paragraph {
    /// Whitespace-delimited word count.
    pub fn word_count(&self) -> usize {
        self.sentences
            .iter()
            .map(|s| s.split_whitespace().count())
            .sum()
    }

    /// The paragraph's full text. Body sentences are joined with spaces;
    /// list, quote, and code entries keep their own lines.
    pub fn text(&self) -> String {
        match self.kind {
            ParagraphKind::Body => self.sentences.join(" "),
            _ => self.sentences.join("\n"),
        }
    }
}

/// Cleaned text as an ordered sequence of tagged paragraphs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedText {
    pub paragraphs: Vec<Paragraph>,
}

impl NormalizedText {
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Render back to plain text, paragraphs separated by blank lines.
    /// `normalize` over this rendering is a fixed point.
    pub fn to_plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

static LIST_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-*]|\d{1,3}\.)\s+").expect("valid regex"));
static BULLET_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-*]\s+").expect("valid regex"));
static BARE_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("valid regex"));
static BARE_ROMAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[IVXLCDM]{2,}$").expect("valid regex"));

fn is_fence(trimmed: &str) -> bool {
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// Clean raw text into tagged paragraphs.
pub fn normalize(raw: &RawText, config: &PipelineConfig) -> NormalizedText {
    let repeated = artifacts::census_repeats(&raw.lines, config);

    let mut paragraphs: Vec<Paragraph> = Vec::new();
    let mut group: Vec<(usize, String)> = Vec::new();
    let mut code_lines: Vec<String> = Vec::new();
    let mut code_start: Option<usize> = None;

    for line in &raw.lines {
        let trimmed = line.text.trim();

        if let Some(start) = code_start {
            code_lines.push(line.text.clone());
            if is_fence(trimmed) {
                paragraphs.push(code_paragraph(start, std::mem::take(&mut code_lines)));
                code_start = None;
            }
            continue;
        }

        if is_fence(trimmed) {
            finish_group(&mut group, &mut paragraphs);
            code_start = Some(line.number);
            code_lines.push(line.text.clone());
            continue;
        }

        if trimmed.is_empty() {
            finish_group(&mut group, &mut paragraphs);
            continue;
        }

        // Standalone digit or Roman-numeral lines become their own
        // paragraphs so the segmenter can weigh them as chapter markers.
        // The same digits interrupting a paragraph are a page number.
        if config.detect_bare_numbers
            && (BARE_INTEGER.is_match(trimmed) || BARE_ROMAN.is_match(trimmed))
        {
            if group.is_empty() {
                paragraphs.push(Paragraph {
                    kind: ParagraphKind::Body,
                    sentences: vec![trimmed.to_string()],
                    line: line.number,
                    source_lines: 1,
                });
            } else if config.remove_page_numbers && BARE_INTEGER.is_match(trimmed) {
                debug!(
                    "line {}: dropped page number inside paragraph: {:?}",
                    line.number, trimmed
                );
            } else {
                group.push((line.number, trimmed.to_string()));
            }
            continue;
        }

        if artifacts::is_page_number(trimmed, config) {
            debug!(
                "line {}: dropped page-number artifact: {:?}",
                line.number, trimmed
            );
            continue;
        }

        if repeated.contains(&artifacts::repeat_signature(trimmed)) {
            debug!(
                "line {}: dropped repeated header/footer: {:?}",
                line.number, trimmed
            );
            continue;
        }

        group.push((line.number, trimmed.to_string()));
    }

    // An unterminated fence still yields a code paragraph.
    if let Some(start) = code_start {
        paragraphs.push(code_paragraph(start, code_lines));
    }
    finish_group(&mut group, &mut paragraphs);

    NormalizedText { paragraphs }
}

fn code_paragraph(start: usize, lines: Vec<String>) -> Paragraph {
    let source_lines = lines.len();
    Paragraph {
        kind: ParagraphKind::Code,
        sentences: lines,
        line: start,
        source_lines,
    }
}

fn finish_group(group: &mut Vec<(usize, String)>, paragraphs: &mut Vec<Paragraph>) {
    if group.is_empty() {
        return;
    }
    let collected = std::mem::take(group);
    let line = collected[0].0;
    let source_lines = collected.len();
    let texts: Vec<String> = collected.into_iter().map(|(_, text)| text).collect();

    let kind = classify_group(&texts);
    let sentences = match kind {
        ParagraphKind::Body => sentences::split_paragraph(&join_soft_wrapped(&texts)),
        _ => texts,
    };

    paragraphs.push(Paragraph {
        kind,
        sentences,
        line,
        source_lines,
    });
}

/// Tag a line group. A single numbered line ("1. Introduction") stays body
/// text: it is ambiguous between a list item and a section heading, and the
/// segmenter resolves single lines. Multi-line numbered groups are lists.
fn classify_group(lines: &[String]) -> ParagraphKind {
    if lines.iter().all(|l| l.starts_with('>')) {
        return ParagraphKind::Quote;
    }
    if lines.iter().all(|l| LIST_LINE.is_match(l))
        && (lines.len() > 1 || BULLET_LINE.is_match(&lines[0]))
    {
        return ParagraphKind::ListItem;
    }
    ParagraphKind::Body
}

/// Join soft-wrapped lines into one string, repairing end-of-line
/// hyphenation where both sides of the break are lowercase letters.
fn join_soft_wrapped(lines: &[String]) -> String {
    let mut text = String::new();
    for line in lines {
        if text.is_empty() {
            text.push_str(line);
        } else if can_join_hyphen(&text, line) {
            text.pop();
            text.push_str(line);
        } else {
            text.push(' ');
            text.push_str(line);
        }
    }
    text
}

fn can_join_hyphen(accumulated: &str, next: &str) -> bool {
    let mut tail = accumulated.chars().rev();
    if tail.next() != Some('-') {
        return false;
    }
    let before = match tail.next() {
        Some(c) => c,
        None => return false,
    };
    let first = match next.chars().next() {
        Some(c) => c,
        None => return false,
    };
    before.is_lowercase() && first.is_lowercase()
}
