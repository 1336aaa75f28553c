//! Metadata enrichment: fill fields the format-specific extractor could
//! not supply by scanning the segmented document.
//!
//! Enrichment is a pure merge and never fails. Externally supplied fields
//! are kept as-is; everything derived here is best-effort and absent
//! fields simply stay absent.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::{Chapter, DEFAULT_LANGUAGE, Document, Metadata};
use crate::normalize::Paragraph;

/// Chapters scanned from each end of the document for ISBN and copyright
/// lines.
const EDGE_CHAPTER_SPAN: usize = 2;

/// Maximum words for a paragraph to qualify as a title guess.
const TITLE_MAX_WORDS: usize = 12;

/// Merge externally supplied metadata with guesses derived from the
/// document. External fields always win.
pub fn enrich(document: &Document, external: &Metadata) -> Metadata {
    let mut metadata = external.clone();

    if metadata.title.is_none() {
        metadata.title = guess_title(document);
    }
    if metadata.author.is_none() {
        metadata.author = guess_author(document);
    }
    if metadata.isbn.is_none() {
        metadata.isbn = find_isbn(document);
    }
    if metadata.year.is_none() {
        metadata.year = find_copyright_year(document);
    }
    if metadata.language.is_empty() {
        metadata.language = DEFAULT_LANGUAGE.to_string();
    }

    metadata
}

/// Chapters at the edges of the document, where publication details live.
fn edge_chapters(document: &Document) -> impl Iterator<Item = &Chapter> {
    let total = document.chapters.len();
    document
        .chapters
        .iter()
        .enumerate()
        .filter_map(move |(index, chapter)| {
            if index < EDGE_CHAPTER_SPAN || index + EDGE_CHAPTER_SPAN >= total {
                Some(chapter)
            } else {
                None
            }
        })
}

static ISBN_CANDIDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d[\d\-]{8,15}[\dXx]\b").expect("valid regex"));

fn find_isbn(document: &Document) -> Option<String> {
    for chapter in edge_chapters(document) {
        let text = chapter.text();
        for candidate in ISBN_CANDIDATE.find_iter(&text) {
            let digits: String = candidate.as_str().chars().filter(|c| *c != '-').collect();
            if is_valid_isbn(&digits) {
                debug!("found ISBN {:?} in chapter {}", candidate.as_str(), chapter.number);
                return Some(candidate.as_str().to_string());
            }
        }
    }
    None
}

/// Check-digit validation for ISBN-10 and ISBN-13 digit strings.
fn is_valid_isbn(digits: &str) -> bool {
    match digits.chars().count() {
        10 => is_valid_isbn10(digits),
        13 => is_valid_isbn13(digits),
        _ => false,
    }
}

fn is_valid_isbn10(digits: &str) -> bool {
    let mut sum: u32 = 0;
    for (i, c) in digits.chars().enumerate() {
        let value = match c {
            '0'..='9' => c as u32 - '0' as u32,
            'X' | 'x' if i == 9 => 10,
            _ => return false,
        };
        sum += (10 - i as u32) * value;
    }
    sum % 11 == 0
}

fn is_valid_isbn13(digits: &str) -> bool {
    let mut sum: u32 = 0;
    for (i, c) in digits.chars().enumerate() {
        let value = match c.to_digit(10) {
            Some(v) => v,
            None => return false,
        };
        sum += if i % 2 == 0 { value } else { 3 * value };
    }
    sum % 10 == 0
}

fn content_paragraphs(chapter: &Chapter) -> impl Iterator<Item = &Paragraph> {
    chapter
        .sections
        .iter()
        .flat_map(|s| s.paragraphs.iter())
        .filter(|p| !p.text().trim().is_empty())
}

fn looks_like_title(text: &str) -> bool {
    let words = text.split_whitespace().count();
    (1..=TITLE_MAX_WORDS).contains(&words) && !text.trim_end().ends_with(['.', '?', '!'])
}

fn guess_title(document: &Document) -> Option<String> {
    if !document.title.is_empty() {
        return Some(document.title.clone());
    }
    let first = content_paragraphs(document.chapters.first()?).next()?;
    let text = first.text();
    if looks_like_title(&text) {
        Some(text)
    } else {
        None
    }
}

static BY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^by\s+(\S.*)$").expect("valid regex"));

fn guess_author(document: &Document) -> Option<String> {
    let chapter = document.chapters.first()?;
    let mut paragraphs = content_paragraphs(chapter);
    let first = paragraphs.next()?.text();
    if !looks_like_title(&first) {
        return None;
    }
    let second = paragraphs.next()?.text();
    let caps = BY_LINE.captures(second.trim())?;
    let author = caps.get(1)?.as_str().trim().trim_end_matches('.').to_string();
    if author.is_empty() { None } else { Some(author) }
}

static COPYRIGHT_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:copyright|\(c\)|©)\s*(?:\(c\)\s*|©\s*)?(\d{4})").expect("valid regex"));

fn find_copyright_year(document: &Document) -> Option<u32> {
    for chapter in document.chapters.iter().take(EDGE_CHAPTER_SPAN) {
        let text = chapter.text();
        if let Some(caps) = COPYRIGHT_YEAR.captures(&text) {
            if let Some(year) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
                if (1000..=2999).contains(&year) {
                    return Some(year);
                }
            }
        }
    }
    None
}
