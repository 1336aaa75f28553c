//! Marker classification: the ordered rule set that decides whether a
//! standalone line signals a structural boundary, and what kind.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::PipelineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Part,
    Book,
    Chapter,
    NamedSection,
    SectionHeading,
    StandaloneNumber,
    StandaloneRoman,
    TitleLine,
}

/// A line recognized as a structural boundary candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub kind: MarkerKind,
    /// The matched line, as written in the source.
    pub raw: String,
    /// Source line number the marker came from.
    pub line: usize,
    /// Printed ordinal, when the marker carried one.
    pub ordinal: Option<u32>,
}

type Rule = fn(&str, &PipelineConfig) -> Option<(MarkerKind, Option<u32>)>;

/// Classification rules in priority order. The first match wins; the order
/// is part of the contract.
const RULES: &[Rule] = &[
    part_or_book,
    chapter_heading,
    named_section,
    section_heading,
    standalone_number,
    standalone_roman,
    title_line,
];

/// Classify a candidate marker line. Returns `None` for ordinary text.
pub fn classify(text: &str, line: usize, config: &PipelineConfig) -> Option<Marker> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    RULES.iter().find_map(|rule| {
        rule(trimmed, config).map(|(kind, ordinal)| Marker {
            kind,
            raw: trimmed.to_string(),
            line,
            ordinal,
        })
    })
}

static PART_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(part|book)\s+(\S+)(?:\s+.*)?$").expect("valid regex"));

fn part_or_book(text: &str, _config: &PipelineConfig) -> Option<(MarkerKind, Option<u32>)> {
    let caps = PART_RE.captures(text)?;
    let ordinal = parse_ordinal(caps.get(2)?.as_str())?;
    let kind = if caps.get(1)?.as_str().eq_ignore_ascii_case("book") {
        MarkerKind::Book
    } else {
        MarkerKind::Part
    };
    Some((kind, Some(ordinal)))
}

static CHAPTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^chapter\s+(\S+)(?:\s+.*)?$").expect("valid regex"));

fn chapter_heading(text: &str, _config: &PipelineConfig) -> Option<(MarkerKind, Option<u32>)> {
    let caps = CHAPTER_RE.captures(text)?;
    let ordinal = parse_ordinal(caps.get(1)?.as_str())?;
    Some((MarkerKind::Chapter, Some(ordinal)))
}

fn named_section(text: &str, config: &PipelineConfig) -> Option<(MarkerKind, Option<u32>)> {
    let word = text.trim_end_matches([':', '.']).trim();
    if config.is_named_section(word) {
        Some((MarkerKind::NamedSection, None))
    } else {
        None
    }
}

static SECTION_HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3}|[IVXLCDM]{1,7})\.\s+\S").expect("valid regex"));

fn section_heading(text: &str, _config: &PipelineConfig) -> Option<(MarkerKind, Option<u32>)> {
    let caps = SECTION_HEADING_RE.captures(text)?;
    let ordinal = parse_ordinal(caps.get(1)?.as_str());
    Some((MarkerKind::SectionHeading, ordinal))
}

static BARE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("valid regex"));

fn standalone_number(text: &str, config: &PipelineConfig) -> Option<(MarkerKind, Option<u32>)> {
    if !config.detect_bare_numbers || !BARE_NUMBER_RE.is_match(text) {
        return None;
    }
    Some((MarkerKind::StandaloneNumber, text.parse().ok()))
}

static BARE_ROMAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[IVXLCDM]+$").expect("valid regex"));

fn standalone_roman(text: &str, config: &PipelineConfig) -> Option<(MarkerKind, Option<u32>)> {
    if !config.detect_bare_numbers || !BARE_ROMAN_RE.is_match(text) {
        return None;
    }
    Some((MarkerKind::StandaloneRoman, parse_roman(text)))
}

fn title_line(text: &str, _config: &PipelineConfig) -> Option<(MarkerKind, Option<u32>)> {
    let words = text.split_whitespace().count();
    if !(1..=10).contains(&words) {
        return None;
    }
    if text.ends_with(['.', '?', '!']) {
        return None;
    }
    if !text.chars().any(|c| c.is_alphabetic()) {
        return None;
    }
    if text.chars().any(|c| c.is_lowercase()) {
        return None;
    }
    Some((MarkerKind::TitleLine, None))
}

/// Parse a printed ordinal: digits, a Roman numeral, or a spelled-out
/// number. Trailing separator punctuation ("1:", "IV.") is ignored.
fn parse_ordinal(token: &str) -> Option<u32> {
    let token = token.trim_matches(|c: char| matches!(c, '.' | ',' | ':' | ';' | '-' | '—' | '–'));
    if token.is_empty() {
        return None;
    }
    if token.chars().all(|c| c.is_ascii_digit()) {
        return token.parse().ok();
    }
    if let Some(value) = parse_roman(&token.to_uppercase()) {
        return Some(value);
    }
    parse_spelled_number(token)
}

/// Parse a Roman numeral, tolerating simple subtractive forms. Anything
/// containing other characters is rejected.
fn parse_roman(text: &str) -> Option<u32> {
    if text.is_empty() {
        return None;
    }
    let mut total: u32 = 0;
    let mut prev: u32 = 0;
    for c in text.chars() {
        let value = match c {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            'D' => 500,
            'M' => 1000,
            _ => return None,
        };
        if prev > 0 && value > prev {
            total = total + value - 2 * prev;
        } else {
            total += value;
        }
        prev = value;
    }
    Some(total)
}

const UNITS: &[(&str, u32)] = &[
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
];

const TENS: &[(&str, u32)] = &[
    ("twenty", 20),
    ("thirty", 30),
    ("forty", 40),
    ("fifty", 50),
    ("sixty", 60),
    ("seventy", 70),
    ("eighty", 80),
    ("ninety", 90),
];

/// Parse a spelled-out number from "one" through "ninety-nine".
fn parse_spelled_number(token: &str) -> Option<u32> {
    let lower = token.to_lowercase();
    if let Some((_, value)) = UNITS.iter().find(|(word, _)| *word == lower) {
        return Some(*value);
    }
    if let Some((_, value)) = TENS.iter().find(|(word, _)| *word == lower) {
        return Some(*value);
    }
    let (tens_word, unit_word) = lower.split_once('-')?;
    let tens = TENS.iter().find(|(word, _)| *word == tens_word)?.1;
    let unit = UNITS.iter().find(|(word, _)| *word == unit_word)?.1;
    if unit >= 10 {
        return None;
    }
    Some(tens + unit)
}
