//! Page-number and running header/footer artifact detection.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use super::{Line, is_fence};
use crate::config::PipelineConfig;

/// Decorated page-number forms: "Page 4", "Page 4 of 212", "4 of 212",
/// "- 7 -", "p. 12". All anchored to the whole line, so a year inside a
/// sentence ("Copyright 2023 by Jane Doe") can never match.
static PAGE_DECORATED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:page\s+\d+(?:\s+of\s+\d+)?|\d+\s+of\s+\d+|[-–—]\s*\d+\s*[-–—]|p\.?\s*\d+)$",
    )
    .expect("valid regex")
});

static BARE_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("valid regex"));

/// Whether a trimmed line is a page-number artifact under the active config.
pub(super) fn is_page_number(line: &str, config: &PipelineConfig) -> bool {
    if !config.remove_page_numbers {
        return false;
    }
    if PAGE_DECORATED.is_match(line) {
        return true;
    }
    // A lone integer is only safe to strip when bare-number chapter markers
    // are disabled; otherwise the segmenter owns that call.
    !config.detect_bare_numbers && BARE_INTEGER.is_match(line)
}

/// Signature used to spot running headers/footers: case-folded, with any
/// trailing page number and its decoration stripped.
pub(super) fn repeat_signature(line: &str) -> String {
    static TRAILING_NUMBER: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[\s\-–—|.]*\d+[\s\-–—|.]*$").expect("valid regex"));
    TRAILING_NUMBER.replace(line, "").trim().to_lowercase()
}

/// Heading keywords whose numbered series ("Chapter 1", "Chapter 2", ...)
/// all strip to the same signature. Those lines are structure, never
/// running headers.
const HEADING_KEYWORDS: &[&str] = &["chapter", "part", "book"];

/// First pass over the raw lines: collect signatures that recur often
/// enough to be running headers or footers. Fenced code regions are
/// excluded from the census.
pub(super) fn census_repeats(lines: &[Line], config: &PipelineConfig) -> HashSet<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut in_code = false;

    for line in lines {
        let trimmed = line.text.trim();
        if is_fence(trimmed) {
            in_code = !in_code;
            continue;
        }
        if in_code || trimmed.is_empty() {
            continue;
        }
        let signature = repeat_signature(trimmed);
        if HEADING_KEYWORDS.contains(&signature.as_str()) {
            continue;
        }
        if signature.chars().any(|c| c.is_alphabetic()) {
            *counts.entry(signature).or_insert(0) += 1;
        }
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count >= config.header_footer_min_repeat)
        .map(|(signature, _)| signature)
        .collect()
}
