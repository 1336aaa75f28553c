//! Sentence splitting for reflowed body paragraphs, using the seams
//! library (dialog-aware).

use seams::sentence_detector::dialog_detector::SentenceDetectorDialog;
use std::sync::OnceLock;

static DETECTOR: OnceLock<SentenceDetectorDialog> = OnceLock::new();

fn detector() -> &'static SentenceDetectorDialog {
    DETECTOR.get_or_init(|| {
        SentenceDetectorDialog::new().expect("seams sentence detector should initialize")
    })
}

/// Split a reflowed paragraph into sentences. Falls back to returning the
/// input as a single sentence when detection yields nothing, so no content
/// is ever lost.
pub(super) fn split_paragraph(text: &str) -> Vec<String> {
    let detected = match detector().detect_sentences_borrowed(text) {
        Ok(sentences) => sentences,
        Err(_) => return vec![text.to_string()],
    };

    let sentences: Vec<String> = detected
        .iter()
        .map(|s| s.normalize())
        .filter(|s| !s.is_empty())
        .collect();

    if sentences.is_empty() {
        vec![text.to_string()]
    } else {
        sentences
    }
}
