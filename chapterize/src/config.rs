//! Pipeline configuration with serde-backed defaults and TOML loading.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ChapterizeError, Result};

const DEFAULT_HEADER_FOOTER_MIN_REPEAT: usize = 3;
const DEFAULT_MARKER_MAX_LENGTH: usize = 80;
const DEFAULT_MIN_PREFACE_WORDS: usize = 20;
const DEFAULT_WORDS_PER_MINUTE: f64 = 150.0;

/// Keywords that open a new chapter when standalone on a line.
const DEFAULT_NAMED_SECTIONS: &[&str] = &[
    "Preface",
    "Prologue",
    "Introduction",
    "Epilogue",
    "Afterword",
    "Appendix",
    "Conclusion",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Strip page-number lines during normalization
    #[serde(default = "default_true")]
    pub remove_page_numbers: bool,

    /// Minimum occurrences before a repeated line counts as a running
    /// header/footer and is dropped from every occurrence
    #[serde(default = "default_header_footer_min_repeat")]
    pub header_footer_min_repeat: usize,

    /// Treat standalone digit or Roman-numeral lines as chapter markers
    #[serde(default = "default_true")]
    pub detect_bare_numbers: bool,

    /// Section keywords that start a new chapter when standalone on a line
    #[serde(default = "default_named_sections")]
    pub named_sections: Vec<String>,

    /// Maximum length of a line considered as a structural marker
    #[serde(default = "default_marker_max_length")]
    pub marker_max_length: usize,

    /// Minimum word count for leading text to be kept as a preface chapter
    #[serde(default = "default_min_preface_words")]
    pub min_preface_words: usize,

    /// Narration rate used for duration estimates
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: f64,
}

fn default_true() -> bool {
    true
}

fn default_header_footer_min_repeat() -> usize {
    DEFAULT_HEADER_FOOTER_MIN_REPEAT
}

fn default_named_sections() -> Vec<String> {
    DEFAULT_NAMED_SECTIONS.iter().map(|s| s.to_string()).collect()
}

fn default_marker_max_length() -> usize {
    DEFAULT_MARKER_MAX_LENGTH
}

fn default_min_preface_words() -> usize {
    DEFAULT_MIN_PREFACE_WORDS
}

fn default_words_per_minute() -> f64 {
    DEFAULT_WORDS_PER_MINUTE
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            remove_page_numbers: true,
            header_footer_min_repeat: default_header_footer_min_repeat(),
            detect_bare_numbers: true,
            named_sections: default_named_sections(),
            marker_max_length: default_marker_max_length(),
            min_preface_words: default_min_preface_words(),
            words_per_minute: default_words_per_minute(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file, using defaults for absent keys.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: PipelineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that would otherwise surface mid-pipeline.
    pub fn validate(&self) -> Result<()> {
        if !self.words_per_minute.is_finite() || self.words_per_minute <= 0.0 {
            return Err(ChapterizeError::Config(format!(
                "words_per_minute must be positive, got {}",
                self.words_per_minute
            )));
        }
        if self.marker_max_length == 0 {
            return Err(ChapterizeError::Config(
                "marker_max_length must be at least 1".to_string(),
            ));
        }
        if self.header_footer_min_repeat < 2 {
            return Err(ChapterizeError::Config(format!(
                "header_footer_min_repeat must be at least 2, got {}",
                self.header_footer_min_repeat
            )));
        }
        if self.named_sections.is_empty() && !self.detect_bare_numbers {
            return Err(ChapterizeError::Config(
                "no chapter markers possible: named_sections is empty and \
                 detect_bare_numbers is disabled"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Case-insensitive membership test for named section keywords.
    pub fn is_named_section(&self, word: &str) -> bool {
        self.named_sections
            .iter()
            .any(|s| s.eq_ignore_ascii_case(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert!(config.remove_page_numbers);
        assert!(config.detect_bare_numbers);
        assert_eq!(config.header_footer_min_repeat, 3);
        assert_eq!(config.marker_max_length, 80);
        assert_eq!(config.min_preface_words, 20);
        assert_eq!(config.words_per_minute, 150.0);
        assert_eq!(config.named_sections.len(), 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
remove_page_numbers = false
detect_bare_numbers = false
named_sections = ["Prologue", "Epilogue"]
words_per_minute = 180.0
"#;
        let config: PipelineConfig = toml::from_str(toml_str).unwrap();
        assert!(!config.remove_page_numbers);
        assert!(!config.detect_bare_numbers);
        assert_eq!(config.named_sections, vec!["Prologue", "Epilogue"]);
        assert_eq!(config.words_per_minute, 180.0);
        // Absent keys fall back to defaults.
        assert_eq!(config.marker_max_length, 80);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: PipelineConfig = toml::from_str("").unwrap();
        assert_eq!(config.header_footer_min_repeat, 3);
        assert_eq!(config.words_per_minute, 150.0);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = PipelineConfig::load(Path::new("/nonexistent/chapterize.toml")).unwrap_err();
        assert!(matches!(err, ChapterizeError::Io(_)));
    }

    #[test]
    fn test_validate_rejects_bad_rate() {
        let config = PipelineConfig {
            words_per_minute: -10.0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            words_per_minute: f64::NAN,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_no_possible_markers() {
        let config = PipelineConfig {
            named_sections: Vec::new(),
            detect_bare_numbers: false,
            ..PipelineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("no chapter markers possible"));
    }

    #[test]
    fn test_validate_rejects_low_repeat_threshold() {
        let config = PipelineConfig {
            header_footer_min_repeat: 1,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_named_section_case_insensitive() {
        let config = PipelineConfig::default();
        assert!(config.is_named_section("Prologue"));
        assert!(config.is_named_section("PROLOGUE"));
        assert!(config.is_named_section("epilogue"));
        assert!(!config.is_named_section("Chapter"));
    }
}
