//! Error types for the chapterize library.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChapterizeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ChapterizeError>;
