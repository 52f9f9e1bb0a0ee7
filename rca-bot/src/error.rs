use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RcaBotError {
    #[error("Failed to fetch document: {0}")]
    Fetch(String),

    #[error("No extractable text in document: {0}")]
    EmptyDocument(String),

    #[error("No knowledge base found at {}, process a URL first", .0.display())]
    NotFound(PathBuf),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Knowledge base is corrupt: {0}")]
    CorruptIndex(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl RcaBotError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound(_) => 1,
            Self::Fetch(_) | Self::EmptyDocument(_) => 2,
            Self::Config(_) => 3,
            Self::Generation(_) => 4,
            Self::CorruptIndex(_) => 5,
            Self::Io(_) | Self::Serialization(_) | Self::Http(_) => 10,
        }
    }
}

pub type Result<T> = std::result::Result<T, RcaBotError>;
