//! Error types for the tilestage editor core

use thiserror::Error;

/// Main error type for the editor core
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to fetch stage '{url}': {reason}")]
    Fetch { url: String, reason: String },

    #[error("Document error: {0}")]
    Document(String),

    #[error("Unknown object class id {0}")]
    UnknownClass(u32),

    #[error("Class registry error: {0}")]
    Registry(String),

    #[error("Stage pager has been disposed")]
    PagerDisposed,

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Build a fetch error for `url` from any displayable cause.
    pub fn fetch(url: &str, reason: impl std::fmt::Display) -> Self {
        Error::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
