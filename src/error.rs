//! Error types for the PDF workbench library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PDF workbench library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Merge called with nothing to merge
    #[error("No input files provided")]
    NoInputFiles,

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {}", .0.display())]
    EmptyPdf(PathBuf),

    /// Encrypted with a user password, so lopdf cannot read its pages
    #[error("PDF is password protected: {}", .0.display())]
    Locked(PathBuf),

    /// Supplied password was rejected by the security handler
    #[error("Incorrect password for {}", .0.display())]
    IncorrectPassword(PathBuf),

    /// Encryption could not be applied
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Date key was not `YYYY-MM-DD`
    #[error("Invalid date key: {0}")]
    InvalidDateKey(String),

    /// Usage file exists but cannot be parsed
    #[error("Usage record at {} is malformed: {source}", .path.display())]
    UsageCorrupted {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Usage record could not be serialized
    #[error("Failed to encode usage record: {0}")]
    UsageEncode(#[source] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Whether the error came from the PDF collaborator rejecting its input
    /// rather than from local I/O or state.
    pub fn is_invalid_pdf(&self) -> bool {
        matches!(
            self,
            Error::Pdf(_) | Error::EmptyPdf(_) | Error::Locked(_) | Error::Encryption(_)
        )
    }
}
