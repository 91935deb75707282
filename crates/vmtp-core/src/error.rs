//! Errors from the service layer.

use thiserror::Error;

/// Failure while sending, serving or loading configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// Protocol or transport failure.
    #[error(transparent)]
    Smtp(#[from] vmtp_smtp::Error),

    /// Malformed JSON in a config or metadata file.
    #[error("Invalid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    /// File or socket I/O.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration value out of range.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Metadata that is not a flat JSON object.
    #[error("Invalid metadata: {0}")]
    Metadata(String),
}

/// `Result` with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
