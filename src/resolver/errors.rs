// Error taxonomy shared by the metadata backend and the external extractor

use thiserror::Error;

/// Result alias used across the resolver
pub type Result<T> = std::result::Result<T, SourceError>;

/// Failures surfaced by resolution operations
#[derive(Error, Debug)]
pub enum SourceError {
    /// Operation exceeded its wall-clock budget
    #[error("Timed out after {0}s")]
    Timeout(u64),

    /// Video or playlist does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Content exists but is private, auth-gated or taken down
    #[error("Private or unavailable: {0}")]
    PrivateOrUnavailable(String),

    /// External tool produced malformed or empty output
    #[error("Invalid extractor result: {0}")]
    InvalidResult(String),

    /// Extractor binary missing at the configured path
    #[error("Extractor binary not found: {0}")]
    BinaryNotFound(String),

    /// Opaque diagnostic text from the external process
    #[error("Extractor error: {0}")]
    ExtractorError(String),

    /// Mix id is not the marker prefix plus an 11-character video id
    #[error("Invalid mix id: {0}")]
    InvalidMixId(String),

    /// Seed video for a mix could not be fetched
    #[error("Mix {0} cannot be loaded (may be a private or unavailable Mix)")]
    MixUnavailable(String),

    /// HTTP transport failure talking to the metadata backend
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Subprocess or file I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend response did not match any known shape
    #[error("Parse error: {0}")]
    Parse(String),
}

impl SourceError {
    /// Check if this is a timeout (callers may retry later)
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if the content simply does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if credentials might make the content reachable
    pub fn is_auth_gated(&self) -> bool {
        matches!(self, Self::PrivateOrUnavailable(_))
    }
}
