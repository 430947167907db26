//! Error types for the Meting client

use std::time::Duration;

/// Result type alias for Meting operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while acquiring a playlist
///
/// Callers of [`crate::PlaylistSource`] never see these: every failure is
/// turned into sample data at the acquisition boundary. The variants only
/// matter for diagnostics, see [`Error::kind`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failure (connection refused, DNS, TLS, broken body...)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The aggregator did not answer before the deadline; the request was aborted
    #[error("Request aborted after {0:?}")]
    Timeout(Duration),

    /// The aggregator answered with a non-2xx status
    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    /// The body is not JSON or not an array of records
    #[error("Unexpected response format: {0}")]
    Format(String),

    /// Well-formed answer without any song
    #[error("Aggregator returned no songs")]
    EmptyResult,

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The metadata probe never signalled before its deadline
    #[error("Metadata probe timed out after {0:?}")]
    ProbeTimeout(Duration),

    /// The metadata probe reported an error
    #[error("Metadata probe failed: {0}")]
    Probe(String),

    /// The operation was cancelled by its caller
    #[error("Operation cancelled")]
    Cancelled,
}

/// Coarse error classification, used for logging and diagnostics only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Http,
    Format,
    EmptyResult,
    Probe,
}

impl Error {
    /// Create a format error
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Create a probe error
    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    /// Diagnostic class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::InvalidUrl(_) | Self::Cancelled => {
                ErrorKind::Network
            }
            Self::Http { .. } => ErrorKind::Http,
            Self::Format(_) => ErrorKind::Format,
            Self::EmptyResult => ErrorKind::EmptyResult,
            Self::ProbeTimeout(_) | Self::Probe(_) => ErrorKind::Probe,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Network => "network",
            Self::Http => "http",
            Self::Format => "format",
            Self::EmptyResult => "empty-result",
            Self::Probe => "probe",
        };
        f.write_str(name)
    }
}
