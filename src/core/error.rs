use thiserror::Error;

/// Extraction failures fall into two classes: anticipated, user-facing
/// conditions (content removed, private, geo-blocked) and genuine faults
/// (page format changed, network error). Callers can branch on
/// [`ExtractError::is_expected`] when deciding how to report a failure.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Anticipated failure: the content is gone, private or removed.
    #[error("{0}")]
    Expected(String),

    /// Anticipated failure: the content is not available in this region.
    #[error("{0}")]
    GeoRestricted(String),

    /// A required field matched none of its patterns. Usually means the
    /// site changed its page format.
    #[error("unable to extract {0}")]
    UnableToExtract(&'static str),

    #[error("no suitable extractor found for URL: {0}")]
    Unsupported(String),

    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed XML payload: {0}")]
    Xml(#[from] roxmltree::Error),
}

impl ExtractError {
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::Expected(_) | Self::GeoRestricted(_))
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
