/// Error types for ecoscan data sources
use thiserror::Error;

/// Failure of a single upstream source.
///
/// These never reach callers of a [`crate::source::SourceChain`]; the chain
/// logs them and moves on to the next source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// HTTP request failed
    #[cfg(feature = "api")]
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("Bad response status {status} from {url}")]
    BadStatus { status: u16, url: String },

    /// Failed to parse a JSON body
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Upstream answered but had nothing usable near the query center
    #[error("No data available near {lat},{lng}")]
    NoData { lat: f64, lng: f64 },

    /// Source requires a key that was not configured
    #[error("API key not configured for {0}")]
    MissingApiKey(&'static str),

    /// Upstream reported an error in its payload
    #[error("API error: {0}")]
    Api(String),

    /// Payload parsed but did not have the expected shape
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

/// Type alias for Results using SourceError
pub type Result<T> = std::result::Result<T, SourceError>;
