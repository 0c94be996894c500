// src/error.rs
use thiserror::Error;

/// Failures reported by a `PageDriver`. All of them are soft from the wizard's point of view.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("element not found: {0}")]
    NotFound(String),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("browser error: {0}")]
    Browser(String),
}

impl From<chromiumoxide::error::CdpError> for DriverError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        DriverError::Browser(err.to_string())
    }
}

/// Failures from the answer oracle. The resolver turns every variant into a no-answer round.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("oracle returned no usable answers")]
    Empty,

    #[error("oracle misconfigured: {0}")]
    Config(String),
}
