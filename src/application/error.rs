// Application errors - Failures talking to the tank backend
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Short text for the on-screen error indicator.
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "Error loading data: backend unreachable",
            FetchError::Status { .. } => "Error loading data: backend error",
            FetchError::Malformed(_) => "Error loading data: unexpected response",
        }
    }
}
