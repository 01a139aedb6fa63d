//! Client errors

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Request could not be sent or the response could not be read
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Server rejected the request
    #[error("Server responded with {status}: {message}")]
    Api { status: StatusCode, message: String },
    /// Session storage could not be accessed
    #[error("Session storage failure: {0}")]
    Storage(#[from] std::io::Error),
    /// Malformed JSON, either received or stored
    #[error("Malformed data: {0}")]
    Decoding(#[from] serde_json::Error),
}

impl ClientError {
    /// HTTP status of the rejected request, if the server was reached
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network(err) => err.status(),
            _ => None,
        }
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
