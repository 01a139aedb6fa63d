//! Errors returned from the REST endpoints

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// API error, rendered as `{ "message": ... }` JSON body
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or incomplete request
    #[error("{0}")]
    BadRequest(String),
    /// Resource does not exist
    #[error("{0}")]
    NotFound(String),
    /// Missing identity or insufficient rights
    #[error("{0}")]
    Unauthorized(String),
    /// Any unexpected failure, details are logged but never exposed
    #[error("Internal server error")]
    Internal(color_eyre::Report),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }
}

impl From<color_eyre::Report> for ApiError {
    fn from(err: color_eyre::Report) -> Self {
        Self::Internal(err)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Self::Internal(err) = self {
            error!(?err, "Request failed");
        }

        HttpResponse::build(self.status_code()).json(ErrorBody {
            message: self.to_string(),
        })
    }
}
