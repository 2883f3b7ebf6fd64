use crate::models::ApiResponse;
use crate::observability::{metrics::record_error, ErrorCategory};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Errors surfaced to HTTP clients.
///
/// Every variant maps to one status code and one client-facing message.
/// Internal details carried by `Database` and `Crypto` are logged, never sent.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Unknown user or wrong password at login.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A protected path was requested without a bearer token.
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("Token expired")]
    ExpiredToken,

    /// Refresh token presented after its own expiry.
    #[error("Refresh token expired")]
    ExpiredRefreshToken,

    /// Malformed token, bad signature, or wrong token type.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Internal server error")]
    Internal,
}

impl AdminError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdminError::MissingCredentials => StatusCode::FORBIDDEN,
            AdminError::InvalidCredentials
            | AdminError::ExpiredToken
            | AdminError::ExpiredRefreshToken
            | AdminError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AdminError::Database(_) | AdminError::Crypto(_) | AdminError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn client_message(&self) -> &'static str {
        match self {
            AdminError::MissingCredentials => "Unauthorized access, please log in first",
            AdminError::InvalidCredentials => "Unauthorized",
            AdminError::ExpiredToken => "Token expired, please log in again",
            AdminError::ExpiredRefreshToken => "Refresh token expired, please log in again",
            AdminError::InvalidToken(_) => "Token invalid, please log in again",
            AdminError::Database(_) | AdminError::Crypto(_) | AdminError::Internal => {
                "Internal server error"
            }
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        record_error(ErrorCategory::from(&self).as_str(), status.as_u16());

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(target: "admin.errors", error = %self, "Request failed");
        }

        let body = ApiResponse::<()>::error(status.as_u16(), self.client_message());

        (status, Json(body)).into_response()
    }
}
