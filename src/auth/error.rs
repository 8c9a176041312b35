//! Authentication and authorization error types.
//!
//! Every token failure (malformed, bad signature, wrong algorithm, expired)
//! collapses into [`AuthError::InvalidToken`] so the response never tells a
//! caller why a token was refused.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing, malformed, forged, wrongly-signed or expired token.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Authenticated, but not entitled to act on this resource.
    #[error("{0}")]
    Forbidden(String),

    /// Candidate secret does not match the stored hash.
    #[error("credentials do not match")]
    Mismatch,

    /// Hash backend failure, including an unparseable stored hash.
    #[error("credential hashing failed: {0}")]
    HashingFailure(String),

    /// Configured lifetime pushes `exp` past the representable time range.
    #[error("token expiry out of range")]
    ExpiryOutOfRange,

    /// Token signing backend failure.
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl AuthError {
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::InvalidToken | Self::Mismatch => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::HashingFailure(_) | Self::Signing(_) | Self::ExpiryOutOfRange => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message placed in the response body. Server faults stay generic.
    pub fn public_message(&self) -> String {
        match self {
            Self::HashingFailure(_) | Self::Signing(_) | Self::ExpiryOutOfRange => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// JSON body shared by every failure response: `{"error": "..."}`.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "invalid or expired token")]
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if status.is_server_error() {
            tracing::error!("Auth fault: {}", self);
        }
        (status, Json(ErrorResponse::new(self.public_message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status() {
        assert_eq!(
            AuthError::InvalidToken.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::Mismatch.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::Forbidden("no".into()).http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::HashingFailure("boom".into()).http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AuthError::ExpiryOutOfRange.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_faults_do_not_leak_detail() {
        let err = AuthError::HashingFailure("salt: invalid length".into());
        assert_eq!(err.public_message(), "internal server error");
    }

    #[test]
    fn test_forbidden_carries_message() {
        let err = AuthError::Forbidden("cannot follow yourself".into());
        assert_eq!(err.public_message(), "cannot follow yourself");
    }
}
