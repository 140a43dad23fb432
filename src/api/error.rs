//! Mapping ledger errors onto HTTP responses.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Error returned by every handler.
#[derive(Debug)]
pub struct ApiError(pub Error);

/// Convenience `Result` type for handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl<E> From<E> for ApiError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    /// HTTP status the error maps onto.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else if self.0.is_rejection() {
            StatusCode::BAD_REQUEST
        } else if matches!(self.0, Error::ConcurrentModification { .. }) {
            StatusCode::CONFLICT
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {:?}", self.0);
            "Internal server error".to_string()
        } else {
            tracing::info!("Request rejected ({status}): {}", self.0);
            self.0.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Builds a 404 response for lookups that come back empty.
pub fn not_found(message: String) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError(Error::NothingSelected).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(Error::FeeNotFound { id: "x".into() }).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(Error::ConcurrentModification {
                expected: 2,
                updated: 1
            })
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError(Error::Config {
                message: "x".into()
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
