use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use twboard_core::{SourceError, SourceErrorKind};

/// Request-level failure, rendered as a JSON error envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Source(error) => match error.kind() {
                SourceErrorKind::SymbolNotFound => StatusCode::NOT_FOUND,
                SourceErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                SourceErrorKind::HttpStatus
                | SourceErrorKind::BadShape
                | SourceErrorKind::Unavailable
                | SourceErrorKind::Exhausted => StatusCode::BAD_GATEWAY,
                SourceErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Source(error) => error.code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": self.code(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_miss_maps_to_not_found() {
        let error = ApiError::from(SourceError::symbol_not_found("9999"));
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
        assert_eq!(error.code(), "source.symbol_not_found");
    }

    #[test]
    fn exhaustion_maps_to_bad_gateway() {
        let error = ApiError::from(SourceError::exhausted(5));
        assert_eq!(error.status(), StatusCode::BAD_GATEWAY);
    }
}
