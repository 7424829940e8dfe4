use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::types::{ErrorBody, ErrorResponse, PrettyJson};
use crate::favorites::FavoriteError;

/// API error type that converts to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    BadRequest {
        message: String,
        param: Option<String>,
    },
    NotFound {
        message: String,
    },
    /// The search backend failed or refused the call.
    BadGateway {
        message: String,
    },
}

impl From<FavoriteError> for ApiError {
    fn from(e: FavoriteError) -> Self {
        match e {
            FavoriteError::NotFound(_) => ApiError::NotFound {
                message: e.to_string(),
            },
            FavoriteError::Remote(inner) => ApiError::BadGateway {
                message: inner.to_string(),
            },
            local => ApiError::BadRequest {
                message: local.to_string(),
                param: Some("name".to_string()),
            },
        }
    }
}

impl From<crate::Error> for ApiError {
    fn from(e: crate::Error) -> Self {
        ApiError::BadGateway {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message, param) = match self {
            ApiError::BadRequest { message, param } => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                Some("invalid_parameter".to_string()),
                message,
                param,
            ),
            ApiError::NotFound { message } => (
                StatusCode::NOT_FOUND,
                "invalid_request_error",
                Some("resource_missing".to_string()),
                message,
                None,
            ),
            ApiError::BadGateway { message } => (
                StatusCode::BAD_GATEWAY,
                "backend_error",
                None,
                message,
                None,
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                error_type: error_type.to_string(),
                code,
                message,
                param,
            },
        };

        (status, PrettyJson(body)).into_response()
    }
}
