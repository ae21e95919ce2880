// HTTP response utilities for the JSON API envelope
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub const CACHE_EMPTY: &str = "public, max-age=60";
pub const CACHE_DEFAULT: &str = "public, max-age=300";

/// `{ success: true, data, metadata }`
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize, M: Serialize> {
    pub success: bool,
    pub data: T,
    pub metadata: M,
}

/// Successful JSON envelope with a `Cache-Control` header.
pub fn json_envelope<T: Serialize, M: Serialize>(
    data: T,
    metadata: M,
    cache_control: &'static str,
) -> Response {
    (
        [(header::CACHE_CONTROL, cache_control)],
        Json(Envelope {
            success: true,
            data,
            metadata,
        }),
    )
        .into_response()
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{error}")]
    BadRequest {
        error: String,
        details: Option<String>,
    },
    #[error("{error}")]
    Internal {
        error: String,
        details: Option<String>,
    },
}

impl ApiError {
    pub fn bad_request(error: impl Into<String>, details: impl ToString) -> Self {
        ApiError::BadRequest {
            error: error.into(),
            details: Some(details.to_string()),
        }
    }

    /// Internal failure; the cause chain goes into `details`.
    pub fn internal(error: impl Into<String>, cause: anyhow::Error) -> Self {
        ApiError::Internal {
            error: error.into(),
            details: Some(format!("{:#}", cause)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::BadRequest { error, details } => (StatusCode::BAD_REQUEST, error, details),
            ApiError::Internal { error, details } => {
                tracing::error!("{}: {}", error, details.as_deref().unwrap_or("unknown error"));
                (StatusCode::INTERNAL_SERVER_ERROR, error, details)
            }
        };
        (
            status,
            Json(ErrorBody {
                success: false,
                error,
                details,
            }),
        )
            .into_response()
    }
}
