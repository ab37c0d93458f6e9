//! Gateway errors and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dokumenter_saf::{DownstreamStatus, GraphQlError, SafError};
use serde::Serialize;

use crate::auth::AuthError;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(#[from] AuthError),

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("upstream token exchange failed: {message}")]
    UpstreamAuthFailure { message: String },

    #[error("downstream rejected the request: {0}")]
    Downstream(DownstreamStatus),

    /// SAF answered without data; the body relays its errors.
    #[error("downstream reported {} error(s)", errors.len())]
    DownstreamErrors {
        status: StatusCode,
        errors: Vec<GraphQlError>,
    },

    #[error("downstream unavailable: {message}")]
    Unavailable { message: String },

    #[error("downstream timed out: {message}")]
    Timeout { message: String },
}

impl GatewayError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// A response with no `data`: `404` when SAF says `not_found` or gives
    /// no errors at all, `400` otherwise.
    pub fn from_graphql_errors(errors: Vec<GraphQlError>) -> Self {
        let not_found =
            errors.is_empty() || errors.iter().any(|e| e.code() == Some("not_found"));
        let status = if not_found {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::BAD_REQUEST
        };
        Self::DownstreamErrors { status, errors }
    }
}

impl From<SafError> for GatewayError {
    fn from(err: SafError) -> Self {
        match err {
            SafError::TokenExchange { message } => Self::UpstreamAuthFailure { message },
            SafError::Downstream(status) => Self::Downstream(status),
            SafError::Timeout { message } => Self::Timeout { message },
            SafError::Network { message }
            | SafError::InvalidResponse { message }
            | SafError::Config { message } => Self::Unavailable { message },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

fn downstream_response(status: DownstreamStatus) -> (StatusCode, &'static str, &'static str) {
    match status {
        DownstreamStatus::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            "DOWNSTREAM_UNAUTHORIZED",
            "downstream could not authorize the delegated credential",
        ),
        DownstreamStatus::Forbidden => (
            StatusCode::FORBIDDEN,
            "DOWNSTREAM_FORBIDDEN",
            "downstream denied access to this document for this caller",
        ),
        DownstreamStatus::NotFound => (
            StatusCode::NOT_FOUND,
            "DOWNSTREAM_NOT_FOUND",
            "downstream has no matching documents",
        ),
        DownstreamStatus::Unrecognized(code) => (
            StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY),
            "DOWNSTREAM_UNRECOGNIZED_STATUS",
            "downstream returned an unrecognized status",
        ),
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            GatewayError::Unauthenticated(reason) => {
                tracing::warn!(reason = %reason, "rejected inbound token");
                (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHENTICATED",
                    "missing or invalid bearer token".to_string(),
                )
            }
            GatewayError::InvalidRequest { message } => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", message.clone())
            }
            GatewayError::UpstreamAuthFailure { message } => {
                tracing::error!(error = %message, "on-behalf-of exchange failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_AUTH_FAILURE",
                    "could not obtain a delegated credential".to_string(),
                )
            }
            GatewayError::Downstream(status) => {
                tracing::warn!(downstream_status = status.code(), "downstream rejected request");
                let (status, code, message) = downstream_response(*status);
                (status, code, message.to_string())
            }
            GatewayError::DownstreamErrors { status, errors } => {
                tracing::warn!(status = status.as_u16(), errors = errors.len(), "downstream returned no data");
                return (*status, Json(errors)).into_response();
            }
            GatewayError::Unavailable { message } => {
                tracing::error!(error = %message, "downstream unavailable");
                (
                    StatusCode::BAD_GATEWAY,
                    "DOWNSTREAM_UNAVAILABLE",
                    "downstream is unavailable".to_string(),
                )
            }
            GatewayError::Timeout { message } => {
                tracing::error!(error = %message, "downstream timed out");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "DOWNSTREAM_TIMEOUT",
                    "downstream did not respond in time".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
