//! RFC 9457 problem responses and domain error mapping.

use std::error::Error as _;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;
use turnstile_auth::AuthError;
use turnstile_outbound::OutboundError;
use turnstile_todo::TodoError;

use crate::http::constants::{
    PROBLEM_BAD_REQUEST, PROBLEM_CONFLICT, PROBLEM_FORBIDDEN, PROBLEM_INTERNAL,
    PROBLEM_NOT_FOUND, PROBLEM_UNAUTHORIZED,
};
use crate::models::{ProblemDetails, ProblemInvalidParam};

/// Structured API error with optional RFC 9457 fields.
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) kind: &'static str,
    title: &'static str,
    detail: Option<String>,
    pub(crate) invalid_params: Option<Vec<ProblemInvalidParam>>,
}

impl ApiError {
    const fn new(status: StatusCode, kind: &'static str, title: &'static str) -> Self {
        Self {
            status,
            kind,
            title,
            detail: None,
            invalid_params: None,
        }
    }

    pub(crate) fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    fn with_invalid_param(mut self, field: &str, message: &str) -> Self {
        self.invalid_params = Some(vec![ProblemInvalidParam {
            pointer: format!("/{field}"),
            message: message.to_string(),
        }]);
        self
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            PROBLEM_INTERNAL,
            "internal server error",
        )
        .with_detail(message)
    }

    pub(crate) fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            PROBLEM_UNAUTHORIZED,
            "authentication required",
        )
        .with_detail(detail)
    }

    pub(crate) fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, PROBLEM_FORBIDDEN, "forbidden").with_detail(detail)
    }

    pub(crate) fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, PROBLEM_BAD_REQUEST, "bad request").with_detail(detail)
    }

    pub(crate) fn not_found(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            PROBLEM_NOT_FOUND,
            "resource not found",
        )
        .with_detail(detail)
    }

    pub(crate) fn conflict(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, PROBLEM_CONFLICT, "conflict").with_detail(detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ProblemDetails {
            kind: self.kind.to_string(),
            title: self.title.to_string(),
            status: self.status.as_u16(),
            detail: self.detail,
            invalid_params: self.invalid_params,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation { field, reason } => {
                Self::bad_request("invalid input").with_invalid_param(field, reason)
            }
            AuthError::Conflict { field } => Self::conflict("credential already exists")
                .with_invalid_param(field, "already registered"),
            AuthError::Authentication { failure } => Self::unauthorized(failure.message()),
            AuthError::Authorization { required, .. } => {
                Self::forbidden(format!("{required} role required"))
            }
            AuthError::NotFound { .. } => Self::not_found("credential record not found"),
            internal => {
                error!(
                    error = %internal,
                    source = internal.source().map(ToString::to_string),
                    "session operation failed"
                );
                Self::internal(internal.to_string())
            }
        }
    }
}

impl From<TodoError> for ApiError {
    fn from(err: TodoError) -> Self {
        match err {
            TodoError::Validation { field, reason } => {
                Self::bad_request("invalid input").with_invalid_param(field, reason)
            }
            TodoError::NotFound { .. } => Self::not_found("todo not found"),
            TodoError::Store { operation, source } => {
                error!(operation, error = %source, "todo store operation failed");
                Self::internal("todo store operation failed")
            }
        }
    }
}

impl From<OutboundError> for ApiError {
    fn from(err: OutboundError) -> Self {
        match err {
            OutboundError::Validation { field, reason } => {
                Self::bad_request("invalid input").with_invalid_param(field, reason)
            }
            OutboundError::Delivery { operation, source } => {
                error!(operation, error = %source, "outbound delivery failed");
                Self::internal("outbound delivery failed")
            }
        }
    }
}
