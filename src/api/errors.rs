use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::catalog::CatalogError;
use crate::services::exam_access::AccessError;
use crate::services::exam_creation::ComposeError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::InUse(_) | CatalogError::Duplicate(_) => {
                ApiError::Conflict(err.to_string())
            }
            CatalogError::Database(_) | CatalogError::Corrupt(_) => {
                ApiError::internal(err, "Catalog operation failed")
            }
        }
    }
}

impl From<ComposeError> for ApiError {
    fn from(err: ComposeError) -> Self {
        match err {
            ComposeError::Boundaries(_)
            | ComposeError::InsufficientQuestions(_)
            | ComposeError::TooManyQuestions { .. } => ApiError::BadRequest(err.to_string()),
            ComposeError::Catalog(inner) => inner.into(),
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::IntegrityFault { .. } => {
                ApiError::internal(err, "Student record missing for caller")
            }
            AccessError::Catalog(inner) => inner.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            ApiError::Unauthorized(message) | ApiError::Forbidden(message) => message.to_string(),
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                message
            }
            ApiError::BadRequest(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message) => message,
        };

        let mut response =
            (status, Json(ErrorResponse { status: status.as_u16(), detail })).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
