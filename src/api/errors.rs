use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::exam_session::SessionError;
use crate::services::password_reset::ResetError;
use crate::services::question_bank::{ImportError, QuestionError};

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
    UnprocessableEntity(String),
    TooManyRequests(&'static str),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    pub(crate) fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    /// Unique-constraint violations become a 409 with `conflict`; anything
    /// else is internal.
    pub(crate) fn from_write(err: sqlx::Error, conflict: &str, context: &str) -> Self {
        let unique_violation =
            err.as_database_error().is_some_and(|db_err| db_err.is_unique_violation());
        if unique_violation {
            Self::Conflict(conflict.to_string())
        } else {
            Self::internal(err, context)
        }
    }

    pub(crate) fn validation(err: validator::ValidationErrors) -> Self {
        Self::BadRequest(err.to_string())
    }

    fn status_and_detail(self) -> (StatusCode, String) {
        match self {
            Self::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message.to_string()),
            Self::Forbidden(message) => (StatusCode::FORBIDDEN, message.to_string()),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::Conflict(message) => (StatusCode::CONFLICT, message),
            Self::UnprocessableEntity(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
            Self::TooManyRequests(message) => (StatusCode::TOO_MANY_REQUESTS, message.to_string()),
            Self::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotOpen | SessionError::MalformedAnswer(_) => {
                Self::BadRequest(err.to_string())
            }
            SessionError::AlreadySubmitted => Self::Conflict(err.to_string()),
            SessionError::QuestionNotInExam => Self::UnprocessableEntity(err.to_string()),
        }
    }
}

impl From<ResetError> for ApiError {
    fn from(err: ResetError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<QuestionError> for ApiError {
    fn from(err: QuestionError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let bearer_challenge = matches!(self, Self::Unauthorized(_));
        let (status, detail) = self.status_and_detail();

        let mut response =
            (status, Json(ErrorResponse { status: status.as_u16(), detail })).into_response();
        if bearer_challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
