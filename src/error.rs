use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The main error type for planhold.
///
/// Lifecycle operations surface these directly; the HTTP boundary maps each
/// kind onto a status code and JSON body.
#[derive(Debug, thiserror::Error)]
pub enum PlanholdError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Standard error response body.
#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
}

impl PlanholdError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Store(_) | Self::Internal(_) | Self::Anyhow(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns a message safe to expose to clients.
    ///
    /// Client errors (4xx) carry their full message; server errors (5xx)
    /// collapse to a generic message so persistence details never leak
    /// (CWE-209). The full error is logged server-side.
    fn safe_message(&self) -> String {
        match self {
            Self::NotFound(_)
            | Self::Unauthorized(_)
            | Self::Forbidden(_)
            | Self::Validation(_)
            | Self::InvalidTransition(_) => self.to_string(),
            Self::Store(_) => "Store error".to_string(),
            Self::Internal(_) | Self::Anyhow(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for PlanholdError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = Json(ErrorResponse {
            error: self.safe_message(),
        });

        (status, body).into_response()
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PlanholdError>;

impl From<serde_json::Error> for PlanholdError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            PlanholdError::Validation(format!("JSON error: {}", err))
        } else {
            PlanholdError::Internal(format!("JSON serialization error: {}", err))
        }
    }
}

impl From<sea_orm::DbErr> for PlanholdError {
    fn from(err: sea_orm::DbErr) -> Self {
        match &err {
            sea_orm::DbErr::RecordNotFound(msg) => PlanholdError::NotFound(if msg.is_empty() {
                "Record not found".to_string()
            } else {
                msg.clone()
            }),
            _ => PlanholdError::Store(err.to_string()),
        }
    }
}
