use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum AgencyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Administrator access required")]
    Forbidden,

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("PDF engine error: {0}")]
    PdfEngine(String),

    #[error("Password hash error: {0}")]
    PasswordHash(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Blocking task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl AgencyError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::BadRequest(reason.into())
    }
}

impl IntoResponse for AgencyError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            AgencyError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ApiErrorBody {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{what} not found"),
                },
            ),
            AgencyError::BadRequest(reason) => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody {
                    code: "BAD_REQUEST".to_string(),
                    message: reason,
                },
            ),
            AgencyError::Conflict(reason) => (
                StatusCode::CONFLICT,
                ApiErrorBody {
                    code: "CONFLICT".to_string(),
                    message: reason,
                },
            ),
            AgencyError::Forbidden => (
                StatusCode::FORBIDDEN,
                ApiErrorBody {
                    code: "FORBIDDEN".to_string(),
                    message: "Administrator access required.".to_string(),
                },
            ),
            AgencyError::MethodNotAllowed(reason) => (
                StatusCode::METHOD_NOT_ALLOWED,
                ApiErrorBody {
                    code: "METHOD_NOT_ALLOWED".to_string(),
                    message: reason,
                },
            ),
            AgencyError::PdfEngine(detail) => {
                error!(error = %detail, "PDF engine failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorBody {
                        code: "PDF_ENGINE_ERROR".to_string(),
                        message: "The letter could not be converted to PDF.".to_string(),
                    },
                )
            }
            err @ (AgencyError::Config(_)
            | AgencyError::DatabaseError(_)
            | AgencyError::Json(_)
            | AgencyError::Template(_)
            | AgencyError::PasswordHash(_)
            | AgencyError::Io(_)
            | AgencyError::TaskJoin(_)) => {
                error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorBody {
                        code: "INTERNAL_ERROR".to_string(),
                        message: "An internal server error occurred.".to_string(),
                    },
                )
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
