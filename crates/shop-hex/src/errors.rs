use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use shop_types::domain::validation::ValidationError;
use shop_types::ports::RepoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {details:?}")]
    Validation { details: Vec<String> },

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Insufficient stock for {product}. Available: {available}")]
    InsufficientStock { product: String, available: u32 },

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Too many requests")]
    TooManyRequests,

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn access_denied() -> Self {
        AppError::Forbidden("Access denied".into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. }
            | AppError::InvalidReference(_)
            | AppError::InsufficientStock { .. }
            | AppError::InvalidState(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Duplicate(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation { details: e.details }
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Duplicate(_) => AppError::Duplicate("Duplicate entry".into()),
            RepoError::Rejected(t) => AppError::InvalidState(t.to_string()),
            RepoError::DbError(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.status();
        let body = match self {
            AppError::Validation { details } => ErrorBody {
                error: "Validation failed".into(),
                details: Some(details),
            },
            AppError::InsufficientStock { product, available } => ErrorBody {
                error: format!("Insufficient stock for {product}. Available: {available}"),
                details: None,
            },
            AppError::TooManyRequests => ErrorBody {
                error: "Too many requests, please try again later".into(),
                details: None,
            },
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "request failed");
                ErrorBody {
                    error: "internal error".into(),
                    details: None,
                }
            }
            AppError::InvalidReference(m)
            | AppError::NotFound(m)
            | AppError::Forbidden(m)
            | AppError::Duplicate(m)
            | AppError::InvalidState(m)
            | AppError::Unauthorized(m) => ErrorBody {
                error: m,
                details: None,
            },
        };

        let body = serde_json::to_string(&body)
            .unwrap_or_else(|_| "{\"error\":\"internal serialization\"}".into());
        (code, [("content-type", "application/json")], body).into_response()
    }
}
