use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::context::ERROR_NOTICE;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

/// Every response, error or not, carries a single `reply` field; the chat UI
/// renders it verbatim. Status code separates validation (400) from failure (500).
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorReply {
            reply: String,
        }

        let (status, reply) = match self {
            AppError::BadRequest(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            err => {
                let error_type = match &err {
                    AppError::DatabaseError(_) => "database",
                    AppError::BadGateway(_) => "provider",
                    AppError::ConfigError(_) => "config",
                    _ => "internal",
                };
                crate::services::metrics::ERRORS_TOTAL
                    .with_label_values(&[error_type])
                    .inc();
                tracing::error!(error = %err, error_type = error_type, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, ERROR_NOTICE.to_string())
            }
        };

        (status, Json(ErrorReply { reply })).into_response()
    }
}
