use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Unique error codes for client identification
#[derive(Debug, Clone, Copy)]
pub enum ErrorCode {
    // Database errors (1xxx)
    DatabaseQuery = 1002,
    DatabaseTransaction = 1003,

    // Validation errors (2xxx)
    ValidationFailed = 2001,
    UnsupportedType = 2002,
    MissingField = 2004,

    // Extraction errors (3xxx)
    ExtractionFailed = 3001,

    // Analysis errors (4xxx)
    NoQuizzes = 4001,
    AnalysisFailed = 4002,

    // Resource errors (6xxx)
    NotFound = 6001,
    AlreadyExists = 6002,

    // Internal errors (9xxx)
    InternalError = 9001,
    ConfigurationError = 9002,
    SerializationError = 9003,
    StorageError = 9004,
}

impl ErrorCode {
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }
}

/// Error types for every failure mode the service surfaces
#[derive(Error, Debug)]
pub enum AppError {
    // Validation
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    // Extraction
    #[error("Text extraction failed: {0}")]
    Extraction(String),

    // Analysis
    #[error("Cannot run analysis: no quizzes found for class {class_id}")]
    NoQuizzes { class_id: i64 },

    #[error("Analysis failed: {0}")]
    Analysis(String),

    // Resources
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    // Database
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database transaction failed: {0}")]
    Transaction(String),

    // Durable file storage
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    // Internal
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::MissingField(_) => ErrorCode::MissingField,
            Self::UnsupportedType(_) => ErrorCode::UnsupportedType,
            Self::Extraction(_) => ErrorCode::ExtractionFailed,
            Self::NoQuizzes { .. } => ErrorCode::NoQuizzes,
            Self::Analysis(_) => ErrorCode::AnalysisFailed,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::AlreadyExists(_) => ErrorCode::AlreadyExists,
            Self::Database(_) => ErrorCode::DatabaseQuery,
            Self::Transaction(_) => ErrorCode::DatabaseTransaction,
            Self::Storage(_) => ErrorCode::StorageError,
            Self::Internal(_) => ErrorCode::InternalError,
            Self::Config(_) => ErrorCode::ConfigurationError,
            Self::Serialization(_) => ErrorCode::SerializationError,
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::MissingField(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NoQuizzes { .. } => StatusCode::BAD_REQUEST,
            Self::Analysis(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::AlreadyExists(_) => StatusCode::CONFLICT,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Transaction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        // Log based on severity
        match &self {
            AppError::Validation(_)
            | AppError::MissingField(_)
            | AppError::UnsupportedType(_)
            | AppError::Extraction(_)
            | AppError::NoQuizzes { .. }
            | AppError::AlreadyExists(_)
            | AppError::NotFound { .. } => {
                tracing::debug!(error_code = error_code.as_u16(), %message, "Client error");
            }
            AppError::Analysis(_) => {
                tracing::warn!(error_code = error_code.as_u16(), %message, "Upstream AI error");
            }
            _ => {
                tracing::error!(error_code = error_code.as_u16(), %message, error = ?self, "Server error");
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code.as_u16(),
                "status": status.as_u16(),
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Helper macro for creating NotFound errors
#[macro_export]
macro_rules! not_found {
    ($resource:expr, $id:expr) => {
        $crate::errors::AppError::NotFound {
            resource: $resource,
            id: $id.to_string(),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::not_found;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::UnsupportedType("application/zip".into()).status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            AppError::NoQuizzes { class_id: 7 }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Analysis("timeout".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(not_found!("Class", 42).status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_no_quizzes_message_names_class() {
        let msg = AppError::NoQuizzes { class_id: 12 }.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("no quizzes"));
    }
}
