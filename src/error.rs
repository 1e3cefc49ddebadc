//! Error handling

use axum::{
    extract::multipart::MultipartError,
    response::{IntoResponse, Response},
    http::{header, HeaderValue, StatusCode},
    Json,
};
use jsonwebtoken::errors::ErrorKind;
use serde_json::json;

use crate::risk::{UnrecognizedDecision, UnrecognizedInputKind};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Auth errors
    InvalidCredentials,
    TokenExpired,
    TokenInvalid,
    Unauthorized,
    Forbidden,
    InactiveUser,

    // Resource errors
    NotFound(String),
    AlreadyExists(String),

    // Validation errors
    ValidationError(String),
    UnrecognizedInputKind(String),

    // Database errors
    DatabaseError(String),

    // Analysis service errors
    ExternalServiceError(String),

    // Generic errors
    InternalError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials
            | AppError::TokenExpired
            | AppError::TokenInvalid
            | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden | AppError::InactiveUser => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_)
            | AppError::ValidationError(_)
            | AppError::UnrecognizedInputKind(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(_) | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            AppError::InvalidCredentials => "Incorrect username or password".to_string(),
            AppError::TokenExpired => "Token has expired".to_string(),
            AppError::TokenInvalid => "Could not validate credentials".to_string(),
            AppError::Unauthorized => "Authentication required".to_string(),
            AppError::Forbidden => "Access denied".to_string(),
            AppError::InactiveUser => "Inactive user account".to_string(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::AlreadyExists(msg) => msg.clone(),
            AppError::ValidationError(msg) => msg.clone(),
            AppError::UnrecognizedInputKind(kind) => format!("Unrecognized input kind: {}", kind),
            AppError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                "Database error occurred".to_string()
            }
            AppError::ExternalServiceError(msg) => {
                tracing::error!("Analysis service error: {}", msg);
                "Analysis service error".to_string()
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::TokenInvalid,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::ValidationError(format!("Invalid upload: {}", err.body_text()))
    }
}

impl From<UnrecognizedInputKind> for AppError {
    fn from(err: UnrecognizedInputKind) -> Self {
        AppError::UnrecognizedInputKind(err.0)
    }
}

impl From<UnrecognizedDecision> for AppError {
    fn from(err: UnrecognizedDecision) -> Self {
        AppError::ValidationError(format!("Unrecognized decision: {}", err.0))
    }
}
