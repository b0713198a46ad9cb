use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Для цього необхідно увійти або зареєструватися")]
    Unauthorized,

    #[error("Посилання не дійсне")]
    InvalidLink,

    #[error("Invalid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Невірна пошта або пароль")]
    InvalidCredentials,

    #[error("Підтвердіть свою пошту")]
    EmailNotConfirmed,

    /// A domain rule rejected the request before anything was written
    #[error("{0}")]
    Precondition(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
    message: String,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized | AppError::InvalidLink => "UNAUTHORIZED",
            AppError::Token(_) => "TOKEN_ERROR",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::EmailNotConfirmed => "EMAIL_NOT_CONFIRMED",
            AppError::Precondition(_) => "PRECONDITION_FAILED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidLink | AppError::Token(_) => {
                StatusCode::UNAUTHORIZED
            }
            // Clients treat 404 as a bad login and 406 as a rule violation
            AppError::InvalidCredentials | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailNotConfirmed | AppError::Precondition(_) => StatusCode::NOT_ACCEPTABLE,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match self {
            // Store details stay in the logs
            AppError::Database(e) => {
                tracing::error!(error = %e, "store operation failed");
                "Internal server error".to_string()
            }
            AppError::Token(e) => {
                tracing::debug!(error = %e, "token rejected");
                AppError::Unauthorized.to_string()
            }
            other => other.to_string(),
        };

        let mut builder = HttpResponse::build(status);
        if status == StatusCode::UNAUTHORIZED {
            builder.insert_header(("WWW-Authenticate", "Bearer"));
        }
        builder.json(ErrorResponse {
            error: self.code(),
            message,
        })
    }
}
