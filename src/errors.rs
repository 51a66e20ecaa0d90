use actix_identity::error::{GetIdentityError, LoginError};
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use sqlx::Error as SqlxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Missing permission: {0}")]
    Forbidden(String),

    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Password error: {0}")]
    PasswordError(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Identity error: {0}")]
    IdentityError(#[from] GetIdentityError),

    #[error("Login error: {0}")]
    LoginError(#[from] LoginError),

    #[error("Template error: {0}")]
    TemplateError(#[from] tera::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] SqlxError),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        AppError::Export(err.to_string())
    }
}

impl From<genpdf::error::Error> for AppError {
    fn from(err: genpdf::error::Error) -> Self {
        AppError::Export(err.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            // stale or tampered session cookie
            AppError::IdentityError(_) => StatusCode::UNAUTHORIZED,
            AppError::SqlxError(SqlxError::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Config(_)
            | AppError::PasswordError(_)
            | AppError::Export(_)
            | AppError::LoginError(_)
            | AppError::TemplateError(_)
            | AppError::IoError(_)
            | AppError::SqlxError(_)
            | AppError::MigrateError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        }
        HttpResponse::build(status).json(json!({ "error": self.to_string() }))
    }
}

impl From<AppError> for std::io::Error {
    fn from(err: AppError) -> Self {
        std::io::Error::other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_status_codes() {
        assert_eq!(
            AppError::validation("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Forbidden("graficos".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::SqlxError(SqlxError::RowNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Export("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_message_is_the_body_text() {
        assert_eq!(
            AppError::validation("cantidad must be at least 1").to_string(),
            "cantidad must be at least 1"
        );
    }
}
