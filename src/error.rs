use axum::{
    http::StatusCode,
    response::{Html, IntoResponse},
};
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

use crate::views::ErrorPage;

#[derive(Debug, ThisError)]
pub enum LogbookError {
    #[error("The username was taken by someone else. Try again with a new one.")]
    DuplicateUsername,

    #[error("A user with this email already exists. Try again with a new one.")]
    DuplicateEmail,

    #[error("Your credentials are invalid. Double check and try again.")]
    InvalidCredentials,

    #[error("Resource not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LogbookError {
    /// Status code the error is rendered with.
    pub fn status(&self) -> StatusCode {
        match self {
            // Business-rule conflicts are answered as plain text pages.
            LogbookError::DuplicateUsername
            | LogbookError::DuplicateEmail
            | LogbookError::InvalidCredentials => StatusCode::OK,
            LogbookError::NotFound => StatusCode::NOT_FOUND,
            LogbookError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LogbookError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        match self {
            LogbookError::DuplicateUsername
            | LogbookError::DuplicateEmail
            | LogbookError::InvalidCredentials => (status, self.to_string()).into_response(),
            LogbookError::NotFound | LogbookError::BadRequest(_) => {
                render_error_page(status, ErrorPage::not_found())
            }
            other => {
                error!(error = %other, "request failed");
                render_error_page(status, ErrorPage::internal())
            }
        }
    }
}

fn render_error_page(status: StatusCode, page: ErrorPage) -> axum::response::Response {
    use askama::Template;

    match page.render() {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => {
            error!(error = %e, "failed to render error page");
            (status, page.heading).into_response()
        }
    }
}
