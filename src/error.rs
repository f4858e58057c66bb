use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde_json::json;
use thiserror::Error;

use crate::{
    flash,
    models::{Flash, FlashLevel},
    repository::RepositoryError,
    storage::StorageError,
};

/// Application-level error type.
///
/// Every failure a route can hit is one of these variants. The `Display` text is the
/// notice shown to the user, so internal variants keep their details out of it.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required field is missing or blank.
    #[error("{0}")]
    Validation(String),

    /// A unique field (`email`, `username`, one application per job) is already taken.
    #[error("{message}")]
    Conflict {
        field: &'static str,
        message: String,
    },

    /// Bad credentials at login.
    #[error("Invalid credentials, try again.")]
    Auth,

    /// Role or ownership mismatch.
    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    NotFound(String),

    /// No valid session on a route that requires one.
    #[error("Please log in to access this page.")]
    Unauthenticated,

    #[error("Could not save the uploaded file, please try again.")]
    Storage(#[from] StorageError),

    #[error("Something went wrong, please try again.")]
    Repository(#[from] RepositoryError),

    #[error("Something went wrong, please try again.")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(field: &'static str, msg: impl Into<String>) -> Self {
        Self::Conflict {
            field,
            message: msg.into(),
        }
    }

    fn flash_level(&self) -> FlashLevel {
        match self {
            AppError::Conflict { .. } => FlashLevel::Warning,
            _ => FlashLevel::Danger,
        }
    }

    /// Writes the server-side details of internal failures to the log.
    /// User-caused failures are only traced at debug level.
    fn log(&self) {
        match self {
            AppError::Storage(e) => tracing::error!("Storage error: {e}"),
            AppError::Repository(e) => tracing::error!("Repository error: {e:?}"),
            AppError::Internal(msg) => tracing::error!("Internal error: {msg}"),
            other => tracing::debug!(error = %other, "request rejected"),
        }
    }

    fn not_found_response(&self) -> Response {
        let body = Json(json!({
            "error": {
                "code": "NOT_FOUND",
                "message": self.to_string()
            }
        }));
        (StatusCode::NOT_FOUND, body).into_response()
    }

    /// Converts the error into a flash notice plus a `303 See Other` to `to`.
    /// `NotFound` is the exception: it is surfaced as a plain 404.
    pub fn into_redirect(self, to: &str) -> Response {
        self.log();
        if let AppError::NotFound(_) = self {
            return self.not_found_response();
        }
        let notice = Flash::new(self.flash_level(), self.to_string());
        let jar = flash::push(CookieJar::new(), &notice);
        (jar, Redirect::to(to)).into_response()
    }
}

/// Used when a handler did not pick a redirect target, and by the `AuthUser` extractor.
/// Internal failures answer 500 instead of redirecting, so a broken home page cannot
/// redirect to itself forever.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Storage(_) | AppError::Repository(_) | AppError::Internal(_) => {
                self.log();
                let body = Json(json!({
                    "error": {
                        "code": "INTERNAL_ERROR",
                        "message": self.to_string()
                    }
                }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
            AppError::Unauthenticated => self.into_redirect("/login"),
            _ => self.into_redirect("/"),
        }
    }
}

/// Redirected
///
/// An `AppError` paired with the page the user should be sent back to.
#[derive(Debug)]
pub struct Redirected {
    pub error: AppError,
    pub to: String,
}

impl IntoResponse for Redirected {
    fn into_response(self) -> Response {
        self.error.into_redirect(&self.to)
    }
}

/// Attaches a redirect target to a failing result.
pub trait OrRedirect<T> {
    fn or_redirect(self, to: impl Into<String>) -> Result<T, Redirected>;
}

impl<T> OrRedirect<T> for AppResult<T> {
    fn or_redirect(self, to: impl Into<String>) -> Result<T, Redirected> {
        self.map_err(|error| Redirected {
            error,
            to: to.into(),
        })
    }
}
