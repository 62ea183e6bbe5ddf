/// Error types for Blog Service
///
/// Every handler returns [`Result`]. Errors render as HTML pages, except
/// [`AppError::LoginRequired`] which becomes a redirect to the login form.
use crate::db::StoreError;
use crate::views;
use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use page_cache::CacheError;
use thiserror::Error;

/// Result type for blog-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Path of the login form guests are sent to
pub const LOGIN_URL: &str = "/auth/login/";

#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Guest hit a page that needs a session; `next` is where to return to
    #[error("Login required for {next}")]
    LoginRequired { next: String },

    /// Malformed request (bad multipart body, oversized upload)
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    /// Login URL with `next` set to `path`, keeping `/` readable
    pub fn login_url(next: &str) -> String {
        let encoded = urlencoding::encode(next).replace("%2F", "/");
        format!("{}?next={}", LOGIN_URL, encoded)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::LoginRequired { .. } => StatusCode::FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Store(_) | AppError::Cache(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            AppError::LoginRequired { next } => HttpResponse::Found()
                .insert_header((header::LOCATION, AppError::login_url(next)))
                .finish(),
            AppError::NotFound(what) => {
                tracing::debug!(what = %what, "Not found");
                views::html(status, views::errors::not_found_page())
            }
            AppError::BadRequest(msg) => {
                tracing::debug!(reason = %msg, "Bad request");
                views::html(status, views::errors::bad_request_page())
            }
            _ => {
                tracing::error!(error = %self, "Request failed");
                views::html(status, views::errors::server_error_page())
            }
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<actix_multipart::MultipartError> for AppError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_url_keeps_slashes() {
        assert_eq!(AppError::login_url("/create/"), "/auth/login/?next=/create/");
        assert_eq!(
            AppError::login_url("/posts/1/edit/"),
            "/auth/login/?next=/posts/1/edit/"
        );
    }

    #[test]
    fn test_login_url_escapes_query() {
        assert_eq!(
            AppError::login_url("/follow/?page=2"),
            "/auth/login/?next=/follow/%3Fpage%3D2"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::not_found("post").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::LoginRequired {
                next: "/".to_string()
            }
            .status_code(),
            StatusCode::FOUND
        );
        assert_eq!(
            AppError::Store(StoreError::CheckViolation("x".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_login_required_redirects() {
        let response = AppError::LoginRequired {
            next: "/create/".to_string(),
        }
        .error_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=/create/"
        );
    }
}
