/// Blog Service Library
///
/// A small blogging site: users publish posts, optionally filed under a
/// group, comment on each other's posts and follow authors.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers
/// - `views`: HTML rendering
/// - `forms`: form input and validation
/// - `models`: rows and joined views
/// - `db`: repository trait with PostgreSQL and in-memory backends
/// - `pagination`: page-number pagination for listings
/// - `middleware`: session cookie and full-page cache middleware
/// - `security`: password hashing and session tokens
/// - `media`: uploaded image storage
/// - `error`: error types and their HTTP rendering
/// - `config`: configuration management
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod security;
pub mod state;
pub mod views;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
