/// HTTP middleware for blog-service
///
/// - [`SessionMiddleware`]: reads the session cookie and exposes the viewer
///   through the [`Viewer`] and [`LoginRequired`] extractors
/// - [`CachePage`]: full-page cache for anonymous and per-user GET responses
pub mod cache_page;
pub mod session;

pub use cache_page::CachePage;
pub use session::{LoginRequired, SessionMiddleware, Viewer};
