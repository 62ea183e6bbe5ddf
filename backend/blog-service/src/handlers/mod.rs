/// HTTP request handlers
///
/// Handlers fetch what they need through the repository, answer 404 for
/// missing entities and redirect after every successful write.
pub mod auth;
pub mod comments;
pub mod follow;
pub mod health;
pub mod media;
pub mod posts;

use crate::pagination::PageQuery;
use actix_web::{http::header, web, HttpRequest, HttpResponse};

/// 302 to `location`
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Raw `page` query value; an unparsable query string counts as absent
pub(crate) fn page_param(req: &HttpRequest) -> Option<String> {
    web::Query::<PageQuery>::from_query(req.query_string())
        .ok()
        .and_then(|q| q.into_inner().page)
}

pub(crate) fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

pub(crate) fn post_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}
