/// HTML rendering
///
/// Pages are plain `format!` templates. Every value that came from a user
/// goes through [`escape`]. Each page marks its `<main>` with a
/// `data-page` attribute naming the page.
pub mod auth;
pub mod errors;
pub mod posts;

use crate::forms::FormErrors;
use crate::security::SessionUser;
use actix_web::{http::StatusCode, HttpResponse};

pub const SITE_NAME: &str = "Yatube";

/// Escape text for HTML element content and attribute values
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap an HTML document in a response
pub fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type(mime::TEXT_HTML_UTF_8)
        .body(body)
}

/// 200 HTML response
pub fn ok(body: String) -> HttpResponse {
    html(StatusCode::OK, body)
}

fn nav(viewer: Option<&SessionUser>) -> String {
    match viewer {
        Some(user) => format!(
            r#"<a href="/follow/">Subscriptions</a>
      <a href="/create/">New post</a>
      <a href="/profile/{name}/">{name_text}</a>
      <a href="/auth/logout/">Log out</a>"#,
            name = urlencoding::encode(&user.username),
            name_text = escape(&user.username),
        ),
        None => r#"<a href="/auth/login/">Log in</a>
      <a href="/auth/signup/">Sign up</a>"#
            .to_string(),
    }
}

/// Full page with the site header
pub fn layout(title: &str, page: &str, viewer: Option<&SessionUser>, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
</head>
<body>
  <header>
    <nav>
      <a href="/">{site}</a>
      {nav}
    </nav>
  </header>
  <main data-page="{page}">
{content}
  </main>
  <footer>&copy; {site}</footer>
</body>
</html>
"#,
        title = escape(title),
        site = SITE_NAME,
        nav = nav(viewer),
        page = page,
        content = content,
    )
}

/// `<ul class="errorlist">` for a field, empty when it has no errors
pub fn field_errors(errors: &FormErrors, field: &str) -> String {
    error_list(errors.field(field))
}

pub fn non_field_errors(errors: &FormErrors) -> String {
    error_list(errors.non_field())
}

fn error_list(messages: &[String]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let items: String = messages
        .iter()
        .map(|m| format!("<li>{}</li>", escape(m)))
        .collect();
    format!(r#"<ul class="errorlist">{}</ul>"#, items)
}
