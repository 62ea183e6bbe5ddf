use super::layout;

pub fn not_found_page() -> String {
    layout(
        "Page not found",
        "not-found",
        None,
        r#"    <h1>Page not found</h1>
    <p>The page you requested does not exist.</p>
    <a href="/">Back to the main page</a>"#,
    )
}

pub fn bad_request_page() -> String {
    layout(
        "Bad request",
        "bad-request",
        None,
        r#"    <h1>Bad request</h1>
    <p>The request could not be understood.</p>"#,
    )
}

pub fn server_error_page() -> String {
    layout(
        "Server error",
        "server-error",
        None,
        r#"    <h1>Server error</h1>
    <p>Something went wrong on our side. Please try again later.</p>"#,
    )
}
