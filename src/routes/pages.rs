// ABOUTME: Minimal inline HTML pages for the browser-facing surface
// ABOUTME: Renders home, login, auth-error, and result pages with escaped values
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::utils::html::escape_html;
use serde_json::Value;

const STYLE: &str = "body { font-family: Arial, sans-serif; margin: 40px; } \
                     pre { background-color: #f4f4f4; padding: 15px; border-radius: 4px; } \
                     .error { color: red; background-color: #ffe6e6; padding: 15px; border-radius: 4px; }";

fn page(title: &str, body: &str) -> String {
    format!(
        r"<!DOCTYPE html>
<html>
<head>
    <title>Guides Portal - {title}</title>
    <style>{STYLE}</style>
</head>
<body>
{body}
<hr><small>guides-portal v{version}</small>
</body>
</html>
",
        version = env!("CARGO_PKG_VERSION"),
    )
}

/// Home page for an authenticated session
#[must_use]
pub fn index_page(user: &Value) -> String {
    let name = user
        .get("name")
        .or_else(|| user.get("preferred_username"))
        .and_then(Value::as_str)
        .unwrap_or("user");
    let claims =
        serde_json::to_string_pretty(user).unwrap_or_else(|_| "{}".into());
    page(
        "Home",
        &format!(
            "<h1>Welcome, {}</h1>\n\
             <ul>\n\
             <li><a href=\"/getguide\">List guides</a></li>\n\
             <li><a href=\"/postguide\">Create a guide</a></li>\n\
             <li><a href=\"/logout\">Sign out</a></li>\n\
             </ul>\n\
             <pre>{}</pre>",
            escape_html(name),
            escape_html(&claims),
        ),
    )
}

/// Login page carrying the authorization URL
#[must_use]
pub fn login_page(auth_url: &str) -> String {
    page(
        "Sign in",
        &format!(
            "<h1>Sign in</h1>\n<p><a href=\"{}\">Sign in with your organizational account</a></p>",
            escape_html(auth_url),
        ),
    )
}

/// Error page for provider-reported authorization or exchange errors,
/// rendered verbatim (escaped)
#[must_use]
pub fn auth_error_page(error: &str, description: Option<&str>) -> String {
    page(
        "Sign-in error",
        &format!(
            "<div class=\"error\"><strong>{}</strong><p>{}</p></div>\n<a href=\"/\">&larr; Home</a>",
            escape_html(error),
            escape_html(description.unwrap_or_default()),
        ),
    )
}

/// Result page showing a raw API response
#[must_use]
pub fn display_page(result: &str) -> String {
    page(
        "Result",
        &format!(
            "<pre>{}</pre>\n<a href=\"/\">&larr; Home</a>",
            escape_html(result)
        ),
    )
}
