// Minimal HTML pages behind and around the edge gate

use axum::{extract::Query, response::Html, routing::get, Router};
use serde::Deserialize;

use crate::web::gate::EdgeGate;
use crate::AppState;

/// Query parameters the edge gate appends when redirecting to the login page
#[derive(Debug, Default, Deserialize)]
pub struct LoginPageQuery {
    pub redirect: Option<String>,
    #[serde(default)]
    pub expired: bool,
    #[serde(default)]
    pub invalid: bool,
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(title),
        body
    ))
}

/// Login page; credentials are posted to the same path as JSON by the client
pub async fn login_page(Query(query): Query<LoginPageQuery>) -> Html<String> {
    let notice = if query.expired {
        "<p class=\"notice\">Your session has expired. Please sign in again.</p>"
    } else if query.invalid {
        "<p class=\"notice\">Your session is invalid. Please sign in again.</p>"
    } else {
        ""
    };

    let redirect = query.redirect.as_deref().unwrap_or("/");
    page(
        "Sign in",
        &format!(
            "<h1>Sign in</h1>\n{}\n<form id=\"login\" data-redirect=\"{}\">\n\
             <input name=\"username\" autocomplete=\"username\">\n\
             <input name=\"password\" type=\"password\" autocomplete=\"current-password\">\n\
             <button type=\"submit\">Sign in</button>\n</form>",
            notice,
            escape_html(redirect)
        ),
    )
}

pub async fn admin_dashboard() -> Html<String> {
    page(
        "Admin dashboard",
        "<h1>Admin dashboard</h1>\n<p>Manage users and content.</p>",
    )
}

pub async fn mobile_blocked_page() -> Html<String> {
    page(
        "Desktop Access Required",
        "<h1>Desktop Access Required</h1>\n\
         <p>The admin dashboard is designed for desktop use only and is not available on mobile devices.</p>\n\
         <ul>\n<li>Use a desktop or laptop computer</li>\n<li>Open this page in a desktop browser</li>\n</ul>\n\
         <a href=\"/\">Return to Homepage</a>",
    )
}

/// Routes for the admin area under the gate's prefix
pub fn router(gate: &EdgeGate) -> Router<AppState> {
    Router::new()
        .route(gate.protected_prefix(), get(admin_dashboard))
        .route(gate.blocked_path(), get(mobile_blocked_page))
}
