// Edge gate in front of the admin pages
//
// Runs before any admin page is rendered. It only admits desktop browsers
// carrying a usable token; real authorization happens on every API call
// through the auth extractors.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tracing::{debug, info};

use crate::auth::token::{peek_expiry, token_fingerprint};

/// User-agent substrings that identify phones and tablets (matched lowercase)
pub const MOBILE_KEYWORDS: [&str; 9] = [
    "mobile",
    "android",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "windows phone",
    "webos",
    "tablet",
];

/// Platform substrings a desktop browser must report (matched lowercase)
pub const DESKTOP_KEYWORDS: [&str; 3] = ["windows", "macintosh", "linux"];

/// Cookie carrying the access token for page navigations
pub const TOKEN_COOKIE: &str = "access_token";

pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    let user_agent = user_agent.to_lowercase();
    MOBILE_KEYWORDS
        .iter()
        .any(|keyword| user_agent.contains(keyword))
}

/// A desktop browser: no mobile keyword and a desktop platform keyword
///
/// Empty user agents and non-browser clients (curl, scripts) are not desktop.
pub fn is_desktop_user_agent(user_agent: &str) -> bool {
    if is_mobile_user_agent(user_agent) {
        return false;
    }

    let user_agent = user_agent.to_lowercase();
    DESKTOP_KEYWORDS
        .iter()
        .any(|keyword| user_agent.contains(keyword))
}

/// The parts of a request the gate looks at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateRequest {
    pub path: String,
    pub user_agent: String,
    /// Token from the `access_token` cookie, else from `Authorization: Bearer`
    pub token: Option<String>,
}

impl GateRequest {
    pub fn from_headers(path: &str, headers: &HeaderMap) -> Self {
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let token = cookie_token(headers).or_else(|| bearer_header_token(headers));

        Self {
            path: path.to_string(),
            user_agent,
            token,
        }
    }
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn bearer_header_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).trim())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Why a request was redirected away from the admin area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    MobileBlocked,
    MissingToken,
    ExpiredToken,
    InvalidToken,
}

/// Outcome of the gate for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect {
        location: String,
        reason: RedirectReason,
    },
}

/// Edge gate configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeGate {
    protected_prefix: String,
    login_path: String,
    blocked_path: String,
}

impl Default for EdgeGate {
    fn default() -> Self {
        Self::new("/admin")
    }
}

impl EdgeGate {
    /// Gate everything at or below `protected_prefix` (e.g. `/admin`)
    pub fn new(protected_prefix: &str) -> Self {
        let prefix = protected_prefix.trim_end_matches('/');
        Self {
            protected_prefix: prefix.to_string(),
            login_path: "/auth/login".to_string(),
            blocked_path: format!("{}/mobile-blocked", prefix),
        }
    }

    pub fn protected_prefix(&self) -> &str {
        &self.protected_prefix
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn blocked_path(&self) -> &str {
        &self.blocked_path
    }

    /// True for the prefix itself and anything below it, except the blocked page
    pub fn is_protected(&self, path: &str) -> bool {
        if path == self.blocked_path {
            return false;
        }

        match path.strip_prefix(self.protected_prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Decide what to do with a request at unix time `now`
    pub fn decide(&self, request: &GateRequest, now: i64) -> GateDecision {
        if !self.is_protected(&request.path) {
            return GateDecision::Allow;
        }

        if !is_desktop_user_agent(&request.user_agent) {
            return GateDecision::Redirect {
                location: self.blocked_path.clone(),
                reason: RedirectReason::MobileBlocked,
            };
        }

        let Some(token) = request.token.as_deref() else {
            return self.to_login(&request.path, RedirectReason::MissingToken);
        };

        match peek_expiry(token) {
            Ok(exp) if exp < now => self.to_login(&request.path, RedirectReason::ExpiredToken),
            Ok(_) => GateDecision::Allow,
            Err(_) => self.to_login(&request.path, RedirectReason::InvalidToken),
        }
    }

    fn to_login(&self, path: &str, reason: RedirectReason) -> GateDecision {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("redirect", path);
        match reason {
            RedirectReason::ExpiredToken => {
                query.append_pair("expired", "true");
            }
            RedirectReason::InvalidToken => {
                query.append_pair("invalid", "true");
            }
            RedirectReason::MissingToken | RedirectReason::MobileBlocked => {}
        }

        GateDecision::Redirect {
            location: format!("{}?{}", self.login_path, query.finish()),
            reason,
        }
    }
}

/// Middleware adapter for [`EdgeGate::decide`]; every refusal is a 307 redirect
pub async fn edge_gate(State(gate): State<Arc<EdgeGate>>, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if !gate.is_protected(path) {
        return next.run(request).await;
    }

    let gate_request = GateRequest::from_headers(path, request.headers());
    match gate.decide(&gate_request, Utc::now().timestamp()) {
        GateDecision::Allow => {
            debug!(
                "Edge gate allowed {} (token {})",
                gate_request.path,
                gate_request
                    .token
                    .as_deref()
                    .map(token_fingerprint)
                    .unwrap_or_default()
            );
            next.run(request).await
        }
        GateDecision::Redirect { location, reason } => {
            info!("Edge gate redirected {}: {:?}", gate_request.path, reason);
            Redirect::temporary(&location).into_response()
        }
    }
}
