// API base URL resolution per execution context

/// Public base URL, reachable from end-user devices
pub const PUBLIC_URL_VAR: &str = "API_PUBLIC_URL";
/// Internal base URL, reachable only from the server side (e.g. a service name)
pub const INTERNAL_URL_VAR: &str = "API_INTERNAL_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// Code running on the user's device
    Browser,
    /// Code running next to the API
    Server,
}

/// Resolve the API base URL
///
/// Browser code only sees the public variable. Server code prefers the
/// internal variable, then the public one. Both fall back to
/// [`DEFAULT_API_URL`]. Blank values count as unset and a trailing slash is
/// removed.
pub fn resolve_api_base_url<F>(context: ExecutionContext, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| {
        lookup(name)
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
    };

    let resolved = match context {
        ExecutionContext::Browser => read(PUBLIC_URL_VAR),
        ExecutionContext::Server => read(INTERNAL_URL_VAR).or_else(|| read(PUBLIC_URL_VAR)),
    };

    resolved.unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

/// Resolve from the process environment
pub fn api_base_url_from_env(context: ExecutionContext) -> String {
    resolve_api_base_url(context, |name| std::env::var(name).ok())
}
