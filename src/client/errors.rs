// Client error taxonomy and user feedback

use std::fmt;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::client::storage::StorageError;

/// Category of a failed API interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Authentication,
    Authorization,
    Validation,
    Server,
    Client,
    Unknown,
}

impl ErrorKind {
    /// Default user-facing message for the category
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::Network => "Please check your internet connection and try again.",
            ErrorKind::Authentication => "Authentication failed. Please check your credentials.",
            ErrorKind::Authorization => "You don't have permission to perform this action.",
            ErrorKind::Validation => "Please check your input and try again.",
            ErrorKind::Server => "Server is temporarily unavailable. Please try again later.",
            ErrorKind::Client | ErrorKind::Unknown => "Something went wrong. Please try again.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Network => "NETWORK",
            ErrorKind::Authentication => "AUTHENTICATION",
            ErrorKind::Authorization => "AUTHORIZATION",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Server => "SERVER",
            ErrorKind::Client => "CLIENT",
            ErrorKind::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Structured description of a failure, ready to show to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    /// User-facing message
    pub message: String,
    /// Server-provided detail, for logs
    pub details: Option<String>,
    pub status: Option<u16>,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            status: None,
        }
    }

    /// Transport-level failure before any response arrived
    pub fn network(details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::new(ErrorKind::Network, ErrorKind::Network.default_message())
        }
    }

    /// Map an HTTP error status and its (possibly empty) JSON body
    pub fn from_status(status: u16, body: Option<&Value>) -> Self {
        let details = body.and_then(server_message);

        let (kind, message) = match status {
            400 | 422 => (
                ErrorKind::Validation,
                body.and_then(validation_message)
                    .unwrap_or_else(|| ErrorKind::Validation.default_message().to_string()),
            ),
            401 => (
                ErrorKind::Authentication,
                ErrorKind::Authentication.default_message().to_string(),
            ),
            403 => (
                ErrorKind::Authorization,
                ErrorKind::Authorization.default_message().to_string(),
            ),
            404 => (
                ErrorKind::Client,
                "The requested resource was not found.".to_string(),
            ),
            409 => (
                ErrorKind::Validation,
                "This data already exists. Please use different values.".to_string(),
            ),
            429 => (
                ErrorKind::Client,
                "Too many requests. Please wait a moment and try again.".to_string(),
            ),
            s if s >= 500 => (ErrorKind::Server, ErrorKind::Server.default_message().to_string()),
            _ => (ErrorKind::Unknown, ErrorKind::Unknown.default_message().to_string()),
        };

        Self {
            kind,
            message,
            details,
            status: Some(status),
        }
    }
}

/// `detail` (string or list) or `message` field of an error body
fn server_message(body: &Value) -> Option<String> {
    match body.get("detail") {
        Some(Value::String(detail)) => Some(detail.clone()),
        Some(detail @ Value::Array(_)) => Some(detail.to_string()),
        _ => body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

/// First field-level message: `detail[0].msg`, a string `detail`, or `message`
fn validation_message(body: &Value) -> Option<String> {
    let from_detail = match body.get("detail") {
        Some(Value::Array(items)) => items
            .first()
            .and_then(|item| item.get("msg"))
            .and_then(Value::as_str)
            .map(str::to_string),
        Some(Value::String(detail)) => Some(detail.clone()),
        _ => None,
    };

    from_detail.or_else(|| {
        body.get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
    })
}

/// Where the caller should send the user after an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/auth/login",
        }
    }
}

/// API client failure
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The stored token was rejected and has already been cleared
    #[error("Unauthorized: {}", .0.message)]
    Unauthorized(ErrorInfo),

    #[error("HTTP {}: {}", .0.status.unwrap_or_default(), .0.message)]
    Http(ErrorInfo),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Rejected by client-side validation; nothing was sent
    #[error("{}", .0.message)]
    Invalid(ErrorInfo),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ClientError {
    /// Categorized, user-presentable view of this error
    pub fn info(&self) -> ErrorInfo {
        match self {
            ClientError::Network(e) => ErrorInfo::network(e.to_string()),
            ClientError::Unauthorized(info) | ClientError::Http(info) | ClientError::Invalid(info) => {
                info.clone()
            }
            ClientError::Decode(details) => ErrorInfo {
                details: Some(details.clone()),
                ..ErrorInfo::new(ErrorKind::Client, ErrorKind::Client.default_message())
            },
            ClientError::Storage(e) => ErrorInfo {
                details: Some(e.to_string()),
                ..ErrorInfo::new(ErrorKind::Client, ErrorKind::Client.default_message())
            },
        }
    }

    /// Navigation the caller should perform; `Some(Route::Login)` after a 401
    pub fn navigation(&self) -> Option<Route> {
        match self {
            ClientError::Unauthorized(_) => Some(Route::Login),
            _ => None,
        }
    }
}

/// Severity of a transient notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// Sink for transient user notifications (toasts)
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NotificationLevel, message: &str);
}

/// Notifier that writes notifications to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NotificationLevel, message: &str) {
        match level {
            NotificationLevel::Success | NotificationLevel::Info => info!("{}", message),
            NotificationLevel::Warning => warn!("{}", message),
            NotificationLevel::Error => error!("{}", message),
        }
    }
}

/// Surfaces errors to the user through a [`Notifier`]
pub struct ErrorReporter<N: Notifier> {
    notifier: N,
}

impl<N: Notifier> ErrorReporter<N> {
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }

    /// Notify the user; the underlying detail is logged in debug builds only
    pub fn report(&self, context: &str, info: &ErrorInfo) {
        if cfg!(debug_assertions) {
            debug!(
                "{}: kind={} status={:?} message={} details={:?}",
                context, info.kind, info.status, info.message, info.details
            );
        }
        self.notifier.notify(NotificationLevel::Error, &info.message);
    }

    pub fn report_error(&self, context: &str, error: &ClientError) -> ErrorInfo {
        let info = error.info();
        self.report(context, &info);
        info
    }

    pub fn success(&self, message: &str) {
        self.notifier.notify(NotificationLevel::Success, message);
    }
}
