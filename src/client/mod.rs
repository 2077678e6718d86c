// API client module
// Token storage, base URL resolution, the bearer-token HTTP client and the
// error taxonomy used to give users feedback.

pub mod api;
pub mod base_url;
pub mod errors;
pub mod models;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use api::ApiClient;
pub use base_url::{api_base_url_from_env, resolve_api_base_url, ExecutionContext};
pub use errors::{ClientError, ErrorInfo, ErrorKind, ErrorReporter, Notifier, Route, TracingNotifier};
pub use models::{ClientUser, Credentials, LoginResponse, RegisterForm};
pub use storage::{FileStorage, MemoryStorage, Storage, TokenStore};
