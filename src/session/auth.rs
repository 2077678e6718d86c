// Authentication session state
//
// Owns the signed-in user and publishes every change to observers through a
// watch channel. Token persistence goes through the API client's token store.

use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info};
use validator::Validate;

use crate::client::{
    errors::{ClientError, ErrorReporter, Notifier, TracingNotifier},
    models::{ClientUser, Credentials, RegisterForm},
    ApiClient,
};
use crate::validation::first_error_message;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<ClientUser>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl SessionState {
    /// State before the stored token has been checked
    pub fn loading() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: true,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            is_loading: false,
            ..Self::loading()
        }
    }

    pub fn signed_in(user: ClientUser) -> Self {
        Self {
            user: Some(user),
            is_authenticated: true,
            is_loading: false,
        }
    }
}

pub struct AuthSession<N: Notifier = TracingNotifier> {
    api: ApiClient,
    state: watch::Sender<SessionState>,
    last_error: Mutex<Option<String>>,
    reporter: ErrorReporter<N>,
}

impl AuthSession<TracingNotifier> {
    pub fn new(api: ApiClient) -> Self {
        Self::with_notifier(api, TracingNotifier)
    }
}

impl<N: Notifier> AuthSession<N> {
    pub fn with_notifier(api: ApiClient, notifier: N) -> Self {
        let (state, _) = watch::channel(SessionState::loading());
        Self {
            api,
            state,
            last_error: Mutex::new(None),
            reporter: ErrorReporter::new(notifier),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<ClientUser> {
        self.state.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    /// Observe session changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// User-facing message of the last failed login or registration
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_last_error(&self, message: Option<String>) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = message;
    }

    fn set_loading(&self, is_loading: bool) {
        self.state.send_modify(|state| state.is_loading = is_loading);
    }

    /// Load the profile for a stored token; any failure clears the token
    pub async fn refresh(&self) {
        if !self.api.tokens().is_authenticated() {
            self.state.send_replace(SessionState::signed_out());
            return;
        }

        self.set_loading(true);
        match self.api.profile().await {
            Ok(user) => {
                debug!("Restored session for {}", user.username);
                self.state.send_replace(SessionState::signed_in(user));
            }
            Err(e) => {
                debug!("Stored token could not be used: {}", e);
                self.api.tokens().clear();
                self.state.send_replace(SessionState::signed_out());
            }
        }
    }

    pub async fn login(&self, credentials: Credentials) -> bool {
        if let Err(errors) = credentials.validate() {
            self.set_last_error(Some(first_error_message(&errors, &["username", "password"])));
            return false;
        }

        self.set_loading(true);
        let result = match self.api.login(&credentials).await {
            Ok(response) => self
                .api
                .tokens()
                .set(&response.access_token)
                .map(|_| response.user)
                .map_err(ClientError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(user) => {
                info!("Signed in as {}", user.username);
                self.set_last_error(None);
                self.state.send_replace(SessionState::signed_in(user));
                self.reporter.success("Welcome back!");
                true
            }
            Err(e) => {
                let info = self.reporter.report_error("Login", &e);
                self.set_last_error(Some(info.message));
                self.set_loading(false);
                false
            }
        }
    }

    /// Create the account, then sign in with the same credentials so a token
    /// is persisted
    pub async fn register(&self, form: RegisterForm) -> bool {
        if let Err(errors) = form.validate() {
            self.set_last_error(Some(first_error_message(&errors, &RegisterForm::FIELDS)));
            return false;
        }

        self.set_loading(true);
        if let Err(e) = self.api.register(&form).await {
            let info = self.reporter.report_error("Registration", &e);
            self.set_last_error(Some(info.message));
            self.set_loading(false);
            return false;
        }

        self.login(form.credentials()).await
    }

    /// Forget the token and the user immediately
    pub fn logout(&self) {
        self.api.tokens().clear();
        self.state.send_replace(SessionState::signed_out());
    }

    /// Notify the backend, then sign out locally whatever the outcome
    pub async fn logout_remote(&self) {
        self.api.logout().await;
        self.logout();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{
        errors::{tests::RecordingNotifier, NotificationLevel},
        storage::{MemoryStorage, TokenStore},
        testing::MockApi,
    };
    use std::sync::Arc;

    fn session_for<'a>(
        base_url: &str,
        notifier: &'a RecordingNotifier,
    ) -> AuthSession<&'a RecordingNotifier> {
        let tokens = TokenStore::new(Arc::new(MemoryStorage::new()));
        AuthSession::with_notifier(ApiClient::new(base_url, tokens), notifier)
    }

    fn form(username: &str) -> RegisterForm {
        RegisterForm {
            username: username.into(),
            email: format!("{}@example.com", username),
            password: "Passw0rd".into(),
            name: None,
        }
    }

    #[tokio::test]
    async fn test_login_persists_token_and_notifies_observers() {
        let mock = MockApi::start().await;
        let notifier = RecordingNotifier::default();
        let session = session_for(mock.base_url(), &notifier);
        let mut changes = session.subscribe();

        assert!(session.login(Credentials::new("testuser", "password")).await);

        assert!(changes.has_changed().unwrap());
        let state = changes.borrow_and_update().clone();
        assert!(state.is_authenticated);
        assert!(!state.is_loading);
        assert_eq!(state.user.unwrap().email, "test@example.com");
        assert_eq!(session.api().tokens().get().as_deref(), Some("mock-jwt-token"));
        assert_eq!(session.last_error(), None);
        assert_eq!(
            notifier.messages.lock().unwrap().last().map(|(level, _)| *level),
            Some(NotificationLevel::Success)
        );
    }

    #[tokio::test]
    async fn test_login_failure_sets_message() {
        let mock = MockApi::start().await;
        let notifier = RecordingNotifier::default();
        let session = session_for(mock.base_url(), &notifier);

        assert!(!session.login(Credentials::new("testuser", "wrong")).await);

        let state = session.state();
        assert!(!state.is_authenticated);
        assert!(!state.is_loading);
        assert_eq!(
            session.last_error().as_deref(),
            Some("Authentication failed. Please check your credentials.")
        );
        assert!(session.api().tokens().get().is_none());
    }

    #[tokio::test]
    async fn test_login_validates_before_sending() {
        let mock = MockApi::start().await;
        let notifier = RecordingNotifier::default();
        let session = session_for(mock.base_url(), &notifier);

        assert!(!session.login(Credentials::new("", "password")).await);
        assert_eq!(session.last_error().as_deref(), Some("Username is required."));
        assert_eq!(mock.hits("/auth/login"), 0);
    }

    #[tokio::test]
    async fn test_register_signs_in_with_same_credentials() {
        let mock = MockApi::start().await;
        let notifier = RecordingNotifier::default();
        let session = session_for(mock.base_url(), &notifier);

        // The mock only knows testuser/password for login
        let mut new_user = form("newuser");
        assert!(!session.register(new_user.clone()).await);
        assert_eq!(mock.hits("/auth/register"), 1);
        assert_eq!(mock.hits("/auth/login"), 1);

        new_user.username = "testuser".into();
        assert!(!session.register(new_user).await);
        assert_eq!(session.last_error().as_deref(), Some("Username already registered"));
        assert_eq!(mock.hits("/auth/login"), 1);
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password_locally() {
        let mock = MockApi::start().await;
        let notifier = RecordingNotifier::default();
        let session = session_for(mock.base_url(), &notifier);

        let mut weak = form("newuser");
        weak.password = "password".into();
        assert!(!session.register(weak).await);
        assert!(session.last_error().is_some());
        assert_eq!(mock.hits("/auth/register"), 0);
    }

    #[tokio::test]
    async fn test_refresh_restores_or_clears() {
        let mock = MockApi::start().await;
        let notifier = RecordingNotifier::default();
        let session = session_for(mock.base_url(), &notifier);
        assert!(session.state().is_loading);

        session.refresh().await;
        assert_eq!(session.state(), SessionState::signed_out());
        assert_eq!(mock.hits("/auth/me"), 0);

        session.api().tokens().set("mock-jwt-token").unwrap();
        session.refresh().await;
        assert_eq!(session.user().unwrap().username, "testuser");

        session.api().tokens().set("stale").unwrap();
        session.refresh().await;
        assert!(!session.is_authenticated());
        assert!(session.api().tokens().get().is_none());
    }

    #[tokio::test]
    async fn test_logout_is_immediate_and_tolerates_offline_backend() {
        let notifier = RecordingNotifier::default();
        let session = session_for("http://127.0.0.1:9", &notifier);
        session.api().tokens().set("mock-jwt-token").unwrap();

        session.logout();
        assert_eq!(session.state(), SessionState::signed_out());
        assert!(session.api().tokens().get().is_none());

        session.api().tokens().set("mock-jwt-token").unwrap();
        session.logout_remote().await;
        assert!(session.api().tokens().get().is_none());
    }
}
