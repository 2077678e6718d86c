// Bearer-token API client
//
// Every request carries the stored token. A 401 clears the token and comes
// back as `ClientError::Unauthorized`; callers decide where to navigate.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::{
    base_url::{api_base_url_from_env, ExecutionContext},
    errors::{ClientError, ErrorInfo},
    models::{ClientUser, Credentials, LoginResponse, RegisterForm},
    storage::TokenStore,
};

pub struct ApiClient {
    http: Client,
    base_url: String,
    tokens: TokenStore,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, tokens: TokenStore) -> Self {
        Self::with_client(Client::new(), base_url, tokens)
    }

    /// Client for the base URL the environment configures for `context`
    pub fn from_env(context: ExecutionContext, tokens: TokenStore) -> Self {
        Self::new(api_base_url_from_env(context), tokens)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>, tokens: TokenStore) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.tokens.get() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request, turning error statuses into [`ClientError`]
    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: Option<Value> = response.json().await.ok();
        let info = ErrorInfo::from_status(status.as_u16(), body.as_ref());

        if status == StatusCode::UNAUTHORIZED {
            warn!("API rejected credentials; clearing stored token");
            self.tokens.clear();
            return Err(ClientError::Unauthorized(info));
        }

        debug!("API request failed with status {}", status);
        Err(ClientError::Http(info))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.send(self.http.get(self.url(path))).await?;
        Self::decode(response).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.http.post(self.url(path)).json(body)).await?;
        Self::decode(response).await
    }

    /// Exchange credentials for a token; the caller decides whether to store it
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ClientError> {
        self.post_json("/auth/login", credentials).await
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<ClientUser, ClientError> {
        self.post_json("/auth/register", form).await
    }

    /// Fetch the profile of the token's owner
    pub async fn profile(&self) -> Result<ClientUser, ClientError> {
        self.get_json("/auth/me").await
    }

    /// Tell the backend about the logout; its failure is ignored and the
    /// stored token is always cleared
    pub async fn logout(&self) {
        if let Err(e) = self.send(self.http.post(self.url("/auth/logout"))).await {
            debug!("Logout notification failed: {}", e);
        }
        self.tokens.clear();
    }
}
