//! GoTrue identity provider client
//!
//! reqwest-based implementation of the [`IdentityProvider`] port against the
//! backend's auth REST API. Holds the persisted session credential and fans
//! out auth-state change notifications to subscribers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use timelords_core::IdentityProvider;
use timelords_domain::{
    AuthChange, AuthChangeEvent, AuthUser, Result, Session, SignUpResponse, TimeLordsError,
};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::config::BackendConfig;
use crate::rest::AccessTokenSource;

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Token grant response from the auth API
///
/// Returned by the password grant and by auto-confirmed sign-ups.
#[derive(Debug, Deserialize)]
struct TokenGrantResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: i64,
    user: AuthUser,
}

impl From<TokenGrantResponse> for Session {
    fn from(grant: TokenGrantResponse) -> Self {
        Self::new(grant.access_token, grant.refresh_token, grant.expires_in, grant.user)
    }
}

/// Sign-up response, which is either a full token grant (auto-confirm
/// enabled) or a bare user record awaiting email confirmation
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpApiResponse {
    Granted(TokenGrantResponse),
    Pending(AuthUser),
}

/// Error body shape of the auth API
///
/// Field names vary across endpoints, so all known spellings are optional.
#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl AuthErrorBody {
    fn message(self) -> Option<String> {
        self.error_description.or(self.msg).or(self.message).or(self.error)
    }
}

/// GoTrue-backed identity provider
///
/// Credential persistence lives here: the current session is kept in memory
/// and can be hydrated from external storage via [`restore_session`].
///
/// [`restore_session`]: GoTrueClient::restore_session
pub struct GoTrueClient {
    http: reqwest::Client,
    config: BackendConfig,
    session: Arc<RwLock<Option<Session>>>,
    events: broadcast::Sender<AuthChange>,
}

impl GoTrueClient {
    /// Create a new client for the configured backend
    ///
    /// # Errors
    /// Returns `Config` if the HTTP client cannot be built.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TimeLordsError::Config(format!("failed to build HTTP client: {e}")))?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self { http, config, session: Arc::new(RwLock::new(None)), events })
    }

    /// Hydrate a session persisted by the embedding application
    ///
    /// Broadcasts an `InitialSession` notification so an already-active
    /// synchronizer picks it up.
    pub async fn restore_session(&self, session: Session) {
        debug!(user_id = %session.user.id, "restoring persisted session");
        *self.session.write().await = Some(session.clone());
        let _ = self
            .events
            .send(AuthChange { event: AuthChangeEvent::InitialSession, session: Some(session) });
    }

    fn builder(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .header("X-Client-Info", &self.config.client_info)
    }

    async fn store_and_notify(&self, session: Session) {
        *self.session.write().await = Some(session.clone());
        let _ = self
            .events
            .send(AuthChange { event: AuthChangeEvent::SignedIn, session: Some(session) });
    }

    /// Turn a non-success auth API response into a `Provider` error carrying
    /// the server's message
    async fn provider_error(response: reqwest::Response) -> TimeLordsError {
        let status = response.status();
        let message = match response.json::<AuthErrorBody>().await {
            Ok(body) => body.message(),
            Err(_) => None,
        };
        TimeLordsError::Provider(
            message.unwrap_or_else(|| format!("auth request failed with status {status}")),
        )
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.session.read().await.clone())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let url = format!("{}/token", self.config.auth_url());

        let response = self
            .builder(reqwest::Method::POST, url)
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| TimeLordsError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let err = Self::provider_error(response).await;
            warn!(error = %err, "password grant rejected");
            return Err(err);
        }

        let grant: TokenGrantResponse = response
            .json()
            .await
            .map_err(|e| TimeLordsError::Provider(format!("failed to parse token response: {e}")))?;

        let session = Session::from(grant);
        info!(user_id = %session.user.id, "password grant succeeded");
        self.store_and_notify(session.clone()).await;
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: &str,
    ) -> Result<SignUpResponse> {
        let url = format!("{}/signup", self.config.auth_url());

        let response = self
            .builder(reqwest::Method::POST, url)
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "full_name": "", "avatar_url": "" },
            }))
            .send()
            .await
            .map_err(|e| TimeLordsError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let err = Self::provider_error(response).await;
            warn!(error = %err, "sign-up rejected");
            return Err(err);
        }

        let body: SignUpApiResponse = response
            .json()
            .await
            .map_err(|e| TimeLordsError::Provider(format!("failed to parse sign-up response: {e}")))?;

        match body {
            SignUpApiResponse::Granted(grant) => {
                let session = Session::from(grant);
                info!(user_id = %session.user.id, "sign-up auto-confirmed");
                self.store_and_notify(session.clone()).await;
                Ok(SignUpResponse { user: Some(session.user.clone()), session: Some(session) })
            }
            SignUpApiResponse::Pending(user) => {
                info!(user_id = %user.id, "sign-up pending email confirmation");
                Ok(SignUpResponse { user: Some(user), session: None })
            }
        }
    }

    async fn sign_out(&self) -> Result<()> {
        let token = self.session.read().await.as_ref().map(|s| s.access_token.clone());

        if let Some(token) = token {
            let url = format!("{}/logout", self.config.auth_url());

            let response = self
                .builder(reqwest::Method::POST, url)
                .header("Authorization", format!("Bearer {token}"))
                .send()
                .await
                .map_err(|e| TimeLordsError::Network(e.to_string()))?;

            // The stored session is only cleared once the server accepted the
            // sign-out; a failed sign-out must leave the credential in place.
            if !response.status().is_success() {
                let err = Self::provider_error(response).await;
                warn!(error = %err, "sign-out rejected");
                return Err(err);
            }
        }

        self.session.write().await.take();
        let _ = self.events.send(AuthChange { event: AuthChangeEvent::SignedOut, session: None });
        info!("signed out");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }
}

#[async_trait]
impl AccessTokenSource for GoTrueClient {
    async fn access_token(&self) -> Option<String> {
        self.session.read().await.as_ref().map(|s| s.access_token.clone())
    }
}

impl std::fmt::Debug for GoTrueClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoTrueClient").field("base_url", &self.config.base_url).finish()
    }
}
