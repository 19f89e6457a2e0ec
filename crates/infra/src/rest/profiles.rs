//! Profile store implementation over the record store REST API
//!
//! Reads and inserts rows of the `profiles` table. Requests carry the anon
//! key plus a bearer token: the signed-in user's access token when one is
//! available, the anon key otherwise (row-level security runs server-side).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use timelords_core::ProfileStore;
use timelords_domain::{Profile, Result, TimeLordsError};
use tracing::{debug, warn};

use super::AccessTokenSource;
use crate::config::BackendConfig;

/// Error body shape of the record store API
#[derive(Debug, Deserialize)]
struct StoreErrorBody {
    message: Option<String>,
    details: Option<String>,
}

/// REST-backed implementation of `ProfileStore`
pub struct PostgrestProfileStore {
    http: reqwest::Client,
    config: BackendConfig,
    tokens: Arc<dyn AccessTokenSource>,
}

impl PostgrestProfileStore {
    /// Create a new store for the configured backend
    ///
    /// # Errors
    /// Returns `Config` if the HTTP client cannot be built.
    pub fn new(config: BackendConfig, tokens: Arc<dyn AccessTokenSource>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TimeLordsError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config, tokens })
    }

    async fn bearer_token(&self) -> String {
        match self.tokens.access_token().await {
            Some(token) => token,
            None => self.config.anon_key.clone(),
        }
    }

    async fn builder(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", self.bearer_token().await))
            .header("X-Client-Info", &self.config.client_info)
    }

    /// Turn a non-success record store response into a `Store` error carrying
    /// the server's message
    async fn store_error(response: reqwest::Response) -> TimeLordsError {
        let status = response.status();
        let message = match response.json::<StoreErrorBody>().await {
            Ok(body) => body.message.or(body.details),
            Err(_) => None,
        };
        TimeLordsError::Store(
            message.unwrap_or_else(|| format!("record store request failed with status {status}")),
        )
    }
}

#[async_trait]
impl ProfileStore for PostgrestProfileStore {
    async fn fetch_by_id(&self, id: &str) -> Result<Option<Profile>> {
        let url = format!("{}/profiles", self.config.rest_url());

        let response = self
            .builder(reqwest::Method::GET, url)
            .await
            .query(&[("id", format!("eq.{id}")), ("select", "*".to_string()), ("limit", "1".to_string())])
            .send()
            .await
            .map_err(|e| TimeLordsError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let err = Self::store_error(response).await;
            warn!(error = %err, user_id = %id, "profile fetch failed");
            return Err(err);
        }

        let mut rows: Vec<Profile> = response
            .json()
            .await
            .map_err(|e| TimeLordsError::Store(format!("failed to parse profile rows: {e}")))?;

        debug!(user_id = %id, found = !rows.is_empty(), "profile fetch complete");
        Ok(if rows.is_empty() { None } else { Some(rows.remove(0)) })
    }

    async fn insert(&self, profile: Profile) -> Result<()> {
        let url = format!("{}/profiles", self.config.rest_url());

        let response = self
            .builder(reqwest::Method::POST, url)
            .await
            .header("Prefer", "return=minimal")
            .json(&profile)
            .send()
            .await
            .map_err(|e| TimeLordsError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::CONFLICT {
            let err = Self::store_error(response).await;
            warn!(error = %err, user_id = %profile.id, "duplicate profile insert");
            return Err(err);
        }
        if !status.is_success() {
            let err = Self::store_error(response).await;
            warn!(error = %err, user_id = %profile.id, "profile insert failed");
            return Err(err);
        }

        debug!(user_id = %profile.id, "profile row inserted");
        Ok(())
    }
}

impl std::fmt::Debug for PostgrestProfileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestProfileStore").field("base_url", &self.config.base_url).finish()
    }
}
