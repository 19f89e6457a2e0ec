//! Backend configuration
//!
//! Connection settings for the hosted backend stack: one base URL serving
//! the auth API under `/auth/v1` and the record store under `/rest/v1`.

use timelords_domain::{Result, TimeLordsError};

/// Environment variable holding the backend base URL
pub const ENV_BACKEND_URL: &str = "TIMELORDS_SUPABASE_URL";

/// Environment variable holding the publishable anon key
pub const ENV_ANON_KEY: &str = "TIMELORDS_SUPABASE_ANON_KEY";

const DEFAULT_CLIENT_INFO: &str = "time-lords-network";

/// Configuration for the hosted backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the backend project (e.g. "https://abc.supabase.co")
    pub base_url: String,

    /// Publishable anon key, sent as `apikey` and used as the bearer token
    /// for unauthenticated requests
    pub anon_key: String,

    /// Value for the `X-Client-Info` header
    pub client_info: String,
}

impl BackendConfig {
    /// Create a new backend configuration
    #[must_use]
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            client_info: DEFAULT_CLIENT_INFO.to_string(),
        }
    }

    /// Load configuration from the environment
    ///
    /// # Errors
    /// Returns `Config` when either variable is missing, mirroring the
    /// fail-fast behaviour of the application bootstrap.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(ENV_BACKEND_URL)
            .map_err(|_| TimeLordsError::Config(format!("{ENV_BACKEND_URL} is not set")))?;
        let anon_key = std::env::var(ENV_ANON_KEY)
            .map_err(|_| TimeLordsError::Config(format!("{ENV_ANON_KEY} is not set")))?;
        Ok(Self::new(base_url, anon_key))
    }

    /// Root of the auth API
    #[must_use]
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.base_url)
    }

    /// Root of the record store API
    #[must_use]
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for config.
    use super::*;

    /// Validates `BackendConfig::new` behavior for the url derivation
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms `auth_url()` and `rest_url()` are rooted at the base URL.
    /// - Ensures a trailing slash on the base URL is trimmed.
    #[test]
    fn test_url_derivation() {
        let config = BackendConfig::new("https://abc.supabase.co/", "anon-key");

        assert_eq!(config.auth_url(), "https://abc.supabase.co/auth/v1");
        assert_eq!(config.rest_url(), "https://abc.supabase.co/rest/v1");
        assert_eq!(config.client_info, "time-lords-network");
    }

    /// Validates `BackendConfig::from_env` fails closed when unset.
    ///
    /// Assertions:
    /// - Ensures a missing base URL variable yields a `Config` error.
    #[test]
    fn test_from_env_missing_variables() {
        std::env::remove_var(ENV_BACKEND_URL);
        std::env::remove_var(ENV_ANON_KEY);

        let result = BackendConfig::from_env();
        assert!(matches!(result, Err(TimeLordsError::Config(_))));
    }
}
