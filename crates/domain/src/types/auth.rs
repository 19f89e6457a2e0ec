//! Authentication session types
//!
//! The session credential, the authenticated principal, and the combined
//! `AuthState` triple published to consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::profile::Profile;

/// Authenticated principal as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Opaque session credential issued by the identity provider
///
/// Present iff the provider currently recognizes an authenticated principal.
/// Expiry bookkeeping mirrors the token metadata the provider returns; the
/// refresh machinery itself belongs to the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// JWT access token for API authentication
    pub access_token: String,

    /// Token type (always "Bearer")
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// Absolute expiration timestamp (UTC), calculated from `expires_in`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Refresh token, when the provider issued one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// The principal this credential proves
    pub user: AuthUser,
}

impl Session {
    /// Create a new `Session` with calculated expiration time
    #[must_use]
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        expires_in: i64,
        user: AuthUser,
    ) -> Self {
        let expires_at = if expires_in > 0 {
            Some(Utc::now() + chrono::Duration::seconds(expires_in))
        } else {
            None
        };

        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            expires_at,
            refresh_token,
            user,
        }
    }

    /// Check if the access token is expired or will expire within the given
    /// threshold
    ///
    /// Returns `false` when no expiry is set.
    #[must_use]
    pub fn is_expired(&self, threshold_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let threshold = chrono::Duration::seconds(threshold_seconds);
                Utc::now() + threshold >= expires_at
            }
            None => false,
        }
    }
}

/// Combined authentication state published to consumers
///
/// Single source of truth for "who is signed in". `session` and `user` always
/// come from the same resolution pass: the only constructors either set both
/// or clear both, so a torn mix of an old session with a newer profile cannot
/// be built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthState {
    /// Current session credential, absent when signed out
    pub session: Option<Session>,

    /// Profile record for the session's principal
    ///
    /// Present only if `session` is present; the reverse is not guaranteed.
    pub user: Option<Profile>,

    /// True while a resolution pass or imperative action is in flight
    pub loading: bool,
}

impl AuthState {
    /// State at application start, before the first resolution pass
    ///
    /// Loading starts true so consumers render a pending state rather than a
    /// flash of signed-out UI.
    #[must_use]
    pub fn initial() -> Self {
        Self { session: None, user: None, loading: true }
    }

    /// Fully resolved signed-out state
    #[must_use]
    pub fn signed_out() -> Self {
        Self { session: None, user: None, loading: false }
    }

    /// Fully resolved authenticated state
    #[must_use]
    pub fn authenticated(session: Session, profile: Profile) -> Self {
        Self { session: Some(session), user: Some(profile), loading: false }
    }

    /// Whether a signed-in principal with a resolved profile is present
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some() && self.user.is_some()
    }
}

/// Auth-state change notification vocabulary of the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthChangeEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// Payload of an auth-state change notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthChange {
    pub event: AuthChangeEvent,
    pub session: Option<Session>,
}

/// Provider-level result of a registration call
///
/// A principal without a session means the user must confirm their email
/// before a session exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignUpResponse {
    pub user: Option<AuthUser>,
    pub session: Option<Session>,
}

/// Synchronizer-level result of a registration call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUpOutcome {
    /// True when the provider returned no session, i.e. the user registered
    /// but must confirm their email before signing in
    pub requires_email_confirmation: bool,
}
