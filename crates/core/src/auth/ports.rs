//! Port interfaces for session and identity synchronization
//!
//! These traits define the boundaries between the synchronizer and the two
//! external collaborators it drives: the hosted identity provider and the
//! profile record store.

use async_trait::async_trait;
use timelords_domain::{AuthChange, Profile, Result, Session, SignUpResponse};
use tokio::sync::broadcast;

/// Trait for the hosted identity provider
///
/// Abstracts session issuance and auth-state change notifications so the
/// synchronizer can be driven by mock providers in tests.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Get the currently persisted session, if any
    async fn current_session(&self) -> Result<Option<Session>>;

    /// Sign in with email and password
    ///
    /// # Errors
    /// Returns error when the credentials are rejected or the provider is
    /// unreachable.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// Register a new principal
    ///
    /// `redirect_to` is the post-confirmation sign-in target. A response
    /// without a session means email confirmation is pending.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: &str,
    ) -> Result<SignUpResponse>;

    /// Sign out the current principal
    async fn sign_out(&self) -> Result<()>;

    /// Subscribe to auth-state change notifications
    ///
    /// Delivery stops when the receiver is dropped; dropping it is the
    /// cancellation handle.
    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;
}

/// Trait for profile record persistence and retrieval
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a profile by principal id
    async fn fetch_by_id(&self, id: &str) -> Result<Option<Profile>>;

    /// Insert a new profile row
    ///
    /// Plain insert, not an upsert: inserting a duplicate principal id fails.
    async fn insert(&self, profile: Profile) -> Result<()>;
}
