//! Session synchronizer - core business logic
//!
//! Owns the authoritative [`AuthState`] and drives its transitions from the
//! identity provider and the profile store. Consumers observe the state
//! through a watch channel; every publish replaces the whole
//! session/user/loading triple so readers never see a torn mix of an old
//! session with a newer profile.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use timelords_domain::{
    AuthChange, AuthState, Profile, Result, Session, SignUpOutcome, TimeLordsError,
};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::ports::{IdentityProvider, ProfileStore};

/// Session and identity synchronization service
///
/// A resolution pass is the sequence "obtain session, fetch matching profile,
/// publish combined state". Passes are numbered at the moment their trigger
/// is observed (activation, change notification, imperative action); a
/// publish from a pass older than the last published one is discarded, so a
/// slow activation pass can never overwrite fresher notification-driven
/// state.
pub struct SessionSynchronizer {
    provider: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    sign_up_redirect: String,
    state_tx: watch::Sender<AuthState>,
    shutdown: CancellationToken,
    pass_counter: AtomicU64,
    last_published: Mutex<u64>,
}

impl SessionSynchronizer {
    /// Create a new synchronizer
    ///
    /// # Arguments
    /// * `provider` - Identity provider client
    /// * `profiles` - Profile record store
    /// * `sign_up_redirect` - Post-confirmation sign-in target passed to the
    ///   provider at registration (e.g. "https://app.example.com/signin")
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
        sign_up_redirect: impl Into<String>,
    ) -> Self {
        let (state_tx, _state_rx) = watch::channel(AuthState::initial());

        Self {
            provider,
            profiles,
            sign_up_redirect: sign_up_redirect.into(),
            state_tx,
            shutdown: CancellationToken::new(),
            pass_counter: AtomicU64::new(0),
            last_published: Mutex::new(0),
        }
    }

    /// Subscribe to published auth states
    ///
    /// The receiver always holds the latest fully-resolved state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    /// Snapshot of the current auth state
    #[must_use]
    pub fn current_state(&self) -> AuthState {
        self.state_tx.borrow().clone()
    }

    /// Activate the synchronizer for the current scope
    ///
    /// Registers the change-notification subscription (the receiver is taken
    /// synchronously so no notification delivered after this call is missed),
    /// then spawns the initialization pass and the listener task. The two run
    /// independently and may complete in either order.
    pub fn activate(self: &Arc<Self>) {
        let events = self.provider.subscribe();

        let init = Arc::clone(self);
        tokio::spawn(async move {
            init.initialize().await;
        });

        let listener = Arc::clone(self);
        tokio::spawn(async move {
            listener.listen(events).await;
        });
    }

    /// Deactivate the synchronizer
    ///
    /// Stops the listener task and suppresses every publish from passes still
    /// in flight. In-flight provider calls are not aborted, only their
    /// effects on shared state.
    pub fn deactivate(&self) {
        debug!("deactivating session synchronizer");
        self.shutdown.cancel();
    }

    /// Sign in with email and password
    ///
    /// Publishes `loading: true` for the duration. On any failure the prior
    /// session/user are restored with `loading: false` and the error is
    /// propagated, so a failed attempt never partially overwrites state.
    ///
    /// # Errors
    /// Returns `InvalidInput` for empty credentials, `Auth` when the provider
    /// rejects the credentials or the principal has no profile.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        validate_credentials(email, password)?;

        let pass = self.begin_pass();
        let before = self.current_state();
        self.publish(pass, AuthState { loading: true, ..before.clone() });

        let session = match self.provider.sign_in_with_password(email, password).await {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "sign-in rejected by identity provider");
                self.publish(pass, AuthState { loading: false, ..before });
                return Err(auth_error(&err));
            }
        };

        let profile = match self.profiles.fetch_by_id(&session.user.id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                warn!(user_id = %session.user.id, "signed-in principal has no profile");
                self.publish(pass, AuthState { loading: false, ..before });
                return Err(TimeLordsError::Auth(format!(
                    "no profile found for principal {}",
                    session.user.id
                )));
            }
            Err(err) => {
                error!(error = %err, "profile fetch failed after sign-in");
                self.publish(pass, AuthState { loading: false, ..before });
                return Err(auth_error(&err));
            }
        };

        info!(user_id = %session.user.id, "sign-in complete");
        self.publish(pass, AuthState::authenticated(session, profile));
        Ok(())
    }

    /// Register a new principal
    ///
    /// When the provider reports a principal, a blank profile row is inserted
    /// for it; registering the same principal twice fails loudly from the
    /// store. The signed-in state itself is published by the provider's
    /// change notification when a session exists, never by this method.
    ///
    /// # Errors
    /// Returns `InvalidInput` for empty credentials, `Auth` when registration
    /// or the profile insert fails.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        validate_credentials(email, password)?;

        let pass = self.begin_pass();
        let before = self.current_state();
        self.publish(pass, AuthState { loading: true, ..before.clone() });

        let response = match self.provider.sign_up(email, password, &self.sign_up_redirect).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "sign-up rejected by identity provider");
                self.publish(pass, AuthState { loading: false, ..before });
                return Err(auth_error(&err));
            }
        };

        if let Some(user) = &response.user {
            if let Err(err) = self.profiles.insert(Profile::empty(user.id.clone())).await {
                error!(error = %err, user_id = %user.id, "profile insert failed during sign-up");
                self.publish(pass, AuthState { loading: false, ..before });
                return Err(auth_error(&err));
            }
            info!(user_id = %user.id, "created blank profile for new principal");
        }

        let requires_email_confirmation = response.session.is_none();
        self.publish(pass, AuthState { loading: false, ..before });
        Ok(SignUpOutcome { requires_email_confirmation })
    }

    /// Sign out the current principal
    ///
    /// On failure the prior session/user remain untouched with
    /// `loading: false` and the error propagates; a failed sign-out must not
    /// silently appear to have logged the user out.
    ///
    /// # Errors
    /// Returns `Auth` when the provider rejects the sign-out.
    pub async fn sign_out(&self) -> Result<()> {
        let pass = self.begin_pass();
        let before = self.current_state();
        self.publish(pass, AuthState { loading: true, ..before.clone() });

        if let Err(err) = self.provider.sign_out().await {
            warn!(error = %err, "sign-out rejected by identity provider");
            self.publish(pass, AuthState { loading: false, ..before });
            return Err(auth_error(&err));
        }

        info!("sign-out complete");
        self.publish(pass, AuthState::signed_out());
        Ok(())
    }

    /// Initialization pass: restore the persisted session and publish
    async fn initialize(&self) {
        let pass = self.begin_pass();

        let state = match self.provider.current_session().await {
            Ok(session) => self.resolve(session).await,
            Err(err) => {
                error!(error = %err, "failed to restore session at activation");
                AuthState::signed_out()
            }
        };

        self.publish(pass, state);
    }

    /// Listener task: re-run resolution for every change notification
    async fn listen(&self, mut events: broadcast::Receiver<AuthChange>) {
        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => {
                    debug!("scope deactivated, stopping auth change listener");
                    break;
                }
                event = events.recv() => match event {
                    Ok(change) => self.on_auth_change(change).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "auth change listener lagged, notifications dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("auth change channel closed, stopping listener");
                        break;
                    }
                },
            }
        }
    }

    /// Handle one change notification from the identity provider
    async fn on_auth_change(&self, change: AuthChange) {
        if self.shutdown.is_cancelled() {
            return;
        }

        debug!(
            event = ?change.event,
            user_id = change.session.as_ref().map(|s| s.user.id.as_str()),
            "auth state changed"
        );

        let pass = self.begin_pass();
        let state = self.resolve(change.session).await;
        self.publish(pass, state);
    }

    /// Resolve a session into a full auth state, fail-closed
    ///
    /// A session whose profile cannot be fetched is treated as not
    /// authenticated.
    async fn resolve(&self, session: Option<Session>) -> AuthState {
        let Some(session) = session else {
            return AuthState::signed_out();
        };

        match self.profiles.fetch_by_id(&session.user.id).await {
            Ok(Some(profile)) => AuthState::authenticated(session, profile),
            Ok(None) => {
                warn!(
                    user_id = %session.user.id,
                    "no profile for session principal, treating as signed out"
                );
                AuthState::signed_out()
            }
            Err(err) => {
                error!(error = %err, "profile fetch failed, treating as signed out");
                AuthState::signed_out()
            }
        }
    }

    /// Allocate the next pass number
    fn begin_pass(&self) -> u64 {
        self.pass_counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish a fully-resolved state, unless the scope is gone or a newer
    /// pass already published
    ///
    /// A pass may publish more than once (loading toggle plus final state);
    /// equal pass numbers are allowed through.
    fn publish(&self, pass: u64, state: AuthState) {
        if self.shutdown.is_cancelled() {
            debug!(pass, "scope deactivated, discarding publish");
            return;
        }

        let mut last = self.last_published.lock();
        if pass < *last {
            debug!(pass, last = *last, "discarding stale publish");
            return;
        }
        *last = pass;
        self.state_tx.send_replace(state);
    }
}

impl std::fmt::Debug for SessionSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSynchronizer")
            .field("sign_up_redirect", &self.sign_up_redirect)
            .field("deactivated", &self.shutdown.is_cancelled())
            .finish()
    }
}

/// Wrap a collaborator failure as the single `Auth` error kind exposed to
/// callers, keeping the original message
fn auth_error(err: &TimeLordsError) -> TimeLordsError {
    TimeLordsError::Auth(err.to_string())
}

fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(TimeLordsError::InvalidInput("email must not be empty".to_string()));
    }
    if password.is_empty() {
        return Err(TimeLordsError::InvalidInput("password must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::synchronizer helpers. Scenario coverage lives in
    //! the crate's integration tests.
    use super::*;

    /// Validates `auth_error` keeps the original collaborator message.
    ///
    /// Assertions:
    /// - Ensures the wrapped error is the `Auth` variant.
    /// - Ensures the provider message survives verbatim.
    #[test]
    fn test_auth_error_keeps_source_message() {
        let source = TimeLordsError::Provider("invalid login credentials".to_string());
        let wrapped = auth_error(&source);

        assert!(matches!(wrapped, TimeLordsError::Auth(_)));
        assert!(wrapped.to_string().contains("invalid login credentials"));
    }

    /// Validates `validate_credentials` rejects empty inputs.
    ///
    /// Assertions:
    /// - Ensures empty or whitespace email fails with `InvalidInput`.
    /// - Ensures empty password fails with `InvalidInput`.
    /// - Ensures non-empty credentials pass.
    #[test]
    fn test_validate_credentials() {
        assert!(matches!(
            validate_credentials("", "pw"),
            Err(TimeLordsError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_credentials("   ", "pw"),
            Err(TimeLordsError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_credentials("a@b.com", ""),
            Err(TimeLordsError::InvalidInput(_))
        ));
        assert!(validate_credentials("a@b.com", "pw").is_ok());
    }
}
