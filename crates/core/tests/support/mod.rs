//! Programmable port mocks for session synchronizer tests

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use timelords_core::{IdentityProvider, ProfileStore};
use timelords_domain::{
    AuthChange, AuthUser, Profile, Result, Session, SignUpResponse, TimeLordsError,
};
use tokio::sync::broadcast;

/// Build a test session for the given principal id
pub fn session_for(id: &str) -> Session {
    let user = AuthUser {
        id: id.to_string(),
        email: Some(format!("{id}@example.com")),
        email_confirmed_at: None,
        created_at: None,
    };
    Session::new(format!("access-{id}"), Some(format!("refresh-{id}")), 3600, user)
}

/// Build a test profile for the given principal id
pub fn profile_for(id: &str, full_name: &str) -> Profile {
    Profile { full_name: full_name.to_string(), ..Profile::empty(id) }
}

/// In-memory identity provider with programmable results
///
/// Results are cloned out on each call; tests reconfigure them between
/// operations. `emit` delivers a change notification to every subscriber.
pub struct MockIdentityProvider {
    current_session: Mutex<Result<Option<Session>>>,
    current_session_delay: Mutex<Option<Duration>>,
    sign_in_result: Mutex<Result<Session>>,
    sign_up_result: Mutex<Result<SignUpResponse>>,
    sign_out_result: Mutex<Result<()>>,
    events: broadcast::Sender<AuthChange>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            current_session: Mutex::new(Ok(None)),
            current_session_delay: Mutex::new(None),
            sign_in_result: Mutex::new(Err(TimeLordsError::Provider(
                "sign-in not configured".to_string(),
            ))),
            sign_up_result: Mutex::new(Err(TimeLordsError::Provider(
                "sign-up not configured".to_string(),
            ))),
            sign_out_result: Mutex::new(Ok(())),
            events,
        }
    }

    pub fn set_current_session(&self, result: Result<Option<Session>>) {
        *self.current_session.lock().unwrap() = result;
    }

    /// Delay `current_session` responses to simulate a slow activation pass
    pub fn set_current_session_delay(&self, delay: Duration) {
        *self.current_session_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_sign_in(&self, result: Result<Session>) {
        *self.sign_in_result.lock().unwrap() = result;
    }

    pub fn set_sign_up(&self, result: Result<SignUpResponse>) {
        *self.sign_up_result.lock().unwrap() = result;
    }

    pub fn set_sign_out(&self, result: Result<()>) {
        *self.sign_out_result.lock().unwrap() = result;
    }

    /// Deliver a change notification to all subscribers
    pub fn emit(&self, change: AuthChange) {
        // No subscribers left is fine (e.g. after deactivation)
        let _ = self.events.send(change);
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn current_session(&self) -> Result<Option<Session>> {
        let delay = *self.current_session_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.current_session.lock().unwrap().clone()
    }

    async fn sign_in_with_password(&self, _email: &str, _password: &str) -> Result<Session> {
        self.sign_in_result.lock().unwrap().clone()
    }

    async fn sign_up(
        &self,
        _email: &str,
        _password: &str,
        _redirect_to: &str,
    ) -> Result<SignUpResponse> {
        self.sign_up_result.lock().unwrap().clone()
    }

    async fn sign_out(&self) -> Result<()> {
        self.sign_out_result.lock().unwrap().clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }
}

/// In-memory profile store with programmable failures
pub struct MockProfileStore {
    profiles: Mutex<HashMap<String, Profile>>,
    fetch_error: Mutex<Option<TimeLordsError>>,
    insert_error: Mutex<Option<TimeLordsError>>,
    inserted: Mutex<Vec<Profile>>,
}

impl MockProfileStore {
    pub fn new() -> Self {
        Self {
            profiles: Mutex::new(HashMap::new()),
            fetch_error: Mutex::new(None),
            insert_error: Mutex::new(None),
            inserted: Mutex::new(Vec::new()),
        }
    }

    pub fn put(&self, profile: Profile) {
        self.profiles.lock().unwrap().insert(profile.id.clone(), profile);
    }

    pub fn set_fetch_error(&self, error: Option<TimeLordsError>) {
        *self.fetch_error.lock().unwrap() = error;
    }

    pub fn set_insert_error(&self, error: Option<TimeLordsError>) {
        *self.insert_error.lock().unwrap() = error;
    }

    /// Rows that went through `insert`, in order
    pub fn inserted(&self) -> Vec<Profile> {
        self.inserted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProfileStore for MockProfileStore {
    async fn fetch_by_id(&self, id: &str) -> Result<Option<Profile>> {
        if let Some(err) = self.fetch_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.profiles.lock().unwrap().get(id).cloned())
    }

    async fn insert(&self, profile: Profile) -> Result<()> {
        if let Some(err) = self.insert_error.lock().unwrap().clone() {
            return Err(err);
        }
        let mut profiles = self.profiles.lock().unwrap();
        if profiles.contains_key(&profile.id) {
            return Err(TimeLordsError::Store(format!(
                "duplicate key value violates unique constraint: profiles.id = {}",
                profile.id
            )));
        }
        profiles.insert(profile.id.clone(), profile.clone());
        self.inserted.lock().unwrap().push(profile);
        Ok(())
    }
}
