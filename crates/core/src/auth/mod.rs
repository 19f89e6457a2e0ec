//! Session and identity synchronization
//!
//! The synchronizer keeps a single authoritative [`AuthState`] consistent
//! across page-load initialization, externally-delivered auth-state change
//! notifications, imperative sign-in/sign-up/sign-out actions, and scope
//! teardown.
//!
//! ```text
//! ┌──────────────────────┐
//! │ SessionSynchronizer  │  owns AuthState (watch channel)
//! └─────────┬────────────┘
//!           ├──► IdentityProvider   (sessions + change notifications)
//!           └──► ProfileStore       (profile record per principal)
//! ```
//!
//! [`AuthState`]: timelords_domain::AuthState

pub mod ports;
pub mod synchronizer;

pub use ports::{IdentityProvider, ProfileStore};
pub use synchronizer::SessionSynchronizer;
