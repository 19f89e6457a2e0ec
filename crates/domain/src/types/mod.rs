//! Domain type definitions

pub mod auth;
pub mod profile;

pub use auth::{
    AuthChange, AuthChangeEvent, AuthState, AuthUser, Session, SignUpOutcome, SignUpResponse,
};
pub use profile::Profile;
