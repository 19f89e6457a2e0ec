//! # Time Lords Network Domain
//!
//! Pure domain types for the Time Lords Network client: the session
//! credential, the application profile record, the combined auth state
//! published to consumers, and the shared error type.
//!
//! ## Architecture Principles
//! - No async, no I/O, no infrastructure dependencies
//! - Types are plain data with serde support
//! - One application-wide error enum with a `Result` alias

pub mod errors;
pub mod types;

pub use errors::{Result, TimeLordsError};
pub use types::{
    AuthChange, AuthChangeEvent, AuthState, AuthUser, Profile, Session, SignUpOutcome,
    SignUpResponse,
};
