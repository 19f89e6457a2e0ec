//! # Time Lords Network Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for the identity provider and the
//!   profile store
//! - The session synchronizer service
//!
//! ## Architecture Principles
//! - Only depends on `timelords-domain` and async runtime plumbing
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod auth;

pub use auth::ports::{IdentityProvider, ProfileStore};
pub use auth::SessionSynchronizer;
