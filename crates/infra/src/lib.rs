//! Infrastructure layer for the Time Lords Network session subsystem
//!
//! Concrete adapters behind the core ports:
//! - `auth`: identity provider client for the hosted auth API
//! - `rest`: profile store over the record store REST API
//! - `config`: backend connection settings

pub mod auth;
pub mod config;
pub mod rest;

pub use auth::GoTrueClient;
pub use config::BackendConfig;
pub use rest::{AccessTokenSource, PostgrestProfileStore};
