//! Identity provider adapter
//!
//! HTTP client for the hosted auth API. Implements the `IdentityProvider`
//! port and broadcasts auth-change notifications to subscribers.

pub mod client;

pub use client::GoTrueClient;
