//! Record store adapters over the backend's REST interface

pub mod profiles;

use async_trait::async_trait;

pub use profiles::PostgrestProfileStore;

/// Trait for providing the bearer token used on record store requests
///
/// Allows dependency injection and testing with fixed tokens. Implemented by
/// the identity provider client, which exposes the current session's access
/// token when one exists.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    /// Current access token, or `None` when no session is persisted
    async fn access_token(&self) -> Option<String>;
}
