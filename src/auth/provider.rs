//! Identity provider interface and session types.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// An opaque provider credential to exchange for a session.
#[derive(Debug, Clone)]
pub struct IdentityCredential {
    /// Short-lived identity token issued by the upstream provider
    pub id_token: String,
    /// OAuth access token, carried by one provider path alongside the id token
    pub access_token: Option<String>,
}

impl IdentityCredential {
    /// Credential from a bare identity token.
    pub fn from_id_token(id_token: impl Into<String>) -> Self {
        Self {
            id_token: id_token.into(),
            access_token: None,
        }
    }
}

/// User object carried by an active provider session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderUser {
    /// Provider-assigned user id
    pub uid: String,
    /// Email address (may be absent if not shared)
    pub email: Option<String>,
    /// Display name
    pub display_name: Option<String>,
    /// Long-lived refresh token bound to this user's session
    pub refresh_token: Option<String>,
}

/// A signed-in session returned by the identity provider.
#[derive(Debug, Clone)]
pub struct Session {
    /// The signed-in user
    pub user: ProviderUser,
    /// Short-lived identity token for backend calls
    pub id_token: String,
    /// Long-lived refresh token, when the provider issued one
    pub refresh_token: Option<String>,
}

/// Fresh token pair returned by the refresh endpoint.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub id_token: String,
    /// Rotated refresh token; absent when the endpoint kept the old one valid
    pub refresh_token: Option<String>,
}

/// Read-only profile derived from a session, returned to callers by value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub name: String,
    /// Fresh identity token; absent when the freshness refresh failed
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// The identity provider collaborator.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an opaque identity credential for a session.
    ///
    /// Fails with [`Error::ProviderRejected`](crate::Error::ProviderRejected)
    /// when the provider refuses the token (expired, malformed, revoked).
    async fn exchange_credential(&self, credential: &IdentityCredential) -> Result<Session>;

    /// One round-trip to the provider's token-refresh endpoint.
    async fn refresh_id_token(&self, refresh_token: &str) -> Result<TokenPair>;

    /// The currently signed-in user, if any.
    async fn current_user(&self) -> Result<Option<ProviderUser>>;

    /// Obtain a guaranteed-fresh identity token for the given user.
    async fn force_token_refresh(&self, user: &ProviderUser) -> Result<String>;
}
