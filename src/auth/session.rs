// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in with bounded refresh retries, and profile derivation.
//!
//! Handles:
//! - Credential exchange against the identity provider
//! - Refreshing an expired id token and retrying, up to a budget
//! - Profile loading with a non-fatal freshness refresh

use crate::auth::provider::{
    IdentityCredential, IdentityProvider, ProviderUser, Session, TokenPair, UserProfile,
};
use crate::error::{Error, Result};

/// Refresh retry budget applied when the caller has no opinion.
pub const DEFAULT_SIGN_IN_TRIES: u32 = 1;

/// One iteration of the sign-in state machine.
///
/// A rejected exchange refreshes the id token and tries again while budget
/// remains; each loop iteration consumes one of these values and produces
/// the next, so the machine never grows the call stack.
#[derive(Debug, Clone)]
enum SignInStep {
    /// A usable id token is in hand; exchange it for a session.
    Attempting {
        id_token: String,
        refresh_token: Option<String>,
        tries_remaining: u32,
    },
    /// No usable id token; obtain one from the refresh endpoint first.
    Refreshing {
        refresh_token: String,
        tries_remaining: u32,
    },
}

impl SignInStep {
    /// Entry transition.
    ///
    /// Neither token present is invalid input. An id token goes straight to
    /// an exchange attempt; a lone refresh token bootstraps through the
    /// refresh endpoint, which does not count against the retry budget.
    fn entry(
        id_token: Option<String>,
        refresh_token: Option<String>,
        max_tries: u32,
    ) -> Result<Self> {
        match (id_token, refresh_token) {
            (Some(id_token), refresh_token) => Ok(SignInStep::Attempting {
                id_token,
                refresh_token,
                tries_remaining: max_tries,
            }),
            (None, Some(refresh_token)) => Ok(SignInStep::Refreshing {
                refresh_token,
                tries_remaining: max_tries,
            }),
            (None, None) => Err(Error::InvalidInput),
        }
    }
}

/// Session management over an identity provider.
#[derive(Clone)]
pub struct SessionService<P> {
    provider: P,
}

impl<P: IdentityProvider> SessionService<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The underlying provider client.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Exchange a raw provider credential for a session, without the retry
    /// machinery.
    pub async fn exchange_credential(&self, credential: &IdentityCredential) -> Result<Session> {
        self.provider.exchange_credential(credential).await
    }

    /// Sign in with an id token and/or refresh token.
    ///
    /// Performs at most `max_tries` rejection-triggered refresh round-trips
    /// and at most `max_tries + 1` credential exchanges. When an exchange is
    /// refused and budget remains, the id token is refreshed and the
    /// exchange retried; the refreshed refresh token replaces the old one
    /// when the endpoint rotates it. Exhausting the budget fails with
    /// [`Error::SignInExhausted`] carrying the last exchange error.
    pub async fn sign_in(
        &self,
        id_token: Option<String>,
        refresh_token: Option<String>,
        max_tries: u32,
    ) -> Result<Session> {
        let mut step = SignInStep::entry(id_token, refresh_token, max_tries)?;

        loop {
            step = match step {
                SignInStep::Attempting {
                    id_token,
                    refresh_token,
                    tries_remaining,
                } => {
                    let credential = IdentityCredential::from_id_token(id_token);
                    match self.provider.exchange_credential(&credential).await {
                        Ok(session) => return Ok(session),
                        Err(err) => match refresh_token {
                            Some(refresh_token) if tries_remaining > 0 => {
                                tracing::debug!(
                                    error = %err,
                                    tries_remaining,
                                    "credential exchange failed, refreshing id token"
                                );
                                SignInStep::Refreshing {
                                    refresh_token,
                                    tries_remaining: tries_remaining - 1,
                                }
                            }
                            _ => return Err(Error::SignInExhausted(Box::new(err))),
                        },
                    }
                }
                SignInStep::Refreshing {
                    refresh_token,
                    tries_remaining,
                } => {
                    let pair = self.provider.refresh_id_token(&refresh_token).await?;
                    SignInStep::Attempting {
                        id_token: pair.id_token,
                        // Keep the previous refresh token unless the endpoint
                        // rotated it.
                        refresh_token: Some(pair.refresh_token.unwrap_or(refresh_token)),
                        tries_remaining,
                    }
                }
            };
        }
    }

    /// Sign in and return the derived user profile.
    ///
    /// The exchange may succeed and the call still fail: a profile missing
    /// an email or display name is refused as incomplete.
    pub async fn sign_in_user(
        &self,
        id_token: Option<String>,
        refresh_token: Option<String>,
        max_tries: u32,
    ) -> Result<UserProfile> {
        let session = self.sign_in(id_token, refresh_token, max_tries).await?;
        let profile = profile_from_session(&session);

        if profile.email.is_empty() {
            return Err(Error::IncompleteProfile("missing email"));
        }
        if profile.name.is_empty() {
            return Err(Error::IncompleteProfile("missing display name"));
        }

        Ok(profile)
    }

    /// One refresh round-trip against the provider's token endpoint.
    pub async fn refresh_id_token(&self, refresh_token: &str) -> Result<TokenPair> {
        self.provider.refresh_id_token(refresh_token).await
    }

    /// Derive a profile from a session user, forcing a token refresh so the
    /// returned id token is fresh.
    ///
    /// An absent user is not an error here; the profile is simply absent. A
    /// failed freshness refresh does not fail the call either: it is
    /// surfaced by the returned profile lacking an id token.
    pub async fn load_profile(&self, user: Option<&ProviderUser>) -> Result<Option<UserProfile>> {
        let Some(user) = user else {
            return Ok(None);
        };

        let id_token = match self.provider.force_token_refresh(user).await {
            Ok(token) => Some(token),
            Err(err) => {
                tracing::warn!(
                    uid = %user.uid,
                    error = %err,
                    "token freshening failed, returning profile without id token"
                );
                None
            }
        };

        Ok(Some(UserProfile {
            uid: user.uid.clone(),
            email: user.email.clone().unwrap_or_default(),
            name: user.display_name.clone().unwrap_or_default(),
            id_token,
            refresh_token: user.refresh_token.clone(),
        }))
    }
}

fn profile_from_session(session: &Session) -> UserProfile {
    UserProfile {
        uid: session.user.uid.clone(),
        email: session.user.email.clone().unwrap_or_default(),
        name: session.user.display_name.clone().unwrap_or_default(),
        id_token: Some(session.id_token.clone()),
        refresh_token: session.refresh_token.clone(),
    }
}
