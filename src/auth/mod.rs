// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session component: sign-in, token refresh, profiles.

pub mod provider;
pub mod rest;
pub mod session;

pub use provider::{
    IdentityCredential, IdentityProvider, ProviderUser, Session, TokenPair, UserProfile,
};
pub use rest::RestAuthClient;
pub use session::{SessionService, DEFAULT_SIGN_IN_TRIES};
