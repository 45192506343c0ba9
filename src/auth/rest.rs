// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! REST client for the identity provider (credential exchange, token
//! refresh, current-session tracking).

use crate::auth::provider::{
    IdentityCredential, IdentityProvider, ProviderUser, Session, TokenPair,
};
use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity provider client over the identity-toolkit and secure-token REST
/// endpoints.
///
/// Holds the current session across calls; sign-out clears it. No other
/// state is shared between calls.
#[derive(Clone)]
pub struct RestAuthClient {
    http: reqwest::Client,
    identity_endpoint: String,
    token_endpoint: String,
    api_key: String,
    current: Arc<RwLock<Option<Session>>>,
}

impl RestAuthClient {
    /// Create a new client from project configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::Http(format!("failed building auth HTTP client: {}", e)))?;

        Ok(Self {
            http,
            identity_endpoint: config.identity_endpoint(),
            token_endpoint: config.token_endpoint(),
            api_key: config.api_key.clone(),
            current: Arc::new(RwLock::new(None)),
        })
    }

    /// Clear the current session.
    pub async fn sign_out(&self) {
        if self.current.write().await.take().is_some() {
            tracing::info!("signed out");
        }
    }

    /// Store a session as current after a successful exchange.
    async fn remember(&self, session: &Session) {
        *self.current.write().await = Some(session.clone());
    }
}

#[async_trait]
impl IdentityProvider for RestAuthClient {
    async fn exchange_credential(&self, credential: &IdentityCredential) -> Result<Session> {
        let url = format!(
            "{}/accounts:signInWithIdp?key={}",
            self.identity_endpoint, self.api_key
        );

        let mut post_body = format!("id_token={}&providerId=google.com", credential.id_token);
        if let Some(access_token) = &credential.access_token {
            post_body.push_str(&format!("&access_token={}", access_token));
        }

        let body = serde_json::json!({
            "postBody": post_body,
            "requestUri": "http://localhost",
            "returnSecureToken": true,
            "returnIdpCredential": true,
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(format!("credential exchange request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = read_api_error(response).await;
            tracing::debug!(status = %status, message = %message, "credential exchange refused");
            return Err(Error::ProviderRejected(message));
        }

        let body: SignInWithIdpResponse = response
            .json()
            .await
            .map_err(|e| Error::Http(format!("malformed exchange response: {}", e)))?;

        let session = Session {
            user: ProviderUser {
                uid: body.local_id,
                email: body.email,
                display_name: body.display_name,
                refresh_token: body.refresh_token.clone(),
            },
            id_token: body.id_token,
            refresh_token: body.refresh_token,
        };

        self.remember(&session).await;
        Ok(session)
    }

    async fn refresh_id_token(&self, refresh_token: &str) -> Result<TokenPair> {
        let response = self
            .http
            .post(&self.token_endpoint)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                Error::RefreshFailed(anyhow::Error::new(e).context("refresh request failed"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::RefreshFailed(anyhow::anyhow!(
                "HTTP {}: {}",
                status,
                body
            )));
        }

        let body: RefreshResponse = response.json().await.map_err(|e| {
            Error::RefreshFailed(anyhow::Error::new(e).context("malformed refresh response"))
        })?;

        Ok(TokenPair {
            id_token: body.id_token,
            refresh_token: body.refresh_token,
        })
    }

    async fn current_user(&self) -> Result<Option<ProviderUser>> {
        Ok(self.current.read().await.as_ref().map(|s| s.user.clone()))
    }

    async fn force_token_refresh(&self, user: &ProviderUser) -> Result<String> {
        let refresh_token = user.refresh_token.as_deref().ok_or_else(|| {
            Error::RefreshFailed(anyhow::anyhow!("user session has no refresh token"))
        })?;

        let pair = self.refresh_id_token(refresh_token).await?;

        // Keep the held session in step with the rotated tokens.
        let mut current = self.current.write().await;
        if let Some(session) = current.as_mut() {
            if session.user.uid == user.uid {
                session.id_token = pair.id_token.clone();
                if let Some(rotated) = &pair.refresh_token {
                    session.refresh_token = Some(rotated.clone());
                    session.user.refresh_token = Some(rotated.clone());
                }
            }
        }

        Ok(pair.id_token)
    }
}

/// Extract the provider's error message from a non-2xx response body.
async fn read_api_error(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ApiErrorBody>().await {
        Ok(body) => body.error.message,
        Err(_) => format!("HTTP {}", status),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithIdpResponse {
    id_token: String,
    refresh_token: Option<String>,
    email: Option<String>,
    display_name: Option<String>,
    local_id: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}
