//! Client configuration loaded from environment variables.
//!
//! Endpoints for the three backend services are derived from the project
//! settings; emulator hosts, when set, reroute them to local emulators.

use std::env;

/// Backend project configuration, loaded once at client construction.
#[derive(Debug, Clone)]
pub struct Config {
    /// Web API key used by the identity provider endpoints
    pub api_key: String,
    /// GCP project ID
    pub project_id: String,
    /// Blob storage bucket name
    pub storage_bucket: String,
    /// Identity provider emulator host (host:port), if any
    pub auth_emulator_host: Option<String>,
    /// Blob storage emulator host (host:port), if any
    pub storage_emulator_host: Option<String>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            api_key: "test-api-key".to_string(),
            project_id: "test-project".to_string(),
            storage_bucket: "test-project.appspot.com".to_string(),
            auth_emulator_host: None,
            storage_emulator_host: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Emulator hosts follow the standard Firebase variable names, so a
    /// locally running emulator suite is picked up without extra wiring.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let project_id =
            env::var("FIREBASE_PROJECT_ID").map_err(|_| ConfigError::Missing("FIREBASE_PROJECT_ID"))?;

        Ok(Self {
            api_key: env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            storage_bucket: env::var("FIREBASE_STORAGE_BUCKET")
                .unwrap_or_else(|_| format!("{}.appspot.com", project_id)),
            auth_emulator_host: env::var("FIREBASE_AUTH_EMULATOR_HOST").ok(),
            storage_emulator_host: env::var("FIREBASE_STORAGE_EMULATOR_HOST").ok(),
            project_id,
        })
    }

    /// Base URL of the identity-toolkit endpoints (credential exchange,
    /// account lookup).
    pub fn identity_endpoint(&self) -> String {
        match &self.auth_emulator_host {
            Some(host) => format!("http://{}/identitytoolkit.googleapis.com/v1", host),
            None => "https://identitytoolkit.googleapis.com/v1".to_string(),
        }
    }

    /// URL of the secure-token refresh endpoint.
    pub fn token_endpoint(&self) -> String {
        match &self.auth_emulator_host {
            Some(host) => format!("http://{}/securetoken.googleapis.com/v1/token", host),
            None => "https://securetoken.googleapis.com/v1/token".to_string(),
        }
    }

    /// Base URL of the blob storage REST API.
    pub fn storage_endpoint(&self) -> String {
        match &self.storage_emulator_host {
            Some(host) => format!("http://{}/v0", host),
            None => "https://firebasestorage.googleapis.com/v0".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
