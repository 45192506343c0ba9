// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Storage REST client.
//!
//! Handles:
//! - Object upload and download
//! - Listing a prefix's immediate children (objects and sub-prefixes)
//! - Object deletion

use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::{BlobStore, Listing, StorageNode};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Blob store client over the Firebase Storage REST API.
#[derive(Clone)]
pub struct FirebaseStorageClient {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
    /// Identity token for authenticated buckets, if any.
    id_token: Option<String>,
}

impl FirebaseStorageClient {
    /// Create a new client from project configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::Http(format!("failed building storage HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.storage_endpoint(),
            bucket: config.storage_bucket.clone(),
            id_token: None,
        })
    }

    /// Authenticate subsequent requests with an identity token.
    pub fn with_id_token(mut self, id_token: impl Into<String>) -> Self {
        self.id_token = Some(id_token.into());
        self
    }

    fn object_url(&self, object_path: &str) -> String {
        format!(
            "{}/b/{}/o/{}",
            self.base_url,
            self.bucket,
            urlencoding::encode(object_path)
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.id_token {
            Some(token) => request.header("Authorization", format!("Firebase {}", token)),
            None => request,
        }
    }

    /// Upload an object, returning its node.
    pub async fn upload(&self, object_path: &str, bytes: Vec<u8>) -> Result<StorageNode> {
        let url = format!(
            "{}/b/{}/o?uploadType=media&name={}",
            self.base_url,
            self.bucket,
            urlencoding::encode(object_path)
        );

        let response = self
            .authorize(self.http.post(&url))
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| Error::Http(format!("upload request failed: {}", e)))?;

        check_status(response, object_path).await?;
        tracing::debug!(path = %object_path, "uploaded object");

        Ok(StorageNode::from_path(object_path))
    }

    /// Download an object's content.
    pub async fn download(&self, object_path: &str) -> Result<Vec<u8>> {
        let url = format!("{}?alt=media", self.object_url(object_path));

        let response = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .map_err(|e| Error::Http(format!("download request failed: {}", e)))?;

        let response = check_status(response, object_path).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Http(format!("download body failed: {}", e)))?;

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl BlobStore for FirebaseStorageClient {
    async fn list(&self, prefix: &str) -> Result<Listing> {
        let url = format!("{}/b/{}/o", self.base_url, self.bucket);

        // The service only recognizes folder boundaries with an explicit
        // delimiter; a non-empty prefix must end with one.
        let prefix = match prefix.trim_end_matches('/') {
            "" => String::new(),
            trimmed => format!("{}/", trimmed),
        };

        let response = self
            .authorize(self.http.get(&url))
            .query(&[("prefix", prefix.as_str()), ("delimiter", "/")])
            .send()
            .await
            .map_err(|e| Error::Http(format!("list request failed: {}", e)))?;

        let response = check_status(response, &prefix).await?;

        let body: ListResponse = response
            .json()
            .await
            .map_err(|e| Error::Http(format!("malformed list response: {}", e)))?;

        Ok(Listing {
            objects: body
                .items
                .into_iter()
                .map(|item| StorageNode::from_path(item.name))
                .collect(),
            sub_prefixes: body
                .prefixes
                .into_iter()
                .map(|p| StorageNode::from_path(p.trim_end_matches('/')))
                .collect(),
        })
    }

    async fn delete(&self, object_path: &str) -> Result<()> {
        // Folders are synthetic; a trailing slash can only name a prefix.
        if object_path.ends_with('/') {
            return Err(Error::CannotDeletePrefix(object_path.to_string()));
        }

        let response = self
            .authorize(self.http.delete(self.object_url(object_path)))
            .send()
            .await
            .map_err(|e| Error::Http(format!("delete request failed: {}", e)))?;

        check_status(response, object_path).await?;
        tracing::debug!(path = %object_path, "deleted object");
        Ok(())
    }
}

/// Check response status, mapping 404 to the object-not-found variant.
async fn check_status(response: reqwest::Response, path: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(Error::ObjectNotFound(path.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    Err(Error::Http(format!("HTTP {}: {}", status, body)))
}

#[derive(Debug, Deserialize, Default)]
struct ListResponse {
    #[serde(default)]
    items: Vec<ListItem>,
    #[serde(default)]
    prefixes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ListItem {
    name: String,
}
