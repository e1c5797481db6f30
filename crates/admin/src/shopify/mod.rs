//! Shopify Admin REST client for the Script Tags resource.
//!
//! # API Reference
//!
//! - Base URL: `https://{shop_domain}/admin/api/{version}`
//! - Authentication: `X-Shopify-Access-Token` header
//! - Endpoints:
//!   - `POST   /script_tags.json` - create
//!   - `GET    /script_tags.json` - list
//!   - `PUT    /script_tags/{id}.json` - update
//!   - `DELETE /script_tags/{id}.json` - delete
//!
//! The transport is a trait so the sync layer can be exercised against a
//! fake; [`RestScriptTagTransport`] is the real reqwest-backed
//! implementation. Credentials are passed per call because they live in the
//! database and can be replaced at runtime.

pub mod types;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::instrument;

use tagsmith_core::RemoteScriptTagId;

use crate::models::ShopifyCredentials;

pub use types::{ScriptTag, ScriptTagPayload, display_scope_for};

use types::{ScriptTagEnvelope, ScriptTagListEnvelope, ScriptTagRequest};

/// Auth header carried on every request.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Errors that can occur when talking to the Script Tag API.
///
/// Error messages never contain credential material; the shop domain is the
/// only request detail that may appear.
#[derive(Debug, Error)]
pub enum SyncError {
    /// HTTP request failed (includes timeouts).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("Shopify API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limited by Shopify.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The remote script tag does not exist.
    #[error("remote script tag not found")]
    NotFound,

    /// Credentials were rejected by Shopify.
    #[error("unauthorized: Shopify rejected the configured credentials")]
    Unauthorized,

    /// Failed to parse a response body.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Capability interface over the Script Tag API.
#[async_trait]
pub trait ScriptTagTransport: Send + Sync {
    /// Create a remote script tag.
    async fn create(
        &self,
        credentials: &ShopifyCredentials,
        payload: &ScriptTagPayload,
    ) -> Result<ScriptTag, SyncError>;

    /// List all remote script tags.
    async fn list(&self, credentials: &ShopifyCredentials) -> Result<Vec<ScriptTag>, SyncError>;

    /// Update an existing remote script tag.
    async fn update(
        &self,
        credentials: &ShopifyCredentials,
        id: RemoteScriptTagId,
        payload: &ScriptTagPayload,
    ) -> Result<ScriptTag, SyncError>;

    /// Delete a remote script tag.
    async fn delete(
        &self,
        credentials: &ShopifyCredentials,
        id: RemoteScriptTagId,
    ) -> Result<(), SyncError>;
}

/// reqwest-backed [`ScriptTagTransport`].
#[derive(Clone)]
pub struct RestScriptTagTransport {
    inner: Arc<TransportInner>,
}

struct TransportInner {
    client: reqwest::Client,
    api_version: String,
}

impl std::fmt::Debug for RestScriptTagTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestScriptTagTransport")
            .field("api_version", &self.inner.api_version)
            .finish_non_exhaustive()
    }
}

impl RestScriptTagTransport {
    /// Create a new transport.
    ///
    /// `timeout` bounds every remote call; an elapsed timeout surfaces as
    /// [`SyncError::Http`].
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(api_version: impl Into<String>, timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(TransportInner {
                client,
                api_version: api_version.into(),
            }),
        })
    }

    fn collection_url(&self, credentials: &ShopifyCredentials) -> String {
        format!(
            "https://{}/admin/api/{}/script_tags.json",
            credentials.shop_domain, self.inner.api_version
        )
    }

    fn member_url(&self, credentials: &ShopifyCredentials, id: RemoteScriptTagId) -> String {
        format!(
            "https://{}/admin/api/{}/script_tags/{}.json",
            credentials.shop_domain, self.inner.api_version, id
        )
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, SyncError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| SyncError::Parse(format!("failed to parse response: {e}")));
        }

        Err(Self::parse_error(response).await)
    }

    /// Parse an error response.
    async fn parse_error(response: reqwest::Response) -> SyncError {
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return SyncError::RateLimited(retry_after);
        }

        if status == 401 || status == 403 {
            return SyncError::Unauthorized;
        }

        if status == 404 {
            return SyncError::NotFound;
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());

        SyncError::Api { status, message }
    }
}

#[async_trait]
impl ScriptTagTransport for RestScriptTagTransport {
    #[instrument(skip_all, fields(shop = %credentials.shop_domain))]
    async fn create(
        &self,
        credentials: &ShopifyCredentials,
        payload: &ScriptTagPayload,
    ) -> Result<ScriptTag, SyncError> {
        let response = self
            .inner
            .client
            .post(self.collection_url(credentials))
            .header(ACCESS_TOKEN_HEADER, credentials.access_token())
            .json(&ScriptTagRequest {
                script_tag: payload,
            })
            .send()
            .await?;

        let envelope: ScriptTagEnvelope = self.handle_response(response).await?;
        Ok(envelope.script_tag)
    }

    #[instrument(skip_all, fields(shop = %credentials.shop_domain))]
    async fn list(&self, credentials: &ShopifyCredentials) -> Result<Vec<ScriptTag>, SyncError> {
        let response = self
            .inner
            .client
            .get(self.collection_url(credentials))
            .header(ACCESS_TOKEN_HEADER, credentials.access_token())
            .send()
            .await?;

        let envelope: ScriptTagListEnvelope = self.handle_response(response).await?;
        Ok(envelope.script_tags)
    }

    #[instrument(skip_all, fields(shop = %credentials.shop_domain, remote_id = %id))]
    async fn update(
        &self,
        credentials: &ShopifyCredentials,
        id: RemoteScriptTagId,
        payload: &ScriptTagPayload,
    ) -> Result<ScriptTag, SyncError> {
        let response = self
            .inner
            .client
            .put(self.member_url(credentials, id))
            .header(ACCESS_TOKEN_HEADER, credentials.access_token())
            .json(&ScriptTagRequest {
                script_tag: payload,
            })
            .send()
            .await?;

        let envelope: ScriptTagEnvelope = self.handle_response(response).await?;
        Ok(envelope.script_tag)
    }

    #[instrument(skip_all, fields(shop = %credentials.shop_domain, remote_id = %id))]
    async fn delete(
        &self,
        credentials: &ShopifyCredentials,
        id: RemoteScriptTagId,
    ) -> Result<(), SyncError> {
        let response = self
            .inner
            .client
            .delete(self.member_url(credentials, id))
            .header(ACCESS_TOKEN_HEADER, credentials.access_token())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        Err(Self::parse_error(response).await)
    }
}
