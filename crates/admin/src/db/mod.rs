//! Persistence for the admin service.
//!
//! # Tables
//!
//! - `scripts` - Script definitions and their remote sync state
//! - `shopify_credentials` - Single-row Shopify API credential set
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p tagsmith-cli -- migrate
//! ```
//!
//! # Store interfaces
//!
//! Handlers and services depend on the [`ScriptStore`] and
//! [`CredentialStore`] traits, not on a concrete backend. The service binary
//! wires in the PostgreSQL implementations; tests and ephemeral tooling use
//! the in-memory keyed-map implementations from [`memory`].

pub mod credentials;
pub mod memory;
pub mod scripts;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use tagsmith_core::{Placement, RemoteScriptTagId, ScriptId};

use crate::models::{NewScript, ScriptDefinition, ScriptPatch, ShopifyCredentials};

pub use credentials::PgCredentialStore;
pub use memory::{MemoryCredentialStore, MemoryScriptStore};
pub use scripts::PgScriptStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// The record changed since it was read (compare-and-swap mismatch).
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Durable store of script definitions, keyed by [`ScriptId`].
///
/// Every mutation is atomic per id and refreshes `updated_at`.
#[async_trait]
pub trait ScriptStore: Send + Sync {
    /// Insert a new definition with a generated id,
    /// `created_at == updated_at`, and `sync_status = unsynced`.
    async fn insert(&self, script: NewScript) -> Result<ScriptDefinition, RepositoryError>;

    /// Fetch a single definition.
    async fn get(&self, id: ScriptId) -> Result<ScriptDefinition, RepositoryError>;

    /// All definitions, newest-first, optionally filtered by placement.
    async fn list(
        &self,
        placement: Option<Placement>,
    ) -> Result<Vec<ScriptDefinition>, RepositoryError>;

    /// Merge the patch into an existing definition.
    ///
    /// When the patch carries `expected_updated_at` and the stored value no
    /// longer matches, fails with [`RepositoryError::Conflict`] and mutates
    /// nothing.
    async fn update(
        &self,
        id: ScriptId,
        patch: ScriptPatch,
    ) -> Result<ScriptDefinition, RepositoryError>;

    /// Remove a definition, returning the removed record.
    async fn delete(&self, id: ScriptId) -> Result<ScriptDefinition, RepositoryError>;

    /// Record a successful sync: the active flag and remote reference are
    /// persisted together, `sync_status` follows the remote reference
    /// (present = synced, absent = unsynced), and any previous sync error is
    /// cleared.
    async fn mark_synced(
        &self,
        id: ScriptId,
        active: bool,
        remote: Option<RemoteScriptTagId>,
    ) -> Result<ScriptDefinition, RepositoryError>;

    /// Record a failed push/remove: `sync_status = sync_pending` with the
    /// error message retained for display. Nothing else changes.
    async fn mark_sync_failed(
        &self,
        id: ScriptId,
        message: &str,
    ) -> Result<ScriptDefinition, RepositoryError>;

    /// Backend health check, used by the readiness endpoint.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Durable store of the Shopify credential set.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the configured credentials, if any.
    async fn load(&self) -> Result<Option<ShopifyCredentials>, RepositoryError>;

    /// Replace the credential set wholesale.
    async fn replace(&self, credentials: &ShopifyCredentials) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
