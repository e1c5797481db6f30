//! Script definition operations: validation, storage, and sync
//! orchestration.
//!
//! Failure policy: sync failures during create/update/activate are fatal to
//! the caller and flag the record `sync_pending`; failures while deleting
//! are advisory (the local delete proceeds and the caller gets a warning).
//! Missing credentials abort before any local write, so a rejected
//! operation never leaves partial state.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, instrument, warn};

use tagsmith_core::{Placement, ScriptId};

use crate::db::{CredentialStore, RepositoryError, ScriptStore};
use crate::models::{DeleteOutcome, NewScript, ScriptDefinition, ScriptPatch, ShopifyCredentials};
use crate::shopify::{ScriptTag, SyncError};

use super::SyncClient;

/// Errors surfaced by script operations.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Bad user input; recoverable, shown inline.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Stale reference to a script that no longer exists.
    #[error("script {0} not found")]
    NotFound(ScriptId),

    /// The script changed since it was loaded (lost-update protection).
    #[error("script was modified since it was loaded")]
    EditConflict,

    /// No complete credential set is configured; directs the operator to
    /// settings.
    #[error("Shopify credentials are not configured")]
    NotConfigured,

    /// A remote call failed; recoverable with a manual retry.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The store itself failed.
    #[error("storage error: {0}")]
    Repository(RepositoryError),
}

/// Service owning the script definition lifecycle.
#[derive(Clone)]
pub struct ScriptService {
    store: Arc<dyn ScriptStore>,
    credentials: Arc<dyn CredentialStore>,
    sync: SyncClient,
}

impl std::fmt::Debug for ScriptService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptService")
            .field("sync", &self.sync)
            .finish_non_exhaustive()
    }
}

impl ScriptService {
    /// Create a new service over the given stores and sync client.
    #[must_use]
    pub fn new(
        store: Arc<dyn ScriptStore>,
        credentials: Arc<dyn CredentialStore>,
        sync: SyncClient,
    ) -> Self {
        Self {
            store,
            credentials,
            sync,
        }
    }

    /// Create a new script definition.
    ///
    /// An active definition is pushed to Shopify immediately; credentials
    /// are required up front and a failed push is returned as an error with
    /// the stored record flagged `sync_pending`.
    ///
    /// # Errors
    ///
    /// `Validation` on empty name/content, `NotConfigured` when active
    /// without credentials, `Sync` when the push fails.
    #[instrument(skip_all, fields(name = %input.name))]
    pub async fn create(&self, input: NewScript) -> Result<ScriptDefinition, ScriptError> {
        validate_required("name", &input.name)?;
        validate_required("content", &input.content)?;

        let credentials = if input.active {
            Some(self.require_credentials().await?)
        } else {
            None
        };

        let record = self
            .store
            .insert(input)
            .await
            .map_err(ScriptError::Repository)?;

        match credentials {
            Some(credentials) => self.push_and_record(&credentials, record).await,
            None => Ok(record),
        }
    }

    /// Fetch a single definition.
    ///
    /// # Errors
    ///
    /// `NotFound` if the id is unknown.
    pub async fn get(&self, id: ScriptId) -> Result<ScriptDefinition, ScriptError> {
        self.store.get(id).await.map_err(|e| for_script(id, e))
    }

    /// All definitions, newest-first, optionally filtered by placement.
    ///
    /// # Errors
    ///
    /// `Repository` if the store fails.
    pub async fn list(
        &self,
        placement: Option<Placement>,
    ) -> Result<Vec<ScriptDefinition>, ScriptError> {
        self.store
            .list(placement)
            .await
            .map_err(ScriptError::Repository)
    }

    /// Merge field changes into a definition.
    ///
    /// Active definitions are re-pushed so the remote tag picks up the new
    /// content reference; credentials are required up front in that case.
    ///
    /// # Errors
    ///
    /// `Validation` on empty fields or an empty patch, `NotFound`,
    /// `EditConflict` on a stale compare-and-swap token, `NotConfigured`,
    /// `Sync` when the push fails.
    #[instrument(skip_all, fields(script = %id))]
    pub async fn update(
        &self,
        id: ScriptId,
        patch: ScriptPatch,
    ) -> Result<ScriptDefinition, ScriptError> {
        if patch.is_empty() {
            return Err(ScriptError::Validation("no fields to update".to_string()));
        }
        if let Some(name) = &patch.name {
            validate_required("name", name)?;
        }
        if let Some(content) = &patch.content {
            validate_required("content", content)?;
        }

        let current = self.store.get(id).await.map_err(|e| for_script(id, e))?;
        let credentials = if current.active {
            Some(self.require_credentials().await?)
        } else {
            None
        };

        let updated = self
            .store
            .update(id, patch)
            .await
            .map_err(|e| for_script(id, e))?;

        match credentials {
            Some(credentials) => self.push_and_record(&credentials, updated).await,
            None => Ok(updated),
        }
    }

    /// Delete a definition.
    ///
    /// Removal of any associated remote tag is requested first; if it fails
    /// (or credentials are missing) the local record is still deleted and
    /// the failure comes back as an advisory warning.
    ///
    /// # Errors
    ///
    /// `NotFound` if the id is unknown.
    #[instrument(skip_all, fields(script = %id))]
    pub async fn delete(&self, id: ScriptId) -> Result<DeleteOutcome, ScriptError> {
        let record = self.store.get(id).await.map_err(|e| for_script(id, e))?;

        let mut warning = None;
        if let Some(remote_id) = record.remote_script_tag_id {
            match self
                .credentials
                .load()
                .await
                .map_err(ScriptError::Repository)?
            {
                None => {
                    warn!(
                        script = %id,
                        "deleting locally without credentials; remote script tag left in place"
                    );
                    warning = Some(
                        "Shopify credentials are not configured; the remote script tag was left in place"
                            .to_string(),
                    );
                }
                Some(credentials) => {
                    if let Err(err) = self.sync.remove(&credentials, remote_id).await {
                        warn!(
                            script = %id,
                            error = %err,
                            "remote script tag removal failed; deleting locally anyway"
                        );
                        warning = Some(format!(
                            "the remote script tag could not be removed: {err}"
                        ));
                    }
                }
            }
        }

        self.store.delete(id).await.map_err(|e| for_script(id, e))?;
        Ok(DeleteOutcome {
            deleted: id,
            warning,
        })
    }

    /// Toggle the active flag, pushing or pulling the remote tag to match.
    ///
    /// Credentials are checked before any mutation: with none configured the
    /// flag is left untouched. On push failure the flag is also left
    /// untouched and the record is flagged `sync_pending`.
    ///
    /// # Errors
    ///
    /// `NotFound`, `NotConfigured`, `Sync` when the push fails.
    #[instrument(skip_all, fields(script = %id, active))]
    pub async fn set_active(
        &self,
        id: ScriptId,
        active: bool,
    ) -> Result<ScriptDefinition, ScriptError> {
        let record = self.store.get(id).await.map_err(|e| for_script(id, e))?;
        let credentials = self.require_credentials().await?;

        let mut desired = record.clone();
        desired.active = active;

        match self.sync.push(&credentials, &desired).await {
            Ok(outcome) => self
                .store
                .mark_synced(id, active, outcome.remote_after(record.remote_script_tag_id))
                .await
                .map_err(|e| for_script(id, e)),
            Err(err) => Err(self.record_sync_failure(id, err).await),
        }
    }

    /// Fetch all remote script tags for visibility/audit.
    ///
    /// Read-only; the local store is never mutated from remote state.
    ///
    /// # Errors
    ///
    /// `NotConfigured` without credentials, `Sync` on remote failure.
    pub async fn pull_remote(&self) -> Result<Vec<ScriptTag>, ScriptError> {
        let credentials = self.require_credentials().await?;
        Ok(self.sync.pull(&credentials).await?)
    }

    async fn require_credentials(&self) -> Result<ShopifyCredentials, ScriptError> {
        self.credentials
            .load()
            .await
            .map_err(ScriptError::Repository)?
            .ok_or(ScriptError::NotConfigured)
    }

    /// Push a definition and persist the resulting sync state.
    async fn push_and_record(
        &self,
        credentials: &ShopifyCredentials,
        record: ScriptDefinition,
    ) -> Result<ScriptDefinition, ScriptError> {
        match self.sync.push(credentials, &record).await {
            Ok(outcome) => self
                .store
                .mark_synced(
                    record.id,
                    record.active,
                    outcome.remote_after(record.remote_script_tag_id),
                )
                .await
                .map_err(|e| for_script(record.id, e)),
            Err(err) => Err(self.record_sync_failure(record.id, err).await),
        }
    }

    /// Flag a record `sync_pending`, keeping the original sync error as the
    /// returned error even if the flagging itself fails.
    async fn record_sync_failure(&self, id: ScriptId, err: SyncError) -> ScriptError {
        if let Err(store_err) = self.store.mark_sync_failed(id, &err.to_string()).await {
            error!(
                script = %id,
                error = %store_err,
                "failed to record sync failure"
            );
        }
        ScriptError::Sync(err)
    }
}

/// Map a repository error into the script error taxonomy for one id.
fn for_script(id: ScriptId, err: RepositoryError) -> ScriptError {
    match err {
        RepositoryError::NotFound => ScriptError::NotFound(id),
        RepositoryError::Conflict(_) => ScriptError::EditConflict,
        other => ScriptError::Repository(other),
    }
}

fn validate_required(field: &str, value: &str) -> Result<(), ScriptError> {
    if value.trim().is_empty() {
        return Err(ScriptError::Validation(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;

    use crate::db::{MemoryCredentialStore, MemoryScriptStore};
    use crate::shopify::{ScriptTag, ScriptTagPayload, ScriptTagTransport};

    use tagsmith_core::RemoteScriptTagId;

    use super::*;

    /// Transport that must never be reached.
    struct UnreachableTransport;

    #[async_trait]
    impl ScriptTagTransport for UnreachableTransport {
        async fn create(
            &self,
            _credentials: &ShopifyCredentials,
            _payload: &ScriptTagPayload,
        ) -> Result<ScriptTag, SyncError> {
            panic!("transport should not be called");
        }

        async fn list(
            &self,
            _credentials: &ShopifyCredentials,
        ) -> Result<Vec<ScriptTag>, SyncError> {
            panic!("transport should not be called");
        }

        async fn update(
            &self,
            _credentials: &ShopifyCredentials,
            _id: RemoteScriptTagId,
            _payload: &ScriptTagPayload,
        ) -> Result<ScriptTag, SyncError> {
            panic!("transport should not be called");
        }

        async fn delete(
            &self,
            _credentials: &ShopifyCredentials,
            _id: RemoteScriptTagId,
        ) -> Result<(), SyncError> {
            panic!("transport should not be called");
        }
    }

    fn service() -> ScriptService {
        ScriptService::new(
            Arc::new(MemoryScriptStore::new()),
            Arc::new(MemoryCredentialStore::new()),
            SyncClient::new(Arc::new(UnreachableTransport), "https://tags.example.com"),
        )
    }

    fn new_script(active: bool) -> NewScript {
        NewScript {
            name: "GA4".to_string(),
            placement: Placement::ThankYouPage,
            content: "<script>void 0;</script>".to_string(),
            active,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name_and_content() {
        let service = service();

        let mut input = new_script(false);
        input.name = "  ".to_string();
        assert!(matches!(
            service.create(input).await.unwrap_err(),
            ScriptError::Validation(_)
        ));

        let mut input = new_script(false);
        input.content = String::new();
        assert!(matches!(
            service.create(input).await.unwrap_err(),
            ScriptError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_create_active_without_credentials_persists_nothing() {
        let service = service();
        let err = service.create(new_script(true)).await.unwrap_err();
        assert!(matches!(err, ScriptError::NotConfigured));
        assert!(service.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_inactive_skips_sync_entirely() {
        let service = service();
        let record = service.create(new_script(false)).await.unwrap();
        assert!(!record.active);
        assert!(record.remote_script_tag_id.is_none());
        assert_eq!(record.created_at, record.updated_at);
    }

    #[tokio::test]
    async fn test_update_rejects_empty_patch() {
        let service = service();
        let record = service.create(new_script(false)).await.unwrap();
        let err = service
            .update(record.id, ScriptPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ScriptError::Validation(_)));
    }

    #[tokio::test]
    async fn test_set_active_without_credentials_keeps_flag() {
        let service = service();
        let record = service.create(new_script(false)).await.unwrap();

        let err = service.set_active(record.id, true).await.unwrap_err();
        assert!(matches!(err, ScriptError::NotConfigured));
        assert!(!service.get(record.id).await.unwrap().active);
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_not_found() {
        let service = service();
        let err = service.get(ScriptId::new(404)).await.unwrap_err();
        assert!(matches!(err, ScriptError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_pull_without_credentials_is_not_configured() {
        let service = service();
        assert!(matches!(
            service.pull_remote().await.unwrap_err(),
            ScriptError::NotConfigured
        ));
    }
}
