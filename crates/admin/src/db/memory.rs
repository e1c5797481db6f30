//! In-memory keyed-map stores.
//!
//! Same contracts as the PostgreSQL stores, with process lifetime. Used by
//! the test suites and by tooling that does not want a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;

use tagsmith_core::{Placement, RemoteScriptTagId, ScriptId, SyncStatus};

use super::{CredentialStore, RepositoryError, ScriptStore};
use crate::models::{NewScript, ScriptDefinition, ScriptPatch, ShopifyCredentials};

/// In-memory implementation of [`ScriptStore`].
#[derive(Debug, Default)]
pub struct MemoryScriptStore {
    scripts: RwLock<HashMap<i32, ScriptDefinition>>,
    next_id: AtomicI32,
}

impl MemoryScriptStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// A strictly advancing "now", so `updated_at > created_at` holds even on
/// coarse clocks.
fn advance(after: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > after {
        now
    } else {
        after + TimeDelta::microseconds(1)
    }
}

#[async_trait]
impl ScriptStore for MemoryScriptStore {
    async fn insert(&self, script: NewScript) -> Result<ScriptDefinition, RepositoryError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let now = Utc::now();
        let definition = ScriptDefinition {
            id: ScriptId::new(id),
            name: script.name,
            placement: script.placement,
            content: script.content,
            active: script.active,
            remote_script_tag_id: None,
            sync_status: SyncStatus::Unsynced,
            last_sync_error: None,
            created_at: now,
            updated_at: now,
        };
        self.scripts.write().await.insert(id, definition.clone());
        Ok(definition)
    }

    async fn get(&self, id: ScriptId) -> Result<ScriptDefinition, RepositoryError> {
        self.scripts
            .read()
            .await
            .get(&id.as_i32())
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list(
        &self,
        placement: Option<Placement>,
    ) -> Result<Vec<ScriptDefinition>, RepositoryError> {
        let scripts = self.scripts.read().await;
        let mut result: Vec<ScriptDefinition> = scripts
            .values()
            .filter(|s| placement.is_none_or(|p| s.placement == p))
            .cloned()
            .collect();
        // Newest-first, matching the SQL ordering
        result.sort_by(|a, b| (b.created_at, b.id.as_i32()).cmp(&(a.created_at, a.id.as_i32())));
        Ok(result)
    }

    async fn update(
        &self,
        id: ScriptId,
        patch: ScriptPatch,
    ) -> Result<ScriptDefinition, RepositoryError> {
        let mut scripts = self.scripts.write().await;
        let record = scripts
            .get_mut(&id.as_i32())
            .ok_or(RepositoryError::NotFound)?;

        if let Some(expected) = patch.expected_updated_at {
            if expected != record.updated_at {
                return Err(RepositoryError::Conflict(
                    "script was modified since it was loaded".to_string(),
                ));
            }
        }

        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(placement) = patch.placement {
            record.placement = placement;
        }
        if let Some(content) = patch.content {
            record.content = content;
        }
        record.updated_at = advance(record.updated_at);
        Ok(record.clone())
    }

    async fn delete(&self, id: ScriptId) -> Result<ScriptDefinition, RepositoryError> {
        self.scripts
            .write()
            .await
            .remove(&id.as_i32())
            .ok_or(RepositoryError::NotFound)
    }

    async fn mark_synced(
        &self,
        id: ScriptId,
        active: bool,
        remote: Option<RemoteScriptTagId>,
    ) -> Result<ScriptDefinition, RepositoryError> {
        let mut scripts = self.scripts.write().await;
        let record = scripts
            .get_mut(&id.as_i32())
            .ok_or(RepositoryError::NotFound)?;

        record.active = active;
        record.remote_script_tag_id = remote;
        record.sync_status = if remote.is_some() {
            SyncStatus::Synced
        } else {
            SyncStatus::Unsynced
        };
        record.last_sync_error = None;
        record.updated_at = advance(record.updated_at);
        Ok(record.clone())
    }

    async fn mark_sync_failed(
        &self,
        id: ScriptId,
        message: &str,
    ) -> Result<ScriptDefinition, RepositoryError> {
        let mut scripts = self.scripts.write().await;
        let record = scripts
            .get_mut(&id.as_i32())
            .ok_or(RepositoryError::NotFound)?;

        record.sync_status = SyncStatus::SyncPending;
        record.last_sync_error = Some(message.to_string());
        record.updated_at = advance(record.updated_at);
        Ok(record.clone())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// In-memory implementation of [`CredentialStore`].
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: RwLock<Option<ShopifyCredentials>>,
}

impl MemoryCredentialStore {
    /// Create an empty (unconfigured) store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<ShopifyCredentials>, RepositoryError> {
        Ok(self.credentials.read().await.clone())
    }

    async fn replace(&self, credentials: &ShopifyCredentials) -> Result<(), RepositoryError> {
        *self.credentials.write().await = Some(credentials.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn new_script(name: &str, placement: Placement) -> NewScript {
        NewScript {
            name: name.to_string(),
            placement,
            content: "<script>void 0;</script>".to_string(),
            active: false,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids_and_equal_timestamps() {
        let store = MemoryScriptStore::new();
        let a = store
            .insert(new_script("a", Placement::Checkout))
            .await
            .unwrap();
        let b = store
            .insert(new_script("b", Placement::Checkout))
            .await
            .unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.created_at, a.updated_at);
        assert_eq!(a.sync_status, SyncStatus::Unsynced);
    }

    #[tokio::test]
    async fn test_list_filters_by_placement_newest_first() {
        let store = MemoryScriptStore::new();
        store
            .insert(new_script("checkout", Placement::Checkout))
            .await
            .unwrap();
        let thanks = store
            .insert(new_script("thanks", Placement::ThankYouPage))
            .await
            .unwrap();

        let all = store.list(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.first().unwrap().created_at >= all.last().unwrap().created_at);

        let filtered = store.list(Some(Placement::ThankYouPage)).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.first().unwrap().id, thanks.id);
    }

    #[tokio::test]
    async fn test_update_cas_mismatch_conflicts_without_mutation() {
        let store = MemoryScriptStore::new();
        let script = store
            .insert(new_script("a", Placement::Checkout))
            .await
            .unwrap();

        let stale = ScriptPatch {
            name: Some("renamed".to_string()),
            expected_updated_at: Some(script.updated_at - TimeDelta::seconds(5)),
            ..ScriptPatch::default()
        };
        let err = store.update(script.id, stale).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(store.get(script.id).await.unwrap().name, "a");

        let fresh = ScriptPatch {
            name: Some("renamed".to_string()),
            expected_updated_at: Some(script.updated_at),
            ..ScriptPatch::default()
        };
        let updated = store.update(script.id, fresh).await.unwrap();
        assert_eq!(updated.name, "renamed");
        assert!(updated.updated_at > updated.created_at);
    }

    #[tokio::test]
    async fn test_mark_synced_tracks_remote_reference() {
        let store = MemoryScriptStore::new();
        let script = store
            .insert(new_script("a", Placement::Checkout))
            .await
            .unwrap();

        let synced = store
            .mark_synced(script.id, true, Some(RemoteScriptTagId::new(99)))
            .await
            .unwrap();
        assert_eq!(synced.sync_status, SyncStatus::Synced);
        assert!(synced.active);

        let failed = store.mark_sync_failed(script.id, "boom").await.unwrap();
        assert_eq!(failed.sync_status, SyncStatus::SyncPending);
        assert_eq!(failed.last_sync_error.as_deref(), Some("boom"));

        let unsynced = store.mark_synced(script.id, false, None).await.unwrap();
        assert_eq!(unsynced.sync_status, SyncStatus::Unsynced);
        assert!(unsynced.last_sync_error.is_none());
    }

    #[tokio::test]
    async fn test_credential_store_replace_wholesale() {
        let store = MemoryCredentialStore::new();
        assert!(store.load().await.unwrap().is_none());

        let creds = crate::models::credentials::tests::valid_input()
            .into_credentials()
            .unwrap();
        store.replace(&creds).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.shop_domain, "test-shop.myshopify.com");
    }
}
