//! PostgreSQL-backed script store.
//!
//! Queries use sqlx's runtime API with explicit row structs; the conversion
//! from row to domain model is where stored text enums are parsed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tagsmith_core::{Placement, RemoteScriptTagId, ScriptId, SyncStatus};

use super::{RepositoryError, ScriptStore};
use crate::models::{NewScript, ScriptDefinition, ScriptPatch};

/// Columns selected for every script query, in `ScriptRow` order.
const SCRIPT_COLUMNS: &str = "id, name, placement, content, active, remote_script_tag_id, \
     sync_status, last_sync_error, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for script queries.
#[derive(Debug, sqlx::FromRow)]
struct ScriptRow {
    id: i32,
    name: String,
    placement: String,
    content: String,
    active: bool,
    remote_script_tag_id: Option<i64>,
    sync_status: String,
    last_sync_error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ScriptRow> for ScriptDefinition {
    type Error = RepositoryError;

    fn try_from(row: ScriptRow) -> Result<Self, Self::Error> {
        let placement: Placement = row.placement.parse().map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "script {} has unknown placement {:?}",
                row.id, row.placement
            ))
        })?;
        let sync_status: SyncStatus = row.sync_status.parse().map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "script {} has unknown sync status {:?}",
                row.id, row.sync_status
            ))
        })?;

        Ok(Self {
            id: ScriptId::new(row.id),
            name: row.name,
            placement,
            content: row.content,
            active: row.active,
            remote_script_tag_id: row.remote_script_tag_id.map(RemoteScriptTagId::new),
            sync_status,
            last_sync_error: row.last_sync_error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Store
// =============================================================================

/// PostgreSQL implementation of [`ScriptStore`].
#[derive(Debug, Clone)]
pub struct PgScriptStore {
    pool: PgPool,
}

impl PgScriptStore {
    /// Create a new store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_required(&self, id: ScriptId) -> Result<ScriptDefinition, RepositoryError> {
        let sql = format!("SELECT {SCRIPT_COLUMNS} FROM scripts WHERE id = $1");
        let row = sqlx::query_as::<_, ScriptRow>(&sql)
            .bind(id.as_i32())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        row.try_into()
    }
}

#[async_trait]
impl ScriptStore for PgScriptStore {
    async fn insert(&self, script: NewScript) -> Result<ScriptDefinition, RepositoryError> {
        let sql = format!(
            "INSERT INTO scripts (name, placement, content, active) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {SCRIPT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ScriptRow>(&sql)
            .bind(script.name)
            .bind(script.placement.as_str())
            .bind(script.content)
            .bind(script.active)
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    async fn get(&self, id: ScriptId) -> Result<ScriptDefinition, RepositoryError> {
        self.fetch_required(id).await
    }

    async fn list(
        &self,
        placement: Option<Placement>,
    ) -> Result<Vec<ScriptDefinition>, RepositoryError> {
        let sql = format!(
            "SELECT {SCRIPT_COLUMNS} FROM scripts \
             WHERE $1::text IS NULL OR placement = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, ScriptRow>(&sql)
            .bind(placement.map(|p| p.as_str()))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(ScriptDefinition::try_from).collect()
    }

    async fn update(
        &self,
        id: ScriptId,
        patch: ScriptPatch,
    ) -> Result<ScriptDefinition, RepositoryError> {
        let sql = format!(
            "UPDATE scripts SET \
                 name = COALESCE($2, name), \
                 placement = COALESCE($3, placement), \
                 content = COALESCE($4, content), \
                 updated_at = NOW() \
             WHERE id = $1 AND ($5::timestamptz IS NULL OR updated_at = $5) \
             RETURNING {SCRIPT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ScriptRow>(&sql)
            .bind(id.as_i32())
            .bind(patch.name)
            .bind(patch.placement.map(|p| p.as_str().to_string()))
            .bind(patch.content)
            .bind(patch.expected_updated_at)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => row.try_into(),
            // Zero rows means either the id is unknown or the CAS token is
            // stale; a second lookup tells them apart.
            None => {
                self.fetch_required(id).await?;
                Err(RepositoryError::Conflict(
                    "script was modified since it was loaded".to_string(),
                ))
            }
        }
    }

    async fn delete(&self, id: ScriptId) -> Result<ScriptDefinition, RepositoryError> {
        let sql = format!("DELETE FROM scripts WHERE id = $1 RETURNING {SCRIPT_COLUMNS}");
        let row = sqlx::query_as::<_, ScriptRow>(&sql)
            .bind(id.as_i32())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        row.try_into()
    }

    async fn mark_synced(
        &self,
        id: ScriptId,
        active: bool,
        remote: Option<RemoteScriptTagId>,
    ) -> Result<ScriptDefinition, RepositoryError> {
        let status = if remote.is_some() {
            SyncStatus::Synced
        } else {
            SyncStatus::Unsynced
        };
        let sql = format!(
            "UPDATE scripts SET \
                 active = $2, \
                 remote_script_tag_id = $3, \
                 sync_status = $4, \
                 last_sync_error = NULL, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {SCRIPT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ScriptRow>(&sql)
            .bind(id.as_i32())
            .bind(active)
            .bind(remote.map(|r| r.as_i64()))
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        row.try_into()
    }

    async fn mark_sync_failed(
        &self,
        id: ScriptId,
        message: &str,
    ) -> Result<ScriptDefinition, RepositoryError> {
        let sql = format!(
            "UPDATE scripts SET \
                 sync_status = $2, \
                 last_sync_error = $3, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {SCRIPT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ScriptRow>(&sql)
            .bind(id.as_i32())
            .bind(SyncStatus::SyncPending.as_str())
            .bind(message)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        row.try_into()
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
