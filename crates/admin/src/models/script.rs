//! Script definition domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tagsmith_core::{Placement, RemoteScriptTagId, ScriptId, SyncStatus};

/// A managed script definition.
///
/// The body (`content`) may contain Shopify Liquid template variables such as
/// `{{ order.total_price }}`; those are resolved by Shopify when the page
/// renders and are opaque strings here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptDefinition {
    /// Unique ID, assigned by the store at creation.
    pub id: ScriptId,
    /// Human-readable label.
    pub name: String,
    /// Which storefront page receives the injected script.
    pub placement: Placement,
    /// Raw script body, including surrounding markup.
    pub content: String,
    /// Inactive scripts are retained but not synced/injected.
    pub active: bool,
    /// Shopify-side script tag ID, absent until first successful sync.
    pub remote_script_tag_id: Option<RemoteScriptTagId>,
    /// Remote sync state; `Synced` exactly when a remote tag exists.
    pub sync_status: SyncStatus,
    /// Last push/remove failure, retained for display until the next
    /// successful sync.
    pub last_sync_error: Option<String>,
    /// When the definition was created.
    pub created_at: DateTime<Utc>,
    /// When the definition was last mutated.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new script definition.
#[derive(Debug, Clone, Deserialize)]
pub struct NewScript {
    /// Human-readable label.
    pub name: String,
    /// Which storefront page receives the injected script.
    pub placement: Placement,
    /// Raw script body.
    pub content: String,
    /// Whether the script should be live immediately.
    #[serde(default)]
    pub active: bool,
}

/// Partial update for a script definition.
///
/// `active` is deliberately absent; activation is a separate operation with
/// its own sync semantics.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptPatch {
    /// New label, if changing.
    pub name: Option<String>,
    /// New placement, if changing.
    pub placement: Option<Placement>,
    /// New script body, if changing.
    pub content: Option<String>,
    /// Compare-and-swap token: when present, the update only applies if the
    /// stored `updated_at` still matches, protecting concurrent editors from
    /// lost updates.
    pub expected_updated_at: Option<DateTime<Utc>>,
}

impl ScriptPatch {
    /// Whether the patch carries any field change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.placement.is_none() && self.content.is_none()
    }
}

/// Result of a delete operation.
///
/// A failed remote removal does not block the local delete; it is reported
/// here as an advisory warning instead.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    /// ID of the removed definition.
    pub deleted: ScriptId,
    /// Advisory warning when the remote script tag could not be removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
