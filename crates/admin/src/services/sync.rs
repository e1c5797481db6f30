//! Reconciliation of local script definitions with remote script tags.
//!
//! The chosen content transport is a hosted `src` URL: each definition's
//! body is served by this service at `/s/{id}.js` and the pushed tag points
//! there, with `updated_at` as a version query so edits bust Shopify's
//! cache of the URL.

use std::sync::Arc;

use tracing::{debug, instrument};

use tagsmith_core::RemoteScriptTagId;

use crate::models::{ScriptDefinition, ShopifyCredentials};
use crate::shopify::{
    ScriptTag, ScriptTagPayload, ScriptTagTransport, SyncError, display_scope_for,
};

/// DOM event remote tags are attached to.
const SCRIPT_TAG_EVENT: &str = "onload";

/// Result of reconciling one definition against Shopify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// A remote tag was created.
    Created(RemoteScriptTagId),
    /// The existing remote tag was updated in place.
    Updated(RemoteScriptTagId),
    /// The remote tag was deleted.
    Removed,
    /// Nothing to do (inactive, no remote tag).
    Noop,
}

impl PushOutcome {
    /// The remote reference after the push, given the reference before it.
    #[must_use]
    pub const fn remote_after(
        self,
        previous: Option<RemoteScriptTagId>,
    ) -> Option<RemoteScriptTagId> {
        match self {
            Self::Created(id) | Self::Updated(id) => Some(id),
            Self::Removed => None,
            Self::Noop => previous,
        }
    }
}

/// Client that reconciles a definition's desired state with Shopify.
///
/// Callers resolve credentials before invoking; every method awaits the
/// remote call to completion, so local and remote state never diverge
/// silently through fire-and-forget syncs.
#[derive(Clone)]
pub struct SyncClient {
    transport: Arc<dyn ScriptTagTransport>,
    base_url: String,
}

impl std::fmt::Debug for SyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SyncClient {
    /// Create a new sync client.
    ///
    /// `base_url` is the public URL of this service, used to build hosted
    /// `src` URLs.
    #[must_use]
    pub fn new(transport: Arc<dyn ScriptTagTransport>, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The hosted `src` URL for a definition.
    #[must_use]
    pub fn script_src(&self, definition: &ScriptDefinition) -> String {
        format!(
            "{}/s/{}.js?v={}",
            self.base_url,
            definition.id,
            definition.updated_at.timestamp()
        )
    }

    fn payload_for(&self, definition: &ScriptDefinition) -> ScriptTagPayload {
        ScriptTagPayload {
            event: SCRIPT_TAG_EVENT.to_string(),
            src: self.script_src(definition),
            display_scope: display_scope_for(definition.placement).to_string(),
        }
    }

    /// Reconcile one definition's desired state with Shopify.
    ///
    /// Active without a remote reference creates a tag; active with one
    /// updates it (recreating if Shopify reports it gone); inactive with one
    /// deletes it. Inactive without a remote reference is a no-op.
    ///
    /// # Errors
    ///
    /// Any remote failure surfaces as [`SyncError`]; the caller decides
    /// whether that is fatal or advisory.
    #[instrument(skip_all, fields(script = %definition.id))]
    pub async fn push(
        &self,
        credentials: &ShopifyCredentials,
        definition: &ScriptDefinition,
    ) -> Result<PushOutcome, SyncError> {
        match (definition.active, definition.remote_script_tag_id) {
            (true, None) => {
                let tag = self
                    .transport
                    .create(credentials, &self.payload_for(definition))
                    .await?;
                debug!(remote_id = %tag.id, "created remote script tag");
                Ok(PushOutcome::Created(tag.id))
            }
            (true, Some(remote_id)) => {
                let payload = self.payload_for(definition);
                match self
                    .transport
                    .update(credentials, remote_id, &payload)
                    .await
                {
                    Ok(tag) => Ok(PushOutcome::Updated(tag.id)),
                    // The remote tag can vanish out-of-band; recreate it so
                    // the next push heals instead of failing forever.
                    Err(SyncError::NotFound) => {
                        debug!(remote_id = %remote_id, "remote script tag gone, recreating");
                        let tag = self.transport.create(credentials, &payload).await?;
                        Ok(PushOutcome::Created(tag.id))
                    }
                    Err(err) => Err(err),
                }
            }
            (false, Some(remote_id)) => {
                self.remove(credentials, remote_id).await?;
                Ok(PushOutcome::Removed)
            }
            (false, None) => Ok(PushOutcome::Noop),
        }
    }

    /// Fetch all remote script tags for visibility/audit.
    ///
    /// Never mutates the local store; pulling is purely informational so
    /// local edits are not clobbered.
    ///
    /// # Errors
    ///
    /// Any remote failure surfaces as [`SyncError`].
    pub async fn pull(
        &self,
        credentials: &ShopifyCredentials,
    ) -> Result<Vec<ScriptTag>, SyncError> {
        self.transport.list(credentials).await
    }

    /// Delete the remote tag regardless of the active flag.
    ///
    /// An already-absent remote tag counts as removed.
    ///
    /// # Errors
    ///
    /// Any other remote failure surfaces as [`SyncError`].
    #[instrument(skip_all, fields(remote_id = %remote_id))]
    pub async fn remove(
        &self,
        credentials: &ShopifyCredentials,
        remote_id: RemoteScriptTagId,
    ) -> Result<(), SyncError> {
        match self.transport.delete(credentials, remote_id).await {
            Ok(()) => Ok(()),
            Err(SyncError::NotFound) => {
                debug!("remote script tag already absent");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use tagsmith_core::{Placement, ScriptId, SyncStatus};

    use super::*;

    fn definition(active: bool, remote: Option<i64>) -> ScriptDefinition {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        ScriptDefinition {
            id: ScriptId::new(7),
            name: "GA4".to_string(),
            placement: Placement::ThankYouPage,
            content: "<script>void 0;</script>".to_string(),
            active,
            remote_script_tag_id: remote.map(RemoteScriptTagId::new),
            sync_status: SyncStatus::Unsynced,
            last_sync_error: None,
            created_at: at,
            updated_at: at,
        }
    }

    fn credentials() -> ShopifyCredentials {
        crate::models::credentials::tests::valid_input()
            .into_credentials()
            .unwrap()
    }

    /// Transport that records calls and can be told to fail updates with 404.
    #[derive(Default)]
    struct FakeTransport {
        calls: Mutex<Vec<String>>,
        update_returns_not_found: bool,
        delete_returns_not_found: bool,
    }

    impl FakeTransport {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ScriptTagTransport for FakeTransport {
        async fn create(
            &self,
            _credentials: &ShopifyCredentials,
            payload: &ScriptTagPayload,
        ) -> Result<ScriptTag, SyncError> {
            self.calls.lock().unwrap().push(format!("create {}", payload.src));
            Ok(ScriptTag {
                id: RemoteScriptTagId::new(1001),
                src: payload.src.clone(),
                event: payload.event.clone(),
                display_scope: Some(payload.display_scope.clone()),
                created_at: None,
                updated_at: None,
            })
        }

        async fn list(
            &self,
            _credentials: &ShopifyCredentials,
        ) -> Result<Vec<ScriptTag>, SyncError> {
            self.calls.lock().unwrap().push("list".to_string());
            Ok(Vec::new())
        }

        async fn update(
            &self,
            _credentials: &ShopifyCredentials,
            id: RemoteScriptTagId,
            _payload: &ScriptTagPayload,
        ) -> Result<ScriptTag, SyncError> {
            self.calls.lock().unwrap().push(format!("update {id}"));
            if self.update_returns_not_found {
                return Err(SyncError::NotFound);
            }
            Ok(ScriptTag {
                id,
                src: String::new(),
                event: SCRIPT_TAG_EVENT.to_string(),
                display_scope: None,
                created_at: None,
                updated_at: None,
            })
        }

        async fn delete(
            &self,
            _credentials: &ShopifyCredentials,
            id: RemoteScriptTagId,
        ) -> Result<(), SyncError> {
            self.calls.lock().unwrap().push(format!("delete {id}"));
            if self.delete_returns_not_found {
                return Err(SyncError::NotFound);
            }
            Ok(())
        }
    }

    fn client(transport: &Arc<FakeTransport>) -> SyncClient {
        SyncClient::new(
            Arc::clone(transport) as Arc<dyn ScriptTagTransport>,
            "https://tags.example.com/",
        )
    }

    #[test]
    fn test_script_src_includes_version_and_trims_slash() {
        let transport = Arc::new(FakeTransport::default());
        let sync = client(&transport);
        let def = definition(true, None);
        assert_eq!(
            sync.script_src(&def),
            format!("https://tags.example.com/s/7.js?v={}", def.updated_at.timestamp())
        );
    }

    #[tokio::test]
    async fn test_push_active_without_remote_creates() {
        let transport = Arc::new(FakeTransport::default());
        let sync = client(&transport);

        let outcome = sync
            .push(&credentials(), &definition(true, None))
            .await
            .unwrap();
        assert_eq!(outcome, PushOutcome::Created(RemoteScriptTagId::new(1001)));
        assert_eq!(transport.calls().len(), 1);
        assert!(transport.calls().first().unwrap().starts_with("create "));
    }

    #[tokio::test]
    async fn test_push_active_with_remote_updates() {
        let transport = Arc::new(FakeTransport::default());
        let sync = client(&transport);

        let outcome = sync
            .push(&credentials(), &definition(true, Some(55)))
            .await
            .unwrap();
        assert_eq!(outcome, PushOutcome::Updated(RemoteScriptTagId::new(55)));
        assert_eq!(transport.calls(), vec!["update 55".to_string()]);
    }

    #[tokio::test]
    async fn test_push_recreates_when_remote_tag_is_gone() {
        let transport = Arc::new(FakeTransport {
            update_returns_not_found: true,
            ..FakeTransport::default()
        });
        let sync = client(&transport);

        let outcome = sync
            .push(&credentials(), &definition(true, Some(55)))
            .await
            .unwrap();
        assert_eq!(outcome, PushOutcome::Created(RemoteScriptTagId::new(1001)));
        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls.first().unwrap(), "update 55");
        assert!(calls.get(1).unwrap().starts_with("create "));
    }

    #[tokio::test]
    async fn test_push_inactive_with_remote_removes() {
        let transport = Arc::new(FakeTransport::default());
        let sync = client(&transport);

        let outcome = sync
            .push(&credentials(), &definition(false, Some(55)))
            .await
            .unwrap();
        assert_eq!(outcome, PushOutcome::Removed);
        assert_eq!(transport.calls(), vec!["delete 55".to_string()]);
    }

    #[tokio::test]
    async fn test_push_inactive_without_remote_is_noop() {
        let transport = Arc::new(FakeTransport::default());
        let sync = client(&transport);

        let outcome = sync
            .push(&credentials(), &definition(false, None))
            .await
            .unwrap();
        assert_eq!(outcome, PushOutcome::Noop);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_remove_tolerates_absent_remote_tag() {
        let transport = Arc::new(FakeTransport {
            delete_returns_not_found: true,
            ..FakeTransport::default()
        });
        let sync = client(&transport);

        sync.remove(&credentials(), RemoteScriptTagId::new(55))
            .await
            .unwrap();
    }

    #[test]
    fn test_remote_after() {
        let prev = Some(RemoteScriptTagId::new(5));
        assert_eq!(
            PushOutcome::Created(RemoteScriptTagId::new(9)).remote_after(None),
            Some(RemoteScriptTagId::new(9))
        );
        assert_eq!(PushOutcome::Removed.remote_after(prev), None);
        assert_eq!(PushOutcome::Noop.remote_after(prev), prev);
    }
}
