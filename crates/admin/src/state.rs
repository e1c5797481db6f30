//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AdminConfig;
use crate::db::{CredentialStore, ScriptStore};
use crate::services::{ScriptService, SyncClient};
use crate::shopify::ScriptTagTransport;

/// Application state shared across all handlers.
///
/// Built from capability interfaces so the same state wires up with the
/// PostgreSQL stores and REST transport in the binary, and with the
/// in-memory stores and a fake transport in tests.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    scripts: ScriptService,
    credentials: Arc<dyn CredentialStore>,
    store: Arc<dyn ScriptStore>,
}

impl AppState {
    /// Compose the application state from its capabilities.
    #[must_use]
    pub fn new(
        config: AdminConfig,
        store: Arc<dyn ScriptStore>,
        credentials: Arc<dyn CredentialStore>,
        transport: Arc<dyn ScriptTagTransport>,
    ) -> Self {
        let sync = SyncClient::new(transport, &config.base_url);
        let scripts = ScriptService::new(Arc::clone(&store), Arc::clone(&credentials), sync);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                scripts,
                credentials,
                store,
            }),
        }
    }

    /// The loaded configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// The script service.
    #[must_use]
    pub fn scripts(&self) -> &ScriptService {
        &self.inner.scripts
    }

    /// The credential store.
    #[must_use]
    pub fn credentials(&self) -> &dyn CredentialStore {
        self.inner.credentials.as_ref()
    }

    /// The script store, for readiness checks.
    #[must_use]
    pub fn store(&self) -> &dyn ScriptStore {
        self.inner.store.as_ref()
    }
}
