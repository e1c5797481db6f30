//! HTTP route handlers for the admin service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check (in main)
//! GET  /health/ready               - Readiness check (in main)
//!
//! # Scripts
//! GET    /api/scripts              - List definitions (newest-first)
//! POST   /api/scripts              - Create a definition
//! GET    /api/scripts/{id}         - Fetch a definition
//! PUT    /api/scripts/{id}         - Update fields
//! DELETE /api/scripts/{id}         - Delete (response may carry a warning)
//! PUT    /api/scripts/{id}/active  - Activate/deactivate
//!
//! # Remote audit
//! GET  /api/script-tags            - Pull remote script tags (read-only)
//!
//! # Settings
//! GET  /api/settings/shopify       - Redacted credential status
//! PUT  /api/settings/shopify       - Replace credentials wholesale
//!
//! # Storefront-facing
//! GET  /s/{id}.js                  - Hosted script body
//! ```

pub mod script_tags;
pub mod scripts;
pub mod settings;

use axum::Router;

use crate::state::AppState;

/// Build the full application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(scripts::router())
        .merge(settings::router())
        .merge(script_tags::router())
}
