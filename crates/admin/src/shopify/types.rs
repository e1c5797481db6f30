//! Wire types for the Script Tags REST resource.

use serde::{Deserialize, Serialize};

use tagsmith_core::{Placement, RemoteScriptTagId};

/// A script tag as returned by Shopify.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptTag {
    /// Shopify-side numeric ID.
    pub id: RemoteScriptTagId,
    /// URL of the hosted script body.
    pub src: String,
    /// DOM event the script is attached to (always `onload`).
    pub event: String,
    /// Which pages load the script.
    #[serde(default)]
    pub display_scope: Option<String>,
    /// Creation timestamp, as reported by Shopify (opaque here).
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last-update timestamp, as reported by Shopify (opaque here).
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Fields sent when creating or updating a script tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptTagPayload {
    /// DOM event the script is attached to.
    pub event: String,
    /// URL of the hosted script body.
    pub src: String,
    /// Which pages load the script.
    pub display_scope: String,
}

/// Request envelope: `{"script_tag": {...}}`.
#[derive(Debug, Serialize)]
pub struct ScriptTagRequest<'a> {
    pub script_tag: &'a ScriptTagPayload,
}

/// Response envelope for single-tag endpoints.
#[derive(Debug, Deserialize)]
pub struct ScriptTagEnvelope {
    pub script_tag: ScriptTag,
}

/// Response envelope for the list endpoint.
#[derive(Debug, Deserialize)]
pub struct ScriptTagListEnvelope {
    pub script_tags: Vec<ScriptTag>,
}

/// The `display_scope` value for a placement.
///
/// Shopify's Script Tag API has no checkout-only scope; `order_status` is
/// the thank-you page and `online_store` covers the storefront pages.
#[must_use]
pub const fn display_scope_for(placement: Placement) -> &'static str {
    match placement {
        Placement::Checkout => "online_store",
        Placement::ThankYouPage => "order_status",
    }
}
