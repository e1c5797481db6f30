//! Shopify credential settings routes.
//!
//! Credentials are replaced wholesale; the read endpoint only ever reveals
//! the shop domain and whether a set is configured.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use serde::Serialize;
use tracing::info;

use crate::db::CredentialStore;
use crate::error::AppError;
use crate::models::CredentialsInput;
use crate::state::AppState;

/// Build the settings router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/settings/shopify",
        get(get_settings).put(put_settings),
    )
}

/// Redacted view of the credential state.
#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_domain: Option<String>,
}

async fn get_settings(State(state): State<AppState>) -> Result<Json<SettingsView>, AppError> {
    let credentials = state.credentials().load().await?;
    Ok(Json(match credentials {
        Some(credentials) => SettingsView {
            configured: true,
            shop_domain: Some(credentials.shop_domain),
        },
        None => SettingsView {
            configured: false,
            shop_domain: None,
        },
    }))
}

async fn put_settings(
    State(state): State<AppState>,
    Json(input): Json<CredentialsInput>,
) -> Result<StatusCode, AppError> {
    let credentials = input
        .into_credentials()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    state.credentials().replace(&credentials).await?;
    info!(shop = %credentials.shop_domain, "Shopify credentials replaced");
    Ok(StatusCode::NO_CONTENT)
}
