//! Remote script tag audit and the hosted script body endpoint.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;

use tagsmith_core::ScriptId;

use crate::error::AppError;
use crate::shopify::ScriptTag;
use crate::state::AppState;

/// Build the script tag router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/script-tags", get(pull_remote_tags))
        .route("/s/{file}", get(serve_script))
}

/// Remote tags as reported by Shopify; purely informational.
#[derive(Debug, Serialize)]
pub struct RemoteTagsResponse {
    pub script_tags: Vec<ScriptTag>,
}

async fn pull_remote_tags(
    State(state): State<AppState>,
) -> Result<Json<RemoteTagsResponse>, AppError> {
    let script_tags = state.scripts().pull_remote().await?;
    Ok(Json(RemoteTagsResponse { script_tags }))
}

/// Serve a script body as `{id}.js`.
///
/// This is the URL pushed to Shopify as the tag's `src`; the storefront
/// fetches it when the page loads. Liquid variables inside the body are
/// served verbatim.
async fn serve_script(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response, AppError> {
    let Some(id) = file
        .strip_suffix(".js")
        .and_then(|stem| stem.parse::<i32>().ok())
    else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let script = state.scripts().get(ScriptId::new(id)).await?;
    Ok((
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        script.content,
    )
        .into_response())
}
