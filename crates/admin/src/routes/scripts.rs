//! Script definition routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use serde::{Deserialize, Serialize};

use tagsmith_core::{Placement, ScriptId};

use crate::error::AppError;
use crate::models::{DeleteOutcome, NewScript, ScriptDefinition, ScriptPatch};
use crate::state::AppState;

/// Build the scripts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/scripts", get(list_scripts).post(create_script))
        .route(
            "/api/scripts/{id}",
            get(get_script).put(update_script).delete(delete_script),
        )
        .route("/api/scripts/{id}/active", put(set_active))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Restrict the listing to one placement.
    pub placement: Option<Placement>,
}

/// Listing response; scripts are ordered newest-first.
#[derive(Debug, Serialize)]
pub struct ScriptListResponse {
    pub scripts: Vec<ScriptDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

async fn list_scripts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ScriptListResponse>, AppError> {
    let scripts = state.scripts().list(params.placement).await?;
    Ok(Json(ScriptListResponse { scripts }))
}

async fn create_script(
    State(state): State<AppState>,
    Json(input): Json<NewScript>,
) -> Result<(StatusCode, Json<ScriptDefinition>), AppError> {
    let script = state.scripts().create(input).await?;
    Ok((StatusCode::CREATED, Json(script)))
}

async fn get_script(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ScriptDefinition>, AppError> {
    let script = state.scripts().get(ScriptId::new(id)).await?;
    Ok(Json(script))
}

async fn update_script(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(patch): Json<ScriptPatch>,
) -> Result<Json<ScriptDefinition>, AppError> {
    let script = state.scripts().update(ScriptId::new(id), patch).await?;
    Ok(Json(script))
}

async fn delete_script(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteOutcome>, AppError> {
    let outcome = state.scripts().delete(ScriptId::new(id)).await?;
    Ok(Json(outcome))
}

async fn set_active(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<ScriptDefinition>, AppError> {
    let script = state
        .scripts()
        .set_active(ScriptId::new(id), request.active)
        .await?;
    Ok(Json(script))
}
