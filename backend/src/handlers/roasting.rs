//! HTTP handlers for roast history

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use shared::{CompletedRoast, RoastFilters};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::RoastingService;
use crate::AppState;

/// List roasts; any combination of `lot_id`, `roast_level`, `from`, `to`
pub async fn list_roasts(
    State(state): State<AppState>,
    Query(filters): Query<RoastFilters>,
) -> AppResult<Json<Vec<CompletedRoast>>> {
    let service = RoastingService::new(state.db);
    let roasts = service.list_roasts_filtered(&filters).await?;
    Ok(Json(roasts))
}

/// Most recent roast, or `null`
pub async fn latest_roast(
    State(state): State<AppState>,
) -> AppResult<Json<Option<CompletedRoast>>> {
    let service = RoastingService::new(state.db);
    let roast = service.latest_roast().await?;
    Ok(Json(roast))
}

/// Get a roast by ID
pub async fn get_roast(
    State(state): State<AppState>,
    Path(roast_id): Path<Uuid>,
) -> AppResult<Json<CompletedRoast>> {
    let service = RoastingService::new(state.db);
    let roast = service.get_roast(roast_id).await?;
    Ok(Json(roast))
}

#[derive(Debug, Serialize)]
pub struct DeleteRoastResponse {
    pub deleted: bool,
}

/// Delete a roast and restore its lot's inventory
pub async fn delete_roast(
    State(state): State<AppState>,
    Path(roast_id): Path<Uuid>,
) -> AppResult<Json<DeleteRoastResponse>> {
    let service = RoastingService::new(state.db);
    let deleted = service.delete_roast(roast_id).await?;
    Ok(Json(DeleteRoastResponse { deleted }))
}
