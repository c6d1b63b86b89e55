//! HTTP handlers for coffees, lots and inventory adjustments

use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    Adjustment, AdjustmentInput, AdjustmentReason, Coffee, CoffeeInput, Lot, LotInput,
    LotSummary, LotUpdateInput,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::InventoryService;
use crate::AppState;

// ============================================================================
// Coffee Handlers
// ============================================================================

/// Add a coffee
pub async fn create_coffee(
    State(state): State<AppState>,
    Json(input): Json<CoffeeInput>,
) -> AppResult<Json<Coffee>> {
    let service = InventoryService::new(state.db);
    let coffee = service.add_coffee(input).await?;
    Ok(Json(coffee))
}

/// List coffees by name
pub async fn list_coffees(State(state): State<AppState>) -> AppResult<Json<Vec<Coffee>>> {
    let service = InventoryService::new(state.db);
    let coffees = service.list_coffees().await?;
    Ok(Json(coffees))
}

/// Get a coffee by ID
pub async fn get_coffee(
    State(state): State<AppState>,
    Path(coffee_id): Path<Uuid>,
) -> AppResult<Json<Coffee>> {
    let service = InventoryService::new(state.db);
    let coffee = service.get_coffee(coffee_id).await?;
    Ok(Json(coffee))
}

// ============================================================================
// Lot Handlers
// ============================================================================

/// Add a lot
pub async fn create_lot(
    State(state): State<AppState>,
    Json(input): Json<LotInput>,
) -> AppResult<Json<Lot>> {
    let service = InventoryService::new(state.db);
    let lot = service.add_lot(input).await?;
    Ok(Json(lot))
}

/// List lots, newest first
pub async fn list_lots(State(state): State<AppState>) -> AppResult<Json<Vec<Lot>>> {
    let service = InventoryService::new(state.db);
    let lots = service.list_lots().await?;
    Ok(Json(lots))
}

/// Lots with coffee names and negative-balance flags
pub async fn list_lot_summaries(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<LotSummary>>> {
    let service = InventoryService::new(state.db);
    let summaries = service.lot_summaries().await?;
    Ok(Json(summaries))
}

/// Get a lot by ID
pub async fn get_lot(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> AppResult<Json<Lot>> {
    let service = InventoryService::new(state.db);
    let lot = service.get_lot(lot_id).await?;
    Ok(Json(lot))
}

/// Edit a lot's label or starting inventory
pub async fn update_lot(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
    Json(input): Json<LotUpdateInput>,
) -> AppResult<Json<Lot>> {
    let service = InventoryService::new(state.db);
    let lot = service.update_lot(lot_id, input).await?;
    Ok(Json(lot))
}

// ============================================================================
// Adjustment Handlers
// ============================================================================

/// Adjustment request body; the lot comes from the path
#[derive(Debug, Deserialize)]
pub struct AdjustmentBody {
    pub amount_lbs: Decimal,
    pub reason: AdjustmentReason,
}

/// Record a manual adjustment against a lot
pub async fn create_adjustment(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
    Json(body): Json<AdjustmentBody>,
) -> AppResult<Json<Adjustment>> {
    let service = InventoryService::new(state.db);
    let adjustment = service
        .add_adjustment(AdjustmentInput {
            lot_id,
            amount_lbs: body.amount_lbs,
            reason: body.reason,
        })
        .await?;
    Ok(Json(adjustment))
}

/// Adjustment history for a lot
pub async fn list_adjustments(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> AppResult<Json<Vec<Adjustment>>> {
    let service = InventoryService::new(state.db);
    let adjustments = service.list_adjustments_for_lot(lot_id).await?;
    Ok(Json(adjustments))
}
