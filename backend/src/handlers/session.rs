//! HTTP handlers for the live roast session
//!
//! A rejected transition is not an error: the response carries
//! `applied: false` and the unchanged snapshot.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use shared::{BeginRoastInput, PostRoastInput, RoastEventType, SessionSnapshot};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::session::{DiscardView, SavedView, SessionService, SessionView};
use crate::AppState;

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn service(state: AppState) -> SessionService {
    SessionService::new(state.db, state.session)
}

/// Notes request body
#[derive(Debug, Deserialize)]
pub struct NotesInput {
    #[serde(default)]
    pub notes: String,
}

/// Lot picker request body
#[derive(Debug, Deserialize)]
pub struct SelectLotInput {
    pub lot_id: Option<Uuid>,
}

/// Marker focus request body
#[derive(Debug, Deserialize)]
pub struct FocusInput {
    pub event: Option<RoastEventType>,
}

/// Current session state
pub async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(service(state).snapshot(now_ms()).await)
}

pub async fn open_pre_roast(State(state): State<AppState>) -> Json<SessionView> {
    Json(service(state).open_pre_roast(now_ms()).await)
}

pub async fn cancel_pre_roast(State(state): State<AppState>) -> Json<SessionView> {
    Json(service(state).cancel_pre_roast(now_ms()).await)
}

/// Start the roast from the pre-roast form
pub async fn begin_roast(
    State(state): State<AppState>,
    Json(input): Json<BeginRoastInput>,
) -> AppResult<Json<SessionView>> {
    let view = service(state).begin_roast(input, now_ms()).await?;
    Ok(Json(view))
}

pub async fn mark_first_crack(State(state): State<AppState>) -> Json<SessionView> {
    Json(service(state).mark_first_crack(now_ms()).await)
}

pub async fn mark_drop(State(state): State<AppState>) -> Json<SessionView> {
    Json(service(state).mark_drop(now_ms()).await)
}

pub async fn stop_roast(State(state): State<AppState>) -> Json<SessionView> {
    Json(service(state).stop(now_ms()).await)
}

/// Delete a marker and every later one
pub async fn delete_marker(
    State(state): State<AppState>,
    Path(event_type): Path<String>,
) -> AppResult<Json<SessionView>> {
    let kind = RoastEventType::from_str(&event_type).ok_or_else(|| AppError::Validation {
        field: "type".to_string(),
        message: format!("Unknown roast event {:?}", event_type),
    })?;
    Ok(Json(service(state).delete_marker(kind, now_ms()).await))
}

pub async fn focus_marker(
    State(state): State<AppState>,
    Json(input): Json<FocusInput>,
) -> Json<SessionView> {
    Json(service(state).focus_marker(input.event, now_ms()).await)
}

/// Record roast level and roasted weight after STOP
pub async fn record_post_roast(
    State(state): State<AppState>,
    Json(input): Json<PostRoastInput>,
) -> AppResult<Json<SessionView>> {
    let view = service(state).record_post_roast(input, now_ms()).await?;
    Ok(Json(view))
}

pub async fn set_notes(
    State(state): State<AppState>,
    Json(input): Json<NotesInput>,
) -> Json<SessionView> {
    Json(service(state).set_notes(input.notes, now_ms()).await)
}

pub async fn set_selected_lot(
    State(state): State<AppState>,
    Json(input): Json<SelectLotInput>,
) -> Json<SessionView> {
    Json(service(state).set_selected_lot(input.lot_id, now_ms()).await)
}

pub async fn reset_session(State(state): State<AppState>) -> Json<SessionView> {
    Json(service(state).reset_session(now_ms()).await)
}

/// Two-step discard from review
pub async fn discard_session(State(state): State<AppState>) -> Json<DiscardView> {
    Json(service(state).discard(now_ms()).await)
}

/// Save the reviewed roast to the ledger
pub async fn save_session(State(state): State<AppState>) -> AppResult<Json<SavedView>> {
    let saved = service(state).save(now_ms()).await?;
    Ok(Json(saved))
}
