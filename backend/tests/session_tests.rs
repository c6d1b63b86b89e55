//! Hosted session tests
//!
//! Drives the server-side session through a full roast and checks how
//! saving interacts with the ledger.

mod common;

use common::{dec, lot_balance, seed_lot, setup_db};
use roast_companion_backend::error::AppError;
use roast_companion_backend::services::session::{new_shared_session, SessionService};
use roast_companion_backend::services::RoastingService;
use shared::{
    BeginRoastInput, DiscardOutcome, FlowStep, PostRoastInput, RoastEventType, RoastLevel,
};
use sqlx::SqlitePool;
use uuid::Uuid;

async fn roast_to_review(service: &SessionService, lot_id: Uuid) {
    assert!(service.open_pre_roast(0).await.applied);
    let view = service
        .begin_roast(
            BeginRoastInput {
                green_weight_grams: Some(dec("453.592")),
                lot_id: Some(lot_id),
            },
            1_000,
        )
        .await
        .unwrap();
    assert!(view.applied);
    assert!(service.mark_first_crack(301_000).await.applied);
    assert!(service.mark_drop(421_000).await.applied);
    assert!(service.stop(541_000).await.applied);

    let view = service
        .record_post_roast(
            PostRoastInput {
                roast_level: Some(RoastLevel::Medium),
                roasted_weight_grams: Some(dec("385.55")),
            },
            542_000,
        )
        .await
        .unwrap();
    assert!(view.applied);
    assert_eq!(view.session.flow_step, FlowStep::Review);
}

async fn service_with_lot() -> (SqlitePool, SessionService, Uuid) {
    let pool = setup_db().await;
    let lot = seed_lot(&pool, "10").await;
    let service = SessionService::new(pool.clone(), new_shared_session());
    (pool, service, lot.id)
}

/// Full roast, saved, deducted and reset
#[tokio::test]
async fn test_save_persists_and_resets() {
    let (pool, service, lot_id) = service_with_lot().await;
    roast_to_review(&service, lot_id).await;

    let saved = service.save(600_000).await.unwrap();
    assert_eq!(saved.roast.started_at, 1_000);
    assert_eq!(saved.roast.ended_at, 541_000);
    assert_eq!(saved.roast.events.len(), 4);
    assert_eq!(saved.session.flow_step, FlowStep::Idle);
    assert!(saved.session.events.is_empty());

    assert_eq!(lot_balance(&pool, lot_id).await, dec("9.000"));
    let stored = RoastingService::new(pool.clone())
        .get_roast(saved.roast.id)
        .await
        .unwrap();
    assert_eq!(stored.lot_id, lot_id);
}

/// A failed save leaves the draft in place for a retry
#[tokio::test]
async fn test_failed_save_keeps_session() {
    let (pool, service, lot_id) = service_with_lot().await;
    roast_to_review(&service, lot_id).await;

    sqlx::query("DELETE FROM lots WHERE id = ?")
        .bind(lot_id)
        .execute(&pool)
        .await
        .unwrap();

    let result = service.save(600_000).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let snapshot = service.snapshot(600_000).await;
    assert_eq!(snapshot.flow_step, FlowStep::Review);
    assert_eq!(snapshot.events.len(), 4);
}

/// Save outside review is a validation error, not a write
#[tokio::test]
async fn test_save_requires_review() {
    let (pool, service, lot_id) = service_with_lot().await;
    service.open_pre_roast(0).await;

    let result = service.save(10).await;
    assert!(matches!(
        result,
        Err(AppError::Validation { ref field, .. }) if field == "flow_step"
    ));
    assert_eq!(lot_balance(&pool, lot_id).await, dec("10.000"));
}

#[tokio::test]
async fn test_begin_roast_requires_existing_lot() {
    let (_pool, service, _lot_id) = service_with_lot().await;
    service.open_pre_roast(0).await;

    let result = service
        .begin_roast(
            BeginRoastInput {
                green_weight_grams: Some(dec("250")),
                lot_id: Some(Uuid::new_v4()),
            },
            1_000,
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(service.snapshot(1_000).await.flow_step, FlowStep::PreRoast);
}

#[tokio::test]
async fn test_begin_roast_validates_form() {
    let (_pool, service, lot_id) = service_with_lot().await;
    service.open_pre_roast(0).await;

    let result = service
        .begin_roast(
            BeginRoastInput {
                green_weight_grams: Some(dec("0")),
                lot_id: Some(lot_id),
            },
            1_000,
        )
        .await;

    assert!(matches!(
        result,
        Err(AppError::Validation { ref field, .. }) if field == "green_weight_grams"
    ));
}

/// Heavier-than-green roasted weight is rejected at the form
#[tokio::test]
async fn test_post_roast_rejects_gain() {
    let (_pool, service, lot_id) = service_with_lot().await;
    service.open_pre_roast(0).await;
    service
        .begin_roast(
            BeginRoastInput {
                green_weight_grams: Some(dec("250")),
                lot_id: Some(lot_id),
            },
            0,
        )
        .await
        .unwrap();
    service.mark_first_crack(1).await;
    service.mark_drop(2).await;
    service.stop(3).await;

    let result = service
        .record_post_roast(
            PostRoastInput {
                roast_level: Some(RoastLevel::Light),
                roasted_weight_grams: Some(dec("260")),
            },
            4,
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation { .. })));
    assert_eq!(service.snapshot(4).await.flow_step, FlowStep::PostRoast);
}

/// Rejected transitions report `applied: false` and leave state alone
#[tokio::test]
async fn test_rejected_transition_reports_not_applied() {
    let (_pool, service, _lot_id) = service_with_lot().await;

    let view = service.mark_drop(5).await;
    assert!(!view.applied);
    assert_eq!(view.session.flow_step, FlowStep::Idle);
    assert!(view.session.events.is_empty());
}

#[tokio::test]
async fn test_delete_marker_and_discard() {
    let (pool, service, lot_id) = service_with_lot().await;
    roast_to_review(&service, lot_id).await;

    let view = service.delete_marker(RoastEventType::Stop, 600_000).await;
    assert!(view.applied);
    assert!(view.session.is_running);

    assert!(service.stop(610_000).await.applied);

    // Back in postRoast flow; record again to reach review
    service
        .record_post_roast(
            PostRoastInput {
                roast_level: Some(RoastLevel::Dark),
                roasted_weight_grams: Some(dec("380")),
            },
            611_000,
        )
        .await
        .unwrap();

    assert_eq!(service.discard(612_000).await.outcome, DiscardOutcome::Armed);
    let view = service.discard(612_500).await;
    assert_eq!(view.outcome, DiscardOutcome::Discarded);
    assert_eq!(view.session.flow_step, FlowStep::Idle);

    // Nothing reached the ledger
    assert_eq!(lot_balance(&pool, lot_id).await, dec("10.000"));
}

/// Reset never drops a live roast; only a reviewed draft can be reset
#[tokio::test]
async fn test_reset_refused_while_running() {
    let (_pool, service, lot_id) = service_with_lot().await;
    service.open_pre_roast(0).await;
    service
        .begin_roast(
            BeginRoastInput {
                green_weight_grams: Some(dec("250")),
                lot_id: Some(lot_id),
            },
            0,
        )
        .await
        .unwrap();

    let view = service.reset_session(5_000).await;
    assert!(!view.applied);
    assert!(view.session.is_running);
    assert_eq!(view.session.flow_step, FlowStep::Running);
    assert_eq!(view.session.events.len(), 1);
}

#[tokio::test]
async fn test_reset_from_review() {
    let (pool, service, lot_id) = service_with_lot().await;
    roast_to_review(&service, lot_id).await;

    let view = service.reset_session(600_000).await;
    assert!(view.applied);
    assert_eq!(view.session.flow_step, FlowStep::Idle);
    assert_eq!(lot_balance(&pool, lot_id).await, dec("10.000"));
}

/// Deleting START after STOP leaves an empty log that can be started again
#[tokio::test]
async fn test_restart_after_deleting_start() {
    let (_pool, service, lot_id) = service_with_lot().await;
    roast_to_review(&service, lot_id).await;

    let view = service.delete_marker(RoastEventType::Start, 600_000).await;
    assert!(view.applied);
    assert!(view.session.events.is_empty());

    let view = service
        .begin_roast(
            BeginRoastInput {
                green_weight_grams: Some(dec("300")),
                lot_id: Some(lot_id),
            },
            700_000,
        )
        .await
        .unwrap();
    assert!(view.applied);
    assert_eq!(view.session.flow_step, FlowStep::Running);
    assert_eq!(view.session.start_at, Some(700_000));
}
