//! Roast history query tests
//!
//! Covers ordering, each filter on its own, and combined filters where the
//! indexed query and the in-memory predicate have to agree.

mod common;

use common::{sample_roast, seed_lot, setup_db};
use roast_companion_backend::services::RoastingService;
use shared::{CompletedRoast, RoastFilters, RoastLevel};
use sqlx::SqlitePool;
use uuid::Uuid;

struct Fixture {
    pool: SqlitePool,
    lot_a: Uuid,
    lot_b: Uuid,
}

/// Two lots, four roasts:
/// - lot A: Light @ 1000, Medium @ 3000
/// - lot B: Medium @ 2000, Dark @ 4000
async fn fixture() -> Fixture {
    let pool = setup_db().await;
    let lot_a = seed_lot(&pool, "20").await.id;
    let lot_b = seed_lot(&pool, "20").await.id;
    let roasting = RoastingService::new(pool.clone());

    for (lot, at, level) in [
        (lot_a, 1_000, RoastLevel::Light),
        (lot_b, 2_000, RoastLevel::Medium),
        (lot_a, 3_000, RoastLevel::Medium),
        (lot_b, 4_000, RoastLevel::Dark),
    ] {
        roasting
            .save_roast(sample_roast(lot, at, level, "250", "212"))
            .await
            .unwrap();
    }

    Fixture { pool, lot_a, lot_b }
}

fn starts(roasts: &[CompletedRoast]) -> Vec<i64> {
    roasts.iter().map(|roast| roast.started_at).collect()
}

#[tokio::test]
async fn test_list_roasts_most_recent_first() {
    let fx = fixture().await;
    let roasts = RoastingService::new(fx.pool.clone())
        .list_roasts()
        .await
        .unwrap();
    assert_eq!(starts(&roasts), vec![4_000, 3_000, 2_000, 1_000]);
}

#[tokio::test]
async fn test_empty_filters_list_everything() {
    let fx = fixture().await;
    let roasts = RoastingService::new(fx.pool.clone())
        .list_roasts_filtered(&RoastFilters::default())
        .await
        .unwrap();
    assert_eq!(roasts.len(), 4);
}

#[tokio::test]
async fn test_filter_by_lot() {
    let fx = fixture().await;
    let filters = RoastFilters {
        lot_id: Some(fx.lot_b),
        ..Default::default()
    };
    let roasts = RoastingService::new(fx.pool.clone())
        .list_roasts_filtered(&filters)
        .await
        .unwrap();
    assert_eq!(starts(&roasts), vec![4_000, 2_000]);
    assert!(roasts.iter().all(|roast| roast.lot_id == fx.lot_b));
}

#[tokio::test]
async fn test_filter_by_level() {
    let fx = fixture().await;
    let filters = RoastFilters {
        roast_level: Some(RoastLevel::Medium),
        ..Default::default()
    };
    let roasts = RoastingService::new(fx.pool.clone())
        .list_roasts_filtered(&filters)
        .await
        .unwrap();
    assert_eq!(starts(&roasts), vec![3_000, 2_000]);
}

/// Range bounds are inclusive on both ends
#[tokio::test]
async fn test_filter_by_inclusive_range() {
    let fx = fixture().await;
    let filters = RoastFilters {
        from: Some(2_000),
        to: Some(3_000),
        ..Default::default()
    };
    let roasts = RoastingService::new(fx.pool.clone())
        .list_roasts_filtered(&filters)
        .await
        .unwrap();
    assert_eq!(starts(&roasts), vec![3_000, 2_000]);
}

#[tokio::test]
async fn test_open_ended_ranges() {
    let fx = fixture().await;
    let service = RoastingService::new(fx.pool.clone());

    let from_only = RoastFilters {
        from: Some(3_000),
        ..Default::default()
    };
    assert_eq!(
        starts(&service.list_roasts_filtered(&from_only).await.unwrap()),
        vec![4_000, 3_000]
    );

    let to_only = RoastFilters {
        to: Some(1_500),
        ..Default::default()
    };
    assert_eq!(
        starts(&service.list_roasts_filtered(&to_only).await.unwrap()),
        vec![1_000]
    );
}

/// Lot and range together return only roasts matching both
#[tokio::test]
async fn test_filter_by_lot_and_range() {
    let fx = fixture().await;
    let filters = RoastFilters {
        lot_id: Some(fx.lot_a),
        from: Some(1_500),
        to: Some(4_000),
        ..Default::default()
    };
    let roasts = RoastingService::new(fx.pool.clone())
        .list_roasts_filtered(&filters)
        .await
        .unwrap();
    assert_eq!(starts(&roasts), vec![3_000]);
    assert_eq!(roasts[0].lot_id, fx.lot_a);
}

#[tokio::test]
async fn test_filter_by_lot_and_level() {
    let fx = fixture().await;
    let filters = RoastFilters {
        lot_id: Some(fx.lot_a),
        roast_level: Some(RoastLevel::Light),
        ..Default::default()
    };
    let roasts = RoastingService::new(fx.pool.clone())
        .list_roasts_filtered(&filters)
        .await
        .unwrap();
    assert_eq!(starts(&roasts), vec![1_000]);
}

#[tokio::test]
async fn test_filters_with_no_match() {
    let fx = fixture().await;
    let filters = RoastFilters {
        lot_id: Some(fx.lot_b),
        roast_level: Some(RoastLevel::Light),
        ..Default::default()
    };
    let roasts = RoastingService::new(fx.pool.clone())
        .list_roasts_filtered(&filters)
        .await
        .unwrap();
    assert!(roasts.is_empty());
}

#[tokio::test]
async fn test_latest_roast() {
    let fx = fixture().await;
    let service = RoastingService::new(fx.pool.clone());
    let latest = service.latest_roast().await.unwrap().unwrap();
    assert_eq!(latest.started_at, 4_000);

    let empty = setup_db().await;
    assert!(RoastingService::new(empty).latest_roast().await.unwrap().is_none());
}

/// Stored roasts come back exactly as saved
#[tokio::test]
async fn test_get_roast_round_trip() {
    let fx = fixture().await;
    let service = RoastingService::new(fx.pool.clone());
    let mut roast = sample_roast(fx.lot_a, 9_000, RoastLevel::Dark, "300.5", "250.25");
    roast.notes = Some("chocolate, low acidity".to_string());

    let saved = service.save_roast(roast.clone()).await.unwrap();
    let loaded = service.get_roast(saved.id).await.unwrap();

    assert_eq!(loaded.events, roast.events);
    assert_eq!(loaded.green_weight_grams, roast.green_weight_grams);
    assert_eq!(loaded.yield_percent, roast.yield_percent);
    assert_eq!(loaded.notes, roast.notes);
    assert_eq!(loaded.roast_level, RoastLevel::Dark);
}
