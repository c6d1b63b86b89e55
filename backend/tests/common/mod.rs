//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::str::FromStr;

use roast_companion_backend::db;
use roast_companion_backend::services::InventoryService;
use rust_decimal::Decimal;
use shared::{
    derive_yield_percent, CoffeeInput, CoffeeProcess, Lot, LotInput, NewRoast, RoastEvent,
    RoastEventType, RoastLevel,
};
use sqlx::SqlitePool;
use uuid::Uuid;

// Helper to create Decimal from string
pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Fresh migrated in-memory database
pub async fn setup_db() -> SqlitePool {
    db::connect_in_memory()
        .await
        .expect("Failed to open in-memory database")
}

/// Coffee plus one lot holding `starting_lbs`
pub async fn seed_lot(pool: &SqlitePool, starting_lbs: &str) -> Lot {
    let service = InventoryService::new(pool.clone());
    let coffee = service
        .add_coffee(CoffeeInput {
            name: "Ethiopia Guji".to_string(),
            origin: Some("Ethiopia".to_string()),
            process: CoffeeProcess::Natural,
        })
        .await
        .expect("Failed to add coffee");

    service
        .add_lot(LotInput {
            coffee_id: coffee.id,
            label: "Guji 2024".to_string(),
            starting_inventory_lbs: dec(starting_lbs),
        })
        .await
        .expect("Failed to add lot")
}

/// Complete roast starting at `started_at`, nine minutes long
pub fn sample_roast(
    lot_id: Uuid,
    started_at: i64,
    level: RoastLevel,
    green_grams: &str,
    roasted_grams: &str,
) -> NewRoast {
    let green = dec(green_grams);
    let roasted = dec(roasted_grams);
    let events = vec![
        RoastEvent::new(RoastEventType::Start, started_at),
        RoastEvent::new(RoastEventType::FirstCrack, started_at + 300_000),
        RoastEvent::new(RoastEventType::Drop, started_at + 420_000),
        RoastEvent::new(RoastEventType::Stop, started_at + 540_000),
    ];

    NewRoast {
        lot_id,
        started_at,
        ended_at: started_at + 540_000,
        roast_level: level,
        green_weight_grams: green,
        roasted_weight_grams: roasted,
        yield_percent: derive_yield_percent(green, roasted).unwrap(),
        notes: None,
        events,
    }
}

pub async fn lot_balance(pool: &SqlitePool, lot_id: Uuid) -> Decimal {
    InventoryService::new(pool.clone())
        .get_lot(lot_id)
        .await
        .expect("Lot should exist")
        .current_inventory_lbs
}
