//! Roast ledger service: saving, deleting and querying completed roasts
//!
//! Saving a roast deducts its green weight from the lot; deleting it puts
//! the same amount back. Both sides run in one transaction that opens with
//! its write, so the write lock is held before the balance is read.

use chrono::{DateTime, Utc};
use shared::{
    grams_to_normalized_lbs, normalize_lbs, validate_new_roast, CompletedRoast, NewRoast,
    RoastEvent, RoastFilters, RoastLevel,
};
use sqlx::{types::Json, FromRow, SqlitePool};
use uuid::Uuid;

use super::decode_decimal;
use super::decode_enum;
use super::inventory::{fetch_lot, write_balance};
use crate::error::{AppError, AppResult};

/// Roasting service for the roast ledger
#[derive(Clone)]
pub struct RoastingService {
    db: SqlitePool,
}

/// Row for roast queries
#[derive(Debug, FromRow)]
struct RoastRow {
    id: Uuid,
    lot_id: Uuid,
    started_at: i64,
    ended_at: i64,
    roast_level: String,
    green_weight_grams: String,
    roasted_weight_grams: String,
    yield_percent: String,
    notes: Option<String>,
    events: Json<Vec<RoastEvent>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<RoastRow> for CompletedRoast {
    type Error = AppError;

    fn try_from(row: RoastRow) -> AppResult<Self> {
        Ok(CompletedRoast {
            id: row.id,
            lot_id: row.lot_id,
            started_at: row.started_at,
            ended_at: row.ended_at,
            roast_level: decode_enum("roast_level", &row.roast_level, RoastLevel::from_str)?,
            green_weight_grams: decode_decimal("green_weight_grams", &row.green_weight_grams)?,
            roasted_weight_grams: decode_decimal(
                "roasted_weight_grams",
                &row.roasted_weight_grams,
            )?,
            yield_percent: decode_decimal("yield_percent", &row.yield_percent)?,
            notes: row.notes,
            events: row.events.0,
            created_at: row.created_at,
        })
    }
}

const ROAST_COLUMNS: &str = "id, lot_id, started_at, ended_at, roast_level, green_weight_grams, \
     roasted_weight_grams, yield_percent, notes, events, created_at";

const ROAST_ORDER: &str = "ORDER BY started_at DESC, created_at DESC, rowid DESC";

impl RoastingService {
    /// Create a new RoastingService instance
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Persist a completed roast and deduct its green weight from the lot.
    /// The balance may go negative.
    pub async fn save_roast(&self, roast: NewRoast) -> AppResult<CompletedRoast> {
        validate_new_roast(&roast)?;

        let deduction_lbs = grams_to_normalized_lbs(roast.green_weight_grams);
        let id = Uuid::new_v4();
        let created_at = Utc::now();
        let mut tx = self.db.begin().await?;

        // Writing first takes the database write lock before the lot is read
        sqlx::query(
            r#"
            INSERT INTO roasts (
                id, lot_id, started_at, ended_at, roast_level, green_weight_grams,
                roasted_weight_grams, yield_percent, notes, events, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(roast.lot_id)
        .bind(roast.started_at)
        .bind(roast.ended_at)
        .bind(roast.roast_level.as_str())
        .bind(roast.green_weight_grams.to_string())
        .bind(roast.roasted_weight_grams.to_string())
        .bind(roast.yield_percent.to_string())
        .bind(&roast.notes)
        .bind(Json(&roast.events))
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        let lot = fetch_lot(&mut *tx, roast.lot_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Lot".to_string()))?;

        let next_balance = normalize_lbs(lot.current_inventory_lbs - deduction_lbs);
        write_balance(&mut *tx, roast.lot_id, next_balance).await?;

        tx.commit().await?;

        tracing::info!(
            roast_id = %id,
            lot_id = %roast.lot_id,
            deducted_lbs = %deduction_lbs,
            balance_lbs = %next_balance,
            "Saved roast"
        );

        Ok(CompletedRoast::from_new(id, roast, created_at))
    }

    /// Delete a roast and restore its deduction to the lot.
    ///
    /// Returns `false` when the roast does not exist. When the lot is gone
    /// the roast is still deleted and the restoration is skipped.
    pub async fn delete_roast(&self, roast_id: Uuid) -> AppResult<bool> {
        let mut tx = self.db.begin().await?;

        let deleted = sqlx::query_as::<_, (Uuid, String)>(
            "DELETE FROM roasts WHERE id = ? RETURNING lot_id, green_weight_grams",
        )
        .bind(roast_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (lot_id, green_weight_grams) = match deleted {
            Some((lot_id, green)) => (lot_id, decode_decimal("green_weight_grams", &green)?),
            None => {
                tracing::debug!(roast_id = %roast_id, "Roast already gone; nothing to delete");
                return Ok(false);
            }
        };

        let restored_lbs = grams_to_normalized_lbs(green_weight_grams);
        match fetch_lot(&mut *tx, lot_id).await? {
            Some(lot) => {
                let next_balance = normalize_lbs(lot.current_inventory_lbs + restored_lbs);
                write_balance(&mut *tx, lot.id, next_balance).await?;
                tracing::info!(
                    roast_id = %roast_id,
                    lot_id = %lot.id,
                    restored_lbs = %restored_lbs,
                    balance_lbs = %next_balance,
                    "Deleted roast"
                );
            }
            None => {
                tracing::warn!(
                    roast_id = %roast_id,
                    lot_id = %lot_id,
                    "Deleted roast whose lot no longer exists; balance not restored"
                );
            }
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Get a roast by ID
    pub async fn get_roast(&self, roast_id: Uuid) -> AppResult<CompletedRoast> {
        let row = sqlx::query_as::<_, RoastRow>(&format!(
            "SELECT {} FROM roasts WHERE id = ?",
            ROAST_COLUMNS
        ))
        .bind(roast_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Roast".to_string()))?;

        row.try_into()
    }

    /// Most recently started roast, if any
    pub async fn latest_roast(&self) -> AppResult<Option<CompletedRoast>> {
        let row = sqlx::query_as::<_, RoastRow>(&format!(
            "SELECT {} FROM roasts {} LIMIT 1",
            ROAST_COLUMNS, ROAST_ORDER
        ))
        .fetch_optional(&self.db)
        .await?;

        row.map(CompletedRoast::try_from).transpose()
    }

    /// All roasts, most recent start first
    pub async fn list_roasts(&self) -> AppResult<Vec<CompletedRoast>> {
        let rows = sqlx::query_as::<_, RoastRow>(&format!(
            "SELECT {} FROM roasts {}",
            ROAST_COLUMNS, ROAST_ORDER
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(CompletedRoast::try_from).collect()
    }

    /// Roasts matching every given filter, most recent start first.
    ///
    /// One indexed query narrows the candidates (start range when bounded,
    /// else lot, else level); the full predicate is applied to the result.
    pub async fn list_roasts_filtered(
        &self,
        filters: &RoastFilters,
    ) -> AppResult<Vec<CompletedRoast>> {
        let range = filters.range();

        let rows = if range.is_bounded() {
            sqlx::query_as::<_, RoastRow>(&format!(
                "SELECT {} FROM roasts WHERE started_at >= ? AND started_at <= ? {}",
                ROAST_COLUMNS, ROAST_ORDER
            ))
            .bind(range.lower())
            .bind(range.upper())
            .fetch_all(&self.db)
            .await?
        } else if let Some(lot_id) = filters.lot_id {
            sqlx::query_as::<_, RoastRow>(&format!(
                "SELECT {} FROM roasts WHERE lot_id = ? {}",
                ROAST_COLUMNS, ROAST_ORDER
            ))
            .bind(lot_id)
            .fetch_all(&self.db)
            .await?
        } else if let Some(level) = filters.roast_level {
            sqlx::query_as::<_, RoastRow>(&format!(
                "SELECT {} FROM roasts WHERE roast_level = ? {}",
                ROAST_COLUMNS, ROAST_ORDER
            ))
            .bind(level.as_str())
            .fetch_all(&self.db)
            .await?
        } else {
            return self.list_roasts().await;
        };

        let mut roasts = Vec::with_capacity(rows.len());
        for row in rows {
            let roast = CompletedRoast::try_from(row)?;
            if filters.matches(&roast) {
                roasts.push(roast);
            }
        }
        Ok(roasts)
    }
}
