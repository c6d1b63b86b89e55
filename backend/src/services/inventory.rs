//! Inventory ledger service: coffees, lots and manual adjustments
//!
//! Every mutation that touches two records runs in one transaction, so a lot
//! balance never moves without the row that explains it. Ledger
//! transactions open with a write so the write lock is taken before any
//! balance is read.

use chrono::{DateTime, Utc};
use shared::{
    normalize_lbs, Adjustment, AdjustmentInput, AdjustmentReason, Coffee, CoffeeInput,
    CoffeeProcess, Lot, LotInput, LotSummary, LotUpdateInput,
};
use sqlx::{FromRow, Sqlite, SqlitePool};
use uuid::Uuid;

use super::{decode_decimal, decode_enum};
use crate::error::{AppError, AppResult};

/// Inventory service for managing coffees, lots and adjustments
#[derive(Clone)]
pub struct InventoryService {
    db: SqlitePool,
}

/// Row for coffee queries
#[derive(Debug, FromRow)]
struct CoffeeRow {
    id: Uuid,
    name: String,
    origin: Option<String>,
    process: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CoffeeRow> for Coffee {
    type Error = AppError;

    fn try_from(row: CoffeeRow) -> AppResult<Self> {
        Ok(Coffee {
            id: row.id,
            name: row.name,
            origin: row.origin,
            process: decode_enum("process", &row.process, CoffeeProcess::from_str)?,
            created_at: row.created_at,
        })
    }
}

/// Row for lot queries
#[derive(Debug, FromRow)]
pub(crate) struct LotRow {
    id: Uuid,
    coffee_id: Uuid,
    label: String,
    starting_inventory_lbs: String,
    current_inventory_lbs: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<LotRow> for Lot {
    type Error = AppError;

    fn try_from(row: LotRow) -> AppResult<Self> {
        Ok(Lot {
            id: row.id,
            coffee_id: row.coffee_id,
            label: row.label,
            starting_inventory_lbs: decode_decimal(
                "starting_inventory_lbs",
                &row.starting_inventory_lbs,
            )?,
            current_inventory_lbs: decode_decimal(
                "current_inventory_lbs",
                &row.current_inventory_lbs,
            )?,
            created_at: row.created_at,
        })
    }
}

/// Row for the lot summary join
#[derive(Debug, FromRow)]
struct LotSummaryRow {
    #[sqlx(flatten)]
    lot: LotRow,
    coffee_name: Option<String>,
}

/// Row for adjustment queries
#[derive(Debug, FromRow)]
struct AdjustmentRow {
    id: Uuid,
    lot_id: Uuid,
    amount_lbs: String,
    reason: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AdjustmentRow> for Adjustment {
    type Error = AppError;

    fn try_from(row: AdjustmentRow) -> AppResult<Self> {
        Ok(Adjustment {
            id: row.id,
            lot_id: row.lot_id,
            amount_lbs: decode_decimal("amount_lbs", &row.amount_lbs)?,
            reason: decode_enum("reason", &row.reason, AdjustmentReason::from_str)?,
            created_at: row.created_at,
        })
    }
}

const LOT_COLUMNS: &str =
    "id, coffee_id, label, starting_inventory_lbs, current_inventory_lbs, created_at";

/// Load a lot through any executor, including an open transaction
pub(crate) async fn fetch_lot<'e, E>(executor: E, lot_id: Uuid) -> AppResult<Option<Lot>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, LotRow>(&format!("SELECT {} FROM lots WHERE id = ?", LOT_COLUMNS))
        .bind(lot_id)
        .fetch_optional(executor)
        .await?;

    row.map(Lot::try_from).transpose()
}

/// Overwrite a lot's running balance
pub(crate) async fn write_balance<'e, E>(
    executor: E,
    lot_id: Uuid,
    balance_lbs: rust_decimal::Decimal,
) -> AppResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE lots SET current_inventory_lbs = ? WHERE id = ?")
        .bind(normalize_lbs(balance_lbs).to_string())
        .bind(lot_id)
        .execute(executor)
        .await?;
    Ok(())
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    // ========================================================================
    // Coffees
    // ========================================================================

    /// Add a coffee to the catalogue
    pub async fn add_coffee(&self, input: CoffeeInput) -> AppResult<Coffee> {
        let coffee = input.validate()?;
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        sqlx::query(
            "INSERT INTO coffees (id, name, origin, process, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(&coffee.name)
        .bind(&coffee.origin)
        .bind(coffee.process.as_str())
        .bind(created_at)
        .execute(&self.db)
        .await?;

        tracing::info!(coffee_id = %id, name = %coffee.name, "Added coffee");

        Ok(Coffee {
            id,
            name: coffee.name,
            origin: coffee.origin,
            process: coffee.process,
            created_at,
        })
    }

    /// Get a coffee by ID
    pub async fn get_coffee(&self, coffee_id: Uuid) -> AppResult<Coffee> {
        let row = sqlx::query_as::<_, CoffeeRow>(
            "SELECT id, name, origin, process, created_at FROM coffees WHERE id = ?",
        )
        .bind(coffee_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Coffee".to_string()))?;

        row.try_into()
    }

    /// List coffees alphabetically
    pub async fn list_coffees(&self) -> AppResult<Vec<Coffee>> {
        let rows = sqlx::query_as::<_, CoffeeRow>(
            "SELECT id, name, origin, process, created_at FROM coffees ORDER BY name ASC",
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Coffee::try_from).collect()
    }

    // ========================================================================
    // Lots
    // ========================================================================

    /// Create a lot; the balance starts at the starting inventory
    pub async fn add_lot(&self, input: LotInput) -> AppResult<Lot> {
        let lot = input.validate()?;

        let coffee_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM coffees WHERE id = ?)")
                .bind(lot.coffee_id)
                .fetch_one(&self.db)
                .await?;

        if !coffee_exists {
            return Err(AppError::NotFound("Coffee".to_string()));
        }

        let id = Uuid::new_v4();
        let created_at = Utc::now();
        let inventory = lot.starting_inventory_lbs.to_string();

        sqlx::query(
            r#"
            INSERT INTO lots (id, coffee_id, label, starting_inventory_lbs, current_inventory_lbs, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(lot.coffee_id)
        .bind(&lot.label)
        .bind(&inventory)
        .bind(&inventory)
        .bind(created_at)
        .execute(&self.db)
        .await?;

        tracing::info!(
            lot_id = %id,
            coffee_id = %lot.coffee_id,
            starting_lbs = %lot.starting_inventory_lbs,
            "Added lot"
        );

        Ok(Lot {
            id,
            coffee_id: lot.coffee_id,
            label: lot.label,
            starting_inventory_lbs: lot.starting_inventory_lbs,
            current_inventory_lbs: lot.starting_inventory_lbs,
            created_at,
        })
    }

    /// Edit a lot's label or starting inventory. The running balance is
    /// owned by the ledger and is never written here.
    pub async fn update_lot(&self, lot_id: Uuid, input: LotUpdateInput) -> AppResult<Lot> {
        let update = input.validate()?;
        let mut tx = self.db.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE lots
            SET label = COALESCE(?, label),
                starting_inventory_lbs = COALESCE(?, starting_inventory_lbs)
            WHERE id = ?
            "#,
        )
        .bind(update.label)
        .bind(update.starting_inventory_lbs.map(|lbs| lbs.to_string()))
        .bind(lot_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Lot".to_string()));
        }

        let lot = fetch_lot(&mut *tx, lot_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Lot".to_string()))?;

        tx.commit().await?;

        tracing::info!(lot_id = %lot_id, "Updated lot");
        Ok(lot)
    }

    /// Get a lot by ID
    pub async fn get_lot(&self, lot_id: Uuid) -> AppResult<Lot> {
        fetch_lot(&self.db, lot_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Lot".to_string()))
    }

    /// List lots, newest first
    pub async fn list_lots(&self) -> AppResult<Vec<Lot>> {
        let rows = sqlx::query_as::<_, LotRow>(&format!(
            "SELECT {} FROM lots ORDER BY created_at DESC, rowid DESC",
            LOT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Lot::try_from).collect()
    }

    /// Lots paired with their coffee name for inventory screens
    pub async fn lot_summaries(&self) -> AppResult<Vec<LotSummary>> {
        let rows = sqlx::query_as::<_, LotSummaryRow>(
            r#"
            SELECT l.id, l.coffee_id, l.label, l.starting_inventory_lbs,
                   l.current_inventory_lbs, l.created_at, c.name AS coffee_name
            FROM lots l
            LEFT JOIN coffees c ON c.id = l.coffee_id
            ORDER BY l.created_at DESC, l.rowid DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| {
                let lot = Lot::try_from(row.lot)?;
                let is_negative = lot.is_negative();
                Ok(LotSummary {
                    lot,
                    coffee_name: row.coffee_name,
                    is_negative,
                })
            })
            .collect()
    }

    // ========================================================================
    // Adjustments
    // ========================================================================

    /// Record a manual adjustment and move the lot balance by its amount
    pub async fn add_adjustment(&self, input: AdjustmentInput) -> AppResult<Adjustment> {
        let adjustment = input.validate()?;
        let id = Uuid::new_v4();
        let created_at = Utc::now();
        let mut tx = self.db.begin().await?;

        sqlx::query(
            "INSERT INTO adjustments (id, lot_id, amount_lbs, reason, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(adjustment.lot_id)
        .bind(adjustment.amount_lbs.to_string())
        .bind(adjustment.reason.as_str())
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        let lot = fetch_lot(&mut *tx, adjustment.lot_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Lot".to_string()))?;

        let next_balance = normalize_lbs(lot.current_inventory_lbs + adjustment.amount_lbs);
        write_balance(&mut *tx, adjustment.lot_id, next_balance).await?;

        tx.commit().await?;

        tracing::info!(
            lot_id = %adjustment.lot_id,
            amount_lbs = %adjustment.amount_lbs,
            reason = adjustment.reason.as_str(),
            balance_lbs = %next_balance,
            "Recorded inventory adjustment"
        );

        Ok(Adjustment {
            id,
            lot_id: adjustment.lot_id,
            amount_lbs: adjustment.amount_lbs,
            reason: adjustment.reason,
            created_at,
        })
    }

    /// Adjustment history for a lot, newest first
    pub async fn list_adjustments_for_lot(&self, lot_id: Uuid) -> AppResult<Vec<Adjustment>> {
        let rows = sqlx::query_as::<_, AdjustmentRow>(
            r#"
            SELECT id, lot_id, amount_lbs, reason, created_at
            FROM adjustments
            WHERE lot_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(lot_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Adjustment::try_from).collect()
    }
}
