//! Green coffee inventory models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Processing method of a green coffee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoffeeProcess {
    Natural,
    Washed,
    #[serde(rename = "Honey/Pulped Natural")]
    Honey,
    Experimental,
    Other,
}

impl CoffeeProcess {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoffeeProcess::Natural => "Natural",
            CoffeeProcess::Washed => "Washed",
            CoffeeProcess::Honey => "Honey/Pulped Natural",
            CoffeeProcess::Experimental => "Experimental",
            CoffeeProcess::Other => "Other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Natural" => Some(CoffeeProcess::Natural),
            "Washed" => Some(CoffeeProcess::Washed),
            "Honey/Pulped Natural" => Some(CoffeeProcess::Honey),
            "Experimental" => Some(CoffeeProcess::Experimental),
            "Other" => Some(CoffeeProcess::Other),
            _ => None,
        }
    }
}

/// A green coffee in the catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coffee {
    pub id: Uuid,
    pub name: String,
    pub origin: Option<String>,
    pub process: CoffeeProcess,
    pub created_at: DateTime<Utc>,
}

/// A physical batch of green coffee with a running balance in pounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub id: Uuid,
    pub coffee_id: Uuid,
    pub label: String,
    pub starting_inventory_lbs: Decimal,
    pub current_inventory_lbs: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Lot {
    /// Balances may go negative; the data layer allows it and displays flag it
    pub fn is_negative(&self) -> bool {
        self.current_inventory_lbs < Decimal::ZERO
    }
}

/// Why a manual adjustment was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentReason {
    Purchase,
    Correction,
}

impl AdjustmentReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentReason::Purchase => "purchase",
            AdjustmentReason::Correction => "correction",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "purchase" => Some(AdjustmentReason::Purchase),
            "correction" => Some(AdjustmentReason::Correction),
            _ => None,
        }
    }
}

/// Append-only manual stock adjustment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub id: Uuid,
    pub lot_id: Uuid,
    /// Signed, never zero
    pub amount_lbs: Decimal,
    pub reason: AdjustmentReason,
    pub created_at: DateTime<Utc>,
}

/// Lot joined with its coffee for inventory screens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotSummary {
    pub lot: Lot,
    pub coffee_name: Option<String>,
    pub is_negative: bool,
}
