//! Roast session and roast record models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Milestone marking a roast phase boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoastEventType {
    Start,
    FirstCrack,
    Drop,
    Stop,
}

/// Canonical milestone order; every valid event log is a prefix of this
pub const CANONICAL_EVENT_ORDER: [RoastEventType; 4] = [
    RoastEventType::Start,
    RoastEventType::FirstCrack,
    RoastEventType::Drop,
    RoastEventType::Stop,
];

impl RoastEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoastEventType::Start => "START",
            RoastEventType::FirstCrack => "FIRST_CRACK",
            RoastEventType::Drop => "DROP",
            RoastEventType::Stop => "STOP",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "START" => Some(RoastEventType::Start),
            "FIRST_CRACK" => Some(RoastEventType::FirstCrack),
            "DROP" => Some(RoastEventType::Drop),
            "STOP" => Some(RoastEventType::Stop),
            _ => None,
        }
    }

    /// Position in the canonical order
    pub fn ordinal(&self) -> usize {
        match self {
            RoastEventType::Start => 0,
            RoastEventType::FirstCrack => 1,
            RoastEventType::Drop => 2,
            RoastEventType::Stop => 3,
        }
    }
}

impl std::fmt::Display for RoastEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timestamped milestone (`at` is epoch milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoastEvent {
    #[serde(rename = "type")]
    pub kind: RoastEventType,
    pub at: i64,
}

impl RoastEvent {
    pub fn new(kind: RoastEventType, at: i64) -> Self {
        Self { kind, at }
    }
}

/// Timestamp of the first event of the given type, if present
pub fn event_timestamp(events: &[RoastEvent], kind: RoastEventType) -> Option<i64> {
    events.iter().find(|event| event.kind == kind).map(|event| event.at)
}

/// Roast levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoastLevel {
    Light,
    Medium,
    Dark,
}

impl RoastLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoastLevel::Light => "Light",
            RoastLevel::Medium => "Medium",
            RoastLevel::Dark => "Dark",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Light" => Some(RoastLevel::Light),
            "Medium" => Some(RoastLevel::Medium),
            "Dark" => Some(RoastLevel::Dark),
            _ => None,
        }
    }
}

impl std::fmt::Display for RoastLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finished roast ready to be written to the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRoast {
    pub lot_id: Uuid,
    pub started_at: i64,
    pub ended_at: i64,
    pub roast_level: RoastLevel,
    pub green_weight_grams: Decimal,
    pub roasted_weight_grams: Decimal,
    pub yield_percent: Decimal,
    pub notes: Option<String>,
    pub events: Vec<RoastEvent>,
}

/// A persisted roast record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedRoast {
    pub id: Uuid,
    pub lot_id: Uuid,
    pub started_at: i64,
    pub ended_at: i64,
    pub roast_level: RoastLevel,
    pub green_weight_grams: Decimal,
    pub roasted_weight_grams: Decimal,
    pub yield_percent: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub events: Vec<RoastEvent>,
    pub created_at: DateTime<Utc>,
}

impl CompletedRoast {
    pub fn from_new(id: Uuid, roast: NewRoast, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            lot_id: roast.lot_id,
            started_at: roast.started_at,
            ended_at: roast.ended_at,
            roast_level: roast.roast_level,
            green_weight_grams: roast.green_weight_grams,
            roasted_weight_grams: roast.roasted_weight_grams,
            yield_percent: roast.yield_percent,
            notes: roast.notes,
            events: roast.events,
            created_at,
        }
    }
}
