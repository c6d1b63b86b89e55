//! Validation for roast sessions and inventory inputs
//!
//! Two layers: structural parsing of form inputs into validated values
//! (returning a field-level [`ValidationError`]), and the event-sequence
//! predicate that gates every milestone transition.

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::metrics::derive_yield_percent;
use crate::models::{
    event_timestamp, AdjustmentReason, CoffeeProcess, NewRoast, RoastEvent, RoastEventType,
    RoastLevel, CANONICAL_EVENT_ORDER,
};
use crate::units::normalize_lbs;

// ============================================================================
// Event Sequence
// ============================================================================

/// Why an event log is not a valid milestone sequence
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("event log has {len} events, at most 4 are allowed")]
    TooManyEvents { len: usize },

    #[error("event {index} is {found}, expected {expected}")]
    OutOfOrder {
        index: usize,
        expected: RoastEventType,
        found: RoastEventType,
    },

    #[error("event {index} at {at} is earlier than the previous event at {previous}")]
    TimestampRegression { index: usize, previous: i64, at: i64 },
}

/// Check that `events` is an exact prefix of START → FIRST_CRACK → DROP → STOP
/// with non-decreasing timestamps
pub fn validate_event_sequence(events: &[RoastEvent]) -> Result<(), SequenceError> {
    if events.len() > CANONICAL_EVENT_ORDER.len() {
        return Err(SequenceError::TooManyEvents { len: events.len() });
    }

    let mut previous: Option<i64> = None;
    for (index, (event, expected)) in events.iter().zip(CANONICAL_EVENT_ORDER).enumerate() {
        if event.kind != expected {
            return Err(SequenceError::OutOfOrder {
                index,
                expected,
                found: event.kind,
            });
        }
        if let Some(previous) = previous {
            if event.at < previous {
                return Err(SequenceError::TimestampRegression {
                    index,
                    previous,
                    at: event.at,
                });
            }
        }
        previous = Some(event.at);
    }

    Ok(())
}

pub fn is_event_sequence_valid(events: &[RoastEvent]) -> bool {
    validate_event_sequence(events).is_ok()
}

/// Would appending `candidate` keep the log valid
pub fn can_append_event(events: &[RoastEvent], candidate: RoastEvent) -> bool {
    let mut next = Vec::with_capacity(events.len() + 1);
    next.extend_from_slice(events);
    next.push(candidate);
    is_event_sequence_valid(&next)
}

// ============================================================================
// Field Validation
// ============================================================================

/// Field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn require<T>(value: Option<T>, field: &'static str, message: &str) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::new(field, message))
}

fn positive(value: Decimal, field: &'static str, message: &str) -> Result<Decimal, ValidationError> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::new(field, message));
    }
    Ok(value)
}

/// Trim free text; blank becomes `None`
pub fn clean_text(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Pre-roast form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BeginRoastInput {
    pub green_weight_grams: Option<Decimal>,
    pub lot_id: Option<Uuid>,
}

/// Validated pre-roast form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeginRoast {
    pub green_weight_grams: Decimal,
    pub lot_id: Uuid,
}

impl BeginRoastInput {
    pub fn validate(&self) -> Result<BeginRoast, ValidationError> {
        let green = require(
            self.green_weight_grams,
            "green_weight_grams",
            "Green weight is required",
        )?;
        let green_weight_grams = positive(
            green,
            "green_weight_grams",
            "Green weight must be greater than zero",
        )?;
        let lot_id = require(self.lot_id, "lot_id", "Select a lot before starting the roast")?;
        Ok(BeginRoast {
            green_weight_grams,
            lot_id,
        })
    }
}

/// Post-roast form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostRoastInput {
    pub roast_level: Option<RoastLevel>,
    pub roasted_weight_grams: Option<Decimal>,
}

/// Validated post-roast form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostRoast {
    pub roast_level: RoastLevel,
    pub roasted_weight_grams: Decimal,
}

impl PostRoastInput {
    /// `green_weight_grams` is the weight recorded when the roast began
    pub fn validate(&self, green_weight_grams: Option<Decimal>) -> Result<PostRoast, ValidationError> {
        let roast_level = require(self.roast_level, "roast_level", "Roast level is required")?;
        let roasted = require(
            self.roasted_weight_grams,
            "roasted_weight_grams",
            "Roasted weight is required",
        )?;
        let roasted_weight_grams = positive(
            roasted,
            "roasted_weight_grams",
            "Roasted weight must be greater than zero",
        )?;
        check_roasted_within_green(green_weight_grams, roasted_weight_grams)?;
        Ok(PostRoast {
            roast_level,
            roasted_weight_grams,
        })
    }
}

fn check_roasted_within_green(
    green_weight_grams: Option<Decimal>,
    roasted_weight_grams: Decimal,
) -> Result<(), ValidationError> {
    match green_weight_grams {
        Some(green) if roasted_weight_grams > green => Err(ValidationError::new(
            "roasted_weight_grams",
            "Roasted weight must be less than or equal to green weight",
        )),
        Some(_) => Ok(()),
        None => Err(ValidationError::new(
            "green_weight_grams",
            "No green weight recorded for this roast",
        )),
    }
}

/// New coffee form
#[derive(Debug, Clone, Deserialize)]
pub struct CoffeeInput {
    pub name: String,
    pub origin: Option<String>,
    pub process: CoffeeProcess,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCoffee {
    pub name: String,
    pub origin: Option<String>,
    pub process: CoffeeProcess,
}

impl CoffeeInput {
    pub fn validate(&self) -> Result<NewCoffee, ValidationError> {
        let name = clean_text(Some(&self.name))
            .ok_or_else(|| ValidationError::new("name", "Coffee name is required"))?;
        Ok(NewCoffee {
            name,
            origin: clean_text(self.origin.as_deref()),
            process: self.process,
        })
    }
}

/// New lot form
#[derive(Debug, Clone, Deserialize)]
pub struct LotInput {
    pub coffee_id: Uuid,
    pub label: String,
    pub starting_inventory_lbs: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLot {
    pub coffee_id: Uuid,
    pub label: String,
    /// Already normalized
    pub starting_inventory_lbs: Decimal,
}

impl LotInput {
    pub fn validate(&self) -> Result<NewLot, ValidationError> {
        let label = clean_text(Some(&self.label))
            .ok_or_else(|| ValidationError::new("label", "Lot label is required"))?;
        if self.starting_inventory_lbs < Decimal::ZERO {
            return Err(ValidationError::new(
                "starting_inventory_lbs",
                "Starting inventory must be 0 or more",
            ));
        }
        Ok(NewLot {
            coffee_id: self.coffee_id,
            label,
            starting_inventory_lbs: normalize_lbs(self.starting_inventory_lbs),
        })
    }
}

/// Lot edit form; only provided fields change
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LotUpdateInput {
    pub label: Option<String>,
    pub starting_inventory_lbs: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LotUpdate {
    pub label: Option<String>,
    pub starting_inventory_lbs: Option<Decimal>,
}

impl LotUpdateInput {
    pub fn validate(&self) -> Result<LotUpdate, ValidationError> {
        let label = match &self.label {
            Some(label) => Some(
                clean_text(Some(label))
                    .ok_or_else(|| ValidationError::new("label", "Lot label is required"))?,
            ),
            None => None,
        };
        let starting_inventory_lbs = match self.starting_inventory_lbs {
            Some(value) if value < Decimal::ZERO => {
                return Err(ValidationError::new(
                    "starting_inventory_lbs",
                    "Starting inventory must be 0 or more",
                ))
            }
            Some(value) => Some(normalize_lbs(value)),
            None => None,
        };
        Ok(LotUpdate {
            label,
            starting_inventory_lbs,
        })
    }
}

/// Manual adjustment form
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustmentInput {
    pub lot_id: Uuid,
    pub amount_lbs: Decimal,
    pub reason: AdjustmentReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewAdjustment {
    pub lot_id: Uuid,
    /// Signed, normalized, never zero
    pub amount_lbs: Decimal,
    pub reason: AdjustmentReason,
}

impl AdjustmentInput {
    pub fn validate(&self) -> Result<NewAdjustment, ValidationError> {
        let amount_lbs = normalize_lbs(self.amount_lbs);
        if amount_lbs.is_zero() {
            return Err(ValidationError::new(
                "amount_lbs",
                "Adjustment amount must be non-zero",
            ));
        }
        Ok(NewAdjustment {
            lot_id: self.lot_id,
            amount_lbs,
            reason: self.reason,
        })
    }
}

// ============================================================================
// Roast Records
// ============================================================================

/// Check a roast before it is written to the ledger
pub fn validate_new_roast(roast: &NewRoast) -> Result<(), ValidationError> {
    if roast.events.is_empty() {
        return Err(ValidationError::new("events", "At least a START event is required"));
    }
    validate_event_sequence(&roast.events)
        .map_err(|err| ValidationError::new("events", err.to_string()))?;

    let started_at = event_timestamp(&roast.events, RoastEventType::Start);
    let ended_at = event_timestamp(&roast.events, RoastEventType::Stop);
    if started_at != Some(roast.started_at) || ended_at != Some(roast.ended_at) {
        return Err(ValidationError::new(
            "events",
            "Roast must run from START to STOP",
        ));
    }

    positive(
        roast.green_weight_grams,
        "green_weight_grams",
        "Green weight must be greater than zero",
    )?;
    positive(
        roast.roasted_weight_grams,
        "roasted_weight_grams",
        "Roasted weight must be greater than zero",
    )?;
    check_roasted_within_green(Some(roast.green_weight_grams), roast.roasted_weight_grams)?;

    if derive_yield_percent(roast.green_weight_grams, roast.roasted_weight_grams)
        != Some(roast.yield_percent)
    {
        return Err(ValidationError::new(
            "yield_percent",
            "Yield does not match the recorded weights",
        ));
    }

    Ok(())
}
