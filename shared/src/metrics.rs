//! Derived roast metrics
//!
//! Phase durations come from the milestone log; yield and loss come from the
//! green/roasted weight pair. Every function here is total: missing or
//! out-of-order inputs produce `None`, never a panic.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::{event_timestamp, RoastEvent, RoastEventType};

/// Phase durations in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimes {
    /// START to STOP
    pub total_ms: Option<i64>,
    /// FIRST_CRACK to DROP
    pub development_ms: Option<i64>,
    /// DROP to STOP
    pub cooling_ms: Option<i64>,
}

fn span(from: Option<i64>, to: Option<i64>) -> Option<i64> {
    match (from, to) {
        (Some(from), Some(to)) if to >= from => to.checked_sub(from),
        _ => None,
    }
}

/// Derive phase durations from an event log
pub fn derive_phase_times(events: &[RoastEvent]) -> PhaseTimes {
    let start = event_timestamp(events, RoastEventType::Start);
    let first_crack = event_timestamp(events, RoastEventType::FirstCrack);
    let drop = event_timestamp(events, RoastEventType::Drop);
    let stop = event_timestamp(events, RoastEventType::Stop);

    PhaseTimes {
        total_ms: span(start, stop),
        development_ms: span(first_crack, drop),
        cooling_ms: span(drop, stop),
    }
}

/// Development time ratio: development / total × 100
pub fn development_ratio_percent(times: &PhaseTimes) -> Option<Decimal> {
    match (times.development_ms, times.total_ms) {
        (Some(development), Some(total)) if total > 0 => {
            Some(Decimal::from(development) / Decimal::from(total) * Decimal::ONE_HUNDRED)
        }
        _ => None,
    }
}

/// Mass lost during roasting: (green − roasted) / green × 100
pub fn derive_loss_percent(green_grams: Decimal, roasted_grams: Decimal) -> Option<Decimal> {
    if green_grams <= Decimal::ZERO || roasted_grams <= Decimal::ZERO {
        return None;
    }
    Some((green_grams - roasted_grams) / green_grams * Decimal::ONE_HUNDRED)
}

/// Mass retained during roasting, always `100 − loss`
pub fn derive_yield_percent(green_grams: Decimal, roasted_grams: Decimal) -> Option<Decimal> {
    derive_loss_percent(green_grams, roasted_grams).map(|loss| Decimal::ONE_HUNDRED - loss)
}

/// Prefer a stored yield; fall back to a stored loss
pub fn resolve_yield_percent(
    yield_percent: Option<Decimal>,
    loss_percent: Option<Decimal>,
) -> Option<Decimal> {
    yield_percent.or_else(|| loss_percent.map(|loss| Decimal::ONE_HUNDRED - loss))
}

/// Render elapsed milliseconds as `m:ss`, clamping negatives to zero
pub fn format_elapsed_ms(elapsed_ms: i64) -> String {
    let total_seconds = elapsed_ms.max(0) / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

pub fn format_elapsed_or_placeholder(elapsed_ms: Option<i64>) -> String {
    match elapsed_ms {
        Some(ms) => format_elapsed_ms(ms),
        None => "--:--".to_string(),
    }
}

/// Render a yield as one decimal place with a percent sign, or `--`
pub fn format_yield_percent(value: Option<Decimal>) -> String {
    match value {
        Some(value) => {
            let rounded = value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
            format!("{:.1}%", rounded)
        }
        None => "--".to_string(),
    }
}
