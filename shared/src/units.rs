//! Weight unit conversion
//!
//! Green coffee is weighed in grams at the roaster but stocked in pounds.
//! Every pound value written to the inventory passes through
//! [`normalize_lbs`] so balances never carry more than 3 decimal places.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept for pound quantities
pub const LBS_SCALE: u32 = 3;

/// Grams in one avoirdupois pound (453.592)
pub fn grams_per_lb() -> Decimal {
    Decimal::new(453_592, 3)
}

/// Convert grams to pounds (not normalized)
pub fn grams_to_lbs(grams: Decimal) -> Decimal {
    grams / grams_per_lb()
}

/// Convert pounds to grams
pub fn lbs_to_grams(lbs: Decimal) -> Decimal {
    lbs * grams_per_lb()
}

/// Round a pound quantity to exactly 3 decimal places, midpoints away from zero
pub fn normalize_lbs(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(LBS_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(LBS_SCALE);
    rounded
}

/// Convert grams to a normalized pound quantity ready for storage
pub fn grams_to_normalized_lbs(grams: Decimal) -> Decimal {
    normalize_lbs(grams_to_lbs(grams))
}
