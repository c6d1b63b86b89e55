//! Business logic services for the roast companion

pub mod inventory;
pub mod roasting;
pub mod session;

pub use inventory::InventoryService;
pub use roasting::RoastingService;
pub use session::{SessionService, SharedSession};

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};

/// Decode a decimal column stored as exact text
pub(crate) fn decode_decimal(column: &str, value: &str) -> AppResult<Decimal> {
    Decimal::from_str(value)
        .map_err(|_| AppError::CorruptRecord(format!("{} is not a decimal: {:?}", column, value)))
}

/// Decode an enum column stored by name
pub(crate) fn decode_enum<T>(
    column: &str,
    value: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> AppResult<T> {
    parse(value)
        .ok_or_else(|| AppError::CorruptRecord(format!("{} has unknown value {:?}", column, value)))
}
