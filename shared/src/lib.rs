//! Shared types and logic for the roast companion
//!
//! This crate holds everything that must behave identically on the server
//! and in the browser (via WASM): the roast session state machine, the
//! event-sequence validator, derived metrics and unit conversion.

pub mod metrics;
pub mod models;
pub mod session;
pub mod types;
pub mod units;
pub mod validation;

pub use metrics::*;
pub use models::*;
pub use session::*;
pub use types::*;
pub use units::*;
pub use validation::*;
