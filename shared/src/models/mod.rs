//! Domain models for the roast companion

mod inventory;
mod roast;

pub use inventory::*;
pub use roast::*;
