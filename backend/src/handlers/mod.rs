//! HTTP request handlers

pub mod access;
pub mod health;
pub mod inventory;
pub mod roasting;
pub mod session;

pub use access::*;
pub use health::*;
pub use inventory::*;
pub use roasting::*;
pub use session::*;
