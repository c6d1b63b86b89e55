//! Request middleware

pub mod access;

pub use access::require_unlock;
