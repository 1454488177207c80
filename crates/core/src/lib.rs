//! Kapruka domain logic.
//!
//! Pure, synchronous building blocks shared by the event services and the
//! HTTP API. Nothing in this crate performs I/O.

pub mod alert;
pub mod error;
pub mod moisture;
pub mod threshold_validation;
pub mod types;
