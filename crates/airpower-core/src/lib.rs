//! Core domain types and utilities for the Airpower server.
//!
//! This crate holds the validated domain models shared by the storage and
//! HTTP layers:
//!
//! - [`Budget`] - a spending budget with category and optional due date
//! - [`PowerReading`] - a single power-usage measurement
//! - [`Recommendation`] - a saved energy-saving recommendation
//!
//! All models validate their fields at construction time, so the HTTP layer
//! can deserialize a typed request and convert it into a model without
//! re-checking invariants downstream.

pub mod budget;
pub mod error;
pub mod id;
pub mod reading;
pub mod recommendation;

pub use budget::{Budget, BudgetCategory};
pub use error::{CoreError, Result};
pub use id::new_id;
pub use reading::{PowerReading, UsageUnit};
pub use recommendation::Recommendation;
