//! SQLite persistence for Tintbook.
//!
//! Implements the core storage contracts (`BookingLedger`, `OverrideStore`,
//! `WorkItemCatalog`) on top of SQLx.

pub mod client;
pub mod error;
pub mod repositories;

pub use client::DbClient;
pub use error::DbError;
pub use repositories::booking_ledger_sql::SqlBookingLedger;
pub use repositories::init_schema;
pub use repositories::toggles_sql::{SqlOverrideStore, SqlWorkItemCatalog};
