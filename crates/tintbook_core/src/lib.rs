// --- File: crates/tintbook_core/src/lib.rs ---
// Declare modules within this crate
pub mod auth;
pub mod availability;
#[cfg(test)]
mod availability_test;
pub mod coordinator;
pub mod handlers;
pub mod ledger;
pub mod memory;
pub mod models;
pub mod pricing;
pub mod routes;
pub mod schedule;
#[cfg(test)]
mod schedule_proptest;
#[cfg(test)]
mod schedule_test;
