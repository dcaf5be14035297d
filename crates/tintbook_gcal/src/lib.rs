// --- File: crates/tintbook_gcal/src/lib.rs ---
// Declare modules within this crate
pub mod service;
pub mod worker;
#[cfg(test)]
mod worker_test;
