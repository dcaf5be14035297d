// --- File: crates/tintbook_common/src/http.rs ---
//! HTTP utilities shared across the feature crates.

pub mod client;
