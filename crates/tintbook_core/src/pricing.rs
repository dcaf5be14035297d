// --- File: crates/tintbook_core/src/pricing.rs ---
//! Pricing of a booking from the configured (tier x work item) table.

use tintbook_common::{validation_error, TintbookError};
use tintbook_config::PricingConfig;

/// Computed price for a booking, in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub amount_total: i64,
    pub amount_deposit: i64,
}

/// Sums the price table entries for the selected work items and computes the
/// 50% deposit (floored on odd cent totals).
///
/// An unknown tier or work item is a validation error rather than a silent
/// zero-priced line.
pub fn price_booking(
    pricing: &PricingConfig,
    tier: &str,
    items: &[String],
) -> Result<Quote, TintbookError> {
    let table = pricing
        .tiers
        .get(tier)
        .ok_or_else(|| validation_error(format!("unknown tint quality: {tier}")))?;

    let mut amount_total: i64 = 0;
    for item in items {
        let price = table
            .get(item)
            .ok_or_else(|| validation_error(format!("unknown work item: {item}")))?;
        amount_total += price;
    }

    Ok(Quote {
        amount_total,
        amount_deposit: amount_total / 2,
    })
}
