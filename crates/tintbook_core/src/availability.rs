// --- File: crates/tintbook_core/src/availability.rs ---
//! The availability resolver.
//!
//! Combines generated candidate slots with admin overrides and ledger state
//! to produce the final bookable list for a date. Disabled slots are kept in
//! the output (the UI greys them out), only annotated.

use crate::ledger::{override_allows, BookingLedger, LedgerError, OverrideStore};
use crate::models::{overlaps, Reservation};
use crate::schedule::{weekday_of, ScheduleRules, SlotWindow};
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::collections::HashSet;
use tintbook_common::TintbookError;
use tracing::debug;

/// A candidate slot annotated with its final bookable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotStatus {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub enabled: bool,
}

impl From<LedgerError> for TintbookError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Conflict { date, start } => TintbookError::ConflictError(format!(
                "time already booked: {date} {}",
                start.format("%H:%M")
            )),
            LedgerError::NotFound(id) => TintbookError::NotFoundError(id),
            LedgerError::Storage(msg) => TintbookError::DatabaseError(msg),
        }
    }
}

/// Resolves the bookable slots for `date`.
///
/// A slot ends up disabled when an admin override disables it, when its
/// window overlaps an active reservation (half-open intervals), or — on the
/// configured high-volume weekday only — when it starts exactly one hour
/// after an active reservation's start (cleanup buffer between back-to-back
/// jobs).
pub async fn resolve_availability(
    date: NaiveDate,
    rules: &ScheduleRules,
    ledger: &dyn BookingLedger,
    overrides: &dyn OverrideStore,
) -> Result<Vec<SlotStatus>, TintbookError> {
    let weekday = weekday_of(date);
    let candidates = rules.generate_slots(weekday);
    if candidates.is_empty() {
        return Ok(Vec::new()); // closed day
    }

    let slot_overrides = overrides.for_date(date, weekday).await?;
    let reservations = ledger.find_by_date(date).await?;
    let active: Vec<&Reservation> = reservations
        .iter()
        .filter(|r| r.status.is_active())
        .collect();

    // Adjacency rule: on the busy weekday, the slot starting one hour after
    // any active reservation's start is blocked as well.
    let adjacency_blocked: HashSet<NaiveTime> = if weekday == rules.adjacency_weekday() {
        active
            .iter()
            .filter_map(|r| ScheduleRules::adjacent_blocked_start(r.start_time))
            .collect()
    } else {
        HashSet::new()
    };

    let slots = candidates
        .iter()
        .map(|&SlotWindow { start, end }| {
            let admin_enabled = override_allows(&slot_overrides, date, start);
            let booked = active
                .iter()
                .any(|r| overlaps(r.start_time, r.end_time, start, end));
            let buffered = adjacency_blocked.contains(&start);
            SlotStatus {
                start,
                end,
                enabled: admin_enabled && !booked && !buffered,
            }
        })
        .collect::<Vec<_>>();

    debug!(
        %date,
        weekday,
        total = slots.len(),
        enabled = slots.iter().filter(|s| s.enabled).count(),
        "resolved availability"
    );
    Ok(slots)
}
