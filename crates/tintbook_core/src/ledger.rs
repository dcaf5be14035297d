// --- File: crates/tintbook_core/src/ledger.rs ---
//! Storage contracts for the booking ledger and the admin toggle stores.
//!
//! The core depends on storage only through these traits, so the backing
//! implementation (SQLite, in-memory test double) can be swapped without
//! touching the scheduling logic. All traits are object-safe and return
//! boxed futures, following the service-abstraction pattern used elsewhere
//! in the workspace.

use crate::models::{OverrideScope, Reservation, ReservationStatus, SlotOverride};
use chrono::NaiveDate;
use thiserror::Error;
use tintbook_common::services::BoxFuture;

/// Errors surfaced by ledger and toggle stores.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// An active reservation already holds the requested window. Raised by
    /// stores that enforce the per-date uniqueness discipline at write time.
    #[error("conflicting active reservation on {date} at {start}")]
    Conflict {
        date: NaiveDate,
        start: chrono::NaiveTime,
    },

    /// No reservation with the given id.
    #[error("reservation not found: {0}")]
    NotFound(String),

    /// Backend failure (pool, query, serialization of a stored row).
    #[error("storage error: {0}")]
    Storage(String),
}

/// The authoritative, append-only set of reservations.
///
/// `insert` and `update_status` are the only mutations; records are never
/// deleted. Reads used for conflict checking must reflect the latest
/// committed writes.
pub trait BookingLedger: Send + Sync {
    /// Insert a new reservation. Implementations that can detect a
    /// conflicting active reservation atomically (e.g. via a uniqueness
    /// constraint) return `LedgerError::Conflict` for the losing insert.
    fn insert(&self, reservation: Reservation) -> BoxFuture<'_, Reservation, LedgerError>;

    /// All reservations on a date, regardless of status.
    fn find_by_date(&self, date: NaiveDate) -> BoxFuture<'_, Vec<Reservation>, LedgerError>;

    /// All reservations with `from <= date <= to`, ordered by date and start.
    fn find_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> BoxFuture<'_, Vec<Reservation>, LedgerError>;

    fn find_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Option<Reservation>, LedgerError>;

    /// The only allowed lifecycle mutation. A payment reference may be
    /// attached alongside the transition to `deposit_paid`. Callers are
    /// responsible for validating the transition itself.
    fn update_status<'a>(
        &'a self,
        id: &'a str,
        status: ReservationStatus,
        payment_ref: Option<String>,
    ) -> BoxFuture<'a, Reservation, LedgerError>;

    /// Attach the mirrored calendar event reference once the mirror
    /// collaborator reports success.
    fn attach_calendar_ref<'a>(
        &'a self,
        id: &'a str,
        event_ref: &'a str,
    ) -> BoxFuture<'a, (), LedgerError>;
}

/// Admin slot enable/disable overrides, keyed by scope and start time.
pub trait OverrideStore: Send + Sync {
    /// Upsert an override for (scope, start).
    fn set(&self, slot_override: SlotOverride) -> BoxFuture<'_, (), LedgerError>;

    /// All overrides that could affect `date`: weekday-scoped ones for the
    /// date's weekday plus date-scoped ones for the date itself.
    fn for_date(
        &self,
        date: NaiveDate,
        weekday: u8,
    ) -> BoxFuture<'_, Vec<SlotOverride>, LedgerError>;

    /// All stored overrides (admin dashboard feed).
    fn list(&self) -> BoxFuture<'_, Vec<SlotOverride>, LedgerError>;
}

/// Availability toggles for the work-item catalog (tier x item).
/// Orthogonal to scheduling but shares the admin surface.
pub trait WorkItemCatalog: Send + Sync {
    fn set_availability<'a>(
        &'a self,
        tier: &'a str,
        item: &'a str,
        available: bool,
    ) -> BoxFuture<'a, (), LedgerError>;

    /// Items currently toggled off for a tier. Absent entries are available.
    fn disabled_items<'a>(&'a self, tier: &'a str) -> BoxFuture<'a, Vec<String>, LedgerError>;
}

/// Convenience lookup used by coordinator and availability resolver:
/// date-scoped override wins, then weekday-scoped, then enabled-by-default.
pub fn override_allows(
    overrides: &[SlotOverride],
    date: NaiveDate,
    start: chrono::NaiveTime,
) -> bool {
    let mut weekday_enabled: Option<bool> = None;
    for o in overrides {
        if o.start != start {
            continue;
        }
        match o.scope {
            OverrideScope::Date(d) if d == date => return o.enabled,
            OverrideScope::Weekday(_) => weekday_enabled = Some(o.enabled),
            _ => {}
        }
    }
    weekday_enabled.unwrap_or(true)
}
