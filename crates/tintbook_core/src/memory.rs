// --- File: crates/tintbook_core/src/memory.rs ---
//! In-memory implementations of the storage contracts.
//!
//! Used as the test double throughout the workspace and as the runtime store
//! when no database is configured (the shop ran for months on a flat file).

use crate::ledger::{BookingLedger, LedgerError, OverrideStore, WorkItemCatalog};
use crate::models::{OverrideScope, Reservation, ReservationStatus, SlotOverride};
use chrono::{NaiveDate, NaiveTime};
use std::collections::HashMap;
use std::sync::Mutex;
use tintbook_common::services::BoxFuture;

/// In-memory booking ledger. All operations take the inner lock, which also
/// makes the insert conflict check atomic with the write.
#[derive(Default)]
pub struct MemoryLedger {
    inner: Mutex<Vec<Reservation>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BookingLedger for MemoryLedger {
    fn insert(&self, reservation: Reservation) -> BoxFuture<'_, Reservation, LedgerError> {
        Box::pin(async move {
            let mut rows = self.inner.lock().expect("ledger lock poisoned");
            let clash = rows.iter().any(|r| {
                r.date == reservation.date
                    && r.status.is_active()
                    && r.overlaps(reservation.start_time, reservation.end_time)
            });
            if clash {
                return Err(LedgerError::Conflict {
                    date: reservation.date,
                    start: reservation.start_time,
                });
            }
            rows.push(reservation.clone());
            Ok(reservation)
        })
    }

    fn find_by_date(&self, date: NaiveDate) -> BoxFuture<'_, Vec<Reservation>, LedgerError> {
        Box::pin(async move {
            let rows = self.inner.lock().expect("ledger lock poisoned");
            let mut found: Vec<Reservation> =
                rows.iter().filter(|r| r.date == date).cloned().collect();
            found.sort_by_key(|r| r.start_time);
            Ok(found)
        })
    }

    fn find_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> BoxFuture<'_, Vec<Reservation>, LedgerError> {
        Box::pin(async move {
            let rows = self.inner.lock().expect("ledger lock poisoned");
            let mut found: Vec<Reservation> = rows
                .iter()
                .filter(|r| r.date >= from && r.date <= to)
                .cloned()
                .collect();
            found.sort_by_key(|r| (r.date, r.start_time));
            Ok(found)
        })
    }

    fn find_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Option<Reservation>, LedgerError> {
        Box::pin(async move {
            let rows = self.inner.lock().expect("ledger lock poisoned");
            Ok(rows.iter().find(|r| r.id == id).cloned())
        })
    }

    fn update_status<'a>(
        &'a self,
        id: &'a str,
        status: ReservationStatus,
        payment_ref: Option<String>,
    ) -> BoxFuture<'a, Reservation, LedgerError> {
        Box::pin(async move {
            let mut rows = self.inner.lock().expect("ledger lock poisoned");
            let row = rows
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
            row.status = status;
            if payment_ref.is_some() {
                row.payment_ref = payment_ref;
            }
            Ok(row.clone())
        })
    }

    fn attach_calendar_ref<'a>(
        &'a self,
        id: &'a str,
        event_ref: &'a str,
    ) -> BoxFuture<'a, (), LedgerError> {
        Box::pin(async move {
            let mut rows = self.inner.lock().expect("ledger lock poisoned");
            let row = rows
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
            row.calendar_event_ref = Some(event_ref.to_string());
            Ok(())
        })
    }
}

/// In-memory override store.
#[derive(Default)]
pub struct MemoryOverrideStore {
    inner: Mutex<HashMap<(OverrideScope, NaiveTime), bool>>,
}

impl MemoryOverrideStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OverrideStore for MemoryOverrideStore {
    fn set(&self, slot_override: SlotOverride) -> BoxFuture<'_, (), LedgerError> {
        Box::pin(async move {
            let mut map = self.inner.lock().expect("override lock poisoned");
            map.insert(
                (slot_override.scope, slot_override.start),
                slot_override.enabled,
            );
            Ok(())
        })
    }

    fn for_date(
        &self,
        date: NaiveDate,
        weekday: u8,
    ) -> BoxFuture<'_, Vec<SlotOverride>, LedgerError> {
        Box::pin(async move {
            let map = self.inner.lock().expect("override lock poisoned");
            Ok(map
                .iter()
                .filter(|((scope, _), _)| match scope {
                    OverrideScope::Weekday(w) => *w == weekday,
                    OverrideScope::Date(d) => *d == date,
                })
                .map(|((scope, start), enabled)| SlotOverride {
                    scope: *scope,
                    start: *start,
                    enabled: *enabled,
                })
                .collect())
        })
    }

    fn list(&self) -> BoxFuture<'_, Vec<SlotOverride>, LedgerError> {
        Box::pin(async move {
            let map = self.inner.lock().expect("override lock poisoned");
            Ok(map
                .iter()
                .map(|((scope, start), enabled)| SlotOverride {
                    scope: *scope,
                    start: *start,
                    enabled: *enabled,
                })
                .collect())
        })
    }
}

/// In-memory work-item availability catalog.
#[derive(Default)]
pub struct MemoryCatalog {
    inner: Mutex<HashMap<(String, String), bool>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkItemCatalog for MemoryCatalog {
    fn set_availability<'a>(
        &'a self,
        tier: &'a str,
        item: &'a str,
        available: bool,
    ) -> BoxFuture<'a, (), LedgerError> {
        Box::pin(async move {
            let mut map = self.inner.lock().expect("catalog lock poisoned");
            map.insert((tier.to_string(), item.to_string()), available);
            Ok(())
        })
    }

    fn disabled_items<'a>(&'a self, tier: &'a str) -> BoxFuture<'a, Vec<String>, LedgerError> {
        Box::pin(async move {
            let map = self.inner.lock().expect("catalog lock poisoned");
            Ok(map
                .iter()
                .filter(|((t, _), available)| t == tier && !**available)
                .map(|((_, item), _)| item.clone())
                .collect())
        })
    }
}
