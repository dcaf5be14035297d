// --- File: crates/tintbook_core/src/coordinator.rs ---
//! The reservation coordinator: validates booking requests against current
//! availability, prices them, and atomically commits new reservations.
//!
//! Concurrency discipline: availability re-check, ledger conflict re-check
//! and the insert for a given date run inside one per-date critical section,
//! so two racing requests for the same window cannot both observe "free".
//! Stores that additionally enforce uniqueness at write time turn the losing
//! insert into a `ConflictError` as a second line of defense.

use crate::availability::{resolve_availability, SlotStatus};
use crate::ledger::{override_allows, BookingLedger, LedgerError, OverrideStore, WorkItemCatalog};
use crate::models::{
    overlaps, CustomerDetails, OverrideScope, Reservation, ReservationStatus, SlotOverride,
};
use crate::pricing::price_booking;
use crate::schedule::{parse_wall_time, weekday_of, ScheduleRules};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tintbook_common::{validation_error, TintbookError};
use tintbook_config::PricingConfig;
use tracing::{info, warn};
use uuid::Uuid;

/// A booking request as submitted by the frontend. Dates and times arrive as
/// strings and are validated here; everything else is required non-empty.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub vehicle: String,
    pub tint_quality: String,
    pub tint_shade: String,
    /// Selected work items, e.g. ["front_doors", "front_windshield"].
    pub windows: Vec<String>,
    /// Calendar day, "YYYY-MM-DD".
    pub date: String,
    /// Wall-clock slot start, "HH:MM".
    pub start_time: String,
    /// Optional; when present it must match the slot's end.
    pub end_time: Option<String>,
}

fn require_field(value: &str, name: &str) -> Result<(), TintbookError> {
    if value.trim().is_empty() {
        return Err(validation_error(format!("missing field: {name}")));
    }
    Ok(())
}

/// Parses a "YYYY-MM-DD" calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate, TintbookError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| validation_error(format!("invalid date (expected YYYY-MM-DD): {s}")))
}

/// Serializes availability reads and conflict-checked inserts per date.
#[derive(Default)]
struct DateLocks {
    inner: Mutex<HashMap<NaiveDate, Arc<tokio::sync::Mutex<()>>>>,
}

impl DateLocks {
    fn lock_for(&self, date: NaiveDate) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock().expect("date lock map poisoned");
        // drop entries nobody holds anymore so the map does not grow with
        // every date ever booked
        map.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(map.entry(date).or_default())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().expect("date lock map poisoned").len()
    }
}

pub struct ReservationCoordinator {
    rules: ScheduleRules,
    pricing: PricingConfig,
    ledger: Arc<dyn BookingLedger>,
    overrides: Arc<dyn OverrideStore>,
    catalog: Arc<dyn WorkItemCatalog>,
    date_locks: DateLocks,
}

impl ReservationCoordinator {
    pub fn new(
        rules: ScheduleRules,
        pricing: PricingConfig,
        ledger: Arc<dyn BookingLedger>,
        overrides: Arc<dyn OverrideStore>,
        catalog: Arc<dyn WorkItemCatalog>,
    ) -> Self {
        ReservationCoordinator {
            rules,
            pricing,
            ledger,
            overrides,
            catalog,
            date_locks: DateLocks::default(),
        }
    }

    pub fn rules(&self) -> &ScheduleRules {
        &self.rules
    }

    pub fn ledger(&self) -> Arc<dyn BookingLedger> {
        Arc::clone(&self.ledger)
    }

    /// The bookable slots for a date, disabled ones included.
    pub async fn availability(&self, date: NaiveDate) -> Result<Vec<SlotStatus>, TintbookError> {
        resolve_availability(date, &self.rules, self.ledger.as_ref(), self.overrides.as_ref())
            .await
    }

    /// Validates, prices and commits a booking request.
    ///
    /// Validation failures carry a specific reason; a race lost against a
    /// concurrent booking surfaces as `ConflictError` so the client knows to
    /// re-fetch availability instead of fixing the form.
    pub async fn create_reservation(
        &self,
        request: BookingRequest,
    ) -> Result<Reservation, TintbookError> {
        require_field(&request.full_name, "full_name")?;
        require_field(&request.phone, "phone")?;
        require_field(&request.email, "email")?;
        require_field(&request.vehicle, "vehicle")?;
        require_field(&request.tint_quality, "tint_quality")?;
        require_field(&request.tint_shade, "tint_shade")?;
        if request.windows.is_empty() {
            return Err(validation_error("missing field: windows"));
        }
        let date = parse_date(&request.date)?;
        let start = parse_wall_time(&request.start_time)?;

        // Catalog check before taking the date lock; it does not depend on
        // ledger state.
        let disabled = self.catalog.disabled_items(&request.tint_quality).await?;
        if let Some(item) = request.windows.iter().find(|w| disabled.contains(w)) {
            return Err(validation_error(format!(
                "work item currently unavailable: {item}"
            )));
        }

        let quote = price_booking(&self.pricing, &request.tint_quality, &request.windows)?;

        // Critical section: availability re-check and insert must not
        // interleave with another booking for the same date.
        let lock = self.date_locks.lock_for(date);
        let _guard = lock.lock().await;

        let weekday = weekday_of(date);
        let slot = self
            .rules
            .generate_slots(weekday)
            .into_iter()
            .find(|s| s.start == start)
            .ok_or_else(|| validation_error("time slot not available"))?;
        if let Some(end_str) = &request.end_time {
            let end = parse_wall_time(end_str)?;
            if end != slot.end {
                return Err(validation_error("end_time does not match the slot"));
            }
        }

        let slot_overrides = self.overrides.for_date(date, weekday).await?;
        if !override_allows(&slot_overrides, date, start) {
            return Err(validation_error("time slot not available"));
        }

        // A window lost to another reservation is a conflict, not a form
        // error: the client should re-fetch availability, not edit fields.
        let existing = self.ledger.find_by_date(date).await?;
        let active: Vec<&Reservation> =
            existing.iter().filter(|r| r.status.is_active()).collect();
        if active
            .iter()
            .any(|r| overlaps(r.start_time, r.end_time, slot.start, slot.end))
        {
            return Err(TintbookError::ConflictError(
                "time already booked".to_string(),
            ));
        }
        if weekday == self.rules.adjacency_weekday()
            && active
                .iter()
                .any(|r| ScheduleRules::adjacent_blocked_start(r.start_time) == Some(slot.start))
        {
            return Err(TintbookError::ConflictError(
                "time blocked by an adjacent booking".to_string(),
            ));
        }

        let reservation = Reservation {
            id: Uuid::new_v4().to_string(),
            date,
            start_time: slot.start,
            end_time: slot.end,
            customer: CustomerDetails {
                full_name: request.full_name,
                phone: request.phone,
                email: request.email,
                vehicle: request.vehicle,
            },
            tint_quality: request.tint_quality,
            tint_shade: request.tint_shade,
            windows: request.windows,
            amount_total: quote.amount_total,
            amount_deposit: quote.amount_deposit,
            status: ReservationStatus::PendingPayment,
            payment_ref: None,
            calendar_event_ref: None,
            created_at: Utc::now(),
        };

        let inserted = self.ledger.insert(reservation).await.map_err(|e| match e {
            LedgerError::Conflict { .. } => {
                TintbookError::ConflictError("time already booked".to_string())
            }
            other => other.into(),
        })?;

        info!(
            id = %inserted.id,
            date = %inserted.date,
            start = %inserted.start_time.format("%H:%M"),
            total = inserted.amount_total,
            "reservation created"
        );
        Ok(inserted)
    }

    pub async fn find(&self, id: &str) -> Result<Reservation, TintbookError> {
        self.ledger
            .find_by_id(id)
            .await?
            .ok_or_else(|| TintbookError::NotFoundError(format!("booking not found: {id}")))
    }

    /// Transition to `deposit_paid`, attaching the payment reference.
    /// Re-delivery of the payment notification is a no-op.
    pub async fn mark_paid(
        &self,
        id: &str,
        payment_ref: &str,
    ) -> Result<Reservation, TintbookError> {
        let current = self.find(id).await?;
        if current.status == ReservationStatus::DepositPaid {
            return Ok(current); // webhook redelivery
        }
        self.transition(&current, ReservationStatus::DepositPaid, Some(payment_ref))
            .await
    }

    /// Cancel a reservation. Cancelling an already-cancelled one is an
    /// idempotent no-op; the freed slot reappears on the next availability
    /// read because the resolver ignores cancelled reservations.
    pub async fn cancel(&self, id: &str) -> Result<Reservation, TintbookError> {
        let current = self.find(id).await?;
        if current.status == ReservationStatus::Cancelled {
            return Ok(current);
        }
        self.transition(&current, ReservationStatus::Cancelled, None)
            .await
    }

    /// Flip a paid reservation to `refunded`. The actual money movement is
    /// the payment collaborator's job and must have succeeded before this is
    /// called.
    pub async fn refund(&self, id: &str) -> Result<Reservation, TintbookError> {
        let current = self.find(id).await?;
        self.transition(&current, ReservationStatus::Refunded, None)
            .await
    }

    async fn transition(
        &self,
        current: &Reservation,
        next: ReservationStatus,
        payment_ref: Option<&str>,
    ) -> Result<Reservation, TintbookError> {
        if !current.status.can_transition_to(next) {
            return Err(TintbookError::InvalidStateTransition(format!(
                "{} -> {}",
                current.status.as_str(),
                next.as_str()
            )));
        }
        let updated = self
            .ledger
            .update_status(&current.id, next, payment_ref.map(String::from))
            .await?;
        info!(id = %updated.id, status = updated.status.as_str(), "reservation status changed");
        Ok(updated)
    }

    /// Admin override write. Only slots the schedule actually generates for
    /// the scope's weekday can be toggled.
    pub async fn toggle_slot(
        &self,
        scope: OverrideScope,
        start: NaiveTime,
        enabled: bool,
    ) -> Result<(), TintbookError> {
        let weekday = match scope {
            OverrideScope::Weekday(w) if w <= 6 => w,
            OverrideScope::Weekday(w) => {
                return Err(validation_error(format!("invalid weekday: {w}")));
            }
            OverrideScope::Date(date) => weekday_of(date),
        };
        let known = self
            .rules
            .generate_slots(weekday)
            .iter()
            .any(|s| s.start == start);
        if !known {
            return Err(validation_error(format!(
                "no configured slot at {} on weekday {weekday}",
                start.format("%H:%M")
            )));
        }
        self.overrides
            .set(SlotOverride {
                scope,
                start,
                enabled,
            })
            .await?;
        info!(?scope, start = %start.format("%H:%M"), enabled, "slot override stored");
        Ok(())
    }

    /// Admin catalog toggle. The tier must exist in the price table; the
    /// item key is accepted as-is so the catalog can be curated ahead of a
    /// price change.
    pub async fn toggle_work_item(
        &self,
        tier: &str,
        item: &str,
        available: bool,
    ) -> Result<(), TintbookError> {
        if !self.pricing.tiers.contains_key(tier) {
            return Err(validation_error(format!("unknown tint quality: {tier}")));
        }
        self.catalog.set_availability(tier, item, available).await?;
        info!(tier, item, available, "work item availability stored");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn date_lock_count(&self) -> usize {
        self.date_locks.len()
    }

    /// Admin listing over a date range.
    pub async fn bookings_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Reservation>, TintbookError> {
        if to < from {
            return Err(validation_error("'to' must not be before 'from'"));
        }
        if let Ok(days) = usize::try_from((to - from).num_days()) {
            if days > 366 {
                warn!(%from, %to, "large admin range query");
            }
        }
        Ok(self.ledger.find_in_range(from, to).await?)
    }
}
