// --- File: crates/tintbook_core/src/models.rs ---
//! Core data model: reservations, their lifecycle, and admin slot overrides.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a reservation.
///
/// A reservation is created in `PendingPayment`, moves to `DepositPaid` when
/// the payment collaborator reports the deposit, and can end up `Cancelled`
/// or `Refunded` through admin action. Records are never deleted; freeing a
/// slot is always a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    PendingPayment,
    DepositPaid,
    Cancelled,
    Refunded,
}

impl ReservationStatus {
    /// Active reservations are the ones that hold their time window.
    pub fn is_active(&self) -> bool {
        !matches!(
            self,
            ReservationStatus::Cancelled | ReservationStatus::Refunded
        )
    }

    /// The allowed lifecycle edges. `cancelled` and `refunded` are terminal.
    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        matches!(
            (self, next),
            (PendingPayment, DepositPaid)
                | (PendingPayment, Cancelled)
                | (DepositPaid, Cancelled)
                | (DepositPaid, Refunded)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::PendingPayment => "pending_payment",
            ReservationStatus::DepositPaid => "deposit_paid",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<ReservationStatus> {
        match s {
            "pending_payment" => Some(ReservationStatus::PendingPayment),
            // "confirmed" was used interchangeably with "deposit_paid" by the
            // shop's earlier tooling; accept it on the way in.
            "deposit_paid" | "confirmed" => Some(ReservationStatus::DepositPaid),
            "cancelled" => Some(ReservationStatus::Cancelled),
            "refunded" => Some(ReservationStatus::Refunded),
            _ => None,
        }
    }
}

/// Customer contact block. Opaque to the scheduling logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub vehicle: String,
}

/// A customer's claim on a date/time window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub customer: CustomerDetails,
    /// Selected tint tier (e.g. "carbon", "ceramic").
    pub tint_quality: String,
    /// Selected shade, passed through opaquely.
    pub tint_shade: String,
    /// Selected work items (e.g. "front_doors").
    pub windows: Vec<String>,
    /// Total price in cents.
    pub amount_total: i64,
    /// 50% deposit in cents, floored.
    pub amount_deposit: i64,
    pub status: ReservationStatus,
    /// Reference handed back by the payment processor on deposit capture.
    pub payment_ref: Option<String>,
    /// Reference of the mirrored calendar event, if mirroring succeeded.
    pub calendar_event_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Half-open interval overlap test: a slot ending exactly when another
    /// begins is not a conflict.
    pub fn overlaps(&self, start: NaiveTime, end: NaiveTime) -> bool {
        overlaps(self.start_time, self.end_time, start, end)
    }
}

/// `[a_start, a_end)` vs `[b_start, b_end)` overlap.
pub fn overlaps(a_start: NaiveTime, a_end: NaiveTime, b_start: NaiveTime, b_end: NaiveTime) -> bool {
    a_start < b_end && b_start < a_end
}

/// What a slot override applies to: every occurrence of a weekday, or one
/// concrete calendar date. Date-scoped overrides win over weekday-scoped ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverrideScope {
    Weekday(u8),
    Date(NaiveDate),
}

/// An admin toggle for a slot the schedule would otherwise offer.
/// Overrides can only disable (or restore) declared slots, never invent new ones.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SlotOverride {
    pub scope: OverrideScope,
    pub start: NaiveTime,
    pub enabled: bool,
}
