// --- File: crates/tintbook_gcal/src/worker.rs ---
//! Outbox worker feeding paid bookings into the calendar mirror.
//!
//! Mirroring sits entirely off the payment path: the webhook handler pushes
//! the paid reservation into a bounded channel and acknowledges Stripe
//! immediately. This worker drains the channel, writes the event with a few
//! retries, and records the event reference on the booking. A mirror that is
//! down costs calendar entries, never payments.

use chrono::{NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tintbook_common::services::{BoxedError, CalendarMirror, MirrorEvent};
use tintbook_core::ledger::BookingLedger;
use tintbook_core::models::Reservation;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const QUEUE_CAPACITY: usize = 64;
const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_secs(2);

/// Handle for enqueueing paid bookings to be mirrored.
#[derive(Clone)]
pub struct MirrorOutbox {
    tx: mpsc::Sender<Reservation>,
}

impl MirrorOutbox {
    pub fn sender(&self) -> mpsc::Sender<Reservation> {
        self.tx.clone()
    }
}

/// Spawns the mirror worker and returns its outbox handle.
pub fn spawn_mirror_worker(
    mirror: Arc<dyn CalendarMirror<Error = BoxedError>>,
    ledger: Arc<dyn BookingLedger>,
    time_zone: Tz,
) -> MirrorOutbox {
    let (tx, mut rx) = mpsc::channel::<Reservation>(QUEUE_CAPACITY);
    tokio::spawn(async move {
        while let Some(reservation) = rx.recv().await {
            mirror_one(mirror.as_ref(), ledger.as_ref(), time_zone, reservation).await;
        }
        info!("calendar mirror worker shutting down");
    });
    MirrorOutbox { tx }
}

async fn mirror_one(
    mirror: &dyn CalendarMirror<Error = BoxedError>,
    ledger: &dyn BookingLedger,
    time_zone: Tz,
    reservation: Reservation,
) {
    let event = match build_event(&reservation, time_zone) {
        Some(event) => event,
        None => {
            // only possible for times falling into a DST gap
            error!(booking_id = %reservation.id, "could not map booking to calendar time");
            return;
        }
    };

    for attempt in 1..=MAX_ATTEMPTS {
        match mirror.create_event(event.clone()).await {
            Ok(result) => {
                if let Some(event_id) = result.event_id {
                    if let Err(e) = ledger.attach_calendar_ref(&reservation.id, &event_id).await {
                        warn!(booking_id = %reservation.id, "failed to record calendar ref: {e}");
                    }
                }
                info!(booking_id = %reservation.id, attempt, "booking mirrored to calendar");
                return;
            }
            Err(e) if attempt < MAX_ATTEMPTS => {
                warn!(booking_id = %reservation.id, attempt, "mirror attempt failed: {e}");
                tokio::time::sleep(RETRY_BASE_DELAY * attempt).await;
            }
            Err(e) => {
                error!(
                    booking_id = %reservation.id,
                    "giving up mirroring after {MAX_ATTEMPTS} attempts: {e}"
                );
            }
        }
    }
}

fn build_event(reservation: &Reservation, time_zone: Tz) -> Option<MirrorEvent> {
    let to_rfc3339 = |naive: NaiveDateTime| {
        time_zone
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.to_rfc3339())
    };

    let start_time = to_rfc3339(reservation.date.and_time(reservation.start_time))?;
    let end_time = to_rfc3339(reservation.date.and_time(reservation.end_time))?;

    let summary = format!(
        "Tint: {} ({} {})",
        reservation.customer.vehicle, reservation.tint_quality, reservation.tint_shade
    );
    let description = format!(
        "Customer: {}\nPhone: {}\nEmail: {}\nWork: {}\nTotal: {} cents (deposit {} paid)",
        reservation.customer.full_name,
        reservation.customer.phone,
        reservation.customer.email,
        reservation.windows.join(", "),
        reservation.amount_total,
        reservation.amount_deposit,
    );

    Some(MirrorEvent {
        start_time,
        end_time,
        time_zone: time_zone.name().to_string(),
        summary,
        description: Some(description),
    })
}
