#[cfg(test)]
mod tests {
    use crate::worker::spawn_mirror_worker;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tintbook_common::services::{
        BoxFuture, BoxedError, CalendarMirror, MirrorEvent, MirrorEventResult,
    };
    use tintbook_core::ledger::BookingLedger;
    use tintbook_core::memory::MemoryLedger;
    use tintbook_core::models::{CustomerDetails, Reservation, ReservationStatus};

    /// Mirror double that fails the first `failures` create calls.
    struct FlakyMirror {
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyMirror {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl CalendarMirror for FlakyMirror {
        type Error = BoxedError;

        fn create_event(
            &self,
            _event: MirrorEvent,
        ) -> BoxFuture<'_, MirrorEventResult, Self::Error> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if call < self.failures {
                    Err(BoxedError(Box::new(std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        "calendar unreachable",
                    ))))
                } else {
                    Ok(MirrorEventResult {
                        event_id: Some("evt_mirrored".to_string()),
                        status: "confirmed".to_string(),
                    })
                }
            })
        }

        fn cancel_event(&self, _event_ref: &str) -> BoxFuture<'_, (), Self::Error> {
            Box::pin(async { Ok(()) })
        }
    }

    fn paid_reservation() -> Reservation {
        Reservation {
            id: "b1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 5, 10).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            customer: CustomerDetails {
                full_name: "Marie Durand".to_string(),
                phone: "+590690123456".to_string(),
                email: "marie@example.com".to_string(),
                vehicle: "Peugeot 208".to_string(),
            },
            tint_quality: "carbon".to_string(),
            tint_shade: "35".to_string(),
            windows: vec!["front_doors".to_string()],
            amount_total: 4000,
            amount_deposit: 2000,
            status: ReservationStatus::DepositPaid,
            payment_ref: Some("pi_1".to_string()),
            calendar_event_ref: None,
            created_at: Utc::now(),
        }
    }

    async fn wait_for_calendar_ref(ledger: &MemoryLedger) -> Option<String> {
        // paused clock: sleeps auto-advance, so retries resolve instantly
        for _ in 0..100 {
            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            let row = ledger.find_by_id("b1").await.unwrap();
            if let Some(r) = row.and_then(|r| r.calendar_event_ref) {
                return Some(r);
            }
        }
        None
    }

    #[tokio::test(start_paused = true)]
    async fn paid_booking_gets_mirrored_and_referenced() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.insert(paid_reservation()).await.unwrap();
        let outbox = spawn_mirror_worker(
            Arc::new(FlakyMirror::new(0)),
            ledger.clone(),
            chrono_tz::America::Guadeloupe,
        );

        outbox.sender().send(paid_reservation()).await.unwrap();
        assert_eq!(
            wait_for_calendar_ref(&ledger).await.as_deref(),
            Some("evt_mirrored")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn transient_mirror_failures_are_retried() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.insert(paid_reservation()).await.unwrap();
        let mirror = Arc::new(FlakyMirror::new(2));
        let outbox = spawn_mirror_worker(
            mirror.clone(),
            ledger.clone(),
            chrono_tz::America::Guadeloupe,
        );

        outbox.sender().send(paid_reservation()).await.unwrap();
        assert!(wait_for_calendar_ref(&ledger).await.is_some());
        assert_eq!(mirror.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_mirror_failure_never_blocks() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.insert(paid_reservation()).await.unwrap();
        let outbox = spawn_mirror_worker(
            Arc::new(FlakyMirror::new(u32::MAX)),
            ledger.clone(),
            chrono_tz::America::Guadeloupe,
        );

        outbox.sender().send(paid_reservation()).await.unwrap();
        // the worker gives up; the booking stays paid, just unmirrored
        assert!(wait_for_calendar_ref(&ledger).await.is_none());
    }
}
