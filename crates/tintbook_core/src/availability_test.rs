#[cfg(test)]
mod tests {
    use crate::availability::resolve_availability;
    use crate::ledger::{BookingLedger, OverrideStore};
    use crate::memory::{MemoryLedger, MemoryOverrideStore};
    use crate::models::{
        CustomerDetails, OverrideScope, Reservation, ReservationStatus, SlotOverride,
    };
    use crate::schedule::ScheduleRules;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use tintbook_config::ScheduleConfig;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn rules() -> ScheduleRules {
        ScheduleRules::from_config(&ScheduleConfig::default()).unwrap()
    }

    fn saturday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 10).unwrap()
    }

    fn tuesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 6).unwrap()
    }

    fn reservation(date: NaiveDate, start: NaiveTime, status: ReservationStatus) -> Reservation {
        Reservation {
            id: format!("res-{}", start.format("%H%M")),
            date,
            start_time: start,
            end_time: start + chrono::Duration::hours(1),
            customer: CustomerDetails {
                full_name: "Jean Test".to_string(),
                phone: "+590690000000".to_string(),
                email: "jean@example.com".to_string(),
                vehicle: "Clio IV".to_string(),
            },
            tint_quality: "carbon".to_string(),
            tint_shade: "20".to_string(),
            windows: vec!["front_doors".to_string()],
            amount_total: 4000,
            amount_deposit: 2000,
            status,
            payment_ref: None,
            calendar_event_ref: None,
            created_at: Utc::now(),
        }
    }

    fn enabled_starts(slots: &[crate::availability::SlotStatus]) -> Vec<NaiveTime> {
        slots.iter().filter(|s| s.enabled).map(|s| s.start).collect()
    }

    #[tokio::test]
    async fn closed_day_has_no_slots() {
        let ledger = MemoryLedger::new();
        let overrides = MemoryOverrideStore::new();
        let monday = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap();
        let slots = resolve_availability(monday, &rules(), &ledger, &overrides)
            .await
            .unwrap();
        assert!(slots.is_empty());
    }

    #[tokio::test]
    async fn free_day_is_fully_enabled() {
        let ledger = MemoryLedger::new();
        let overrides = MemoryOverrideStore::new();
        let slots = resolve_availability(saturday(), &rules(), &ledger, &overrides)
            .await
            .unwrap();
        assert_eq!(slots.len(), 8);
        assert!(slots.iter().all(|s| s.enabled));
    }

    #[tokio::test]
    async fn saturday_booking_also_blocks_the_following_slot() {
        let ledger = MemoryLedger::new();
        ledger
            .insert(reservation(
                saturday(),
                t(9, 0),
                ReservationStatus::PendingPayment,
            ))
            .await
            .unwrap();
        let overrides = MemoryOverrideStore::new();
        let slots = resolve_availability(saturday(), &rules(), &ledger, &overrides)
            .await
            .unwrap();
        // 09:00 is booked, 10:00 is the cleanup buffer, 11:00 onwards is free
        let enabled = enabled_starts(&slots);
        assert!(!enabled.contains(&t(9, 0)));
        assert!(!enabled.contains(&t(10, 0)));
        assert!(enabled.contains(&t(11, 0)));
        assert_eq!(slots.len(), 8, "disabled slots stay in the response");
    }

    #[tokio::test]
    async fn weekday_booking_blocks_only_its_own_slot() {
        let ledger = MemoryLedger::new();
        ledger
            .insert(reservation(
                tuesday(),
                t(14, 0),
                ReservationStatus::DepositPaid,
            ))
            .await
            .unwrap();
        let overrides = MemoryOverrideStore::new();
        let slots = resolve_availability(tuesday(), &rules(), &ledger, &overrides)
            .await
            .unwrap();
        let enabled = enabled_starts(&slots);
        assert!(!enabled.contains(&t(14, 0)));
        // no adjacency buffer outside the configured weekday
        assert!(enabled.contains(&t(15, 0)));
        assert!(enabled.contains(&t(16, 0)));
    }

    #[tokio::test]
    async fn cancelled_reservation_frees_its_slot() {
        let ledger = MemoryLedger::new();
        ledger
            .insert(reservation(
                saturday(),
                t(9, 0),
                ReservationStatus::Cancelled,
            ))
            .await
            .unwrap();
        let overrides = MemoryOverrideStore::new();
        let slots = resolve_availability(saturday(), &rules(), &ledger, &overrides)
            .await
            .unwrap();
        assert!(slots.iter().all(|s| s.enabled));
    }

    #[tokio::test]
    async fn weekday_override_disables_every_occurrence() {
        let ledger = MemoryLedger::new();
        let overrides = MemoryOverrideStore::new();
        overrides
            .set(SlotOverride {
                scope: OverrideScope::Weekday(6),
                start: t(9, 0),
                enabled: false,
            })
            .await
            .unwrap();
        let slots = resolve_availability(saturday(), &rules(), &ledger, &overrides)
            .await
            .unwrap();
        assert!(!enabled_starts(&slots).contains(&t(9, 0)));

        // the following Saturday is affected too
        let next = NaiveDate::from_ymd_opt(2025, 5, 17).unwrap();
        let slots = resolve_availability(next, &rules(), &ledger, &overrides)
            .await
            .unwrap();
        assert!(!enabled_starts(&slots).contains(&t(9, 0)));
    }

    #[tokio::test]
    async fn date_override_wins_over_weekday_override() {
        let ledger = MemoryLedger::new();
        let overrides = MemoryOverrideStore::new();
        overrides
            .set(SlotOverride {
                scope: OverrideScope::Weekday(6),
                start: t(9, 0),
                enabled: false,
            })
            .await
            .unwrap();
        overrides
            .set(SlotOverride {
                scope: OverrideScope::Date(saturday()),
                start: t(9, 0),
                enabled: true,
            })
            .await
            .unwrap();
        let slots = resolve_availability(saturday(), &rules(), &ledger, &overrides)
            .await
            .unwrap();
        assert!(enabled_starts(&slots).contains(&t(9, 0)));
    }

    #[tokio::test]
    async fn override_on_a_booked_slot_cannot_reenable_it() {
        let ledger = MemoryLedger::new();
        ledger
            .insert(reservation(
                saturday(),
                t(9, 0),
                ReservationStatus::DepositPaid,
            ))
            .await
            .unwrap();
        let overrides = MemoryOverrideStore::new();
        overrides
            .set(SlotOverride {
                scope: OverrideScope::Date(saturday()),
                start: t(9, 0),
                enabled: true,
            })
            .await
            .unwrap();
        let slots = resolve_availability(saturday(), &rules(), &ledger, &overrides)
            .await
            .unwrap();
        assert!(!enabled_starts(&slots).contains(&t(9, 0)));
    }
}
