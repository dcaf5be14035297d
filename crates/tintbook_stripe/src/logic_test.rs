#[cfg(test)]
mod tests {
    use crate::error::StripeError;
    use crate::logic::{
        process_stripe_webhook, sign_payload_for_tests, verify_stripe_signature, StripeEvent,
    };
    use serde_json::json;
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};
    use tintbook_core::coordinator::{BookingRequest, ReservationCoordinator};
    use tintbook_core::memory::{MemoryCatalog, MemoryLedger, MemoryOverrideStore};
    use tintbook_core::models::ReservationStatus;
    use tintbook_core::schedule::ScheduleRules;
    use tintbook_config::{PricingConfig, ScheduleConfig};

    const SECRET: &str = "whsec_test_secret";

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    #[test]
    fn valid_signature_is_accepted() {
        let payload = br#"{"id":"evt_1","type":"ping"}"#;
        let header = sign_payload_for_tests(payload, SECRET, now());
        assert!(verify_stripe_signature(payload, Some(&header), SECRET).is_ok());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let payload = br#"{"id":"evt_1","type":"ping"}"#;
        let header = sign_payload_for_tests(payload, SECRET, now());
        let tampered = br#"{"id":"evt_2","type":"ping"}"#;
        assert!(matches!(
            verify_stripe_signature(tampered, Some(&header), SECRET),
            Err(StripeError::WebhookSignatureError(_))
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let payload = br#"{"id":"evt_1","type":"ping"}"#;
        let header = sign_payload_for_tests(payload, "whsec_other", now());
        assert!(verify_stripe_signature(payload, Some(&header), SECRET).is_err());
    }

    #[test]
    fn missing_or_malformed_header_is_rejected() {
        let payload = b"{}";
        assert!(verify_stripe_signature(payload, None, SECRET).is_err());
        assert!(verify_stripe_signature(payload, Some("garbage"), SECRET).is_err());
        assert!(verify_stripe_signature(payload, Some("t=abc,v1=00"), SECRET).is_err());
        assert!(verify_stripe_signature(payload, Some("t=123"), SECRET).is_err());
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let payload = b"{}";
        let header = sign_payload_for_tests(payload, SECRET, now() - 3600);
        assert!(matches!(
            verify_stripe_signature(payload, Some(&header), SECRET),
            Err(StripeError::WebhookSignatureError(_))
        ));
    }

    // --- webhook processing ---

    fn coordinator() -> Arc<ReservationCoordinator> {
        let rules = ScheduleRules::from_config(&ScheduleConfig::default()).unwrap();
        Arc::new(ReservationCoordinator::new(
            rules,
            PricingConfig::default(),
            Arc::new(MemoryLedger::new()),
            Arc::new(MemoryOverrideStore::new()),
            Arc::new(MemoryCatalog::new()),
        ))
    }

    async fn pending_booking(c: &ReservationCoordinator) -> String {
        c.create_reservation(BookingRequest {
            full_name: "Marie Durand".to_string(),
            phone: "+590690123456".to_string(),
            email: "marie@example.com".to_string(),
            vehicle: "Peugeot 208".to_string(),
            tint_quality: "carbon".to_string(),
            tint_shade: "35".to_string(),
            windows: vec!["front_doors".to_string()],
            date: "2025-05-10".to_string(),
            start_time: "09:00".to_string(),
            end_time: None,
        })
        .await
        .unwrap()
        .id
    }

    fn paid_session_event(booking_id: &str) -> StripeEvent {
        serde_json::from_value(json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_test_1",
                    "payment_intent": "pi_test_1",
                    "payment_status": "paid",
                    "metadata": { "booking_id": booking_id }
                }
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn paid_session_marks_the_booking() {
        let c = coordinator();
        let id = pending_booking(&c).await;

        let paid = process_stripe_webhook(paid_session_event(&id), &c)
            .await
            .unwrap()
            .expect("a paid booking");
        assert_eq!(paid.reservation.status, ReservationStatus::DepositPaid);
        assert_eq!(paid.reservation.payment_ref.as_deref(), Some("pi_test_1"));

        // redelivery is harmless
        let again = process_stripe_webhook(paid_session_event(&id), &c)
            .await
            .unwrap()
            .expect("redelivery still resolves the booking");
        assert_eq!(again.reservation.payment_ref.as_deref(), Some("pi_test_1"));
    }

    #[tokio::test]
    async fn paid_session_for_a_cancelled_booking_is_acknowledged() {
        let c = coordinator();
        let id = pending_booking(&c).await;
        c.cancel(&id).await.unwrap();

        // Acknowledged (no error), so Stripe does not retry forever; the
        // booking stays cancelled and the capture is only logged.
        let outcome = process_stripe_webhook(paid_session_event(&id), &c)
            .await
            .unwrap();
        assert!(outcome.is_none());
        let booking = c.find(&id).await.unwrap();
        assert_eq!(booking.status, ReservationStatus::Cancelled);
        assert_eq!(booking.payment_ref, None);
    }

    #[tokio::test]
    async fn payment_intent_success_also_confirms() {
        let c = coordinator();
        let id = pending_booking(&c).await;

        let event: StripeEvent = serde_json::from_value(json!({
            "id": "evt_pi",
            "type": "payment_intent.succeeded",
            "data": {
                "object": {
                    "id": "pi_test_9",
                    "metadata": { "booking_id": id }
                }
            }
        }))
        .unwrap();

        let paid = process_stripe_webhook(event, &c)
            .await
            .unwrap()
            .expect("a paid booking");
        assert_eq!(paid.reservation.status, ReservationStatus::DepositPaid);
        assert_eq!(paid.reservation.payment_ref.as_deref(), Some("pi_test_9"));
    }

    #[tokio::test]
    async fn payment_intent_without_metadata_is_acknowledged() {
        let c = coordinator();
        let event: StripeEvent = serde_json::from_value(json!({
            "id": "evt_pi_2",
            "type": "payment_intent.succeeded",
            "data": { "object": { "id": "pi_test_10" } }
        }))
        .unwrap();
        assert!(process_stripe_webhook(event, &c).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unpaid_session_is_ignored() {
        let c = coordinator();
        let id = pending_booking(&c).await;

        let event: StripeEvent = serde_json::from_value(json!({
            "id": "evt_2",
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_test_2",
                    "payment_status": "unpaid",
                    "metadata": { "booking_id": id }
                }
            }
        }))
        .unwrap();

        assert!(process_stripe_webhook(event, &c).await.unwrap().is_none());
        assert_eq!(
            c.find(&id).await.unwrap().status,
            ReservationStatus::PendingPayment
        );
    }

    #[tokio::test]
    async fn session_without_booking_id_is_an_error() {
        let c = coordinator();
        let event: StripeEvent = serde_json::from_value(json!({
            "id": "evt_3",
            "type": "checkout.session.completed",
            "data": {
                "object": { "id": "cs_test_3", "payment_status": "paid" }
            }
        }))
        .unwrap();
        assert!(matches!(
            process_stripe_webhook(event, &c).await.unwrap_err(),
            StripeError::WebhookProcessingError(_)
        ));
    }

    #[tokio::test]
    async fn unrelated_event_types_are_acknowledged() {
        let c = coordinator();
        let event: StripeEvent = serde_json::from_value(json!({
            "id": "evt_4",
            "type": "invoice.created",
            "data": { "object": {} }
        }))
        .unwrap();
        assert!(process_stripe_webhook(event, &c).await.unwrap().is_none());
    }
}
