// --- File: crates/tintbook_stripe/src/logic.rs ---
//! Stripe REST calls and webhook verification.
//!
//! The checkout flow charges only the 50% deposit; the remainder is settled
//! at the shop. The booking id travels in the session metadata and comes
//! back on the `checkout.session.completed` event.

use crate::error::StripeError;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};
use tintbook_common::{TintbookError, HTTP_CLIENT};
use tintbook_config::StripeConfig;
use tintbook_core::models::Reservation;
use tracing::{debug, info, warn};

// --- Data Structures ---

/// Request from our frontend to create a deposit Checkout Session.
#[derive(Deserialize, Debug)]
pub struct CreateDepositSessionRequest {
    /// Id of a reservation in `pending_payment`.
    pub booking_id: String,
}

#[derive(Serialize, Debug)]
pub struct CreateDepositSessionResponse {
    pub url: String,
    pub session_id: String,
}

#[derive(Deserialize, Debug)]
struct StripeCheckoutSessionApiResponse {
    pub id: String,
    pub url: Option<String>,
}

/// Represents the `data` field within a Stripe Event.
#[derive(Deserialize, Debug, Clone)]
pub struct StripeEventData {
    /// The actual object related to the event. Structure varies by type.
    pub object: serde_json::Value,
}

/// Represents the outer Stripe Event object.
#[derive(Deserialize, Debug, Clone)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

/// The `data.object` of a "checkout.session.completed" event, reduced to the
/// fields the deposit flow needs.
#[derive(Deserialize, Debug, Clone)]
pub struct StripeCheckoutSessionObject {
    pub id: String,
    pub payment_intent: Option<String>,
    pub payment_status: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
}

/// The `data.object` of a "payment_intent.succeeded" event.
#[derive(Deserialize, Debug, Clone)]
pub struct StripePaymentIntentObject {
    pub id: String,
    pub metadata: Option<HashMap<String, String>>,
}

// --- Checkout Session Creation ---

/// Creates a Stripe Checkout Session charging the reservation's deposit.
pub async fn create_deposit_checkout_session(
    stripe_config: &StripeConfig,
    currency: &str,
    reservation: &Reservation,
) -> Result<CreateDepositSessionResponse, StripeError> {
    info!(
        booking_id = %reservation.id,
        amount = reservation.amount_deposit,
        "creating deposit checkout session"
    );

    let stripe_secret_key = env::var("STRIPE_SECRET_KEY").map_err(|_| StripeError::ConfigError)?;

    let product_name = format!(
        "Window tinting deposit ({} {}, {})",
        reservation.tint_quality,
        reservation.tint_shade,
        reservation.date.format("%Y-%m-%d"),
    );

    let form_body: Vec<(String, String)> = vec![
        ("payment_method_types[]".to_string(), "card".to_string()),
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), stripe_config.success_url.clone()),
        ("cancel_url".to_string(), stripe_config.cancel_url.clone()),
        (
            "line_items[0][price_data][currency]".to_string(),
            currency.to_lowercase(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            product_name,
        ),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            reservation.amount_deposit.to_string(),
        ),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        ("client_reference_id".to_string(), reservation.id.clone()),
        ("metadata[booking_id]".to_string(), reservation.id.clone()),
        // also stamped on the payment intent so its events can be correlated
        (
            "payment_intent_data[metadata][booking_id]".to_string(),
            reservation.id.clone(),
        ),
    ];

    let api_url = "https://api.stripe.com/v1/checkout/sessions";
    let response = HTTP_CLIENT
        .post(api_url)
        .basic_auth(stripe_secret_key, None::<&str>)
        .form(&form_body)
        .send()
        .await?;

    let status = response.status();
    let body_text = response.text().await?;

    if status.is_success() {
        let stripe_response: StripeCheckoutSessionApiResponse = serde_json::from_str(&body_text)?;
        match stripe_response.url {
            Some(url) => Ok(CreateDepositSessionResponse {
                url,
                session_id: stripe_response.id,
            }),
            None => Err(StripeError::InternalError(
                "Stripe response missing checkout URL".to_string(),
            )),
        }
    } else {
        Err(StripeError::ApiError {
            status_code: status.as_u16(),
            message: extract_stripe_error(&body_text),
        })
    }
}

fn extract_stripe_error(body_text: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body_text) {
        Ok(json_body) => json_body
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .unwrap_or(body_text)
            .to_string(),
        Err(_) => body_text.to_string(),
    }
}

// --- Webhook Verification ---

const TOLERANCE_SECONDS: i64 = 600; // 10 minutes

/// Verifies the signature of an incoming Stripe webhook request.
///
/// # Arguments
/// * `payload_bytes` - The raw request body bytes.
/// * `sig_header` - The value of the 'Stripe-Signature' header.
/// * `secret` - Your Stripe webhook signing secret (whsec_...).
pub fn verify_stripe_signature(
    payload_bytes: &[u8],
    sig_header: Option<&str>,
    secret: &str,
) -> Result<(), StripeError> {
    let sig_header_value = sig_header.ok_or_else(|| {
        StripeError::WebhookSignatureError("Missing Stripe-Signature header".to_string())
    })?;

    let mut timestamp_str: Option<&str> = None;
    let mut v1_signatures_hex: Vec<&str> = Vec::new();
    for item in sig_header_value.split(',') {
        let parts: Vec<&str> = item.trim().splitn(2, '=').collect();
        if parts.len() == 2 {
            match parts[0] {
                "t" => timestamp_str = Some(parts[1]),
                "v1" => v1_signatures_hex.push(parts[1]),
                _ => {} // ignore v0 and friends
            }
        }
    }

    let timestamp_str = timestamp_str.ok_or_else(|| {
        StripeError::WebhookSignatureError("Missing timestamp 't' in Stripe-Signature".to_string())
    })?;
    let parsed_timestamp = timestamp_str.parse::<i64>().map_err(|_| {
        StripeError::WebhookSignatureError("Invalid timestamp format in Stripe-Signature".to_string())
    })?;
    if v1_signatures_hex.is_empty() {
        return Err(StripeError::WebhookSignatureError(
            "Missing v1 signature in Stripe-Signature".to_string(),
        ));
    }

    let current_timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| StripeError::InternalError(format!("system clock error: {e}")))?
        .as_secs() as i64;
    if (current_timestamp - parsed_timestamp).abs() > TOLERANCE_SECONDS {
        warn!(
            event_ts = parsed_timestamp,
            now = current_timestamp,
            "webhook timestamp outside tolerance"
        );
        return Err(StripeError::WebhookSignatureError(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    let signed_payload_string = format!(
        "{}.{}",
        timestamp_str,
        String::from_utf8_lossy(payload_bytes)
    );

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| {
        StripeError::WebhookSignatureError("Invalid webhook secret format for HMAC".to_string())
    })?;
    mac.update(signed_payload_string.as_bytes());
    let calculated_signature_hex = hex::encode(mac.finalize().into_bytes());

    for provided_sig_hex in v1_signatures_hex {
        if constant_time_eq(
            calculated_signature_hex.as_bytes(),
            provided_sig_hex.as_bytes(),
        ) {
            return Ok(());
        }
    }
    debug!("no v1 signature matched the calculated signature");
    Err(StripeError::WebhookSignatureError(
        "Signature mismatch".to_string(),
    ))
}

/// Helper for constant-time string comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Signs a payload the way Stripe does. Test helper for webhook round trips.
#[cfg(test)]
pub(crate) fn sign_payload_for_tests(payload: &[u8], secret: &str, timestamp: i64) -> String {
    type HmacSha256 = Hmac<Sha256>;
    let signed = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(signed.as_bytes());
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

// --- Webhook Processing ---

/// Outcome of a processed webhook event that flipped a booking to paid.
#[derive(Debug, Clone)]
pub struct DepositPaid {
    pub reservation: Reservation,
}

/// Processes a verified Stripe webhook event.
///
/// Returns the reservation that was marked paid, if the event was a paid
/// checkout session for a known booking. Re-delivered events return the
/// reservation unchanged; unrelated event types return `None`.
pub async fn process_stripe_webhook(
    event: StripeEvent,
    coordinator: &tintbook_core::coordinator::ReservationCoordinator,
) -> Result<Option<DepositPaid>, StripeError> {
    info!(event_id = %event.id, event_type = %event.event_type, "processing Stripe event");

    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let session: StripeCheckoutSessionObject = serde_json::from_value(event.data.object)
                .map_err(|e| {
                    StripeError::WebhookProcessingError(format!(
                        "Failed to parse checkout session object: {}",
                        e
                    ))
                })?;

            if session.payment_status.as_deref() != Some("paid") {
                info!(
                    session_id = %session.id,
                    status = ?session.payment_status,
                    "session completed but not paid; nothing to do"
                );
                return Ok(None);
            }

            let booking_id = session
                .metadata
                .as_ref()
                .and_then(|m| m.get("booking_id").cloned())
                .ok_or_else(|| {
                    StripeError::WebhookProcessingError(format!(
                        "Missing booking_id in metadata for session {}",
                        session.id
                    ))
                })?;

            // Prefer the payment intent as the durable payment reference;
            // refunds are issued against it.
            let payment_ref = session
                .payment_intent
                .clone()
                .unwrap_or_else(|| session.id.clone());

            let reservation = match coordinator.mark_paid(&booking_id, &payment_ref).await {
                Ok(r) => r,
                // The booking was cancelled while the customer was paying.
                // Acknowledge so Stripe stops retrying; the captured deposit
                // is flagged for a manual refund.
                Err(TintbookError::InvalidStateTransition(reason)) => {
                    warn!(
                        %booking_id,
                        %payment_ref,
                        %reason,
                        "deposit captured for a booking no longer awaiting payment"
                    );
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };
            info!(booking_id = %reservation.id, "deposit captured");
            Ok(Some(DepositPaid { reservation }))
        }
        "payment_intent.succeeded" => {
            // secondary confirmation path; the session event usually lands
            // first, and mark_paid is idempotent either way
            let intent: StripePaymentIntentObject = serde_json::from_value(event.data.object)
                .map_err(|e| {
                    StripeError::WebhookProcessingError(format!(
                        "Failed to parse payment intent object: {}",
                        e
                    ))
                })?;

            let Some(booking_id) = intent
                .metadata
                .as_ref()
                .and_then(|m| m.get("booking_id").cloned())
            else {
                debug!(intent_id = %intent.id, "payment intent without booking metadata");
                return Ok(None);
            };

            let reservation = match coordinator.mark_paid(&booking_id, &intent.id).await {
                Ok(r) => r,
                Err(TintbookError::InvalidStateTransition(reason)) => {
                    warn!(
                        %booking_id,
                        intent_id = %intent.id,
                        %reason,
                        "deposit captured for a booking no longer awaiting payment"
                    );
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };
            info!(booking_id = %reservation.id, "deposit captured (payment intent)");
            Ok(Some(DepositPaid { reservation }))
        }
        "checkout.session.expired" => {
            let session_id = event.data.object.get("id").and_then(|v| v.as_str());
            info!(session_id = ?session_id, "checkout session expired");
            Ok(None)
        }
        other => {
            debug!(event_type = other, "unhandled Stripe event type");
            Ok(None)
        }
    }
}

// --- Refunds ---

#[derive(Deserialize, Debug)]
struct StripeRefundApiResponse {
    pub id: String,
    pub status: Option<String>,
    pub amount: i64,
    pub currency: String,
}

/// Refunds a captured payment via the Stripe refunds endpoint. A `None`
/// amount refunds the full charge.
pub async fn create_refund(
    payment_ref: &str,
    amount: Option<i64>,
) -> Result<tintbook_common::services::RefundResult, StripeError> {
    info!(payment_ref, ?amount, "creating Stripe refund");

    let stripe_secret_key = env::var("STRIPE_SECRET_KEY").map_err(|_| StripeError::ConfigError)?;

    let mut form_body: Vec<(String, String)> =
        vec![("payment_intent".to_string(), payment_ref.to_string())];
    if let Some(amount) = amount {
        form_body.push(("amount".to_string(), amount.to_string()));
    }

    let response = HTTP_CLIENT
        .post("https://api.stripe.com/v1/refunds")
        .basic_auth(stripe_secret_key, None::<&str>)
        .form(&form_body)
        .send()
        .await?;

    let status = response.status();
    let body_text = response.text().await?;

    if status.is_success() {
        let refund: StripeRefundApiResponse = serde_json::from_str(&body_text)?;
        Ok(tintbook_common::services::RefundResult {
            id: refund.id,
            status: refund.status.unwrap_or_else(|| "pending".to_string()),
            amount: refund.amount,
            currency: refund.currency,
        })
    } else {
        Err(StripeError::ApiError {
            status_code: status.as_u16(),
            message: extract_stripe_error(&body_text),
        })
    }
}
