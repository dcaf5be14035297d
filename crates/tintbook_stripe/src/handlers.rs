// --- File: crates/tintbook_stripe/src/handlers.rs ---
use crate::logic::{
    create_deposit_checkout_session, process_stripe_webhook, verify_stripe_signature,
    CreateDepositSessionRequest, CreateDepositSessionResponse, StripeEvent,
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tintbook_core::coordinator::ReservationCoordinator;
use tintbook_core::models::{Reservation, ReservationStatus};
use tintbook_config::AppConfig;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

// --- State for Stripe Handlers ---
// The reqwest client is static in logic.rs; the state carries the config,
// the coordinator, and the channel feeding the calendar mirror worker.
#[derive(Clone)]
pub struct StripeState {
    pub config: Arc<AppConfig>,
    pub coordinator: Arc<ReservationCoordinator>,
    /// Paid reservations are pushed here for calendar mirroring.
    pub on_paid: Option<mpsc::Sender<Reservation>>,
}

/// Axum handler to create a deposit Checkout Session for a pending booking.
#[axum::debug_handler]
pub async fn create_deposit_session_handler(
    State(state): State<Arc<StripeState>>,
    Json(payload): Json<CreateDepositSessionRequest>,
) -> Result<Json<CreateDepositSessionResponse>, (StatusCode, String)> {
    if !state.config.use_stripe {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "Stripe service is disabled.".to_string(),
        ));
    }
    let stripe_config = state.config.stripe.as_ref().ok_or((
        StatusCode::INTERNAL_SERVER_ERROR,
        "Stripe configuration not loaded.".to_string(),
    ))?;

    let reservation = state
        .coordinator
        .find(&payload.booking_id)
        .await
        .map_err(|e| (StatusCode::NOT_FOUND, e.to_string()))?;
    if reservation.status != ReservationStatus::PendingPayment {
        return Err((
            StatusCode::CONFLICT,
            format!(
                "booking {} is {}, not awaiting payment",
                reservation.id,
                reservation.status.as_str()
            ),
        ));
    }

    match create_deposit_checkout_session(
        stripe_config,
        &state.config.pricing.currency,
        &reservation,
    )
    .await
    {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!("failed to create deposit session: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to communicate with payment provider.".to_string(),
            ))
        }
    }
}

/// Axum handler for the Stripe server-to-server webhook. The endpoint URL is
/// configured in the Stripe dashboard.
#[axum::debug_handler]
pub async fn stripe_webhook_handler(
    State(state): State<Arc<StripeState>>,
    headers: HeaderMap,
    body: String, // raw body for signature verification
) -> Response {
    if !state.config.use_stripe {
        return (StatusCode::SERVICE_UNAVAILABLE, "Stripe service disabled.").into_response();
    }

    let webhook_secret = match std::env::var("STRIPE_WEBHOOK_SECRET") {
        Ok(s) => s,
        Err(_) => {
            error!("STRIPE_WEBHOOK_SECRET environment variable not set");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let sig_header = headers
        .get("Stripe-Signature")
        .and_then(|h| h.to_str().ok());

    if let Err(e) = verify_stripe_signature(body.as_bytes(), sig_header, &webhook_secret) {
        warn!("Stripe webhook signature verification failed: {e}");
        return (StatusCode::BAD_REQUEST, format!("Invalid signature: {}", e)).into_response();
    }

    // Deserialize only after the signature checks out.
    let event: StripeEvent = match serde_json::from_str(&body) {
        Ok(ev) => ev,
        Err(e) => {
            warn!("failed to deserialize Stripe webhook event: {e}");
            return (StatusCode::BAD_REQUEST, "Invalid payload format".to_string())
                .into_response();
        }
    };

    match process_stripe_webhook(event, &state.coordinator).await {
        Ok(Some(paid)) => {
            if let Some(on_paid) = &state.on_paid {
                // Mirroring is fire-and-forget; a full outbox queue only
                // costs us the calendar entry, never the payment ack.
                if let Err(e) = on_paid.try_send(paid.reservation) {
                    warn!("calendar mirror queue rejected paid booking: {e}");
                }
            }
            StatusCode::OK.into_response()
        }
        Ok(None) => StatusCode::OK.into_response(),
        Err(e) => {
            error!("error processing Stripe webhook: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Webhook processing error: {}", e),
            )
                .into_response()
        }
    }
}

/// Landing page after a successful checkout redirect.
#[axum::debug_handler]
pub async fn stripe_checkout_success_handler() -> axum::response::Html<&'static str> {
    info!("user redirected to Stripe success URL");
    axum::response::Html(
        "<h1>Deposit received!</h1><p>Your appointment is confirmed. See you at the shop.</p><a href='/'>Back to Home</a>",
    )
}

/// Landing page after a cancelled checkout redirect.
#[axum::debug_handler]
pub async fn stripe_checkout_cancel_handler() -> axum::response::Html<&'static str> {
    info!("user redirected to Stripe cancel URL");
    axum::response::Html(
        "<h1>Payment Cancelled</h1><p>Your payment process was cancelled. You have not been charged.</p><a href='/'>Back to Home</a>",
    )
}
