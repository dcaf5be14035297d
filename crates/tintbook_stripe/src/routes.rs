// --- File: crates/tintbook_stripe/src/routes.rs ---

use crate::handlers::{
    create_deposit_session_handler, stripe_checkout_cancel_handler,
    stripe_checkout_success_handler, stripe_webhook_handler, StripeState,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Creates a router containing all routes for the Stripe feature.
pub fn routes(state: Arc<StripeState>) -> Router {
    Router::new()
        .route(
            "/stripe/create-deposit-session",
            post(create_deposit_session_handler),
        )
        .route("/stripe/webhook", post(stripe_webhook_handler))
        // User-facing redirect endpoints (GET)
        .route(
            "/stripe/checkout-success",
            get(stripe_checkout_success_handler),
        )
        .route(
            "/stripe/checkout-cancel",
            get(stripe_checkout_cancel_handler),
        )
        .with_state(state)
}
