// --- File: crates/tintbook_stripe/src/service.rs ---
use crate::logic::create_refund;
use tintbook_common::services::{BoxFuture, BoxedError, PaymentService, RefundResult};

/// Stripe payment service implementation.
///
/// The checkout/webhook surface lives in this crate's routes; the core only
/// reaches in for refunds, through this adapter.
pub struct StripePaymentService;

impl StripePaymentService {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StripePaymentService {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentService for StripePaymentService {
    type Error = BoxedError;

    fn create_refund(
        &self,
        payment_ref: &str,
        amount: Option<i64>,
    ) -> BoxFuture<'_, RefundResult, Self::Error> {
        let payment_ref = payment_ref.to_string();
        Box::pin(async move {
            create_refund(&payment_ref, amount)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }
}
