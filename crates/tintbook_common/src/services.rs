// --- File: crates/tintbook_common/src/services.rs ---
//! Service abstractions for external collaborators.
//!
//! This module provides trait definitions for the external services the
//! booking core delegates to (payment processor, calendar mirror). These
//! traits allow for dependency injection and easier testing by decoupling
//! the core from specific implementations.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A wrapper error type that implements std::error::Error for Box<dyn std::error::Error + Send + Sync>
#[derive(Debug)]
pub struct BoxedError(pub Box<dyn StdError + Send + Sync>);

impl fmt::Display for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for BoxedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<Box<dyn StdError + Send + Sync>> for BoxedError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        BoxedError(err)
    }
}

/// A trait for mirroring confirmed bookings into an external calendar.
///
/// Mirror failures must never escalate into booking failures; callers are
/// expected to run these operations off the synchronous request path.
pub trait CalendarMirror: Send + Sync {
    /// Error type returned by calendar mirror operations.
    type Error: StdError + Send + Sync + 'static;

    /// Create a calendar event, returning an opaque event reference.
    fn create_event(&self, event: MirrorEvent) -> BoxFuture<'_, MirrorEventResult, Self::Error>;

    /// Mark a previously mirrored event as cancelled.
    fn cancel_event(&self, event_ref: &str) -> BoxFuture<'_, (), Self::Error>;
}

/// A trait for payment service operations the core needs to delegate.
///
/// Session creation and webhook handling live in the payment crate; the core
/// only ever asks for refunds of a previously captured deposit.
pub trait PaymentService: Send + Sync {
    /// Error type returned by payment service operations.
    type Error: StdError + Send + Sync + 'static;

    /// Refund a captured payment (full refund when `amount` is None).
    fn create_refund(
        &self,
        payment_ref: &str,
        amount: Option<i64>,
    ) -> BoxFuture<'_, RefundResult, Self::Error>;
}

/// An event to be mirrored into the external calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorEvent {
    /// RFC3339 start of the appointment.
    pub start_time: String,
    /// RFC3339 end of the appointment.
    pub end_time: String,
    /// IANA timezone name of the shop.
    pub time_zone: String,
    /// Event title.
    pub summary: String,
    /// Free-text body (customer, vehicle, selected work).
    pub description: Option<String>,
}

/// Represents the result of a calendar event operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorEventResult {
    /// The opaque reference of the created event.
    pub event_id: Option<String>,
    /// The status of the event.
    pub status: String,
}

/// Represents the result of a refund operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundResult {
    /// The ID of the refund.
    pub id: String,
    /// The status of the refund.
    pub status: String,
    /// The amount refunded, in cents.
    pub amount: i64,
    /// The currency of the refund.
    pub currency: String,
}
