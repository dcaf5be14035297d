// --- File: crates/tintbook_core/src/handlers.rs ---
use crate::coordinator::{parse_date, BookingRequest, ReservationCoordinator};
use crate::models::{OverrideScope, Reservation, ReservationStatus};
use crate::schedule::parse_wall_time;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tintbook_common::services::{BoxedError, CalendarMirror, PaymentService};
use tintbook_common::{HttpStatusCode, TintbookError};
use tintbook_config::AppConfig;
use tracing::{error, info, warn};

// Define shared state needed by the booking handlers
#[derive(Clone)]
pub struct CoreState {
    pub config: Arc<AppConfig>,
    pub coordinator: Arc<ReservationCoordinator>,
    /// Payment collaborator; only the refund path touches it synchronously.
    pub payment: Option<Arc<dyn PaymentService<Error = BoxedError>>>,
    /// Calendar mirror; used best-effort when cancelling mirrored bookings.
    pub mirror: Option<Arc<dyn CalendarMirror<Error = BoxedError>>>,
}

/// Error envelope returned to clients: `{"error": {"kind", "message"}}`.
/// The kind lets the frontend distinguish "re-fetch availability" (conflict)
/// from "fix your form" (validation).
pub struct ApiError(pub TintbookError);

impl From<TintbookError> for ApiError {
    fn from(err: TintbookError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let kind = match &self.0 {
            TintbookError::ValidationError(_) => "validation_error",
            TintbookError::ConflictError(_) => "conflict",
            TintbookError::NotFoundError(_) => "not_found",
            TintbookError::InvalidStateTransition(_) => "invalid_state_transition",
            TintbookError::ConfigError(_) => "configuration_error",
            TintbookError::AuthError(_) => "auth_error",
            TintbookError::ParseError(_) => "parse_error",
            TintbookError::HttpError(_) | TintbookError::ExternalServiceError { .. } => {
                "external_service_error"
            }
            TintbookError::DatabaseError(_) | TintbookError::InternalError(_) => "internal_error",
        };
        if status.is_server_error() {
            error!(kind, "request failed: {}", self.0);
        }
        (
            status,
            Json(json!({"error": {"kind": kind, "message": self.0.to_string()}})),
        )
            .into_response()
    }
}

// --- Availability ---

#[derive(Deserialize, Debug)]
pub struct AvailabilityQuery {
    /// Date in YYYY-MM-DD format
    pub date: String,
}

#[derive(Serialize, Debug)]
pub struct SlotDto {
    pub start: String,
    pub end: String,
    pub enabled: bool,
}

#[derive(Serialize, Debug)]
pub struct AvailabilityResponse {
    pub date: String,
    pub slots: Vec<SlotDto>,
}

/// Handler to get the slot list for a date, disabled slots included.
#[axum::debug_handler]
pub async fn get_availability_handler(
    State(state): State<Arc<CoreState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let date = parse_date(&query.date)?;
    let slots = state.coordinator.availability(date).await?;
    Ok(Json(AvailabilityResponse {
        date: query.date,
        slots: slots
            .into_iter()
            .map(|s| SlotDto {
                start: s.start.format("%H:%M").to_string(),
                end: s.end.format("%H:%M").to_string(),
                enabled: s.enabled,
            })
            .collect(),
    }))
}

// --- Booking creation ---

#[derive(Serialize, Debug)]
pub struct CreateBookingResponse {
    pub booking_id: String,
    pub amount_total: i64,
    pub amount_deposit: i64,
}

#[axum::debug_handler]
pub async fn create_booking_handler(
    State(state): State<Arc<CoreState>>,
    Json(payload): Json<BookingRequest>,
) -> Result<Json<CreateBookingResponse>, ApiError> {
    let reservation = state.coordinator.create_reservation(payload).await?;
    Ok(Json(CreateBookingResponse {
        booking_id: reservation.id,
        amount_total: reservation.amount_total,
        amount_deposit: reservation.amount_deposit,
    }))
}

// --- Admin: booking listing ---

#[derive(Deserialize, Debug)]
pub struct AdminBookingsQuery {
    /// Start date in YYYY-MM-DD format
    pub from: String,
    /// End date, inclusive; defaults to `from`
    pub to: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct AdminBookingsResponse {
    pub bookings: Vec<Reservation>,
}

#[axum::debug_handler]
pub async fn list_bookings_handler(
    State(state): State<Arc<CoreState>>,
    Query(query): Query<AdminBookingsQuery>,
) -> Result<Json<AdminBookingsResponse>, ApiError> {
    let from = parse_date(&query.from)?;
    let to = match &query.to {
        Some(to) => parse_date(to)?,
        None => from,
    };
    let bookings = state.coordinator.bookings_in_range(from, to).await?;
    Ok(Json(AdminBookingsResponse { bookings }))
}

// --- Admin: cancel / refund ---

#[derive(Serialize, Debug)]
pub struct StatusChangeResponse {
    pub ok: bool,
    pub id: String,
    pub status: String,
}

#[axum::debug_handler]
pub async fn cancel_booking_handler(
    State(state): State<Arc<CoreState>>,
    Path(id): Path<String>,
) -> Result<Json<StatusChangeResponse>, ApiError> {
    let reservation = state.coordinator.cancel(&id).await?;

    // Best-effort: take the mirrored event down as well. Never fails the
    // cancellation.
    if let (Some(mirror), Some(event_ref)) =
        (state.mirror.clone(), reservation.calendar_event_ref.clone())
    {
        let booking_id = reservation.id.clone();
        tokio::spawn(async move {
            if let Err(e) = mirror.cancel_event(&event_ref).await {
                warn!(booking_id, "failed to cancel mirrored calendar event: {e}");
            }
        });
    }

    Ok(Json(StatusChangeResponse {
        ok: true,
        id: reservation.id,
        status: reservation.status.as_str().to_string(),
    }))
}

#[axum::debug_handler]
pub async fn refund_booking_handler(
    State(state): State<Arc<CoreState>>,
    Path(id): Path<String>,
) -> Result<Json<StatusChangeResponse>, ApiError> {
    let reservation = state.coordinator.find(&id).await?;

    // The state machine gates the money: an illegal transition must be
    // rejected before the provider is asked to move anything.
    if !reservation
        .status
        .can_transition_to(ReservationStatus::Refunded)
    {
        return Err(TintbookError::InvalidStateTransition(format!(
            "{} -> {}",
            reservation.status.as_str(),
            ReservationStatus::Refunded.as_str()
        ))
        .into());
    }

    // Move the money; the status only flips on confirmed success.
    let payment = state.payment.clone().ok_or_else(|| {
        TintbookError::ConfigError("payment service not configured; cannot refund".to_string())
    })?;
    let payment_ref = reservation.payment_ref.clone().ok_or_else(|| {
        TintbookError::InvalidStateTransition(format!(
            "{} has no captured payment to refund",
            reservation.id
        ))
    })?;
    let refund = payment
        .create_refund(&payment_ref, Some(reservation.amount_deposit))
        .await
        .map_err(|e| TintbookError::ExternalServiceError {
            service_name: "payment".to_string(),
            message: e.to_string(),
        })?;
    info!(booking_id = %reservation.id, refund_id = %refund.id, "deposit refunded");

    let updated = state.coordinator.refund(&id).await?;
    Ok(Json(StatusChangeResponse {
        ok: true,
        id: updated.id,
        status: updated.status.as_str().to_string(),
    }))
}

// --- Admin: slot and work-item toggles ---

#[derive(Deserialize, Debug)]
pub struct ToggleSlotRequest {
    /// Sunday-indexed weekday; exactly one of `weekday`/`date` is required.
    pub weekday: Option<u8>,
    /// Concrete date in YYYY-MM-DD format.
    pub date: Option<String>,
    /// Slot start, "HH:MM".
    pub start_time: String,
    pub enabled: bool,
}

#[derive(Serialize, Debug)]
pub struct OkResponse {
    pub ok: bool,
}

#[axum::debug_handler]
pub async fn toggle_slot_handler(
    State(state): State<Arc<CoreState>>,
    Json(payload): Json<ToggleSlotRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let scope = match (payload.weekday, &payload.date) {
        (Some(weekday), None) => OverrideScope::Weekday(weekday),
        (None, Some(date)) => OverrideScope::Date(parse_date(date)?),
        _ => {
            return Err(TintbookError::ValidationError(
                "exactly one of weekday or date is required".to_string(),
            )
            .into());
        }
    };
    let start = parse_wall_time(&payload.start_time)?;
    state
        .coordinator
        .toggle_slot(scope, start, payload.enabled)
        .await?;
    Ok(Json(OkResponse { ok: true }))
}

#[derive(Deserialize, Debug)]
pub struct ToggleWorkItemRequest {
    /// Tint quality tier, e.g. "carbon".
    pub tier: String,
    /// Work item key, e.g. "front_windshield".
    pub item: String,
    pub available: bool,
}

#[axum::debug_handler]
pub async fn toggle_work_item_handler(
    State(state): State<Arc<CoreState>>,
    Json(payload): Json<ToggleWorkItemRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    state
        .coordinator
        .toggle_work_item(&payload.tier, &payload.item, payload.available)
        .await?;
    Ok(Json(OkResponse { ok: true }))
}
