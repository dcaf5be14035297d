// --- File: crates/tintbook_core/src/routes.rs ---

use crate::auth::{admin_auth_middleware, AdminAuthState};
use crate::handlers::{
    cancel_booking_handler, create_booking_handler, get_availability_handler,
    list_bookings_handler, refund_booking_handler, toggle_slot_handler, toggle_work_item_handler,
    CoreState,
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Creates a router containing the public booking routes and the
/// secret-guarded admin routes.
pub fn routes(state: Arc<CoreState>) -> Router {
    let auth_state = Arc::new(AdminAuthState {
        config: Arc::clone(&state.config),
    });

    let admin_routes = Router::new()
        .route("/admin/bookings", get(list_bookings_handler))
        .route("/admin/bookings/{id}/cancel", post(cancel_booking_handler))
        .route("/admin/bookings/{id}/refund", post(refund_booking_handler))
        .route("/admin/slots", post(toggle_slot_handler))
        .route("/admin/work-items", post(toggle_work_item_handler))
        .route_layer(middleware::from_fn_with_state(
            auth_state,
            admin_auth_middleware,
        ));

    Router::new()
        .route("/availability", get(get_availability_handler))
        .route("/bookings", post(create_booking_handler))
        .merge(admin_routes)
        .with_state(state)
}
