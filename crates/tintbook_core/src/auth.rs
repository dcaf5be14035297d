// --- File: crates/tintbook_core/src/auth.rs ---

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use constant_time_eq::constant_time_eq; // For secure string comparison
use std::sync::Arc;
use tintbook_config::AppConfig; // To access the shared secret
use tracing::warn;

// The state that this auth middleware will have access to.
// It needs the AppConfig to get the shared secret.
#[derive(Clone)]
pub struct AdminAuthState {
    pub config: Arc<AppConfig>,
}

const ADMIN_AUTH_HEADER: &str = "X-Admin-Auth-Secret";

/// Axum middleware to authenticate admin dashboard requests.
/// Checks for a shared secret in the `X-Admin-Auth-Secret` header.
pub async fn admin_auth_middleware(
    State(auth_state): State<Arc<AdminAuthState>>,
    req: Request,
    next: Next,
) -> Response {
    // 1. Get the expected shared secret from config
    let expected_secret: String = match auth_state
        .config
        .admin
        .as_ref()
        .and_then(|a_cfg| a_cfg.shared_secret.clone())
    {
        Some(secret) => secret,
        None => {
            warn!("Admin shared secret not configured in AppConfig!");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server configuration error for admin auth.".to_string(),
            )
                .into_response();
        }
    };

    // 2. Get the token from the request header
    let provided_secret: Option<&str> = req
        .headers()
        .get(ADMIN_AUTH_HEADER)
        .and_then(|value| value.to_str().ok());

    // 3. Validate the token
    match provided_secret {
        Some(provided) => {
            if constant_time_eq(provided.as_bytes(), expected_secret.as_bytes()) {
                next.run(req).await
            } else {
                warn!("Admin request: invalid secret provided.");
                (
                    StatusCode::UNAUTHORIZED,
                    "Unauthorized: Invalid credentials.".to_string(),
                )
                    .into_response()
            }
        }
        None => {
            warn!("Admin request: missing '{}' header.", ADMIN_AUTH_HEADER);
            (
                StatusCode::UNAUTHORIZED,
                format!("Unauthorized: Missing {} header.", ADMIN_AUTH_HEADER),
            )
                .into_response()
        }
    }
}
