// File: services/tintbook_backend/src/main.rs
use axum::{routing::get, Router};
use chrono_tz::Tz;
use std::sync::Arc;
use tintbook_common::services::{BoxedError, CalendarMirror, PaymentService};
use tintbook_config::{load_config, AppConfig};
use tintbook_core::coordinator::ReservationCoordinator;
use tintbook_core::handlers::CoreState;
use tintbook_core::ledger::{BookingLedger, OverrideStore, WorkItemCatalog};
use tintbook_core::memory::{MemoryCatalog, MemoryLedger, MemoryOverrideStore};
use tintbook_core::routes as core_routes;
use tintbook_core::schedule::ScheduleRules;
use tintbook_db::{init_schema, DbClient, SqlBookingLedger, SqlOverrideStore, SqlWorkItemCatalog};
use tintbook_gcal::service::HttpCalendarMirror;
use tintbook_gcal::worker::spawn_mirror_worker;
use tintbook_stripe::handlers::StripeState;
use tintbook_stripe::routes as stripe_routes;
use tintbook_stripe::service::StripePaymentService;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

type Stores = (
    Arc<dyn BookingLedger>,
    Arc<dyn OverrideStore>,
    Arc<dyn WorkItemCatalog>,
);

/// Picks the SQL stores when a database is configured, the in-memory ones
/// otherwise. The in-memory fallback is meant for local development only.
async fn build_stores(config: &AppConfig) -> Stores {
    if let Some(db_config) = &config.database {
        let client = DbClient::from_config(db_config)
            .await
            .expect("Failed to connect to the configured database");
        init_schema(&client)
            .await
            .expect("Failed to initialize the database schema");
        info!("booking ledger backed by {}", db_config.url);
        return (
            Arc::new(SqlBookingLedger::new(client.clone())),
            Arc::new(SqlOverrideStore::new(client.clone())),
            Arc::new(SqlWorkItemCatalog::new(client)),
        );
    }
    warn!("no database configured, bookings are kept in memory and lost on restart");
    (
        Arc::new(MemoryLedger::new()),
        Arc::new(MemoryOverrideStore::new()),
        Arc::new(MemoryCatalog::new()),
    )
}

fn build_mirror(config: &AppConfig) -> Option<Arc<dyn CalendarMirror<Error = BoxedError>>> {
    if !config.use_gcal {
        return None;
    }
    let Some(gcal_config) = &config.gcal else {
        warn!("use_gcal is set but the [gcal] section is missing, mirroring disabled");
        return None;
    };
    match HttpCalendarMirror::from_config(gcal_config) {
        Ok(mirror) => Some(Arc::new(mirror)),
        Err(e) => {
            warn!("calendar mirroring disabled: {e}");
            None
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Arc::new(load_config().expect("Failed to load config"));
    tintbook_common::logging::init();

    let rules =
        ScheduleRules::from_config(&config.schedule).expect("Invalid schedule configuration");
    let time_zone = rules.time_zone();

    let (ledger, overrides, catalog) = build_stores(&config).await;
    let coordinator = Arc::new(ReservationCoordinator::new(
        rules,
        config.pricing.clone(),
        ledger,
        overrides,
        catalog,
    ));

    let payment: Option<Arc<dyn PaymentService<Error = BoxedError>>> = if config.use_stripe {
        Some(Arc::new(StripePaymentService::new()))
    } else {
        None
    };

    let mirror = build_mirror(&config);
    // calendar events may display in a different zone than the shop schedule
    let mirror_time_zone = config
        .gcal
        .as_ref()
        .and_then(|g| g.time_zone.as_deref())
        .and_then(|name| match name.parse::<Tz>() {
            Ok(tz) => Some(tz),
            Err(_) => {
                warn!("unknown gcal.time_zone {name:?}, using the schedule zone");
                None
            }
        })
        .unwrap_or(time_zone);
    // the webhook handler enqueues paid bookings here; the worker owns the retries
    let on_paid = mirror.as_ref().map(|m| {
        spawn_mirror_worker(Arc::clone(m), coordinator.ledger(), mirror_time_zone).sender()
    });

    let core_state = Arc::new(CoreState {
        config: config.clone(),
        coordinator: coordinator.clone(),
        payment,
        mirror,
    });
    let stripe_state = Arc::new(StripeState {
        config: config.clone(),
        coordinator,
        on_paid,
    });

    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to the Tintbook API!" }))
        .merge(core_routes::routes(core_state))
        .merge(stripe_routes::routes(stripe_state));

    let mut app = Router::new()
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http());

    // Serve the booking frontend out of dist/ in dev mode
    if cfg!(debug_assertions) {
        info!("development mode, serving static files from ./dist");
        app = app.fallback_service(ServeDir::new("dist"));
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind server address");
    info!("Starting server at http://{addr}");
    info!("API endpoints available at http://{addr}/api");

    axum::serve(listener, app.into_make_service())
        .await
        .expect("Server error");
}
