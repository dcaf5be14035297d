//! SQL repositories backing the core storage contracts.

pub mod booking_ledger_sql;
pub mod toggles_sql;

use crate::client::DbClient;
use crate::error::DbError;
use tracing::info;

/// Create the tables and indexes used by the repositories if they are
/// missing. Statements are executed one at a time; the Any driver does not
/// batch.
pub async fn init_schema(client: &DbClient) -> Result<(), DbError> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS bookings (
            id TEXT PRIMARY KEY,
            date TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            full_name TEXT NOT NULL,
            phone TEXT NOT NULL,
            email TEXT NOT NULL,
            vehicle TEXT NOT NULL,
            tint_quality TEXT NOT NULL,
            tint_shade TEXT NOT NULL,
            windows TEXT NOT NULL,
            amount_total BIGINT NOT NULL,
            amount_deposit BIGINT NOT NULL,
            status TEXT NOT NULL,
            payment_ref TEXT,
            calendar_event_ref TEXT,
            created_at TEXT NOT NULL
        )
        "#,
        // Partial unique index: at most one active reservation per window.
        // Cancelled and refunded rows stay behind without holding the slot.
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_bookings_active_slot
            ON bookings (date, start_time)
            WHERE status IN ('pending_payment', 'deposit_paid')
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_bookings_date ON bookings (date)
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS slot_toggles (
            scope_kind TEXT NOT NULL,
            scope_value TEXT NOT NULL,
            start_time TEXT NOT NULL,
            enabled INTEGER NOT NULL,
            PRIMARY KEY (scope_kind, scope_value, start_time)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS work_item_availability (
            tier TEXT NOT NULL,
            item TEXT NOT NULL,
            available INTEGER NOT NULL,
            PRIMARY KEY (tier, item)
        )
        "#,
    ];
    for statement in statements {
        sqlx::query(statement)
            .execute(client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
    }
    info!("database schema initialized");
    Ok(())
}
