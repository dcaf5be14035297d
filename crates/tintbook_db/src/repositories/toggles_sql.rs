//! SQL implementations of the admin toggle stores: slot overrides and the
//! work-item availability catalog.

use crate::client::DbClient;
use crate::error::DbError;
use chrono::{NaiveDate, NaiveTime};
use sqlx::any::AnyRow;
use sqlx::Row;
use tintbook_common::services::BoxFuture;
use tintbook_core::ledger::{LedgerError, OverrideStore, WorkItemCatalog};
use tintbook_core::models::{OverrideScope, SlotOverride};

fn storage(e: DbError) -> LedgerError {
    LedgerError::Storage(e.to_string())
}

fn scope_columns(scope: OverrideScope) -> (&'static str, String) {
    match scope {
        OverrideScope::Weekday(w) => ("weekday", w.to_string()),
        OverrideScope::Date(d) => ("date", d.format("%Y-%m-%d").to_string()),
    }
}

fn row_to_override(row: &AnyRow) -> Result<SlotOverride, DbError> {
    let kind: String = row.try_get("scope_kind")?;
    let value: String = row.try_get("scope_value")?;
    let start: String = row.try_get("start_time")?;
    // toggles are stored as 0/1; the Any driver has no portable bool
    let enabled: i32 = row.try_get("enabled")?;

    let scope = match kind.as_str() {
        "weekday" => OverrideScope::Weekday(
            value
                .parse()
                .map_err(|_| DbError::RowError(format!("bad stored weekday {value:?}")))?,
        ),
        "date" => OverrideScope::Date(
            NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                .map_err(|_| DbError::RowError(format!("bad stored date {value:?}")))?,
        ),
        other => return Err(DbError::RowError(format!("unknown scope kind {other:?}"))),
    };
    Ok(SlotOverride {
        scope,
        start: NaiveTime::parse_from_str(&start, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&start, "%H:%M:%S"))
            .map_err(|_| DbError::RowError(format!("bad stored time {start:?}")))?,
        enabled: enabled != 0,
    })
}

/// SQL implementation of the slot override store.
#[derive(Debug, Clone)]
pub struct SqlOverrideStore {
    db_client: DbClient,
}

impl SqlOverrideStore {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

impl OverrideStore for SqlOverrideStore {
    fn set(&self, slot_override: SlotOverride) -> BoxFuture<'_, (), LedgerError> {
        Box::pin(async move {
            let (kind, value) = scope_columns(slot_override.scope);
            sqlx::query(
                r#"
                INSERT INTO slot_toggles (scope_kind, scope_value, start_time, enabled)
                VALUES (?, ?, ?, ?)
                ON CONFLICT (scope_kind, scope_value, start_time)
                DO UPDATE SET enabled = excluded.enabled
                "#,
            )
            .bind(kind)
            .bind(&value)
            .bind(slot_override.start.format("%H:%M").to_string())
            .bind(slot_override.enabled as i32)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| storage(DbError::QueryError(e.to_string())))?;
            Ok(())
        })
    }

    fn for_date(
        &self,
        date: NaiveDate,
        weekday: u8,
    ) -> BoxFuture<'_, Vec<SlotOverride>, LedgerError> {
        Box::pin(async move {
            let rows = sqlx::query(
                r#"
                SELECT scope_kind, scope_value, start_time, enabled FROM slot_toggles
                WHERE (scope_kind = 'weekday' AND scope_value = ?)
                   OR (scope_kind = 'date' AND scope_value = ?)
                "#,
            )
            .bind(weekday.to_string())
            .bind(date.format("%Y-%m-%d").to_string())
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| storage(DbError::QueryError(e.to_string())))?;
            rows.iter()
                .map(|r| row_to_override(r).map_err(storage))
                .collect()
        })
    }

    fn list(&self) -> BoxFuture<'_, Vec<SlotOverride>, LedgerError> {
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT scope_kind, scope_value, start_time, enabled FROM slot_toggles",
            )
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| storage(DbError::QueryError(e.to_string())))?;
            rows.iter()
                .map(|r| row_to_override(r).map_err(storage))
                .collect()
        })
    }
}

/// SQL implementation of the work-item availability catalog.
#[derive(Debug, Clone)]
pub struct SqlWorkItemCatalog {
    db_client: DbClient,
}

impl SqlWorkItemCatalog {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

impl WorkItemCatalog for SqlWorkItemCatalog {
    fn set_availability<'a>(
        &'a self,
        tier: &'a str,
        item: &'a str,
        available: bool,
    ) -> BoxFuture<'a, (), LedgerError> {
        Box::pin(async move {
            sqlx::query(
                r#"
                INSERT INTO work_item_availability (tier, item, available)
                VALUES (?, ?, ?)
                ON CONFLICT (tier, item)
                DO UPDATE SET available = excluded.available
                "#,
            )
            .bind(tier)
            .bind(item)
            .bind(available as i32)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| storage(DbError::QueryError(e.to_string())))?;
            Ok(())
        })
    }

    fn disabled_items<'a>(&'a self, tier: &'a str) -> BoxFuture<'a, Vec<String>, LedgerError> {
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT item FROM work_item_availability WHERE tier = ? AND available = ?",
            )
            .bind(tier)
            .bind(0_i32)
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| storage(DbError::QueryError(e.to_string())))?;
            rows.iter()
                .map(|r| {
                    r.try_get::<String, _>("item")
                        .map_err(|e| storage(DbError::RowError(e.to_string())))
                })
                .collect()
        })
    }
}
