//! SQL implementation of the booking ledger.
//!
//! Rows are stored with ISO-8601 text dates and times so the ordering the
//! queries rely on is plain lexicographic ordering. The partial unique index
//! on `(date, start_time)` turns a racing insert for the same window into a
//! unique violation, which surfaces as `LedgerError::Conflict`.

use crate::client::DbClient;
use crate::error::DbError;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::any::AnyRow;
use sqlx::Row;
use tintbook_common::services::BoxFuture;
use tintbook_core::ledger::{BookingLedger, LedgerError};
use tintbook_core::models::{CustomerDetails, Reservation, ReservationStatus};
use tracing::debug;

/// SQL implementation of the booking ledger.
#[derive(Debug, Clone)]
pub struct SqlBookingLedger {
    db_client: DbClient,
}

impl SqlBookingLedger {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

fn storage(e: DbError) -> LedgerError {
    LedgerError::Storage(e.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db)
            if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation)
    )
}

fn parse_time(s: &str) -> Result<NaiveTime, DbError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| DbError::RowError(format!("bad stored time {s:?}: {e}")))
}

fn row_to_reservation(row: &AnyRow) -> Result<Reservation, DbError> {
    let date: String = row.try_get("date")?;
    let start_time: String = row.try_get("start_time")?;
    let end_time: String = row.try_get("end_time")?;
    let windows: String = row.try_get("windows")?;
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Reservation {
        id: row.try_get("id")?,
        date: NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| DbError::RowError(format!("bad stored date {date:?}: {e}")))?,
        start_time: parse_time(&start_time)?,
        end_time: parse_time(&end_time)?,
        customer: CustomerDetails {
            full_name: row.try_get("full_name")?,
            phone: row.try_get("phone")?,
            email: row.try_get("email")?,
            vehicle: row.try_get("vehicle")?,
        },
        tint_quality: row.try_get("tint_quality")?,
        tint_shade: row.try_get("tint_shade")?,
        windows: serde_json::from_str(&windows)
            .map_err(|e| DbError::RowError(format!("bad stored windows {windows:?}: {e}")))?,
        amount_total: row.try_get("amount_total")?,
        amount_deposit: row.try_get("amount_deposit")?,
        status: ReservationStatus::parse(&status)
            .ok_or_else(|| DbError::RowError(format!("unknown stored status {status:?}")))?,
        payment_ref: row.try_get("payment_ref")?,
        calendar_event_ref: row.try_get("calendar_event_ref")?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| DbError::RowError(format!("bad stored timestamp {created_at:?}: {e}")))?,
    })
}

impl SqlBookingLedger {
    async fn fetch_by_id(&self, id: &str) -> Result<Option<Reservation>, LedgerError> {
        let row = sqlx::query("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| storage(DbError::QueryError(e.to_string())))?;
        row.map(|r| row_to_reservation(&r).map_err(storage))
            .transpose()
    }
}

impl BookingLedger for SqlBookingLedger {
    fn insert(&self, reservation: Reservation) -> BoxFuture<'_, Reservation, LedgerError> {
        Box::pin(async move {
            let windows = serde_json::to_string(&reservation.windows)
                .map_err(|e| storage(DbError::RowError(e.to_string())))?;
            let result = sqlx::query(
                r#"
                INSERT INTO bookings (
                    id, date, start_time, end_time,
                    full_name, phone, email, vehicle,
                    tint_quality, tint_shade, windows,
                    amount_total, amount_deposit, status,
                    payment_ref, calendar_event_ref, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&reservation.id)
            .bind(reservation.date.format("%Y-%m-%d").to_string())
            .bind(reservation.start_time.format("%H:%M").to_string())
            .bind(reservation.end_time.format("%H:%M").to_string())
            .bind(&reservation.customer.full_name)
            .bind(&reservation.customer.phone)
            .bind(&reservation.customer.email)
            .bind(&reservation.customer.vehicle)
            .bind(&reservation.tint_quality)
            .bind(&reservation.tint_shade)
            .bind(&windows)
            .bind(reservation.amount_total)
            .bind(reservation.amount_deposit)
            .bind(reservation.status.as_str())
            .bind(reservation.payment_ref.as_deref())
            .bind(reservation.calendar_event_ref.as_deref())
            .bind(reservation.created_at.to_rfc3339())
            .execute(self.db_client.pool())
            .await;

            match result {
                Ok(_) => {
                    debug!(id = %reservation.id, "reservation row inserted");
                    Ok(reservation)
                }
                Err(e) if is_unique_violation(&e) => Err(LedgerError::Conflict {
                    date: reservation.date,
                    start: reservation.start_time,
                }),
                Err(e) => Err(storage(DbError::QueryError(e.to_string()))),
            }
        })
    }

    fn find_by_date(&self, date: NaiveDate) -> BoxFuture<'_, Vec<Reservation>, LedgerError> {
        Box::pin(async move {
            let rows = sqlx::query("SELECT * FROM bookings WHERE date = ? ORDER BY start_time")
                .bind(date.format("%Y-%m-%d").to_string())
                .fetch_all(self.db_client.pool())
                .await
                .map_err(|e| storage(DbError::QueryError(e.to_string())))?;
            rows.iter()
                .map(|r| row_to_reservation(r).map_err(storage))
                .collect()
        })
    }

    fn find_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> BoxFuture<'_, Vec<Reservation>, LedgerError> {
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT * FROM bookings WHERE date >= ? AND date <= ? ORDER BY date, start_time",
            )
            .bind(from.format("%Y-%m-%d").to_string())
            .bind(to.format("%Y-%m-%d").to_string())
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| storage(DbError::QueryError(e.to_string())))?;
            rows.iter()
                .map(|r| row_to_reservation(r).map_err(storage))
                .collect()
        })
    }

    fn find_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Option<Reservation>, LedgerError> {
        Box::pin(async move { self.fetch_by_id(id).await })
    }

    fn update_status<'a>(
        &'a self,
        id: &'a str,
        status: ReservationStatus,
        payment_ref: Option<String>,
    ) -> BoxFuture<'a, Reservation, LedgerError> {
        Box::pin(async move {
            let result = sqlx::query(
                "UPDATE bookings SET status = ?, payment_ref = COALESCE(?, payment_ref) WHERE id = ?",
            )
            .bind(status.as_str())
            .bind(payment_ref.as_deref())
            .bind(id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| storage(DbError::QueryError(e.to_string())))?;
            if result.rows_affected() == 0 {
                return Err(LedgerError::NotFound(id.to_string()));
            }
            self.fetch_by_id(id)
                .await?
                .ok_or_else(|| LedgerError::NotFound(id.to_string()))
        })
    }

    fn attach_calendar_ref<'a>(
        &'a self,
        id: &'a str,
        event_ref: &'a str,
    ) -> BoxFuture<'a, (), LedgerError> {
        Box::pin(async move {
            let result = sqlx::query("UPDATE bookings SET calendar_event_ref = ? WHERE id = ?")
                .bind(event_ref)
                .bind(id)
                .execute(self.db_client.pool())
                .await
                .map_err(|e| storage(DbError::QueryError(e.to_string())))?;
            if result.rows_affected() == 0 {
                return Err(LedgerError::NotFound(id.to_string()));
            }
            Ok(())
        })
    }
}
