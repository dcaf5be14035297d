// --- File: crates/tintbook_gcal/src/service.rs ---
//! Calendar mirror implementation over the Google Calendar REST API.
//!
//! Events are written with a bearer token from the environment; the mirror
//! is strictly write-only and never consulted for availability (the booking
//! ledger is the source of truth).

use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use tintbook_common::services::{
    BoxFuture, BoxedError, CalendarMirror, MirrorEvent, MirrorEventResult,
};
use tintbook_common::HTTP_CLIENT;
use tintbook_config::GcalConfig;
use tracing::{debug, info};

/// Errors that can occur when mirroring into Google Calendar.
#[derive(Error, Debug)]
pub enum GcalMirrorError {
    #[error("Calendar mirror request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Calendar API returned an error: {message} (Status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Failed to parse calendar API response: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Calendar mirror configuration missing or incomplete: {0}")]
    ConfigError(String),
}

#[derive(Serialize, Debug)]
struct GcalEventTime<'a> {
    #[serde(rename = "dateTime")]
    date_time: &'a str,
    #[serde(rename = "timeZone")]
    time_zone: &'a str,
}

#[derive(Serialize, Debug)]
struct GcalEventBody<'a> {
    summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    start: GcalEventTime<'a>,
    end: GcalEventTime<'a>,
}

#[derive(Deserialize, Debug)]
struct GcalEventResponse {
    id: Option<String>,
    status: Option<String>,
}

/// Write-only Google Calendar mirror.
pub struct HttpCalendarMirror {
    calendar_id: String,
}

impl HttpCalendarMirror {
    /// Builds the mirror from configuration. The bearer token is read from
    /// the `GCAL_API_TOKEN` environment variable at call time, so it can be
    /// rotated without a restart.
    pub fn from_config(config: &GcalConfig) -> Result<Self, GcalMirrorError> {
        let calendar_id = config
            .calendar_id
            .clone()
            .ok_or_else(|| GcalMirrorError::ConfigError("calendar_id is not set".to_string()))?;
        Ok(Self { calendar_id })
    }

    fn api_token() -> Result<String, GcalMirrorError> {
        env::var("GCAL_API_TOKEN")
            .map_err(|_| GcalMirrorError::ConfigError("GCAL_API_TOKEN is not set".to_string()))
    }

    fn events_url(&self) -> String {
        format!(
            "https://www.googleapis.com/calendar/v3/calendars/{}/events",
            self.calendar_id
        )
    }

    async fn create(&self, event: MirrorEvent) -> Result<MirrorEventResult, GcalMirrorError> {
        let token = Self::api_token()?;
        let body = GcalEventBody {
            summary: &event.summary,
            description: event.description.as_deref(),
            start: GcalEventTime {
                date_time: &event.start_time,
                time_zone: &event.time_zone,
            },
            end: GcalEventTime {
                date_time: &event.end_time,
                time_zone: &event.time_zone,
            },
        };

        let response = HTTP_CLIENT
            .post(self.events_url())
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let body_text = response.text().await?;
        if !status.is_success() {
            return Err(GcalMirrorError::ApiError {
                status_code: status.as_u16(),
                message: body_text,
            });
        }

        let created: GcalEventResponse = serde_json::from_str(&body_text)?;
        info!(event_id = ?created.id, "calendar event mirrored");
        Ok(MirrorEventResult {
            event_id: created.id,
            status: created.status.unwrap_or_else(|| "confirmed".to_string()),
        })
    }

    async fn cancel(&self, event_ref: &str) -> Result<(), GcalMirrorError> {
        let token = Self::api_token()?;
        let response = HTTP_CLIENT
            .delete(format!("{}/{}", self.events_url(), event_ref))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        // an already-deleted event is fine, cancellation is idempotent
        if status.is_success() || status.as_u16() == 404 || status.as_u16() == 410 {
            debug!(event_ref, "calendar event cancelled");
            return Ok(());
        }
        let body_text = response.text().await?;
        Err(GcalMirrorError::ApiError {
            status_code: status.as_u16(),
            message: body_text,
        })
    }
}

impl CalendarMirror for HttpCalendarMirror {
    type Error = BoxedError;

    fn create_event(&self, event: MirrorEvent) -> BoxFuture<'_, MirrorEventResult, Self::Error> {
        Box::pin(async move { self.create(event).await.map_err(|e| BoxedError(Box::new(e))) })
    }

    fn cancel_event(&self, event_ref: &str) -> BoxFuture<'_, (), Self::Error> {
        let event_ref = event_ref.to_string();
        Box::pin(async move {
            self.cancel(&event_ref)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }
}
