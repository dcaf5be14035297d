// --- File: crates/tintbook_core/src/schedule.rs ---
//! Weekly schedule rules and the slot generator.
//!
//! The schedule is configured as wall-clock opening hours per weekday plus a
//! slot granularity. Slot generation is a pure function of (weekday, rules):
//! no I/O, no clock reads, identical output for identical input.

use chrono::{Datelike, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::Serialize;
use std::str::FromStr;
use tintbook_common::{config_error, TintbookError};
use tintbook_config::ScheduleConfig;
use tracing::debug;

/// A candidate bookable time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// One contiguous block of opening hours within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoursBlock {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Validated weekly schedule: opening hours per weekday (Sunday-indexed),
/// slot duration, the high-volume weekday the adjacency rule applies to,
/// and the shop timezone.
#[derive(Debug, Clone)]
pub struct ScheduleRules {
    slot_duration_minutes: u32,
    adjacency_weekday: u8,
    hours: [Vec<HoursBlock>; 7],
    time_zone: Tz,
}

/// Sunday-indexed weekday (0=Sun .. 6=Sat) of a calendar date.
pub fn weekday_of(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Parses a wall-clock "HH:MM" string.
pub fn parse_wall_time(s: &str) -> Result<NaiveTime, TintbookError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| TintbookError::ValidationError(format!("invalid time of day: {s}")))
}

fn minutes_of(t: NaiveTime) -> u32 {
    use chrono::Timelike;
    t.hour() * 60 + t.minute()
}

fn time_from_minutes(m: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(m / 60, m % 60, 0)
}

impl ScheduleRules {
    /// Builds and validates schedule rules from configuration.
    ///
    /// Rejected as `ConfigError`: unparseable times, blocks with
    /// `start >= end`, overlapping blocks within a weekday, a zero slot
    /// duration, weekday keys outside 0..=6, and unknown timezones.
    pub fn from_config(cfg: &ScheduleConfig) -> Result<Self, TintbookError> {
        if cfg.slot_duration_minutes == 0 || cfg.slot_duration_minutes > 24 * 60 {
            return Err(config_error(format!(
                "slot_duration_minutes out of range: {}",
                cfg.slot_duration_minutes
            )));
        }
        if cfg.adjacency_weekday > 6 {
            return Err(config_error(format!(
                "adjacency_weekday out of range: {}",
                cfg.adjacency_weekday
            )));
        }
        let time_zone = match &cfg.time_zone {
            Some(name) => Tz::from_str(name)
                .map_err(|_| config_error(format!("unknown time zone: {name}")))?,
            None => chrono_tz::America::Guadeloupe,
        };

        let mut hours: [Vec<HoursBlock>; 7] = Default::default();
        for (key, blocks) in &cfg.hours {
            let weekday: u8 = key
                .parse()
                .ok()
                .filter(|w| *w <= 6)
                .ok_or_else(|| config_error(format!("invalid weekday key: {key}")))?;
            let mut parsed = Vec::with_capacity(blocks.len());
            for block in blocks {
                let start = parse_wall_time(&block.start)
                    .map_err(|_| config_error(format!("invalid block start: {}", block.start)))?;
                let end = parse_wall_time(&block.end)
                    .map_err(|_| config_error(format!("invalid block end: {}", block.end)))?;
                if start >= end {
                    return Err(config_error(format!(
                        "hours block must end after it starts: {}-{}",
                        block.start, block.end
                    )));
                }
                parsed.push(HoursBlock { start, end });
            }
            parsed.sort_by_key(|b| b.start);
            for pair in parsed.windows(2) {
                if pair[1].start < pair[0].end {
                    return Err(config_error(format!(
                        "overlapping hours blocks on weekday {weekday}"
                    )));
                }
            }
            hours[weekday as usize] = parsed;
        }

        Ok(ScheduleRules {
            slot_duration_minutes: cfg.slot_duration_minutes,
            adjacency_weekday: cfg.adjacency_weekday,
            hours,
            time_zone,
        })
    }

    pub fn slot_duration_minutes(&self) -> u32 {
        self.slot_duration_minutes
    }

    /// The weekday (Sunday-indexed) on which the adjacency rule applies.
    pub fn adjacency_weekday(&self) -> u8 {
        self.adjacency_weekday
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    pub fn blocks_for(&self, weekday: u8) -> &[HoursBlock] {
        self.hours
            .get(weekday as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Generates the ordered candidate slots for a weekday.
    ///
    /// Each opening block is walked in fixed steps of the slot duration; a
    /// step that would overrun the block end is dropped (no partial slots).
    /// A weekday with no blocks yields an empty list (closed day).
    pub fn generate_slots(&self, weekday: u8) -> Vec<SlotWindow> {
        let duration = self.slot_duration_minutes;
        let mut slots = Vec::new();
        for block in self.blocks_for(weekday) {
            let end = minutes_of(block.end);
            let mut cur = minutes_of(block.start);
            while cur + duration <= end {
                // block bounds are validated < 24:00, so both lookups succeed
                if let (Some(start), Some(slot_end)) =
                    (time_from_minutes(cur), time_from_minutes(cur + duration))
                {
                    slots.push(SlotWindow {
                        start,
                        end: slot_end,
                    });
                }
                cur += duration;
            }
        }
        debug!(weekday, count = slots.len(), "generated candidate slots");
        slots
    }

    /// Generates the candidate slots for a concrete date.
    pub fn generate_slots_for_date(&self, date: NaiveDate) -> Vec<SlotWindow> {
        self.generate_slots(weekday_of(date))
    }

    /// The slot that the adjacency rule blocks for a booking starting at
    /// `start`: the candidate beginning exactly one hour later.
    pub fn adjacent_blocked_start(start: NaiveTime) -> Option<NaiveTime> {
        time_from_minutes(minutes_of(start) + 60)
    }
}
