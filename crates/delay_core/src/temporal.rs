//! Timestamp-derived features
//!
//! Every extractor here is total: a missing or malformed timestamp degrades
//! to a fixed default (`night`, `0`, `0.0`) instead of failing, so one corrupt
//! row never aborts a preprocessing pass.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::record::FlightRecord;

/// Timestamp layout used by both `Fecha-I` and `Fecha-O`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// High-season windows as inclusive `((month, day), (month, day))` pairs
pub const HIGH_SEASON_WINDOWS: [((u32, u32), (u32, u32)); 4] = [
    ((12, 15), (12, 31)),
    ((1, 1), (3, 3)),
    ((7, 15), (7, 31)),
    ((9, 11), (9, 30)),
];

/// Time-of-day bucket of the scheduled departure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodDay {
    Morning,
    Afternoon,
    Night,
}

impl PeriodDay {
    pub const ALL: [PeriodDay; 3] = [PeriodDay::Morning, PeriodDay::Afternoon, PeriodDay::Night];

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodDay::Morning => "morning",
            PeriodDay::Afternoon => "afternoon",
            PeriodDay::Night => "night",
        }
    }

    /// Bucket a wall-clock time; bounds are inclusive to the second
    ///
    /// `11:59:30` is past the `11:59:00` morning bound and so falls in `night`.
    pub fn from_time(time: NaiveTime) -> Self {
        let key = (time.hour(), time.minute(), time.second());
        if ((5, 0, 0)..=(11, 59, 0)).contains(&key) {
            PeriodDay::Morning
        } else if ((12, 0, 0)..=(18, 59, 0)).contains(&key) {
            PeriodDay::Afternoon
        } else {
            PeriodDay::Night
        }
    }
}

impl fmt::Display for PeriodDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a `YYYY-MM-DD HH:MM:SS` timestamp as a naive local time
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).ok()
}

/// Time-of-day bucket for a scheduled timestamp; `night` if unparseable
pub fn period_day(fecha_i: &str) -> PeriodDay {
    match parse_timestamp(fecha_i) {
        Some(ts) => PeriodDay::from_time(ts.time()),
        None => {
            debug!(value = fecha_i, "unparseable Fecha-I, defaulting period_day to night");
            PeriodDay::Night
        }
    }
}

/// Whether a calendar date falls inside one of the high-season windows
pub fn is_high_season_date(date: NaiveDate) -> bool {
    let key = (date.month(), date.day());
    HIGH_SEASON_WINDOWS
        .iter()
        .any(|&(start, end)| start <= key && key <= end)
}

/// 1 if the scheduled date is in high season, 0 otherwise or if unparseable
pub fn high_season(fecha_i: &str) -> u8 {
    match parse_timestamp(fecha_i) {
        Some(ts) => u8::from(is_high_season_date(ts.date())),
        None => {
            debug!(value = fecha_i, "unparseable Fecha-I, defaulting high_season to 0");
            0
        }
    }
}

/// Minutes between actual and scheduled time; 0.0 if either is unparseable
///
/// The zero default also hides real delays on malformed rows. That is a
/// known approximation of the labelling, kept for compatibility with models
/// trained on the same rule.
pub fn min_diff(fecha_i: &str, fecha_o: &str) -> f64 {
    match (parse_timestamp(fecha_i), parse_timestamp(fecha_o)) {
        (Some(scheduled), Some(actual)) => (actual - scheduled).num_seconds() as f64 / 60.0,
        _ => {
            debug!(fecha_i, fecha_o, "unparseable timestamp pair, defaulting min_diff to 0");
            0.0
        }
    }
}

/// Raw record plus derived temporal features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeredRecord {
    #[serde(flatten)]
    pub record: FlightRecord,
    pub period_day: PeriodDay,
    pub high_season: u8,
    pub min_diff: f64,
}

impl EngineeredRecord {
    /// Derive temporal features; missing timestamps take the fail-safe defaults
    pub fn from_record(record: &FlightRecord) -> Self {
        let fecha_i = record.fecha_i.as_deref().unwrap_or("");
        let fecha_o = record.fecha_o.as_deref().unwrap_or("");

        Self {
            period_day: period_day(fecha_i),
            high_season: high_season(fecha_i),
            min_diff: min_diff(fecha_i, fecha_o),
            record: record.clone(),
        }
    }
}

/// Engineer a whole batch, preserving order
pub fn engineer(records: &[FlightRecord]) -> Vec<EngineeredRecord> {
    records.iter().map(EngineeredRecord::from_record).collect()
}
