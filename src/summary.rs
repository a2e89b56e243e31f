//! Per-mediatype aggregation of entry counts and stock sizes.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Entry, MedialogError};

const UNIT_STEP: f64 = 1000.0;
const HUMAN_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Bytes per stock unit. Unknown units multiply by 1.
pub fn unit_multiplier(unit: &str) -> f64 {
    match unit.trim().to_ascii_uppercase().as_str() {
        "B" => 1.0,
        "KB" => UNIT_STEP,
        "MB" => UNIT_STEP.powi(2),
        "GB" => UNIT_STEP.powi(3),
        "TB" => UNIT_STEP.powi(4),
        _ => 1.0,
    }
}

pub fn to_bytes(size: f64, unit: &str) -> f64 {
    size * unit_multiplier(unit)
}

/// Render a byte count with the largest unit that keeps the value >= 1.
pub fn human_size(bytes: f64) -> String {
    let mut value = bytes;
    let mut idx = 0;
    while value.abs() >= UNIT_STEP && idx < HUMAN_UNITS.len() - 1 {
        value /= UNIT_STEP;
        idx += 1;
    }
    format!("{:.2} {}", value, HUMAN_UNITS[idx])
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mediatype: String,
    pub count: u64,
    pub size: f64,
    pub human_size: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub count: u64,
    pub size: f64,
    pub human_size: String,
}

/// Summaries keyed by mediatype, iterated in mediatype order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Summaries(BTreeMap<String, Summary>);

impl Summaries {
    pub fn add(&mut self, mediatype: &str, stock_size: f64, stock_unit: &str) {
        let bytes = to_bytes(stock_size, stock_unit);
        let summary = self
            .0
            .entry(mediatype.to_string())
            .or_insert_with(|| Summary {
                mediatype: mediatype.to_string(),
                count: 0,
                size: 0.0,
                human_size: String::new(),
            });
        summary.count += 1;
        summary.size += bytes;
        summary.human_size = human_size(summary.size);
    }

    pub fn to_vec(&self) -> Vec<Summary> {
        self.0.values().cloned().collect()
    }

    pub fn totals(&self) -> Totals {
        let (count, size) = self
            .0
            .values()
            .fold((0u64, 0f64), |(c, s), summary| (c + summary.count, s + summary.size));
        Totals {
            count,
            size,
            human_size: human_size(size),
        }
    }
}

pub fn summarize(entries: &[Entry]) -> Summaries {
    let mut summaries = Summaries::default();
    for entry in entries {
        summaries.add(&entry.mediatype, entry.stock_size_num, &entry.stock_unit);
    }
    summaries
}

/// Entries created inside an inclusive window of whole UTC days.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportFilter {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub repository_id: Option<i64>,
    pub refreshed_only: bool,
}

impl ReportFilter {
    /// Covers `start` 00:00:00 through the last millisecond of `end`.
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        repository_id: Option<i64>,
        refreshed_only: bool,
    ) -> Result<Self, MedialogError> {
        if end < start {
            return Err(MedialogError::InvertedDateRange(
                start.to_string(),
                end.to_string(),
            ));
        }
        let start_at = start
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| invalid_date("start_date", start.to_string()))?;
        let end_at = end
            .and_hms_milli_opt(23, 59, 59, 999)
            .ok_or_else(|| invalid_date("end_date", end.to_string()))?;
        Ok(Self {
            start: start_at.and_utc(),
            end: end_at.and_utc(),
            repository_id,
            refreshed_only,
        })
    }
}

fn invalid_date(field: &'static str, value: String) -> MedialogError {
    MedialogError::InvalidDate { field, value }
}

/// Parse a `YYYYMMDD` date.
pub fn parse_compact_date(field: &'static str, raw: &str) -> Result<NaiveDate, MedialogError> {
    let raw = raw.trim();
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid_date(field, raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, "%Y%m%d").map_err(|_| invalid_date(field, raw.to_string()))
}

pub fn date_from_parts(
    field: &'static str,
    year: i32,
    month: u32,
    day: u32,
) -> Result<NaiveDate, MedialogError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| invalid_date(field, format!("{year:04}-{month:02}-{day:02}")))
}
