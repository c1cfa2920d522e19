use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One network-quality measurement reported by a device.
/// Immutable once stored; the API only reads these.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DiagnosticRecord {
    pub id: i64,
    pub device_id: String,
    pub city: String,
    pub state: String,
    pub latency_ms: f64,
    pub packet_loss: f64,
    pub quality_of_service: f64,
    pub date: NaiveDateTime,
}

impl DiagnosticRecord {
    /// Re-round float fields at the repository boundary, independent of
    /// whatever rounding the store applied.
    pub fn rounded(mut self) -> Self {
        self.latency_ms = round2(self.latency_ms);
        self.packet_loss = round2(self.packet_loss);
        self.quality_of_service = round2(self.quality_of_service);
        self
    }
}

/// Measurement waiting to be inserted (seeding path only).
#[derive(Debug, Clone)]
pub struct NewDiagnostic {
    pub device_id: String,
    pub city: String,
    pub state: String,
    pub latency_ms: f64,
    pub packet_loss: f64,
    pub quality_of_service: f64,
    pub date: NaiveDateTime,
}

/// Grouping dimension for the aggregate endpoint. Decoded from the raw
/// `group_by` string exactly once, at the validation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Day,
    City,
    State,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Day => "day",
            GroupBy::City => "city",
            GroupBy::State => "state",
        }
    }
}

/// One row of grouped aggregation output. The variant matches the GroupBy
/// mode; serialization is flat (untagged) so each mode produces the field
/// set its dimension calls for.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum AggregateRow {
    Day {
        day: NaiveDate,
        total: i64,
        avg_latency_ms: f64,
        avg_packet_loss: f64,
        avg_quality_of_service: f64,
        min_latency_ms: f64,
        max_latency_ms: f64,
    },
    City {
        city: String,
        state: String,
        total: i64,
        avg_latency_ms: f64,
        avg_packet_loss: f64,
        avg_quality_of_service: f64,
    },
    State {
        state: String,
        total: i64,
        avg_latency_ms: f64,
        avg_packet_loss: f64,
        avg_quality_of_service: f64,
    },
}

impl AggregateRow {
    pub fn total(&self) -> i64 {
        match self {
            AggregateRow::Day { total, .. }
            | AggregateRow::City { total, .. }
            | AggregateRow::State { total, .. } => *total,
        }
    }
}

/// Single summary row over a filtered record set. COUNT/AVG over an empty
/// set yield zeroed numerics and absent timestamps, not an error.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatisticsSummary {
    pub total_diagnostics: i64,
    pub total_devices: i64,
    pub total_cities: i64,
    pub total_states: i64,
    pub avg_latency_ms: f64,
    pub avg_packet_loss: f64,
    pub avg_quality_of_service: f64,
    pub first_diagnostic: Option<NaiveDateTime>,
    pub last_diagnostic: Option<NaiveDateTime>,
}

/// Round to 2 decimal places. Every numeric field the API emits goes
/// through this so rounding is consistent across endpoints.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
