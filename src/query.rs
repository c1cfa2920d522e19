//! SQL query construction.
//!
//! All four query shapes (count, list, aggregate, statistics) share one
//! clause accumulator so the predicate is built exactly once per request:
//! the count a page reports is always computed over the same WHERE clause
//! as the page itself. Filter values are always bound parameters, never
//! spliced into the SQL text.

use chrono::NaiveDate;

use crate::models::GroupBy;
use crate::validate::{FilterSet, PageRequest};

/// A value bound to a `?` placeholder, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Int(i64),
    Date(NaiveDate),
}

/// A rendered query plus its bind values, ready for the storage driver.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub sql: String,
    pub binds: Vec<BindValue>,
}

#[derive(Debug, Clone, PartialEq)]
struct Clause {
    predicate: &'static str,
    bind: BindValue,
}

/// Ordered, AND-combined filter predicates. Built once from a FilterSet
/// and rendered into every query shape that needs it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    clauses: Vec<Clause>,
}

impl WhereClause {
    pub fn from_filters(filters: &FilterSet) -> Self {
        let mut clauses = Vec::new();

        // Case-insensitive substring containment, intentionally not an
        // exact match: "Sal" matches "Salvador".
        if let Some(city) = &filters.city {
            clauses.push(Clause {
                predicate: "city LIKE ? COLLATE NOCASE",
                bind: BindValue::Text(format!("%{city}%")),
            });
        }
        if let Some(state) = &filters.state {
            clauses.push(Clause {
                predicate: "state LIKE ? COLLATE NOCASE",
                bind: BindValue::Text(format!("%{state}%")),
            });
        }
        // Inclusive date-only bounds; time-of-day is ignored.
        if let Some(start) = filters.start_date {
            clauses.push(Clause {
                predicate: "DATE(date) >= DATE(?)",
                bind: BindValue::Date(start),
            });
        }
        if let Some(end) = filters.end_date {
            clauses.push(Clause {
                predicate: "DATE(date) <= DATE(?)",
                bind: BindValue::Date(end),
            });
        }

        Self { clauses }
    }

    /// Renders `" WHERE a AND b"`, or an empty string when unfiltered.
    fn render(&self) -> String {
        if self.clauses.is_empty() {
            return String::new();
        }
        let predicates: Vec<&str> = self.clauses.iter().map(|c| c.predicate).collect();
        format!(" WHERE {}", predicates.join(" AND "))
    }

    fn binds(&self) -> Vec<BindValue> {
        self.clauses.iter().map(|c| c.bind.clone()).collect()
    }
}

const RECORD_COLUMNS: &str =
    "id, device_id, city, state, latency_ms, packet_loss, quality_of_service, date";

/// Count of records matching the filters. Built structurally, not by text
/// substitution on the list query.
pub fn count_query(filters: &FilterSet) -> QuerySpec {
    let clause = WhereClause::from_filters(filters);
    QuerySpec {
        sql: format!("SELECT COUNT(*) FROM diagnostics{}", clause.render()),
        binds: clause.binds(),
    }
}

/// One page of records, newest first. The id tiebreak keeps page
/// boundaries stable when timestamps collide.
pub fn list_query(filters: &FilterSet, page: &PageRequest) -> QuerySpec {
    let clause = WhereClause::from_filters(filters);
    let mut binds = clause.binds();
    binds.push(BindValue::Int(page.limit));
    binds.push(BindValue::Int(page.offset()));
    QuerySpec {
        sql: format!(
            "SELECT {RECORD_COLUMNS} FROM diagnostics{} ORDER BY date DESC, id DESC LIMIT ? OFFSET ?",
            clause.render()
        ),
        binds,
    }
}

/// Grouped aggregates over the filtered set. Every mode applies the full
/// filter set; the dimension only decides GROUP BY and output columns.
pub fn aggregate_query(filters: &FilterSet, group: GroupBy) -> QuerySpec {
    let clause = WhereClause::from_filters(filters);
    let sql = match group {
        GroupBy::Day => format!(
            "SELECT DATE(date) AS day, COUNT(*) AS total, \
             ROUND(AVG(latency_ms), 2) AS avg_latency, \
             ROUND(AVG(packet_loss), 2) AS avg_packet_loss, \
             ROUND(AVG(quality_of_service), 2) AS avg_quality, \
             ROUND(MIN(latency_ms), 2) AS min_latency, \
             ROUND(MAX(latency_ms), 2) AS max_latency \
             FROM diagnostics{} GROUP BY DATE(date) ORDER BY DATE(date) DESC",
            clause.render()
        ),
        GroupBy::City => format!(
            "SELECT city, state, COUNT(*) AS total, \
             ROUND(AVG(latency_ms), 2) AS avg_latency, \
             ROUND(AVG(packet_loss), 2) AS avg_packet_loss, \
             ROUND(AVG(quality_of_service), 2) AS avg_quality \
             FROM diagnostics{} GROUP BY city, state ORDER BY total DESC, city ASC",
            clause.render()
        ),
        GroupBy::State => format!(
            "SELECT state, COUNT(*) AS total, \
             ROUND(AVG(latency_ms), 2) AS avg_latency, \
             ROUND(AVG(packet_loss), 2) AS avg_packet_loss, \
             ROUND(AVG(quality_of_service), 2) AS avg_quality \
             FROM diagnostics{} GROUP BY state ORDER BY total DESC, state ASC",
            clause.render()
        ),
    };
    QuerySpec {
        sql,
        binds: clause.binds(),
    }
}

/// Single summary row over the filtered set.
pub fn statistics_query(filters: &FilterSet) -> QuerySpec {
    let clause = WhereClause::from_filters(filters);
    QuerySpec {
        sql: format!(
            "SELECT COUNT(*) AS total_diagnostics, \
             COUNT(DISTINCT device_id) AS total_devices, \
             COUNT(DISTINCT city) AS total_cities, \
             COUNT(DISTINCT state) AS total_states, \
             ROUND(AVG(latency_ms), 2) AS avg_latency, \
             ROUND(AVG(packet_loss), 2) AS avg_packet_loss, \
             ROUND(AVG(quality_of_service), 2) AS avg_quality, \
             MIN(date) AS first_diagnostic, \
             MAX(date) AS last_diagnostic \
             FROM diagnostics{}",
            clause.render()
        ),
        binds: clause.binds(),
    }
}
