use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteArguments, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{
    round2, AggregateRow, DiagnosticRecord, GroupBy, NewDiagnostic, StatisticsSummary,
};
use crate::query::{self, BindValue, QuerySpec};
use crate::storage::{DiagnosticsStore, StorageResult};
use crate::validate::{FilterSet, PageRequest};

pub struct SqliteStore {
    pool: Arc<SqlitePool>,
}

impl SqliteStore {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

fn bind_values<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>,
    binds: &[BindValue],
) -> sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
    binds.iter().fold(query, |q, bind| match bind {
        BindValue::Text(s) => q.bind(s.clone()),
        BindValue::Int(i) => q.bind(*i),
        BindValue::Date(d) => q.bind(*d),
    })
}

fn bind_values_as<'q, T>(
    query: sqlx::query::QueryAs<'q, sqlx::Sqlite, T, SqliteArguments<'q>>,
    binds: &[BindValue],
) -> sqlx::query::QueryAs<'q, sqlx::Sqlite, T, SqliteArguments<'q>> {
    binds.iter().fold(query, |q, bind| match bind {
        BindValue::Text(s) => q.bind(s.clone()),
        BindValue::Int(i) => q.bind(*i),
        BindValue::Date(d) => q.bind(*d),
    })
}

fn bind_values_scalar<'q, T>(
    query: sqlx::query::QueryScalar<'q, sqlx::Sqlite, T, SqliteArguments<'q>>,
    binds: &[BindValue],
) -> sqlx::query::QueryScalar<'q, sqlx::Sqlite, T, SqliteArguments<'q>> {
    binds.iter().fold(query, |q, bind| match bind {
        BindValue::Text(s) => q.bind(s.clone()),
        BindValue::Int(i) => q.bind(*i),
        BindValue::Date(d) => q.bind(*d),
    })
}

/// AVG over an empty group is NULL; the API contract maps that to 0.0.
fn avg_or_zero(row: &SqliteRow, column: &str) -> Result<f64, sqlx::Error> {
    Ok(round2(row.try_get::<Option<f64>, _>(column)?.unwrap_or(0.0)))
}

fn aggregate_row(row: &SqliteRow, group: GroupBy) -> Result<AggregateRow, sqlx::Error> {
    let total: i64 = row.try_get("total")?;
    let avg_latency_ms = avg_or_zero(row, "avg_latency")?;
    let avg_packet_loss = avg_or_zero(row, "avg_packet_loss")?;
    let avg_quality_of_service = avg_or_zero(row, "avg_quality")?;

    Ok(match group {
        GroupBy::Day => AggregateRow::Day {
            day: row.try_get("day")?,
            total,
            avg_latency_ms,
            avg_packet_loss,
            avg_quality_of_service,
            min_latency_ms: avg_or_zero(row, "min_latency")?,
            max_latency_ms: avg_or_zero(row, "max_latency")?,
        },
        GroupBy::City => AggregateRow::City {
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            total,
            avg_latency_ms,
            avg_packet_loss,
            avg_quality_of_service,
        },
        GroupBy::State => AggregateRow::State {
            state: row.try_get("state")?,
            total,
            avg_latency_ms,
            avg_packet_loss,
            avg_quality_of_service,
        },
    })
}

#[async_trait]
impl DiagnosticsStore for SqliteStore {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS diagnostics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                device_id TEXT NOT NULL,
                city TEXT NOT NULL,
                state TEXT NOT NULL,
                latency_ms REAL NOT NULL,
                packet_loss REAL NOT NULL,
                quality_of_service REAL NOT NULL,
                date TEXT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_diagnostics_city ON diagnostics(city)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_diagnostics_state ON diagnostics(state)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_diagnostics_date ON diagnostics(date)")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn insert(&self, record: &NewDiagnostic) -> StorageResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO diagnostics
            (device_id, city, state, latency_ms, packet_loss, quality_of_service, date)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.device_id)
        .bind(&record.city)
        .bind(&record.state)
        .bind(record.latency_ms)
        .bind(record.packet_loss)
        .bind(record.quality_of_service)
        .bind(record.date)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn clear(&self) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM diagnostics")
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_paginated(
        &self,
        filters: &FilterSet,
        page: &PageRequest,
    ) -> StorageResult<(Vec<DiagnosticRecord>, i64)> {
        // Count and page are built from the same clause accumulator, so
        // total always matches the predicate the page was computed over.
        let count_spec = query::count_query(filters);
        let total: i64 = bind_values_scalar(
            sqlx::query_scalar(&count_spec.sql),
            &count_spec.binds,
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        let list_spec: QuerySpec = query::list_query(filters, page);
        let records = bind_values_as(
            sqlx::query_as::<_, DiagnosticRecord>(&list_spec.sql),
            &list_spec.binds,
        )
        .fetch_all(self.pool.as_ref())
        .await?
        .into_iter()
        .map(DiagnosticRecord::rounded)
        .collect();

        Ok((records, total))
    }

    async fn get_by_id(&self, id: i64) -> StorageResult<Option<DiagnosticRecord>> {
        let record = sqlx::query_as::<_, DiagnosticRecord>(
            r#"
            SELECT id, device_id, city, state, latency_ms, packet_loss, quality_of_service, date
            FROM diagnostics
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(record.map(DiagnosticRecord::rounded))
    }

    async fn get_aggregated(
        &self,
        filters: &FilterSet,
        group: GroupBy,
    ) -> StorageResult<Vec<AggregateRow>> {
        let spec = query::aggregate_query(filters, group);
        let rows = bind_values(sqlx::query(&spec.sql), &spec.binds)
            .fetch_all(self.pool.as_ref())
            .await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in &rows {
            result.push(aggregate_row(row, group)?);
        }
        Ok(result)
    }

    async fn get_statistics(&self, filters: &FilterSet) -> StorageResult<StatisticsSummary> {
        let spec = query::statistics_query(filters);
        let row = bind_values(sqlx::query(&spec.sql), &spec.binds)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(StatisticsSummary {
            total_diagnostics: row.try_get("total_diagnostics")?,
            total_devices: row.try_get("total_devices")?,
            total_cities: row.try_get("total_cities")?,
            total_states: row.try_get("total_states")?,
            avg_latency_ms: avg_or_zero(&row, "avg_latency")?,
            avg_packet_loss: avg_or_zero(&row, "avg_packet_loss")?,
            avg_quality_of_service: avg_or_zero(&row, "avg_quality")?,
            first_diagnostic: row.try_get("first_diagnostic")?,
            last_diagnostic: row.try_get("last_diagnostic")?,
        })
    }
}
