use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    AggregateRow, DiagnosticRecord, GroupBy, NewDiagnostic, StatisticsSummary,
};
use crate::validate::{FilterSet, PageRequest};

/// Failure from the storage backend. Not retried; the caller surfaces it
/// as a generic internal error and logs the detail.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Read-side repository over the diagnostics table. All operations are a
/// single query (listing runs count + page over one shared predicate) and
/// hold no state between calls.
#[async_trait]
pub trait DiagnosticsStore: Send + Sync {
    /// Initialize the storage (create tables and indexes).
    async fn init(&self) -> Result<()>;

    /// Insert one measurement. Only the seeding path and tests write.
    async fn insert(&self, record: &NewDiagnostic) -> StorageResult<i64>;

    /// Delete all measurements. Used by the seeding tool's --reset flag.
    async fn clear(&self) -> StorageResult<u64>;

    /// One page of records matching the filters, newest first, plus the
    /// total match count. An empty match is `(vec![], 0)`, not an error.
    async fn list_paginated(
        &self,
        filters: &FilterSet,
        page: &PageRequest,
    ) -> StorageResult<(Vec<DiagnosticRecord>, i64)>;

    /// Single-record lookup. `None` means not found.
    async fn get_by_id(&self, id: i64) -> StorageResult<Option<DiagnosticRecord>>;

    /// Grouped aggregates over the filtered set, one row per group.
    async fn get_aggregated(
        &self,
        filters: &FilterSet,
        group: GroupBy,
    ) -> StorageResult<Vec<AggregateRow>>;

    /// Summary statistics over the filtered set. Zeroed numerics and
    /// absent timestamps when nothing matches.
    async fn get_statistics(&self, filters: &FilterSet) -> StorageResult<StatisticsSummary>;
}
