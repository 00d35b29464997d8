//! Two-granularity response caching for the report engine.
//!
//! - **Per-cell**: one (entity, window) runtime sample, keyed by entity id
//!   and window boundaries. A hit is valid whenever the key matches; runtime
//!   for a closed historical window does not change within a session.
//! - **Per-query**: the raw row set of the most recent completed query. A
//!   hit is valid only when the incoming query key is byte-identical to the
//!   immediately preceding one.
//!
//! Entries carry no TTL: the key space is bounded by entities × days and the
//! cache lives only as long as the process. The per-query slot is guarded by
//! a monotonically increasing query-cycle token so that a re-entrant query
//! racing an older in-flight one leaves the latest result in place.

use moka::future::Cache;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::report::engine::RawRow;
use crate::report::window::TimeWindow;
use crate::telemetry::RuntimeSample;

/// Build a cache key from a prefix and components.
///
/// Components are joined with `:` separator. Empty components are included
/// to ensure different queries produce different keys.
pub fn cache_key(prefix: &str, components: &[&str]) -> String {
    let mut key = prefix.to_string();
    for c in components {
        key.push(':');
        key.push_str(c);
    }
    key
}

/// Key for one (entity, window) cell.
#[must_use]
pub fn cell_key(entity_id: &str, window: &TimeWindow, aggregation: Option<&str>) -> String {
    cache_key(
        "cell",
        &[
            entity_id,
            &window.start.to_rfc3339(),
            &window.end.to_rfc3339(),
            aggregation.unwrap_or(""),
        ],
    )
}

/// A per-query cache hit: the raw rows of the last completed query, plus the
/// number of cells that were zero-substituted when they were built. The count
/// travels with the rows so a repeat of a degraded query reports itself as
/// degraded too.
#[derive(Clone)]
pub struct QueryHit {
    pub rows: Arc<Vec<RawRow>>,
    pub failed_cells: usize,
}

struct LastQuery {
    cycle: u64,
    key: String,
    hit: QueryHit,
}

/// Session-scoped cache owned by the caller and injected into the engine.
pub struct ReportCache {
    cells: Cache<String, RuntimeSample>,
    last_query: Mutex<Option<LastQuery>>,
}

impl ReportCache {
    #[must_use]
    pub fn new(max_cells: u64) -> Self {
        Self {
            cells: Cache::builder().max_capacity(max_cells).build(),
            last_query: Mutex::new(None),
        }
    }

    /// Look up a per-cell sample. A hit short-circuits the remote call.
    pub async fn get_cell(&self, key: &str) -> Option<RuntimeSample> {
        let sample = self.cells.get(key).await;
        if sample.is_some() {
            tracing::debug!(cache_key = %key, "cell_cache_hit");
        }
        sample
    }

    /// Store a freshly fetched per-cell sample.
    ///
    /// Writes are idempotent (re-fetching the same closed window yields the
    /// same value), so concurrent writers racing on a key are safe.
    pub async fn store_cell(&self, key: String, sample: RuntimeSample) {
        tracing::debug!(cache_key = %key, hours = sample.hours, "cell_cache_stored");
        self.cells.insert(key, sample).await;
    }

    /// Return the last completed query's rows if `key` matches it exactly.
    pub async fn get_query(&self, key: &str) -> Option<QueryHit> {
        let guard = self.last_query.lock().await;
        match guard.as_ref() {
            Some(last) if last.key == key => {
                tracing::debug!(cache_key = %key, "query_cache_hit");
                Some(last.hit.clone())
            }
            _ => None,
        }
    }

    /// Record a completed query as the latest, unless a newer cycle already
    /// finished (latest invocation wins on re-entrant queries).
    pub async fn store_query(
        &self,
        cycle: u64,
        key: String,
        rows: Arc<Vec<RawRow>>,
        failed_cells: usize,
    ) {
        let mut guard = self.last_query.lock().await;
        if let Some(last) = guard.as_ref()
            && last.cycle > cycle
        {
            tracing::debug!(cache_key = %key, cycle, newest = last.cycle, "query_result_superseded");
            return;
        }
        tracing::debug!(cache_key = %key, cycle, rows = rows.len(), failed_cells, "query_cache_stored");
        *guard = Some(LastQuery {
            cycle,
            key,
            hit: QueryHit { rows, failed_cells },
        });
    }

    /// Number of cell entries currently resident (diagnostics only).
    #[must_use]
    pub fn cell_count(&self) -> u64 {
        self.cells.entry_count()
    }
}
