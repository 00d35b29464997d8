//! Report engine: cache-first fetch orchestration and row assembly.
//!
//! A query cycle resolves one runtime cell per (entity, window) pair,
//! preferring the injected cache and degrading per-cell fetch failures into
//! zero-value cells. Windows are processed in order; within a window all
//! entity fetches run concurrently.

use chrono::NaiveDate;
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::report::cache::{self, ReportCache};
use crate::report::trend;
use crate::report::window::{self, DayBoundary, RangeSelector, TimeWindow};
use crate::telemetry::{RuntimeSample, RuntimeSource};

/// A telemetry source selected for a query. Reference data owned by the
/// caller; the engine fetches by `id` and never resolves display names.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, ToSchema)]
pub struct Entity {
    /// Stable identifier (device serial / IMEI).
    pub id: String,
    /// Display name, passed through for rendering.
    pub name: String,
}

/// One report query cycle's inputs.
#[derive(Debug, Clone)]
pub struct ReportQuery {
    pub entities: Vec<Entity>,
    pub selector: RangeSelector,
    /// Aggregation hint forwarded to the remote endpoint unmodified.
    pub aggregation: Option<String>,
    pub boundary: DayBoundary,
    pub include_trend: bool,
}

/// One assembled window's raw values, keyed by entity identifier.
/// This is the unit stored in the per-query cache; averages and trend are
/// recomputed from it on every assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub label: String,
    pub values: BTreeMap<String, f64>,
}

/// One output row: window label plus per-entity runtime hours.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReportRow {
    /// Window label (`DD-MM-YYYY` of the window start).
    pub date: String,
    /// Runtime hours per entity identifier.
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
    /// Mean over the selected entities' present fields.
    pub average: f64,
    /// Fitted trend value for this row, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<f64>,
}

/// A completed query cycle.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub rows: Vec<ReportRow>,
    /// Cells substituted with zero after a fetch failure.
    pub failed_cells: usize,
    pub total_cells: usize,
    /// Whether the raw rows came from the per-query cache.
    pub cache_hit: bool,
}

enum CellOutcome {
    Cached,
    Fetched,
    Failed,
}

pub struct ReportEngine {
    source: Arc<dyn RuntimeSource>,
    cache: Arc<ReportCache>,
    cycle: AtomicU64,
}

impl ReportEngine {
    /// The cache is injected and caller-owned; the engine only reads and
    /// writes through it.
    #[must_use]
    pub fn new(source: Arc<dyn RuntimeSource>, cache: Arc<ReportCache>) -> Self {
        Self {
            source,
            cache,
            cycle: AtomicU64::new(0),
        }
    }

    /// Run one query cycle and assemble the ordered row sequence.
    ///
    /// `today` anchors preset ranges; the route layer passes the current
    /// UTC date.
    ///
    /// # Errors
    ///
    /// Returns `AppError::EmptySelection` or `AppError::InvalidRange` before
    /// any network I/O. Per-cell fetch failures never surface as errors;
    /// they become zero cells counted in `failed_cells`.
    pub async fn run(&self, query: &ReportQuery, today: NaiveDate) -> AppResult<ReportOutcome> {
        if query.entities.is_empty() {
            return Err(AppError::EmptySelection(
                "select at least one entity".to_string(),
            ));
        }

        let windows = window::generate(&query.selector, query.boundary, today)?;
        let query_key = self.query_key(query, today);
        let total_cells = windows.len() * query.entities.len();
        let cycle = self.cycle.fetch_add(1, Ordering::SeqCst) + 1;

        let selected: Vec<String> = query.entities.iter().map(|e| e.id.clone()).collect();

        // Identical consecutive query: reuse the assembled raw rows and only
        // recompute the selection-dependent overlay. The stored failure count
        // travels with the rows, since the zero substitutes do too.
        if let Some(hit) = self.cache.get_query(&query_key).await {
            let rows = assemble(&hit.rows, &selected, query.include_trend);
            return Ok(ReportOutcome {
                rows,
                failed_cells: hit.failed_cells,
                total_cells,
                cache_hit: true,
            });
        }

        let mut raw_rows = Vec::with_capacity(windows.len());
        let mut failed_cells = 0usize;

        for window in &windows {
            let fetches = query
                .entities
                .iter()
                .map(|entity| self.resolve_cell(entity, window, query.aggregation.as_deref()));
            let results = join_all(fetches).await;

            let mut values = BTreeMap::new();
            for (entity_id, sample, outcome) in results {
                if matches!(outcome, CellOutcome::Failed) {
                    failed_cells += 1;
                }
                values.insert(entity_id, sample.hours);
            }

            raw_rows.push(RawRow {
                label: window.label(),
                values,
            });
        }

        if failed_cells > 0 {
            tracing::warn!(
                failed_cells,
                total_cells,
                query_key = %query_key,
                "report completed with degraded cells"
            );
        }

        let raw_rows = Arc::new(raw_rows);
        self.cache
            .store_query(cycle, query_key, Arc::clone(&raw_rows), failed_cells)
            .await;

        let rows = assemble(&raw_rows, &selected, query.include_trend);
        Ok(ReportOutcome {
            rows,
            failed_cells,
            total_cells,
            cache_hit: false,
        })
    }

    /// Resolve one (entity, window) cell: cache first, then the remote
    /// source, then a zero substitute on failure.
    async fn resolve_cell(
        &self,
        entity: &Entity,
        window: &TimeWindow,
        aggregation: Option<&str>,
    ) -> (String, RuntimeSample, CellOutcome) {
        let key = cache::cell_key(&entity.id, window, aggregation);

        if let Some(sample) = self.cache.get_cell(&key).await {
            return (entity.id.clone(), sample, CellOutcome::Cached);
        }

        match self.source.runtime(&entity.id, window, aggregation).await {
            Ok(sample) => {
                self.cache.store_cell(key, sample).await;
                (entity.id.clone(), sample, CellOutcome::Fetched)
            }
            Err(e) => {
                tracing::warn!(
                    entity_id = %entity.id,
                    window_start = %window.start,
                    error = %e,
                    "cell fetch failed, substituting zero"
                );
                (
                    entity.id.clone(),
                    RuntimeSample {
                        hours: 0.0,
                        timestamp: None,
                        samples: None,
                    },
                    CellOutcome::Failed,
                )
            }
        }
    }

    /// Per-query cache key: range selector plus everything else that shapes
    /// the raw row set. The reference date is part of the key because preset
    /// ranges are anchored to it; a process spanning midnight must not serve
    /// yesterday's rows for "last N days".
    fn query_key(&self, query: &ReportQuery, today: NaiveDate) -> String {
        let mut ids: Vec<&str> = query.entities.iter().map(|e| e.id.as_str()).collect();
        ids.sort_unstable();
        cache::cache_key(
            "query",
            &[
                &query.selector.key(),
                &today.to_string(),
                &ids.join(","),
                query.aggregation.as_deref().unwrap_or(""),
                &query.boundary.hour().to_string(),
            ],
        )
    }
}

/// Fold raw rows into output rows, attaching the selection average and the
/// optional trend overlay.
fn assemble(raw_rows: &[RawRow], selected: &[String], include_trend: bool) -> Vec<ReportRow> {
    let averages = trend::selection_averages(raw_rows, selected);
    let model = include_trend.then(|| trend::fit(&averages));

    raw_rows
        .iter()
        .zip(averages)
        .enumerate()
        .map(|(index, (raw, average))| ReportRow {
            date: raw.label.clone(),
            values: raw.values.clone(),
            average,
            trend: model.as_ref().map(|m| m.predict(index)),
        })
        .collect()
}
