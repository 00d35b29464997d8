//! Integration tests for the report engine: cache-first orchestration,
//! partial-failure containment, and end-to-end row assembly.
//!
//! Run with: cargo test --test engine_test

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use fleet_runtime_api::error::{AppError, AppResult};
use fleet_runtime_api::report::window::TimeWindow;
use fleet_runtime_api::report::{
    DayBoundary, Entity, RangeSelector, ReportCache, ReportEngine, ReportQuery,
};
use fleet_runtime_api::telemetry::{RuntimeSample, RuntimeSource};

/// In-memory source returning a fixed per-cell runtime, counting calls and
/// optionally failing for specific entity ids.
struct CountingSource {
    running_seconds: f64,
    calls: AtomicUsize,
    fail_ids: Vec<String>,
}

impl CountingSource {
    fn new(running_seconds: f64) -> Self {
        Self {
            running_seconds,
            calls: AtomicUsize::new(0),
            fail_ids: Vec::new(),
        }
    }

    fn failing_for(running_seconds: f64, fail_ids: &[&str]) -> Self {
        Self {
            running_seconds,
            calls: AtomicUsize::new(0),
            fail_ids: fail_ids.iter().map(ToString::to_string).collect(),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RuntimeSource for CountingSource {
    async fn runtime(
        &self,
        entity_id: &str,
        window: &TimeWindow,
        _aggregation: Option<&str>,
    ) -> AppResult<RuntimeSample> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_ids.iter().any(|id| id == entity_id) {
            return Err(AppError::TelemetryApi("simulated outage".to_string()));
        }
        Ok(RuntimeSample {
            hours: self.running_seconds / 3600.0,
            timestamp: Some(window.end),
            samples: Some(1),
        })
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 30).unwrap()
}

fn entities(ids: &[&str]) -> Vec<Entity> {
    ids.iter()
        .map(|id| Entity {
            id: (*id).to_string(),
            name: format!("Forklift {}", id.to_uppercase()),
        })
        .collect()
}

fn query(ids: &[&str], selector: RangeSelector) -> ReportQuery {
    ReportQuery {
        entities: entities(ids),
        selector,
        aggregation: None,
        boundary: DayBoundary::Hour(6),
        include_trend: true,
    }
}

fn engine_with(source: Arc<CountingSource>) -> ReportEngine {
    ReportEngine::new(source, Arc::new(ReportCache::new(10_000)))
}

#[tokio::test]
async fn end_to_end_preset_report() {
    // Endpoint reports 3600 running seconds for every cell.
    let source = Arc::new(CountingSource::new(3600.0));
    let engine = engine_with(Arc::clone(&source));

    let outcome = engine
        .run(&query(&["a", "b"], RangeSelector::LastDays(3)), today())
        .await
        .unwrap();

    assert_eq!(outcome.rows.len(), 3);
    assert_eq!(outcome.total_cells, 6);
    assert_eq!(outcome.failed_cells, 0);
    assert!(!outcome.cache_hit);
    assert_eq!(source.calls(), 6);

    for row in &outcome.rows {
        assert_eq!(row.values["a"], 1.0);
        assert_eq!(row.values["b"], 1.0);
        assert_eq!(row.average, 1.0);
        assert!((row.trend.unwrap() - 1.0).abs() < 1e-9);
    }

    // Rows are chronological: labels run up to the reference date.
    assert_eq!(outcome.rows.last().unwrap().date, "30-08-2026");
}

#[tokio::test]
async fn identical_repeat_query_is_served_from_the_query_cache() {
    let source = Arc::new(CountingSource::new(1800.0));
    let engine = engine_with(Arc::clone(&source));
    let q = query(&["a", "b"], RangeSelector::LastDays(5));

    let first = engine.run(&q, today()).await.unwrap();
    assert!(!first.cache_hit);
    assert_eq!(source.calls(), 10);

    let second = engine.run(&q, today()).await.unwrap();
    assert!(second.cache_hit);
    assert_eq!(source.calls(), 10, "repeat query must not hit the network");
    assert_eq!(second.rows.len(), first.rows.len());
    for (a, b) in first.rows.iter().zip(&second.rows) {
        assert_eq!(a.values, b.values);
    }
}

#[tokio::test]
async fn preset_query_is_not_cached_across_days() {
    let source = Arc::new(CountingSource::new(3600.0));
    let engine = engine_with(Arc::clone(&source));
    let q = query(&["a"], RangeSelector::LastDays(3));

    let first = engine.run(&q, today()).await.unwrap();
    assert_eq!(first.rows.last().unwrap().date, "30-08-2026");
    assert_eq!(source.calls(), 3);

    // The same preset query on the next day covers a shifted window set and
    // must not be served from the per-query cache.
    let tomorrow = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
    let second = engine.run(&q, tomorrow).await.unwrap();
    assert!(!second.cache_hit);
    assert_eq!(second.rows.last().unwrap().date, "31-08-2026");
    // Two of the three windows overlap yesterday's and come from the cell
    // cache; only the new day's cell is fetched.
    assert_eq!(source.calls(), 4);
}

#[tokio::test]
async fn repeated_degraded_query_still_reports_its_failures() {
    let source = Arc::new(CountingSource::failing_for(3600.0, &["b"]));
    let engine = engine_with(Arc::clone(&source));
    let q = query(&["a", "b"], RangeSelector::LastDays(2));

    let first = engine.run(&q, today()).await.unwrap();
    assert_eq!(first.failed_cells, 2);

    // The repeat is a query-cache hit returning the same zero-substituted
    // cells, so it must carry the same failure count.
    let second = engine.run(&q, today()).await.unwrap();
    assert!(second.cache_hit);
    assert_eq!(second.failed_cells, 2);
    assert_eq!(second.total_cells, 4);
}

#[tokio::test]
async fn cell_cache_survives_a_different_intervening_query() {
    let source = Arc::new(CountingSource::new(3600.0));
    let engine = engine_with(Arc::clone(&source));

    // Warm cells for entity "a" across 4 windows.
    engine
        .run(&query(&["a"], RangeSelector::LastDays(4)), today())
        .await
        .unwrap();
    assert_eq!(source.calls(), 4);

    // Widening the selection reuses a's cells; only b's are fetched.
    let outcome = engine
        .run(&query(&["a", "b"], RangeSelector::LastDays(4)), today())
        .await
        .unwrap();
    assert_eq!(source.calls(), 8);
    assert!(!outcome.cache_hit);

    // The query slot now holds the wider query, so rerunning the narrow one
    // misses at query granularity but is still fully served from cells.
    let narrow = engine
        .run(&query(&["a"], RangeSelector::LastDays(4)), today())
        .await
        .unwrap();
    assert!(!narrow.cache_hit);
    assert_eq!(source.calls(), 8, "all cells must come from the cell cache");
}

#[tokio::test]
async fn one_failing_entity_does_not_blank_the_report() {
    let source = Arc::new(CountingSource::failing_for(7200.0, &["b"]));
    let engine = engine_with(Arc::clone(&source));

    let outcome = engine
        .run(&query(&["a", "b", "c"], RangeSelector::LastDays(2)), today())
        .await
        .unwrap();

    assert_eq!(outcome.rows.len(), 2);
    assert_eq!(outcome.failed_cells, 2);
    assert_eq!(outcome.total_cells, 6);
    for row in &outcome.rows {
        assert_eq!(row.values["a"], 2.0);
        assert_eq!(row.values["b"], 0.0);
        assert_eq!(row.values["c"], 2.0);
    }
}

#[tokio::test]
async fn failed_cells_are_not_cached() {
    let source = Arc::new(CountingSource::failing_for(3600.0, &["a"]));
    let engine = engine_with(Arc::clone(&source));

    engine
        .run(&query(&["a"], RangeSelector::LastDays(2)), today())
        .await
        .unwrap();
    assert_eq!(source.calls(), 2);

    // A different selection forces a fresh cycle; the failed cells must be
    // retried rather than served as cached zeros.
    engine
        .run(&query(&["a", "b"], RangeSelector::LastDays(2)), today())
        .await
        .unwrap();
    assert_eq!(source.calls(), 6, "failed cells retried, b fetched fresh");
}

#[tokio::test]
async fn empty_selection_is_rejected_before_any_fetch() {
    let source = Arc::new(CountingSource::new(3600.0));
    let engine = engine_with(Arc::clone(&source));

    let result = engine
        .run(&query(&[], RangeSelector::LastDays(7)), today())
        .await;

    assert!(matches!(result, Err(AppError::EmptySelection(_))));
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn invalid_range_is_rejected_before_any_fetch() {
    let source = Arc::new(CountingSource::new(3600.0));
    let engine = engine_with(Arc::clone(&source));

    let result = engine
        .run(&query(&["a"], RangeSelector::LastDays(0)), today())
        .await;

    assert!(matches!(result, Err(AppError::InvalidRange(_))));
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn single_row_report_gets_a_flat_trend() {
    let source = Arc::new(CountingSource::new(5400.0));
    let engine = engine_with(Arc::clone(&source));

    let outcome = engine
        .run(&query(&["a"], RangeSelector::LastDays(1)), today())
        .await
        .unwrap();

    assert_eq!(outcome.rows.len(), 1);
    let row = &outcome.rows[0];
    assert_eq!(row.average, 1.5);
    assert_eq!(row.trend, Some(1.5));
}

#[tokio::test]
async fn trend_can_be_disabled() {
    let source = Arc::new(CountingSource::new(3600.0));
    let engine = engine_with(Arc::clone(&source));

    let mut q = query(&["a"], RangeSelector::LastDays(3));
    q.include_trend = false;

    let outcome = engine.run(&q, today()).await.unwrap();
    assert!(outcome.rows.iter().all(|row| row.trend.is_none()));
}
