use axum::{
    Json,
    extract::State,
    http::{HeaderValue, header},
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::report::display::{self, SeriesConfig};
use crate::report::{DayBoundary, Entity, RangeSelector, ReportQuery, ReportRow};

fn default_trend() -> bool {
    true
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReportRequest {
    /// Entities to report on, in display order. Must be non-empty.
    pub entities: Vec<Entity>,
    /// Preset range: report the last N days. Mutually exclusive with
    /// `start`/`end`.
    #[serde(default)]
    pub days: Option<u32>,
    /// Custom range start (ISO 8601). Requires `end`.
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    /// Custom range end (ISO 8601). Requires `start`.
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    /// Aggregation hint forwarded to the telemetry endpoint unmodified
    /// (e.g. "raw", "1-minute", "5-minute", "1-hour").
    #[serde(default)]
    pub aggregation: Option<String>,
    /// Hour of day (0-23) at which preset daily windows open. Defaults to
    /// the service-wide `DAY_BOUNDARY_HOUR`.
    #[serde(default)]
    pub boundary_hour: Option<u32>,
    /// Attach the least-squares trend overlay.
    #[serde(default = "default_trend")]
    pub trend: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportResponse {
    /// One row per window, chronological.
    pub rows: Vec<ReportRow>,
    /// Deterministic display config per selected entity.
    pub series: Vec<SeriesConfig>,
    /// Cells substituted with zero after a fetch failure.
    pub failed_cells: usize,
    pub total_cells: usize,
}

/// Build a JSON response with X-Cache header indicating hit/miss status.
fn json_response(body: &ReportResponse, cache_hit: bool) -> AppResult<Response> {
    let cache_header = if cache_hit { "HIT" } else { "MISS" };
    let json_bytes = serde_json::to_vec(body).map_err(|e| AppError::Internal(e.to_string()))?;
    Response::builder()
        .header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )
        .header("X-Cache", HeaderValue::from_static(cache_header))
        .body(axum::body::Body::from(json_bytes))
        .map_err(|e| AppError::Internal(e.to_string()))
}

fn resolve_selector(request: &ReportRequest, max_range_days: u32) -> AppResult<RangeSelector> {
    match (request.days, request.start, request.end) {
        (Some(days), None, None) => {
            if days > max_range_days {
                return Err(AppError::InvalidRange(format!(
                    "day count exceeds maximum of {max_range_days} days"
                )));
            }
            Ok(RangeSelector::LastDays(days))
        }
        (None, Some(start), Some(end)) => {
            if end <= start {
                return Err(AppError::InvalidRange(
                    "end must be after start".to_string(),
                ));
            }
            if end - start > Duration::days(i64::from(max_range_days)) {
                return Err(AppError::InvalidRange(format!(
                    "time range exceeds maximum of {max_range_days} days"
                )));
            }
            Ok(RangeSelector::Custom { start, end })
        }
        _ => Err(AppError::BadRequest(
            "specify either days or both start and end".to_string(),
        )),
    }
}

/// Run a runtime report
///
/// Resolves per-day runtime hours for the selected entities, preferring the
/// session cache, and attaches the selection average and optional trend
/// overlay. Per-cell fetch failures degrade to zero values and are counted
/// in `failed_cells` rather than failing the report.
#[utoipa::path(
    post,
    path = "/api/reports/runtime",
    request_body = ReportRequest,
    responses(
        (status = 200, description = "Report assembled", body = ReportResponse,
         headers(("X-Cache" = String, description = "HIT when served from the per-query cache"))),
        (status = 400, description = "Invalid range or empty entity selection"),
    ),
    tag = "reports"
)]
pub async fn run_runtime_report(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> AppResult<Response> {
    let selector = resolve_selector(&request, state.config.max_range_days)?;

    let boundary = match request.boundary_hour {
        Some(0) => DayBoundary::Midnight,
        Some(hour) if hour > 23 => {
            return Err(AppError::InvalidRange(format!(
                "boundary hour must be 0-23, got {hour}"
            )));
        }
        Some(hour) => DayBoundary::Hour(hour),
        None => DayBoundary::Hour(state.config.day_boundary_hour),
    };

    let query = ReportQuery {
        entities: request.entities.clone(),
        selector,
        aggregation: request.aggregation.clone(),
        boundary,
        include_trend: request.trend,
    };

    let outcome = state.engine.run(&query, Utc::now().date_naive()).await?;

    tracing::debug!(
        rows = outcome.rows.len(),
        failed_cells = outcome.failed_cells,
        cache_hit = outcome.cache_hit,
        "runtime report served"
    );

    let response = ReportResponse {
        rows: outcome.rows,
        series: display::series_configs(&request.entities),
        failed_cells: outcome.failed_cells,
        total_cells: outcome.total_cells,
    };

    json_response(&response, outcome.cache_hit)
}
