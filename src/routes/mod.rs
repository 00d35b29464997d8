pub mod health;
mod rate_limit;
pub mod reports;

use axum::{Router, routing::get, routing::post};
use std::sync::Arc;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};

use rate_limit::FallbackIpKeyExtractor;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::common::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(health::healthz, reports::run_runtime_report),
    components(
        schemas(
            reports::ReportRequest,
            reports::ReportResponse,
            crate::report::ReportRow,
            crate::report::Entity,
            crate::report::display::SeriesConfig,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "reports", description = "Runtime reports over the fleet telemetry endpoint"),
    ),
    info(
        title = "Fleet Runtime API",
        description = "Per-day fleet runtime reports with caching and trend overlay",
        version = "0.1.0"
    )
)]
struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    if config.disable_rate_limiting {
        tracing::warn!("Rate limiting DISABLED");
    } else {
        tracing::info!(
            reports_rate = %format!(
                "{}/s burst {}",
                config.rate_limit_reports_per_second, config.rate_limit_reports_burst
            ),
            "Rate limiting configured"
        );
    }

    // Base routes without rate limiting
    let report_routes_base =
        Router::new().route("/reports/runtime", post(reports::run_runtime_report));

    // Conditionally apply rate limiting
    let api_routes = if config.disable_rate_limiting {
        report_routes_base
    } else {
        let reports_limiter = GovernorConfigBuilder::default()
            .key_extractor(FallbackIpKeyExtractor)
            .per_second(config.rate_limit_reports_per_second)
            .burst_size(config.rate_limit_reports_burst)
            .finish()
            .expect("Failed to create reports rate limiter");

        report_routes_base.layer(GovernorLayer {
            config: Arc::new(reports_limiter),
        })
    }
    .layer(RequestBodyLimitLayer::new(1024 * 1024)); // 1MB body limit

    // Health check routes (NO rate limiting)
    let health_routes = Router::new().route("/healthz", get(health::healthz));

    // OpenAPI documentation
    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    // Combine all routes
    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(docs_routes)
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
