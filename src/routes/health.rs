use axum::http::StatusCode;

/// Liveness check
///
/// Returns 200 as soon as the report service is accepting connections. Does
/// not touch the telemetry endpoint or the cache, and is exempt from rate
/// limiting and the request body limit.
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is up"),
    ),
    tag = "health"
)]
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
