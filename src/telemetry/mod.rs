pub mod client;
pub mod models;

pub use client::FleetTelemetryClient;
pub use models::RuntimeSample;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::report::window::TimeWindow;

/// Source of per-cell runtime measures.
///
/// One call resolves the accumulated runtime for a single entity within a
/// single time window. The production implementation talks to the remote
/// runtime-report endpoint; tests substitute in-memory sources.
#[async_trait]
pub trait RuntimeSource: Send + Sync {
    /// Fetch the runtime measure for `entity_id` within `window`.
    ///
    /// The aggregation hint is passed through to the endpoint unmodified.
    ///
    /// # Errors
    ///
    /// Returns `AppError::TelemetryApi` on non-success responses or
    /// transport failures. Callers are expected to degrade these into
    /// zero-value cells rather than failing the whole query.
    async fn runtime(
        &self,
        entity_id: &str,
        window: &TimeWindow,
        aggregation: Option<&str>,
    ) -> AppResult<RuntimeSample>;
}
