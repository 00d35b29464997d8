use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::report::window::TimeWindow;
use crate::telemetry::RuntimeSource;
use crate::telemetry::models::{RuntimeReportRequest, RuntimeReportResponse, RuntimeSample};

pub struct FleetTelemetryClient {
    http_client: Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl FleetTelemetryClient {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let http_client = Client::builder()
            .danger_accept_invalid_certs(config.telemetry_skip_tls_verify)
            .timeout(Duration::from_secs(config.telemetry_timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            base_url: config.telemetry_base_url.clone(),
            bearer_token: config.telemetry_bearer_token.clone(),
        }
    }

    /// Query the runtime-report endpoint for one (entity, window) cell.
    ///
    /// # Errors
    ///
    /// Returns `AppError::TelemetryApi` if the request fails or returns an
    /// error status.
    pub async fn runtime_report(
        &self,
        imei: &str,
        window: &TimeWindow,
        aggregation: Option<&str>,
    ) -> AppResult<RuntimeReportResponse> {
        let url = format!("{}/runtime-report", self.base_url);

        let body = RuntimeReportRequest {
            imei: imei.to_string(),
            start_time: window.start,
            end_time: window.end,
            aggregation: aggregation.map(ToString::to_string),
        };

        let mut request = self.http_client.post(&url).json(&body);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::TelemetryApi(format!("Request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::TelemetryApi("Rate limited (429)".to_string()));
        }

        if !response.status().is_success() {
            return Err(AppError::TelemetryApi(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::TelemetryApi(format!("Failed to get response text: {e}")))?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body_preview = %text.chars().take(500).collect::<String>(),
                "Failed to parse runtime-report response"
            );
            AppError::TelemetryApi(format!("Failed to parse response: {e}"))
        })
    }
}

#[async_trait]
impl RuntimeSource for FleetTelemetryClient {
    async fn runtime(
        &self,
        entity_id: &str,
        window: &TimeWindow,
        aggregation: Option<&str>,
    ) -> AppResult<RuntimeSample> {
        let response = self.runtime_report(entity_id, window, aggregation).await?;
        Ok(response.into())
    }
}
