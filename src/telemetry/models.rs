use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request body for the remote runtime-report endpoint.
///
/// Field names match the endpoint's JSON contract.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeReportRequest {
    pub imei: String,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "endTime")]
    pub end_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<String>,
}

/// Response body from the remote runtime-report endpoint.
///
/// Deployed endpoint versions disagree on the field: some report
/// `running_hours`, older ones `running_seconds`. Both are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeReportResponse {
    #[serde(default)]
    pub running_hours: Option<f64>,
    #[serde(default)]
    pub running_seconds: Option<f64>,
    #[serde(default)]
    pub samples: Option<u32>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl RuntimeReportResponse {
    /// Runtime in hours, whichever field the endpoint returned.
    #[must_use]
    pub fn hours(&self) -> f64 {
        self.running_hours
            .or_else(|| self.running_seconds.map(|s| s / 3600.0))
            .unwrap_or(0.0)
    }
}

/// A resolved runtime measure for one (entity, window) cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeSample {
    /// Accumulated runtime within the window, in hours.
    pub hours: f64,
    /// Source timestamp echoed by the endpoint, when present.
    pub timestamp: Option<DateTime<Utc>>,
    /// Sample count reported by the endpoint, when present.
    pub samples: Option<u32>,
}

impl From<RuntimeReportResponse> for RuntimeSample {
    fn from(resp: RuntimeReportResponse) -> Self {
        Self {
            hours: resp.hours(),
            timestamp: resp.timestamp,
            samples: resp.samples,
        }
    }
}
