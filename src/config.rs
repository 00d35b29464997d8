use std::env;

#[derive(Debug, Clone)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Remote runtime endpoint
    pub telemetry_base_url: String,
    pub telemetry_bearer_token: Option<String>,
    pub telemetry_skip_tls_verify: bool,
    pub telemetry_timeout_seconds: u64,

    // Report engine
    pub day_boundary_hour: u32,
    pub max_range_days: u32,
    pub cache_max_cells: u64,

    // API settings
    pub api_host: String,
    pub api_port: u16,

    // Rate limiting
    pub disable_rate_limiting: bool,
    pub rate_limit_reports_per_second: u64,
    pub rate_limit_reports_burst: u32,

    // Application metadata
    pub deployment: Deployment,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if required environment variables are not set,
    /// `ConfigError::Invalid` if a value is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let day_boundary_hour: u32 = env::var("DAY_BOUNDARY_HOUR")
            .unwrap_or_else(|_| "6".to_string())
            .parse()
            .unwrap_or(6);
        if day_boundary_hour > 23 {
            return Err(ConfigError::Invalid("DAY_BOUNDARY_HOUR must be 0-23"));
        }

        Ok(Self {
            // Remote runtime endpoint
            telemetry_base_url: env::var("TELEMETRY_BASE_URL")
                .map_err(|_| ConfigError::Missing("TELEMETRY_BASE_URL"))?,
            telemetry_bearer_token: env::var("TELEMETRY_BEARER_TOKEN").ok(),
            telemetry_skip_tls_verify: env::var("TELEMETRY_SKIP_TLS_VERIFY")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            telemetry_timeout_seconds: env::var("TELEMETRY_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),

            // Report engine
            day_boundary_hour,
            max_range_days: env::var("MAX_RANGE_DAYS")
                .unwrap_or_else(|_| "90".to_string())
                .parse()
                .unwrap_or(90),
            cache_max_cells: env::var("CACHE_MAX_CELLS")
                .unwrap_or_else(|_| "100000".to_string())
                .parse()
                .unwrap_or(100_000),

            // API settings
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),

            // Rate limiting
            disable_rate_limiting: env::var("DISABLE_RATE_LIMITING")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            rate_limit_reports_per_second: env::var("RATE_LIMIT_REPORTS_PER_SECOND")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            rate_limit_reports_burst: env::var("RATE_LIMIT_REPORTS_BURST")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),

            // Application metadata
            deployment: Deployment::from_str(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
        })
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration value: {0}")]
    Invalid(&'static str),
}
