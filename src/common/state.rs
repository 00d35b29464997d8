use std::sync::Arc;

use crate::config::Config;
use crate::report::{ReportCache, ReportEngine};
use crate::telemetry::RuntimeSource;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<ReportEngine>,
}

impl AppState {
    /// Wire the engine up with a session-scoped cache sized from config.
    /// The cache is owned here and injected into the engine.
    pub fn new(config: Config, source: Arc<dyn RuntimeSource>) -> Self {
        let cache = Arc::new(ReportCache::new(config.cache_max_cells));
        let engine = Arc::new(ReportEngine::new(source, cache));

        Self {
            config: Arc::new(config),
            engine,
        }
    }
}
