//! Runtime report core: window generation, cache-first fetch orchestration,
//! row assembly, and the trend overlay.

pub mod cache;
pub mod display;
pub mod engine;
pub mod trend;
pub mod window;

pub use cache::ReportCache;
pub use engine::{Entity, ReportEngine, ReportOutcome, ReportQuery, ReportRow};
pub use window::{DayBoundary, RangeSelector, TimeWindow};
