//! Window generation for runtime reports.
//!
//! A report covers an ordered sequence of half-open time windows
//! `[start, end)`. Preset ranges produce one 24-hour window per day ending
//! "today"; custom ranges slice the exact `[start, end)` span into 24-hour
//! steps anchored at the start's time of day.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::error::{AppError, AppResult};

/// How a caller names the report span.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeSelector {
    /// N consecutive daily windows ending today.
    LastDays(u32),
    /// Explicit span, sliced into daily windows from `start`.
    Custom {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl RangeSelector {
    /// Stable key component for query-level caching.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::LastDays(n) => format!("range_{n}"),
            Self::Custom { start, end } => {
                format!("custom_{}_{}", start.to_rfc3339(), end.to_rfc3339())
            }
        }
    }
}

/// Hour of day at which a preset daily window opens.
///
/// The reference deployment tracks shifts on a 06:00-to-06:00 cycle, but
/// this is a parameter, not a constant: other views use plain
/// midnight-to-midnight days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBoundary {
    Midnight,
    Hour(u32),
}

impl DayBoundary {
    #[must_use]
    pub fn hour(self) -> u32 {
        match self {
            Self::Midnight => 0,
            Self::Hour(h) => h,
        }
    }
}

/// A half-open interval `[start, end)` over which one cell is aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Display label for the row this window produces (`DD-MM-YYYY`).
    #[must_use]
    pub fn label(&self) -> String {
        self.start.format("%d-%m-%Y").to_string()
    }
}

/// Generate the ordered window sequence for a range selector.
///
/// `today` anchors preset ranges and is injected so callers (and tests)
/// control the reference date; the service passes `Utc::now().date_naive()`.
///
/// # Errors
///
/// Returns `AppError::InvalidRange` when the day count is zero, the custom
/// span is empty or inverted, or the boundary hour is out of range.
pub fn generate(
    selector: &RangeSelector,
    boundary: DayBoundary,
    today: NaiveDate,
) -> AppResult<Vec<TimeWindow>> {
    match selector {
        RangeSelector::LastDays(days) => preset_windows(*days, boundary, today),
        RangeSelector::Custom { start, end } => custom_windows(*start, *end),
    }
}

/// N consecutive daily windows ending `today`, each opening at the boundary
/// hour and spanning exactly 24 hours.
fn preset_windows(days: u32, boundary: DayBoundary, today: NaiveDate) -> AppResult<Vec<TimeWindow>> {
    if days < 1 {
        return Err(AppError::InvalidRange(
            "day count must be at least 1".to_string(),
        ));
    }
    let hour = boundary.hour();
    if hour > 23 {
        return Err(AppError::InvalidRange(format!(
            "boundary hour must be 0-23, got {hour}"
        )));
    }

    let mut windows = Vec::with_capacity(days as usize);
    for offset in (0..i64::from(days)).rev() {
        let date = today - Duration::days(offset);
        let start = date
            .and_hms_opt(hour, 0, 0)
            .ok_or_else(|| AppError::Internal(format!("invalid window start for {date}")))?
            .and_utc();
        windows.push(TimeWindow {
            start,
            end: start + Duration::hours(24),
        });
    }
    Ok(windows)
}

/// Slice `[start, end)` into 24-hour windows anchored at `start`'s time of
/// day. The last window is clipped so its end equals `end` exactly.
fn custom_windows(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<Vec<TimeWindow>> {
    if end <= start {
        return Err(AppError::InvalidRange(
            "end must be after start".to_string(),
        ));
    }

    let mut windows = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let next = cursor + Duration::hours(24);
        windows.push(TimeWindow {
            start: cursor,
            end: next.min(end),
        });
        cursor = next;
    }
    Ok(windows)
}
