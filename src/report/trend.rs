//! Least-squares trend overlay for report rows.
//!
//! The trend is fitted over (row index, cross-entity average) pairs, where
//! the average covers only the currently selected entities. It is cheap and
//! must always reflect the live selection, so it is recomputed on every
//! assembly and never cached.

use crate::report::engine::RawRow;

/// Fitted line `y = slope * x + intercept` over row indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendModel {
    pub slope: f64,
    pub intercept: f64,
}

impl TrendModel {
    /// Predicted value for row `index`.
    #[must_use]
    pub fn predict(&self, index: usize) -> f64 {
        self.slope * index as f64 + self.intercept
    }
}

/// Per-row mean over the selected entities' fields.
///
/// A missing field is excluded from the denominator rather than counted as
/// zero; a row where no selected entity has a value averages to 0.
#[must_use]
pub fn selection_averages(rows: &[RawRow], selected: &[String]) -> Vec<f64> {
    rows.iter()
        .map(|row| {
            let mut sum = 0.0;
            let mut count = 0usize;
            for id in selected {
                if let Some(value) = row.values.get(id) {
                    sum += value;
                    count += 1;
                }
            }
            if count > 0 { sum / count as f64 } else { 0.0 }
        })
        .collect()
}

/// Ordinary least-squares fit over `x = index`, `y = ys[index]`.
///
/// Degenerate inputs (fewer than two points, or a zero denominator) fall
/// back to a flat line at the mean, never dividing by zero.
#[must_use]
pub fn fit(ys: &[f64]) -> TrendModel {
    let n = ys.len() as f64;
    if ys.len() <= 1 {
        return TrendModel {
            slope: 0.0,
            intercept: ys.first().copied().unwrap_or(0.0),
        };
    }

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_x2 = 0.0;
    for (i, y) in ys.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
    }

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 {
        return TrendModel {
            slope: 0.0,
            intercept: sum_y / n,
        };
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;
    TrendModel { slope, intercept }
}
