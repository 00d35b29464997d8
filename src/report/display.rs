//! Deterministic per-entity display configuration.
//!
//! Colors are assigned by position in the caller's ordered selection so the
//! same fleet always renders with the same palette, with axis defaults sized
//! for a runtime-hours scale. Stateless: rebuilt from the selection on every
//! query instead of accumulating per-tag settings.

use serde::Serialize;
use utoipa::ToSchema;

use crate::report::engine::Entity;

const PALETTE: [&str; 10] = [
    "#007bff", "#28a745", "#dc3545", "#ffc107", "#17a2b8", "#6f42c1", "#e83e8c", "#fd7e14",
    "#20c997", "#6610f2",
];

/// Chart axis spans `scale * divisions` units.
const DEFAULT_SCALE: f64 = 4.0;
const DEFAULT_DIVISIONS: u32 = 6;

/// Display configuration for one entity's series.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SeriesConfig {
    pub id: String,
    pub name: String,
    pub color: String,
    pub scale: f64,
    pub divisions: u32,
}

/// Build series configs for an ordered entity selection.
#[must_use]
pub fn series_configs(entities: &[Entity]) -> Vec<SeriesConfig> {
    entities
        .iter()
        .enumerate()
        .map(|(index, entity)| SeriesConfig {
            id: entity.id.clone(),
            name: entity.name.clone(),
            color: PALETTE[index % PALETTE.len()].to_string(),
            scale: DEFAULT_SCALE,
            divisions: DEFAULT_DIVISIONS,
        })
        .collect()
}
