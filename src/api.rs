//! Public API surface for the engine.
//!
//! This file consolidates the DTO types shared across services together
//! with re-exports of the main result types. Everything derives
//! Serialize/Deserialize for JSON serialization; the engine itself never
//! touches the network or the disk.

pub use crate::models::catalog::{Catalog, DeepSkyObject, ObjectType};
pub use crate::models::time::JulianDate;
pub use crate::scheduler::{
    ForcedTarget, ManualEdits, OptimizationStrategy, ScheduledTarget, SessionPlan,
    TargetCandidate,
};
pub use crate::services::enrichment::{AltitudeData, AltitudeSample, EnrichedObject};
pub use crate::services::nighttime::{MoonPhase, NighttimeData, RiseSetWindow, WindowState};
pub use crate::services::search::{
    CatalogStats, OrderField, SearchFilters, SearchResult, SortDirection,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version written into [`SavedSessionPlan`] records. Increases are
/// handled by the persistence layer via backfill of missing fields.
pub const SESSION_PLAN_SCHEMA_VERSION: u32 = 1;

/// Geographic location (latitude, longitude, elevation).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeographicLocation {
    /// Latitude in decimal degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in decimal degrees (-180 to 180)
    pub longitude: f64,
    /// Elevation in meters above sea level (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation_m: Option<f64>,
}

impl GeographicLocation {
    pub fn new(latitude: f64, longitude: f64, elevation_m: Option<f64>) -> Result<Self, String> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err("Latitude must be between -90 and 90 degrees".to_string());
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err("Longitude must be between -180 and 180 degrees".to_string());
        }
        Ok(Self {
            latitude,
            longitude,
            elevation_m,
        })
    }
}

/// Wall-clock time period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Length of the interval in minutes.
    pub fn duration_minutes(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 60.0
    }

    /// Check if an instant lies inside this interval (inclusive start,
    /// exclusive end).
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }

    /// Check if this interval overlaps with another.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Per-plan default constraints recorded alongside a saved plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanConstraints {
    pub min_altitude: qtty::Degrees,
    pub min_moon_distance: qtty::Degrees,
    pub min_imaging_minutes: f64,
}

/// The versioned serialization shape of a persisted session plan.
///
/// The engine only supplies this in-memory record; identifiers, timestamps
/// and on-disk format/migration belong to the external store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSessionPlan {
    pub schema_version: u32,
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Night the plan was computed for
    pub plan_date: DateTime<Utc>,
    pub location: GeographicLocation,
    pub strategy: OptimizationStrategy,
    pub constraints: PlanConstraints,
    pub targets: Vec<ScheduledTarget>,
    pub excluded_target_ids: Vec<String>,
    pub total_imaging_minutes: f64,
    pub night_coverage: f64,
    pub efficiency: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SavedSessionPlan {
    /// Snapshot an optimizer result into the persistence shape.
    #[allow(clippy::too_many_arguments)]
    pub fn from_plan(
        id: String,
        created_at: DateTime<Utc>,
        plan_date: DateTime<Utc>,
        location: GeographicLocation,
        strategy: OptimizationStrategy,
        constraints: PlanConstraints,
        plan: &SessionPlan,
        notes: Option<String>,
    ) -> Self {
        Self {
            schema_version: SESSION_PLAN_SCHEMA_VERSION,
            id,
            created_at,
            updated_at: created_at,
            plan_date,
            location,
            strategy,
            constraints,
            targets: plan.targets.clone(),
            excluded_target_ids: plan.excluded_target_ids.clone(),
            total_imaging_minutes: plan.total_imaging_minutes,
            night_coverage: plan.night_coverage,
            efficiency: plan.efficiency,
            notes,
        }
    }
}
