//! Catalog search and filter engine.
//!
//! The pipeline enriches every candidate for the requested night, applies
//! the hard filters, sorts with a deterministic id tie-break and paginates.
//! An empty catalog or an over-constrained filter set yields an empty,
//! well-formed result, never an error.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::api::GeographicLocation;
use crate::models::catalog::{DeepSkyObject, ObjectType};
use crate::services::enrichment::{self, EnrichedObject};
use crate::services::nighttime::{calculate_nighttime_data, NighttimeData};

/// Default result page size.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Curated minimum altitude for the tonight's-best ranking, degrees.
const TONIGHTS_BEST_MIN_ALTITUDE: f64 = 30.0;

/// Curated minimum imaging window for the tonight's-best ranking, minutes.
const TONIGHTS_BEST_MIN_MINUTES: f64 = 60.0;

/// Result cap for the tonight's-best ranking.
const TONIGHTS_BEST_LIMIT: usize = 10;

/// Sort field for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderField {
    Magnitude,
    MaxAltitude,
    #[default]
    Name,
    ObjectType,
}

/// Sort direction for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Search constraints for one catalog query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Case-insensitive substring matched against id, name and aliases
    pub name_query: String,
    /// Night the search is evaluated for
    pub filter_date: DateTime<Utc>,
    /// Minimum altitude a target must reach inside the altitude window
    pub min_altitude: qtty::Degrees,
    /// Minimum angular distance to the Moon
    pub min_moon_distance: qtty::Degrees,
    /// Start of the altitude evaluation window; defaults to astronomical dusk
    pub altitude_window_from: Option<DateTime<Utc>>,
    /// End of the altitude evaluation window; defaults to astronomical dawn
    pub altitude_window_through: Option<DateTime<Utc>>,
    /// Allowed object types; empty means all types
    #[serde(default)]
    pub object_types: Vec<ObjectType>,
    /// Constellation code filter (case-insensitive)
    pub constellation: Option<String>,
    /// Numeric lower magnitude bound (brighter limit)
    pub min_magnitude: Option<f64>,
    /// Numeric upper magnitude bound (fainter limit)
    pub max_magnitude: Option<f64>,
    /// Required contiguous time above `min_altitude`, in minutes
    pub min_imaging_minutes: Option<f64>,
    /// Sort field
    pub order_by: OrderField,
    /// Sort direction
    pub direction: SortDirection,
    /// 1-based page index
    pub page: usize,
    /// Page size
    pub page_size: usize,
}

impl SearchFilters {
    /// Baseline filter set: everything visible tonight, ordered by name.
    pub fn default_for(now: DateTime<Utc>) -> Self {
        Self {
            name_query: String::new(),
            filter_date: now,
            min_altitude: qtty::Degrees::new(0.0),
            min_moon_distance: qtty::Degrees::new(0.0),
            altitude_window_from: None,
            altitude_window_through: None,
            object_types: Vec::new(),
            constellation: None,
            min_magnitude: None,
            max_magnitude: None,
            min_imaging_minutes: None,
            order_by: OrderField::default(),
            direction: SortDirection::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Derive the altitude window from the night's twilight data.
    ///
    /// Prefers true darkness (astronomical dusk to dawn); under bright
    /// summer nights it falls back tier by tier so altitude constraints
    /// still apply to the darkest stretch available.
    pub fn initialize_with_nighttime(&mut self, night: &NighttimeData) {
        let window = night
            .darkness_window()
            .or_else(|| night.window_for(&night.nautical_twilight))
            .or_else(|| night.window_for(&night.civil_twilight))
            .or_else(|| night.window_for(&night.sun));
        if let Some((from, through)) = window {
            self.altitude_window_from = Some(from);
            self.altitude_window_through = Some(through);
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub objects: Vec<EnrichedObject>,
    pub total_count: usize,
    pub total_pages: usize,
}

impl SearchResult {
    fn empty() -> Self {
        Self {
            objects: Vec::new(),
            total_count: 0,
            total_pages: 0,
        }
    }
}

/// Aggregate catalog statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_objects: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_constellation: BTreeMap<String, usize>,
}

/// Run the full search pipeline over a catalog.
pub fn search_deep_sky_objects(
    objects: &[DeepSkyObject],
    filters: &SearchFilters,
    location: &GeographicLocation,
) -> SearchResult {
    if objects.is_empty() {
        return SearchResult::empty();
    }

    let night = calculate_nighttime_data(location.latitude, location.longitude, filters.filter_date);
    let window = match (filters.altitude_window_from, filters.altitude_window_through) {
        (Some(from), Some(through)) => (from, through),
        _ => night.darkness_window().unwrap_or_else(|| night.night_window()),
    };

    let query_lower = filters.name_query.trim().to_lowercase();
    let mut matched: Vec<EnrichedObject> = Vec::new();

    for object in objects {
        // Cheap catalog-level filters before paying for enrichment.
        if !query_lower.is_empty() && !object.matches_name(&query_lower) {
            continue;
        }
        if !filters.object_types.is_empty() && !filters.object_types.contains(&object.object_type)
        {
            continue;
        }
        if let Some(constellation) = &filters.constellation {
            if !object.constellation.eq_ignore_ascii_case(constellation) {
                continue;
            }
        }
        if !magnitude_in_range(object.magnitude, filters.min_magnitude, filters.max_magnitude) {
            continue;
        }

        let enriched = enrichment::enrich_deep_sky_object(
            object,
            location.latitude,
            location.longitude,
            filters.filter_date,
        );

        // The target must actually reach the altitude floor inside the window.
        let reaches = enrichment::fraction_above_in_window(
            &enriched.altitude_data,
            filters.min_altitude.value(),
            window,
        ) > 0.0;
        if !reaches {
            continue;
        }

        if filters.min_moon_distance.value() > 0.0
            && enriched.moon_distance.value() < filters.min_moon_distance.value()
        {
            continue;
        }

        if let Some(min_minutes) = filters.min_imaging_minutes {
            if !enrichment::is_above_altitude_for_duration(
                &enriched.altitude_data,
                filters.min_altitude.value(),
                min_minutes,
            ) {
                continue;
            }
        }

        matched.push(enriched);
    }

    sort_results(&mut matched, filters.order_by, filters.direction);

    let total_count = matched.len();
    let page_size = filters.page_size.max(1);
    let total_pages = (total_count + page_size - 1) / page_size;
    let page = filters.page.max(1);
    let start = (page - 1).saturating_mul(page_size);

    let objects_page: Vec<EnrichedObject> = matched
        .into_iter()
        .skip(start)
        .take(page_size)
        .collect();

    debug!(
        "search matched {} of {} catalog entries ({} pages)",
        total_count,
        objects.len(),
        total_pages
    );

    SearchResult {
        objects: objects_page,
        total_count,
        total_pages,
    }
}

/// Substring lookup across id, name and alternate names.
///
/// An empty or whitespace query returns an empty list without scanning the
/// catalog.
pub fn quick_search_by_name(objects: &[DeepSkyObject], query: &str) -> Vec<DeepSkyObject> {
    let query_lower = query.trim().to_lowercase();
    if query_lower.is_empty() {
        return Vec::new();
    }
    objects
        .iter()
        .filter(|object| object.matches_name(&query_lower))
        .cloned()
        .collect()
}

/// Curated "what should I image tonight" ranking.
///
/// Runs the standard pipeline with a 30-degree altitude floor and a one-hour
/// imaging window, then ranks by the composite visibility score.
pub fn get_tonights_best(
    objects: &[DeepSkyObject],
    location: &GeographicLocation,
    now: DateTime<Utc>,
) -> SearchResult {
    let night = calculate_nighttime_data(location.latitude, location.longitude, now);

    let mut filters = SearchFilters::default_for(now);
    filters.min_altitude = qtty::Degrees::new(TONIGHTS_BEST_MIN_ALTITUDE);
    filters.min_imaging_minutes = Some(TONIGHTS_BEST_MIN_MINUTES);
    filters.page_size = objects.len().max(1);
    filters.initialize_with_nighttime(&night);

    let window = night.darkness_window().unwrap_or_else(|| night.night_window());
    let mut result = search_deep_sky_objects(objects, &filters, location);

    result.objects.sort_by(|a, b| {
        let score_a = composite_score(a, filters.min_altitude.value(), window);
        let score_b = composite_score(b, filters.min_altitude.value(), window);
        score_b
            .partial_cmp(&score_a)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.object.id.cmp(&b.object.id))
    });
    result.objects.truncate(TONIGHTS_BEST_LIMIT);
    result.total_pages = (result.total_count + TONIGHTS_BEST_LIMIT - 1) / TONIGHTS_BEST_LIMIT;

    result
}

/// Count objects by type and constellation.
pub fn get_catalog_stats(objects: &[DeepSkyObject]) -> CatalogStats {
    let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_constellation: BTreeMap<String, usize> = BTreeMap::new();

    for object in objects {
        *by_type.entry(object.object_type.label().to_string()).or_insert(0) += 1;
        *by_constellation
            .entry(object.constellation.to_uppercase())
            .or_insert(0) += 1;
    }

    CatalogStats {
        total_objects: objects.len(),
        by_type,
        by_constellation,
    }
}

/// Composite score used by the tonight's-best ranking.
fn composite_score(
    enriched: &EnrichedObject,
    min_altitude_deg: f64,
    window: (DateTime<Utc>, DateTime<Utc>),
) -> f64 {
    let fraction = enrichment::fraction_above_in_window(
        &enriched.altitude_data,
        min_altitude_deg,
        window,
    );
    enrichment::visibility_score(
        enriched.altitude_data.max_altitude.value(),
        enriched.moon_distance.value(),
        fraction,
    )
}

fn magnitude_in_range(magnitude: Option<f64>, min: Option<f64>, max: Option<f64>) -> bool {
    match (magnitude, min, max) {
        (_, None, None) => true,
        // Entries without a catalogued magnitude fail any magnitude bound.
        (None, _, _) => false,
        (Some(m), lo, hi) => lo.map_or(true, |v| m >= v) && hi.map_or(true, |v| m <= v),
    }
}

fn sort_results(results: &mut [EnrichedObject], field: OrderField, direction: SortDirection) {
    let apply = |ordering: Ordering| match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    };

    results.sort_by(|a, b| {
        let primary = match field {
            OrderField::Magnitude => match (a.object.magnitude, b.object.magnitude) {
                (Some(x), Some(y)) => apply(x.partial_cmp(&y).unwrap_or(Ordering::Equal)),
                // Unknown magnitudes sort last in either direction.
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            OrderField::MaxAltitude => apply(
                a.altitude_data
                    .max_altitude
                    .value()
                    .partial_cmp(&b.altitude_data.max_altitude.value())
                    .unwrap_or(Ordering::Equal),
            ),
            OrderField::Name => apply(
                a.object
                    .name
                    .to_lowercase()
                    .cmp(&b.object.name.to_lowercase()),
            ),
            OrderField::ObjectType => {
                apply(a.object.object_type.label().cmp(b.object.object_type.label()))
            }
        };
        primary.then_with(|| a.object.id.cmp(&b.object.id))
    });
}
