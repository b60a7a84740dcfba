//! Service layer for the observability engine.
//!
//! These modules compose the ephemeris primitives into the operations the
//! application consumes: the per-night summary, per-object enrichment, the
//! catalog search pipeline and the exposure calculator. All of them are
//! pure and synchronous.

pub mod enrichment;

pub mod exposure;

pub mod nighttime;

pub mod search;

pub use enrichment::{
    calculate_altitude_data, calculate_moon_distance, enrich_deep_sky_object,
    is_above_altitude_for_duration,
};
pub use exposure::{calculate_exposure, calculate_total_integration};
pub use nighttime::calculate_nighttime_data;
pub use search::{
    get_catalog_stats, get_tonights_best, quick_search_by_name, search_deep_sky_objects,
};
