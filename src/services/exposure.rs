//! Exposure and sampling recommendations for an imaging setup.
//!
//! A standalone numeric module: nothing here touches the ephemeris or the
//! catalog search. Inputs come from the externally owned equipment profile
//! (focal length, aperture, sensor geometry) plus the Bortle class of the
//! observing site.

use serde::{Deserialize, Serialize};

use crate::models::catalog::ObjectType;

/// Fallback Bortle exposure multiplier for out-of-range classes.
const DEFAULT_BORTLE_MULTIPLIER: f64 = 2.0;

/// Mount tracking tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMode {
    /// Fixed tripod
    None,
    /// Motorized tracking, unguided
    Basic,
    /// Autoguided mount
    Guided,
}

/// Single-exposure recommendation, in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExposureRecommendation {
    /// "500 rule" untracked ceiling
    pub max_untracked: f64,
    /// Suggested single sub-exposure
    pub recommended_single: f64,
    /// Shortest sub worth taking for the sky signal to clear read noise
    pub min_for_signal: f64,
}

/// Total integration recommendation, in minutes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IntegrationRecommendation {
    pub minimum: f64,
    pub recommended: f64,
    pub ideal: f64,
}

/// Sampling classification of an image scale against the local seeing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingVerdict {
    Optimal,
    Undersampled,
    Oversampled,
}

/// One row of the Bortle darkness scale.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BortleEntry {
    /// Class value, 1 (darkest) to 9 (brightest)
    pub value: u8,
    /// Class name
    pub name: &'static str,
    /// Typical sky quality in magnitudes per square arcsecond
    pub sqm: f64,
    /// Short description
    pub description: &'static str,
}

/// The fixed nine-class Bortle scale. SQM decreases strictly with class.
pub const BORTLE_SCALE: [BortleEntry; 9] = [
    BortleEntry {
        value: 1,
        name: "Excellent dark-sky site",
        sqm: 22.0,
        description: "Zodiacal light and airglow visible; Milky Way casts shadows",
    },
    BortleEntry {
        value: 2,
        name: "Typical truly dark site",
        sqm: 21.7,
        description: "Summer Milky Way highly structured to the naked eye",
    },
    BortleEntry {
        value: 3,
        name: "Rural sky",
        sqm: 21.4,
        description: "Some light pollution on the horizon; Milky Way still complex",
    },
    BortleEntry {
        value: 4,
        name: "Rural/suburban transition",
        sqm: 20.9,
        description: "Light domes over settlements; Milky Way lacks detail",
    },
    BortleEntry {
        value: 5,
        name: "Suburban sky",
        sqm: 20.3,
        description: "Milky Way washed out at the zenith, invisible near the horizon",
    },
    BortleEntry {
        value: 6,
        name: "Bright suburban sky",
        sqm: 19.4,
        description: "Milky Way only hinted at the zenith",
    },
    BortleEntry {
        value: 7,
        name: "Suburban/urban transition",
        sqm: 18.7,
        description: "Entire sky background has a grayish-white hue",
    },
    BortleEntry {
        value: 8,
        name: "City sky",
        sqm: 18.0,
        description: "Sky glows white or orange; only bright constellations recognizable",
    },
    BortleEntry {
        value: 9,
        name: "Inner-city sky",
        sqm: 17.5,
        description: "Only the brightest stars and planets visible",
    },
];

/// Integration multiplier for a Bortle class.
///
/// Darker skies reward longer total integration, so the multiplier grows
/// toward class 1. Any value outside 1-9 falls back to the mid-scale 2.0.
pub fn bortle_exposure_multiplier(bortle: u8) -> f64 {
    match bortle {
        1 => 4.0,
        2 => 3.5,
        3 => 3.0,
        4 => 2.5,
        5 => 2.0,
        6 => 1.8,
        7 => 1.5,
        8 => 1.2,
        9 => 1.0,
        _ => DEFAULT_BORTLE_MULTIPLIER,
    }
}

/// Single-exposure recommendation for a setup.
///
/// `max_untracked` follows the "500 rule". An untracked setup keeps the
/// recommended sub strictly below that ceiling; tracking tiers raise the
/// allowed ceiling instead.
pub fn calculate_exposure(
    bortle: u8,
    focal_length_mm: f64,
    aperture_mm: f64,
    tracking: TrackingMode,
) -> ExposureRecommendation {
    let max_untracked = 500.0 / focal_length_mm;

    let ceiling = match tracking {
        TrackingMode::None => max_untracked * 0.8,
        TrackingMode::Basic => max_untracked * 20.0,
        TrackingMode::Guided => max_untracked * 240.0,
    };

    // Brighter skies saturate faster, so cap the sub length by class.
    let sky_limited = match bortle {
        1..=3 => 300.0,
        4..=5 => 180.0,
        6..=7 => 120.0,
        _ => 60.0,
    };

    let recommended_single = match tracking {
        TrackingMode::None => ceiling,
        _ => ceiling.min(sky_limited),
    };

    // Read noise floor scales with the square of the focal ratio.
    let focal_ratio = focal_length_mm / aperture_mm.max(1.0);
    let min_for_signal = (focal_ratio * focal_ratio * 0.5).max(1.0);

    ExposureRecommendation {
        max_untracked,
        recommended_single,
        min_for_signal,
    }
}

/// Base integration time per target type, in minutes.
fn base_integration_minutes(target_type: ObjectType) -> f64 {
    match target_type {
        ObjectType::Galaxy => 180.0,
        ObjectType::EmissionNebula => 120.0,
        ObjectType::ReflectionNebula => 150.0,
        ObjectType::PlanetaryNebula => 150.0,
        ObjectType::SupernovaRemnant => 180.0,
        ObjectType::DarkNebula => 200.0,
        ObjectType::OpenCluster => 60.0,
        ObjectType::GlobularCluster => 90.0,
        ObjectType::DoubleStar => 30.0,
        ObjectType::Asterism => 30.0,
    }
}

/// Total integration recommendation for a target type and sky.
///
/// Narrowband filters reject most of the sky glow, so the narrowband
/// recommendation is reduced. The invariant `ideal > recommended > minimum`
/// always holds.
pub fn calculate_total_integration(
    bortle: u8,
    target_type: ObjectType,
    narrowband: bool,
) -> IntegrationRecommendation {
    let base = base_integration_minutes(target_type);
    let multiplier = bortle_exposure_multiplier(bortle);
    let narrowband_factor = if narrowband { 0.6 } else { 1.0 };

    let recommended = base * multiplier * narrowband_factor;
    IntegrationRecommendation {
        minimum: recommended * 0.5,
        recommended,
        ideal: recommended * 2.0,
    }
}

/// Number of sub-frames needed for a total integration.
pub fn calculate_subframe_count(total_minutes: f64, sub_seconds: f64) -> u32 {
    if sub_seconds <= 0.0 {
        return 0;
    }
    (total_minutes * 60.0 / sub_seconds).ceil() as u32
}

/// Image scale in arcseconds per pixel.
pub fn image_scale(focal_length_mm: f64, pixel_um: f64) -> f64 {
    206.265 * pixel_um / focal_length_mm
}

/// Classify an image scale against the seeing.
///
/// Optimal sampling sits around half the seeing disc; a factor of two
/// either side is accepted before the verdict flips.
pub fn check_sampling(scale_arcsec_per_px: f64, seeing_arcsec: f64) -> SamplingVerdict {
    let ideal = seeing_arcsec / 2.0;
    if scale_arcsec_per_px > ideal * 1.5 {
        SamplingVerdict::Undersampled
    } else if scale_arcsec_per_px < ideal * 0.5 {
        SamplingVerdict::Oversampled
    } else {
        SamplingVerdict::Optimal
    }
}

/// Field of view in degrees for a sensor dimension.
pub fn field_of_view(sensor_mm: f64, focal_length_mm: f64) -> f64 {
    (2.0 * (sensor_mm / (2.0 * focal_length_mm)).atan()).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bortle_scale_has_nine_strictly_decreasing_entries() {
        assert_eq!(BORTLE_SCALE.len(), 9);
        for (i, entry) in BORTLE_SCALE.iter().enumerate() {
            assert_eq!(entry.value as usize, i + 1);
        }
        for pair in BORTLE_SCALE.windows(2) {
            assert!(
                pair[0].sqm > pair[1].sqm,
                "SQM must strictly decrease: {} vs {}",
                pair[0].sqm,
                pair[1].sqm
            );
        }
    }

    #[test]
    fn test_bortle_multiplier_grows_toward_dark_skies() {
        for class in 1..9u8 {
            assert!(
                bortle_exposure_multiplier(class) > bortle_exposure_multiplier(class + 1),
                "multiplier must decrease from class {} to {}",
                class,
                class + 1
            );
        }
    }

    #[test]
    fn test_bortle_multiplier_fallback() {
        assert_eq!(bortle_exposure_multiplier(0), 2.0);
        assert_eq!(bortle_exposure_multiplier(10), 2.0);
        assert_eq!(bortle_exposure_multiplier(255), 2.0);
    }

    #[test]
    fn test_500_rule() {
        let rec = calculate_exposure(4, 500.0, 100.0, TrackingMode::None);
        assert!((rec.max_untracked - 1.0).abs() < 1e-12);

        let wide = calculate_exposure(4, 50.0, 25.0, TrackingMode::None);
        assert!((wide.max_untracked - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_untracked_recommendation_stays_below_ceiling() {
        for focal in [50.0, 135.0, 500.0, 1000.0] {
            let rec = calculate_exposure(5, focal, focal / 5.0, TrackingMode::None);
            assert!(
                rec.recommended_single < rec.max_untracked,
                "untracked sub {} must stay below {}",
                rec.recommended_single,
                rec.max_untracked
            );
        }
    }

    #[test]
    fn test_tracking_raises_the_ceiling() {
        let none = calculate_exposure(3, 500.0, 100.0, TrackingMode::None);
        let basic = calculate_exposure(3, 500.0, 100.0, TrackingMode::Basic);
        let guided = calculate_exposure(3, 500.0, 100.0, TrackingMode::Guided);

        assert!(basic.recommended_single > none.recommended_single);
        assert!(guided.recommended_single >= basic.recommended_single);
    }

    #[test]
    fn test_integration_ordering_invariant() {
        for bortle in 0..=10u8 {
            for narrowband in [false, true] {
                let rec =
                    calculate_total_integration(bortle, ObjectType::Galaxy, narrowband);
                assert!(rec.ideal > rec.recommended);
                assert!(rec.recommended > rec.minimum);
                assert!(rec.minimum > 0.0);
            }
        }
    }

    #[test]
    fn test_narrowband_reduces_integration() {
        let broadband = calculate_total_integration(4, ObjectType::EmissionNebula, false);
        let narrowband = calculate_total_integration(4, ObjectType::EmissionNebula, true);
        assert!(narrowband.recommended < broadband.recommended);
    }

    #[test]
    fn test_darker_sky_means_longer_integration() {
        let dark = calculate_total_integration(1, ObjectType::Galaxy, false);
        let city = calculate_total_integration(9, ObjectType::Galaxy, false);
        assert!(dark.recommended > city.recommended);
    }

    #[test]
    fn test_subframe_count_ceiling_rounding() {
        assert_eq!(calculate_subframe_count(61.0, 60.0), 61);
        assert_eq!(calculate_subframe_count(60.0, 60.0), 60);
        assert_eq!(calculate_subframe_count(1.0, 120.0), 1);
        assert_eq!(calculate_subframe_count(10.0, 0.0), 0);
    }

    #[test]
    fn test_image_scale_reference_value() {
        let scale = image_scale(1000.0, 4.0);
        assert!((scale - 0.82506).abs() < 1e-3, "scale was {}", scale);
    }

    #[test]
    fn test_field_of_view_reference_value() {
        let fov = field_of_view(36.0, 500.0);
        assert!((fov - 4.125).abs() < 0.05, "fov was {}", fov);
    }

    #[test]
    fn test_sampling_classification() {
        // Seeing 2": ideal scale is 1"/px.
        assert_eq!(check_sampling(1.0, 2.0), SamplingVerdict::Optimal);
        assert_eq!(check_sampling(0.825, 2.0), SamplingVerdict::Optimal);
        assert_eq!(check_sampling(2.0, 2.0), SamplingVerdict::Undersampled);
        assert_eq!(check_sampling(0.3, 2.0), SamplingVerdict::Oversampled);
    }
}
