//! Per-object visibility enrichment.
//!
//! Projects a catalog entry onto one observing night: the altitude curve at
//! a fixed cadence, the meridian transit, rise/set times and the angular
//! distance to the Moon. Enrichment is a pure projection; the catalog entry
//! itself is never mutated and the data is recomputed on every search.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::astro::events::{crossings, transit_near, HorizonCrossings};
use crate::astro::horizontal;
use crate::astro::lunar::{self, MoonPosition};
use crate::models::catalog::DeepSkyObject;
use crate::models::time::{reference_noon, JulianDate};

/// Sampling cadence for altitude curves, in minutes.
pub const SAMPLE_CADENCE_MINUTES: i64 = 5;

/// One altitude curve sample.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AltitudeSample {
    pub time: DateTime<Utc>,
    /// Altitude above the horizon, [-90, 90] degrees
    pub altitude: qtty::Degrees,
}

/// Altitude projection of one object across one observing night.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AltitudeData {
    /// Catalog id of the projected object
    pub object_id: String,
    /// Samples at [`SAMPLE_CADENCE_MINUTES`] cadence, noon to noon
    pub samples: Vec<AltitudeSample>,
    /// Highest sampled altitude
    pub max_altitude: qtty::Degrees,
    /// Time of the highest sampled altitude
    pub max_altitude_time: DateTime<Utc>,
    /// Meridian crossing; the analytic culmination, not necessarily paired
    /// with a rise/set event
    pub transit_time: DateTime<Utc>,
    /// Horizon rise within the night, absent for circumpolar or
    /// never-rising objects
    pub rise_time: Option<DateTime<Utc>>,
    /// Horizon set within the night
    pub set_time: Option<DateTime<Utc>>,
}

/// Display-ready copy of a catalog entry with visibility data attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedObject {
    pub object: DeepSkyObject,
    pub altitude_data: AltitudeData,
    /// Angular distance to the Moon at the query time
    pub moon_distance: qtty::Degrees,
    /// Altitude at the query time
    pub current_altitude: qtty::Degrees,
    /// Azimuth at the query time
    pub current_azimuth: qtty::Degrees,
}

/// Sample an object's altitude across the observing night that contains
/// `date`.
pub fn calculate_altitude_data(
    object: &DeepSkyObject,
    lat_deg: f64,
    lon_deg: f64,
    date: DateTime<Utc>,
) -> AltitudeData {
    let night_start = reference_noon(date, lon_deg);
    let jd_start = JulianDate::from_datetime(night_start);
    let jd_end = JulianDate::new(jd_start.value() + 1.0);

    let ra = object.ra.value();
    let dec = object.dec.value();

    let sample_count = (24 * 60 / SAMPLE_CADENCE_MINUTES) as usize;
    let mut samples = Vec::with_capacity(sample_count + 1);
    let mut max_altitude = f64::NEG_INFINITY;
    let mut max_altitude_time = night_start;

    for i in 0..=sample_count {
        let minutes = i as i64 * SAMPLE_CADENCE_MINUTES;
        let time = night_start + Duration::minutes(minutes);
        let jd = JulianDate::new(jd_start.value() + minutes as f64 / 1440.0);
        let altitude = horizontal::altitude(ra, dec, lat_deg, lon_deg, jd);

        if altitude > max_altitude {
            max_altitude = altitude;
            max_altitude_time = time;
        }
        samples.push(AltitudeSample {
            time,
            altitude: qtty::Degrees::new(altitude),
        });
    }

    let target = |_jd: JulianDate| (ra, dec);
    let transit_time = transit_near(
        JulianDate::new(jd_start.value() + 0.5),
        lon_deg,
        &target,
    )
    .to_datetime();

    let (rise_time, set_time) =
        match crossings(jd_start, jd_end, lat_deg, lon_deg, 0.0, target) {
            HorizonCrossings::Events { rise, set } => {
                (rise.map(|jd| jd.to_datetime()), set.map(|jd| jd.to_datetime()))
            }
            HorizonCrossings::AlwaysAbove | HorizonCrossings::AlwaysBelow => (None, None),
        };

    AltitudeData {
        object_id: object.id.clone(),
        samples,
        max_altitude: qtty::Degrees::new(max_altitude),
        max_altitude_time,
        transit_time,
        rise_time,
        set_time,
    }
}

/// Angular distance between an object and the Moon, in degrees.
pub fn calculate_moon_distance(object: &DeepSkyObject, moon: &MoonPosition) -> qtty::Degrees {
    qtty::Degrees::new(horizontal::angular_separation(
        object.ra.value(),
        object.dec.value(),
        moon.ra.value(),
        moon.dec.value(),
    ))
}

/// Check for a *contiguous* run of samples at or above `min_altitude_deg`
/// spanning at least `min_minutes`.
pub fn is_above_altitude_for_duration(
    altitude_data: &AltitudeData,
    min_altitude_deg: f64,
    min_minutes: f64,
) -> bool {
    let mut run: usize = 0;
    for sample in &altitude_data.samples {
        if sample.altitude.value() >= min_altitude_deg {
            run += 1;
            let run_minutes = ((run - 1) as i64 * SAMPLE_CADENCE_MINUTES) as f64;
            if run_minutes >= min_minutes {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// Fraction of the samples inside `window` that sit at or above
/// `min_altitude_deg`. Returns 0 when the window contains no samples.
pub fn fraction_above_in_window(
    altitude_data: &AltitudeData,
    min_altitude_deg: f64,
    window: (DateTime<Utc>, DateTime<Utc>),
) -> f64 {
    let (start, end) = window;
    let mut total = 0usize;
    let mut above = 0usize;
    for sample in &altitude_data.samples {
        if sample.time >= start && sample.time <= end {
            total += 1;
            if sample.altitude.value() >= min_altitude_deg {
                above += 1;
            }
        }
    }
    if total == 0 {
        0.0
    } else {
        above as f64 / total as f64
    }
}

/// Composite visibility score in [0, 1].
///
/// Blends culmination altitude, Moon separation and the fraction of the
/// night the target stays usable. Shared by the search ranking and the
/// scheduler's feasibility metric.
pub fn visibility_score(
    max_altitude_deg: f64,
    moon_distance_deg: f64,
    night_fraction: f64,
) -> f64 {
    let altitude_term = (max_altitude_deg / 90.0).clamp(0.0, 1.0);
    let moon_term = (moon_distance_deg / 180.0).clamp(0.0, 1.0);
    let fraction_term = night_fraction.clamp(0.0, 1.0);
    0.5 * altitude_term + 0.2 * moon_term + 0.3 * fraction_term
}

/// Produce the display-ready enriched copy of a catalog entry.
pub fn enrich_deep_sky_object(
    object: &DeepSkyObject,
    lat_deg: f64,
    lon_deg: f64,
    date: DateTime<Utc>,
) -> EnrichedObject {
    let altitude_data = calculate_altitude_data(object, lat_deg, lon_deg, date);

    let jd = JulianDate::from_datetime(date);
    let moon = lunar::moon_position(jd);
    let moon_distance = calculate_moon_distance(object, &moon);

    let current_altitude = horizontal::altitude(
        object.ra.value(),
        object.dec.value(),
        lat_deg,
        lon_deg,
        jd,
    );
    let current_azimuth = horizontal::azimuth(
        object.ra.value(),
        object.dec.value(),
        lat_deg,
        lon_deg,
        jd,
    );

    EnrichedObject {
        object: object.clone(),
        altitude_data,
        moon_distance,
        current_altitude: qtty::Degrees::new(current_altitude),
        current_azimuth: qtty::Degrees::new(current_azimuth),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::ObjectType;
    use chrono::TimeZone;

    const LAT: f64 = 28.7624;
    const LON: f64 = -17.8892;

    fn m31() -> DeepSkyObject {
        DeepSkyObject {
            id: "M31".to_string(),
            name: "Andromeda Galaxy".to_string(),
            alternate_names: vec!["NGC 224".to_string()],
            object_type: ObjectType::Galaxy,
            constellation: "AND".to_string(),
            ra: qtty::Degrees::new(10.6847),
            dec: qtty::Degrees::new(41.2690),
            magnitude: Some(3.4),
            major_axis_arcmin: Some(178.0),
            minor_axis_arcmin: Some(63.0),
            position_angle_deg: Some(35.0),
        }
    }

    fn query_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 15, 22, 0, 0).unwrap()
    }

    fn synthetic_altitude_data(altitudes: &[f64]) -> AltitudeData {
        let start = Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0).unwrap();
        let samples: Vec<AltitudeSample> = altitudes
            .iter()
            .enumerate()
            .map(|(i, alt)| AltitudeSample {
                time: start + Duration::minutes(i as i64 * SAMPLE_CADENCE_MINUTES),
                altitude: qtty::Degrees::new(*alt),
            })
            .collect();
        AltitudeData {
            object_id: "synthetic".to_string(),
            samples,
            max_altitude: qtty::Degrees::new(0.0),
            max_altitude_time: start,
            transit_time: start,
            rise_time: None,
            set_time: None,
        }
    }

    #[test]
    fn test_altitude_curve_covers_the_night() {
        let data = calculate_altitude_data(&m31(), LAT, LON, query_date());
        assert_eq!(data.samples.len(), 289);

        let span = data.samples.last().unwrap().time - data.samples[0].time;
        assert_eq!(span, Duration::days(1));
    }

    #[test]
    fn test_max_altitude_matches_culmination_geometry() {
        let object = m31();
        let data = calculate_altitude_data(&object, LAT, LON, query_date());

        // Culmination altitude for a northern target: 90 - |lat - dec|.
        let expected = 90.0 - (LAT - object.dec.value()).abs();
        assert!(
            (data.max_altitude.value() - expected).abs() < 0.5,
            "max altitude {} vs expected {}",
            data.max_altitude.value(),
            expected
        );
    }

    #[test]
    fn test_transit_time_within_night() {
        let data = calculate_altitude_data(&m31(), LAT, LON, query_date());
        let night_start = reference_noon(query_date(), LON);
        let night_end = night_start + Duration::days(1);
        assert!(data.transit_time >= night_start - Duration::minutes(5));
        assert!(data.transit_time <= night_end + Duration::minutes(5));
    }

    #[test]
    fn test_transit_altitude_is_near_max() {
        let object = m31();
        let data = calculate_altitude_data(&object, LAT, LON, query_date());
        let alt_at_transit = horizontal::altitude(
            object.ra.value(),
            object.dec.value(),
            LAT,
            LON,
            JulianDate::from_datetime(data.transit_time),
        );
        assert!(
            (alt_at_transit - data.max_altitude.value()).abs() < 0.5,
            "transit altitude {} vs sampled max {}",
            alt_at_transit,
            data.max_altitude.value()
        );
    }

    #[test]
    fn test_rise_and_set_present_for_mid_declination_target() {
        let data = calculate_altitude_data(&m31(), LAT, LON, query_date());
        assert!(data.rise_time.is_some());
        assert!(data.set_time.is_some());
    }

    #[test]
    fn test_circumpolar_target_has_no_rise_or_set() {
        let mut object = m31();
        object.id = "polar".to_string();
        object.dec = qtty::Degrees::new(88.0);
        let data = calculate_altitude_data(&object, 60.0, 0.0, query_date());
        assert!(data.rise_time.is_none());
        assert!(data.set_time.is_none());
        // It still culminates and stays above the horizon.
        assert!(data.max_altitude.value() > 0.0);
    }

    #[test]
    fn test_duration_check_contiguous_run() {
        // 13 consecutive samples at 5-minute cadence span one hour.
        let mut altitudes = vec![10.0; 13];
        altitudes.extend(vec![-5.0; 10]);
        let data = synthetic_altitude_data(&altitudes);

        assert!(is_above_altitude_for_duration(&data, 5.0, 60.0));
        assert!(!is_above_altitude_for_duration(&data, 5.0, 61.0));
    }

    #[test]
    fn test_duration_check_rejects_split_runs() {
        // Two 30-minute runs separated by a dip never form one hour.
        let mut altitudes = vec![10.0; 7];
        altitudes.push(-1.0);
        altitudes.extend(vec![10.0; 7]);
        let data = synthetic_altitude_data(&altitudes);

        assert!(is_above_altitude_for_duration(&data, 5.0, 30.0));
        assert!(!is_above_altitude_for_duration(&data, 5.0, 60.0));
    }

    #[test]
    fn test_duration_check_zero_minutes() {
        let data = synthetic_altitude_data(&[-10.0, 3.0, -10.0]);
        assert!(is_above_altitude_for_duration(&data, 0.0, 0.0));
        assert!(!is_above_altitude_for_duration(&data, 5.0, 0.0));
    }

    #[test]
    fn test_fraction_above_in_window() {
        let data = synthetic_altitude_data(&[0.0, 10.0, 10.0, 10.0, 0.0, 0.0]);
        let start = data.samples[0].time;
        let end = data.samples[5].time;
        let fraction = fraction_above_in_window(&data, 5.0, (start, end));
        assert!((fraction - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_moon_distance_is_separation() {
        let object = m31();
        let moon = lunar::moon_position(JulianDate::from_datetime(query_date()));
        let distance = calculate_moon_distance(&object, &moon);
        let direct = horizontal::angular_separation(
            object.ra.value(),
            object.dec.value(),
            moon.ra.value(),
            moon.dec.value(),
        );
        assert_eq!(distance.value(), direct);
        assert!((0.0..=180.0).contains(&distance.value()));
    }

    #[test]
    fn test_enrich_leaves_catalog_entry_intact() {
        let object = m31();
        let enriched = enrich_deep_sky_object(&object, LAT, LON, query_date());
        assert_eq!(enriched.object.id, object.id);
        assert_eq!(enriched.object.ra.value(), object.ra.value());
        assert_eq!(enriched.altitude_data.object_id, object.id);
        assert!((-90.0..=90.0).contains(&enriched.current_altitude.value()));
        assert!((0.0..360.0).contains(&enriched.current_azimuth.value()));
    }

    #[test]
    fn test_visibility_score_bounds() {
        assert!((visibility_score(90.0, 180.0, 1.0) - 1.0).abs() < 1e-12);
        assert_eq!(visibility_score(-10.0, 0.0, 0.0), 0.0);
        let mid = visibility_score(45.0, 90.0, 0.5);
        assert!((0.0..=1.0).contains(&mid));
    }
}
