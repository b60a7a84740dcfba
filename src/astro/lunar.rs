//! Low-precision lunar position.
//!
//! Uses mean orbital elements plus the principal perturbation terms
//! (evection, variation, yearly equation and friends). Accuracy is on the
//! order of a few arcminutes in longitude, which is sufficient for rise/set
//! times, moon-distance filters and phase computation.

use crate::astro::cache::PositionCache;
use crate::models::angles::normalize_degrees;
use crate::models::time::JulianDate;
use serde::{Deserialize, Serialize};

static MOON_CACHE: PositionCache<(f64, f64, f64, f64)> = PositionCache::new(4096);

/// Equatorial radius used to convert orbit radii to kilometers.
const EARTH_RADIUS_KM: f64 = 6378.14;

/// Physically valid geocentric lunar distance band in kilometers.
const MIN_DISTANCE_KM: f64 = 356_000.0;
const MAX_DISTANCE_KM: f64 = 407_000.0;

/// Geocentric lunar position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MoonPosition {
    /// Right ascension in degrees, [0, 360)
    pub ra: qtty::Degrees,
    /// Declination in degrees, [-90, 90]
    pub dec: qtty::Degrees,
    /// Geocentric distance in kilometers
    pub distance_km: f64,
    /// Ecliptic longitude in degrees, [0, 360); used for phase computation
    pub ecliptic_longitude: f64,
}

/// Geocentric equatorial position and distance of the Moon.
///
/// Memoized by the exact Julian Date key. The distance is clamped to the
/// physically valid [356 000, 407 000] km band so floating-point drift in
/// the perturbation series can never leak an impossible distance downstream.
pub fn moon_position(jd: JulianDate) -> MoonPosition {
    let (ra, dec, distance_km, ecliptic_longitude) =
        MOON_CACHE.get_or_compute(jd.value(), || compute_moon_state(jd));
    MoonPosition {
        ra: qtty::Degrees::new(ra),
        dec: qtty::Degrees::new(dec),
        distance_km,
        ecliptic_longitude,
    }
}

fn compute_moon_state(jd: JulianDate) -> (f64, f64, f64, f64) {
    // Element epoch 2000 Jan 0.0 (JD 2451543.5).
    let d = jd.value() - 2451543.5;

    // Solar elements, needed by the perturbation terms.
    let sun_mean_anomaly = normalize_degrees(356.0470 + 0.9856002585 * d);
    let sun_perihelion = 282.9404 + 4.70935e-5 * d;
    let sun_mean_longitude = normalize_degrees(sun_mean_anomaly + sun_perihelion);

    // Lunar mean elements.
    let node = normalize_degrees(125.1228 - 0.0529538083 * d);
    let inclination = 5.1454_f64;
    let perigee = normalize_degrees(318.0634 + 0.1643573223 * d);
    let semi_major_axis = 60.2666; // Earth radii
    let eccentricity: f64 = 0.054900;
    let mean_anomaly = normalize_degrees(115.3654 + 13.0649929509 * d);

    // Kepler's equation, a few Newton steps are plenty at this eccentricity.
    let m_rad = mean_anomaly.to_radians();
    let e_deg = eccentricity.to_degrees();
    let mut eccentric_anomaly =
        mean_anomaly + e_deg * m_rad.sin() * (1.0 + eccentricity * m_rad.cos());
    for _ in 0..3 {
        let e_rad = eccentric_anomaly.to_radians();
        eccentric_anomaly -= (eccentric_anomaly - e_deg * e_rad.sin() - mean_anomaly)
            / (1.0 - eccentricity * e_rad.cos());
    }
    let e_rad = eccentric_anomaly.to_radians();

    // Position in the orbital plane.
    let x = semi_major_axis * (e_rad.cos() - eccentricity);
    let y = semi_major_axis * (1.0 - eccentricity * eccentricity).sqrt() * e_rad.sin();
    let true_anomaly = y.atan2(x).to_degrees();
    let mut radius = (x * x + y * y).sqrt();

    // Rotate into ecliptic coordinates.
    let n_rad = node.to_radians();
    let i_rad = inclination.to_radians();
    let arg_lat = (true_anomaly + perigee).to_radians();

    let x_ecl = radius * (n_rad.cos() * arg_lat.cos() - n_rad.sin() * arg_lat.sin() * i_rad.cos());
    let y_ecl = radius * (n_rad.sin() * arg_lat.cos() + n_rad.cos() * arg_lat.sin() * i_rad.cos());
    let z_ecl = radius * arg_lat.sin() * i_rad.sin();

    let mut lon = normalize_degrees(y_ecl.atan2(x_ecl).to_degrees());
    let mut lat = z_ecl.atan2((x_ecl * x_ecl + y_ecl * y_ecl).sqrt()).to_degrees();

    // Fundamental arguments for the perturbation series.
    let moon_mean_longitude = normalize_degrees(node + perigee + mean_anomaly);
    let elongation = normalize_degrees(moon_mean_longitude - sun_mean_longitude);
    let lat_argument = normalize_degrees(moon_mean_longitude - node);

    let m = mean_anomaly.to_radians();
    let ms = sun_mean_anomaly.to_radians();
    let dd = elongation.to_radians();
    let f = lat_argument.to_radians();

    // Principal longitude perturbations: evection, variation, yearly
    // equation and the next-largest terms.
    lon += -1.274 * (m - 2.0 * dd).sin()
        + 0.658 * (2.0 * dd).sin()
        - 0.186 * ms.sin()
        - 0.059 * (2.0 * m - 2.0 * dd).sin()
        - 0.057 * (m - 2.0 * dd + ms).sin()
        + 0.053 * (m + 2.0 * dd).sin()
        + 0.046 * (2.0 * dd - ms).sin()
        + 0.041 * (m - ms).sin()
        - 0.035 * dd.sin()
        - 0.031 * (m + ms).sin()
        - 0.015 * (2.0 * f - 2.0 * dd).sin()
        + 0.011 * (m - 4.0 * dd).sin();

    lat += -0.173 * (f - 2.0 * dd).sin()
        - 0.055 * (m - f - 2.0 * dd).sin()
        - 0.046 * (m + f - 2.0 * dd).sin()
        + 0.033 * (f + 2.0 * dd).sin()
        + 0.017 * (2.0 * m + f).sin();

    radius += -0.58 * (m - 2.0 * dd).cos() - 0.46 * (2.0 * dd).cos();

    lon = normalize_degrees(lon);
    let distance_km = (radius * EARTH_RADIUS_KM).clamp(MIN_DISTANCE_KM, MAX_DISTANCE_KM);

    // Ecliptic to equatorial.
    let obliquity = crate::astro::solar::mean_obliquity(jd).to_radians();
    let lon_rad = lon.to_radians();
    let lat_rad = lat.to_radians();

    let xe = lon_rad.cos() * lat_rad.cos();
    let ye = lon_rad.sin() * lat_rad.cos() * obliquity.cos() - lat_rad.sin() * obliquity.sin();
    let ze = lon_rad.sin() * lat_rad.cos() * obliquity.sin() + lat_rad.sin() * obliquity.cos();

    let ra = normalize_degrees(ye.atan2(xe).to_degrees());
    let dec = ze.asin().to_degrees();

    (ra, dec, distance_km, lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moon_distance_stays_physical() {
        // Sweep two anomalistic months at 6-hour cadence.
        for i in 0..220 {
            let jd = JulianDate::new(2460676.5 + i as f64 * 0.25);
            let moon = moon_position(jd);
            assert!(
                (MIN_DISTANCE_KM..=MAX_DISTANCE_KM).contains(&moon.distance_km),
                "distance {} km out of band at step {}",
                moon.distance_km,
                i
            );
        }
    }

    #[test]
    fn test_moon_declination_bounds() {
        // The Moon never strays beyond about +/-28.7 degrees declination.
        for i in 0..120 {
            let jd = JulianDate::new(2460676.5 + i as f64 * 0.5);
            let dec = moon_position(jd).dec.value();
            assert!(dec.abs() < 29.5, "moon dec {} at step {}", dec, i);
        }
    }

    #[test]
    fn test_moon_ra_normalized() {
        for i in 0..60 {
            let jd = JulianDate::new(2460700.0 + i as f64 * 0.9);
            let ra = moon_position(jd).ra.value();
            assert!((0.0..360.0).contains(&ra));
        }
    }

    #[test]
    fn test_moon_position_is_memoized_identically() {
        let jd = JulianDate::new(2460712.125);
        let a = moon_position(jd);
        let b = moon_position(jd);
        assert_eq!(a.ra.value(), b.ra.value());
        assert_eq!(a.dec.value(), b.dec.value());
        assert_eq!(a.distance_km, b.distance_km);
    }

    #[test]
    fn test_moon_moves_across_the_sky() {
        // The Moon covers roughly 13 degrees of ecliptic longitude per day.
        let jd = JulianDate::new(2460700.0);
        let lon0 = moon_position(jd).ecliptic_longitude;
        let lon1 = moon_position(JulianDate::new(jd.value() + 1.0)).ecliptic_longitude;
        let daily = normalize_degrees(lon1 - lon0);
        assert!(
            (11.0..16.0).contains(&daily),
            "daily motion {} degrees",
            daily
        );
    }
}
