//! Low-precision solar position and sidereal time.
//!
//! The solar position uses the mean-longitude / mean-anomaly / equation-of-
//! center closed form, good to about 0.01 degrees. That is adequate for
//! rise/set solving and altitude scoring, not for pointing-grade astrometry.

use crate::astro::cache::PositionCache;
use crate::astro::EquatorialCoord;
use crate::models::angles::normalize_degrees;
use crate::models::time::JulianDate;

static SUN_CACHE: PositionCache<(f64, f64, f64)> = PositionCache::new(4096);

/// Mean obliquity of the ecliptic in degrees.
pub fn mean_obliquity(jd: JulianDate) -> f64 {
    23.439 - 0.0000004 * jd.days_since_j2000()
}

/// Apparent ecliptic longitude of the Sun in degrees, [0, 360).
pub fn sun_ecliptic_longitude(jd: JulianDate) -> f64 {
    sun_state(jd).2
}

/// Geocentric equatorial position of the Sun.
///
/// `ra` is normalized to [0, 360); `dec` stays within roughly +/-23.44
/// degrees. Memoized by the exact Julian Date key.
pub fn sun_position(jd: JulianDate) -> EquatorialCoord {
    let (ra, dec, _) = sun_state(jd);
    EquatorialCoord {
        ra: qtty::Degrees::new(ra),
        dec: qtty::Degrees::new(dec),
    }
}

/// (ra, dec, ecliptic longitude) in degrees, memoized.
fn sun_state(jd: JulianDate) -> (f64, f64, f64) {
    SUN_CACHE.get_or_compute(jd.value(), || compute_sun_state(jd))
}

fn compute_sun_state(jd: JulianDate) -> (f64, f64, f64) {
    let n = jd.days_since_j2000();

    // Mean longitude and mean anomaly of the Sun.
    let mean_longitude = normalize_degrees(280.460 + 0.9856474 * n);
    let mean_anomaly = normalize_degrees(357.528 + 0.9856003 * n).to_radians();

    // Equation of center gives the apparent ecliptic longitude.
    let ecliptic_longitude = normalize_degrees(
        mean_longitude + 1.915 * mean_anomaly.sin() + 0.020 * (2.0 * mean_anomaly).sin(),
    );

    let obliquity = mean_obliquity(jd).to_radians();
    let lambda = ecliptic_longitude.to_radians();

    let ra = normalize_degrees(
        (obliquity.cos() * lambda.sin())
            .atan2(lambda.cos())
            .to_degrees(),
    );
    let dec = (obliquity.sin() * lambda.sin()).asin().to_degrees();

    (ra, dec, ecliptic_longitude)
}

/// Greenwich mean sidereal time in degrees, [0, 360).
pub fn greenwich_sidereal_time(jd: JulianDate) -> f64 {
    let d = jd.days_since_j2000();
    let t = d / 36525.0;
    normalize_degrees(
        280.46061837 + 360.98564736629 * d + 0.000387933 * t * t - t * t * t / 38710000.0,
    )
}

/// Local mean sidereal time in degrees, [0, 360).
///
/// Shifting the longitude by some delta shifts the result by the same delta,
/// modulo 360.
pub fn local_sidereal_time(jd: JulianDate, longitude_deg: f64) -> f64 {
    normalize_degrees(greenwich_sidereal_time(jd) + longitude_deg)
}
