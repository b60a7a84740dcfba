//! Horizontal-coordinate projection and angular separation.

use crate::astro::solar::local_sidereal_time;
use crate::models::angles::{normalize_degrees, normalize_hour_angle};
use crate::models::time::JulianDate;

/// Altitude of a J2000 equatorial position above the observer's horizon,
/// in degrees, [-90, 90].
pub fn altitude(ra_deg: f64, dec_deg: f64, lat_deg: f64, lon_deg: f64, jd: JulianDate) -> f64 {
    let hour_angle = normalize_hour_angle(local_sidereal_time(jd, lon_deg) - ra_deg).to_radians();
    let lat = lat_deg.to_radians();
    let dec = dec_deg.to_radians();

    let sin_alt = lat.sin() * dec.sin() + lat.cos() * dec.cos() * hour_angle.cos();
    sin_alt.clamp(-1.0, 1.0).asin().to_degrees()
}

/// Azimuth of a J2000 equatorial position, in degrees east of north,
/// [0, 360).
pub fn azimuth(ra_deg: f64, dec_deg: f64, lat_deg: f64, lon_deg: f64, jd: JulianDate) -> f64 {
    let hour_angle = normalize_hour_angle(local_sidereal_time(jd, lon_deg) - ra_deg).to_radians();
    let lat = lat_deg.to_radians();
    let dec = dec_deg.to_radians();

    let north = dec.sin() * lat.cos() - dec.cos() * hour_angle.cos() * lat.sin();
    let east = -dec.cos() * hour_angle.sin();
    normalize_degrees(east.atan2(north).to_degrees())
}

/// Great-circle separation between two equatorial positions, in degrees.
///
/// The cosine argument is clamped to [-1, 1] before inversion so identical
/// or antipodal points cannot round to a NaN.
pub fn angular_separation(ra1_deg: f64, dec1_deg: f64, ra2_deg: f64, dec2_deg: f64) -> f64 {
    let d1 = dec1_deg.to_radians();
    let d2 = dec2_deg.to_radians();
    let delta_ra = (ra1_deg - ra2_deg).to_radians();

    let cos_sep = d1.sin() * d2.sin() + d1.cos() * d2.cos() * delta_ra.cos();
    cos_sep.clamp(-1.0, 1.0).acos().to_degrees()
}
