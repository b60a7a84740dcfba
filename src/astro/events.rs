//! Rise/set and twilight crossing solver.
//!
//! Solves the hour-angle equation for the times at which a body's altitude
//! crosses a threshold (0 degrees for rise/set, -6/-12/-18 for the twilight
//! tiers). Circumpolar and never-rising geometries are reported as explicit
//! variants, never as errors, so callers can propagate "no crossing tonight"
//! as plain data.

use crate::astro::solar::local_sidereal_time;
use crate::models::angles::normalize_hour_angle;
use crate::models::time::JulianDate;

/// Hour-angle advance rate in degrees per solar day.
const HOUR_ANGLE_RATE: f64 = 360.98564736629;

/// Result of a crossing search over one observing window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HorizonCrossings {
    /// The body crosses the threshold; either event may still fall outside
    /// the searched window.
    Events {
        /// Upward crossing (body climbing through the threshold)
        rise: Option<JulianDate>,
        /// Downward crossing
        set: Option<JulianDate>,
    },
    /// The body never drops below the threshold at this latitude/date.
    AlwaysAbove,
    /// The body never climbs above the threshold at this latitude/date.
    AlwaysBelow,
}

enum Arc {
    Crosses(f64),
    AlwaysAbove,
    AlwaysBelow,
}

/// Semidiurnal arc: the hour angle (degrees, 0..180) at which the altitude
/// equals `threshold_deg`.
///
/// The polar degenerate case (observer at a pole, or the body at a celestial
/// pole) makes the denominator vanish; the altitude is then constant and the
/// crossing is classified by the numerator sign instead of dividing.
fn semidiurnal_arc(threshold_deg: f64, lat_deg: f64, dec_deg: f64) -> Arc {
    let lat = lat_deg.to_radians();
    let dec = dec_deg.to_radians();

    let numerator = threshold_deg.to_radians().sin() - lat.sin() * dec.sin();
    let denominator = lat.cos() * dec.cos();

    if denominator.abs() < 1e-9 {
        return if numerator <= 0.0 {
            Arc::AlwaysAbove
        } else {
            Arc::AlwaysBelow
        };
    }

    let cos_h0 = numerator / denominator;
    if cos_h0 > 1.0 {
        Arc::AlwaysBelow
    } else if cos_h0 < -1.0 {
        Arc::AlwaysAbove
    } else {
        Arc::Crosses(cos_h0.acos().to_degrees())
    }
}

/// Meridian transit nearest to `guess`, found by fixed-point iteration on
/// the hour angle. Re-evaluates the body position each step, so it works
/// for the Sun and Moon as well as for fixed targets.
pub fn transit_near<F>(guess: JulianDate, lon_deg: f64, body: &F) -> JulianDate
where
    F: Fn(JulianDate) -> (f64, f64),
{
    let mut t = guess.value();
    for _ in 0..6 {
        let jd = JulianDate::new(t);
        let (ra, _) = body(jd);
        let hour_angle = normalize_hour_angle(local_sidereal_time(jd, lon_deg) - ra);
        t -= hour_angle / HOUR_ANGLE_RATE;
    }
    JulianDate::new(t)
}

/// Polish a crossing estimate by driving the hour angle to the semidiurnal
/// arc (negative for a rise, positive for a set).
fn refine_crossing<F>(
    estimate: f64,
    rising: bool,
    lat_deg: f64,
    lon_deg: f64,
    threshold_deg: f64,
    body: &F,
) -> f64
where
    F: Fn(JulianDate) -> (f64, f64),
{
    let mut t = estimate;
    for _ in 0..4 {
        let jd = JulianDate::new(t);
        let (ra, dec) = body(jd);
        let arc = match semidiurnal_arc(threshold_deg, lat_deg, dec) {
            Arc::Crosses(h0) => h0,
            // Declination drifted into a no-crossing geometry mid-refinement;
            // keep the current estimate.
            _ => break,
        };
        let target = if rising { -arc } else { arc };
        let hour_angle = normalize_hour_angle(local_sidereal_time(jd, lon_deg) - ra);
        t += normalize_hour_angle(target - hour_angle) / HOUR_ANGLE_RATE;
    }
    t
}

/// Find the threshold crossings of a body within `[window_start, window_end]`.
///
/// `body` maps a Julian Date to (ra, dec) in degrees; for fixed targets it
/// simply returns constants. Transits one day either side of the window
/// midpoint are examined so events near the window edges are not missed.
pub fn crossings<F>(
    window_start: JulianDate,
    window_end: JulianDate,
    lat_deg: f64,
    lon_deg: f64,
    threshold_deg: f64,
    body: F,
) -> HorizonCrossings
where
    F: Fn(JulianDate) -> (f64, f64),
{
    let mid = JulianDate::new((window_start.value() + window_end.value()) / 2.0);
    let (_, dec_mid) = body(mid);

    match semidiurnal_arc(threshold_deg, lat_deg, dec_mid) {
        Arc::AlwaysAbove => return HorizonCrossings::AlwaysAbove,
        Arc::AlwaysBelow => return HorizonCrossings::AlwaysBelow,
        Arc::Crosses(_) => {}
    }

    let mut rises: Vec<f64> = Vec::new();
    let mut sets: Vec<f64> = Vec::new();

    for offset in [-1.0, 0.0, 1.0] {
        let transit = transit_near(JulianDate::new(mid.value() + offset), lon_deg, &body);
        let (_, dec) = body(transit);
        let arc = match semidiurnal_arc(threshold_deg, lat_deg, dec) {
            Arc::Crosses(h0) => h0,
            _ => continue,
        };

        let rise = refine_crossing(
            transit.value() - arc / HOUR_ANGLE_RATE,
            true,
            lat_deg,
            lon_deg,
            threshold_deg,
            &body,
        );
        let set = refine_crossing(
            transit.value() + arc / HOUR_ANGLE_RATE,
            false,
            lat_deg,
            lon_deg,
            threshold_deg,
            &body,
        );
        rises.push(rise);
        sets.push(set);
    }

    HorizonCrossings::Events {
        rise: first_in_window(&mut rises, window_start.value(), window_end.value()),
        set: first_in_window(&mut sets, window_start.value(), window_end.value()),
    }
}

fn first_in_window(candidates: &mut Vec<f64>, start: f64, end: f64) -> Option<JulianDate> {
    candidates.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    // Adjacent transit guesses can converge onto the same event.
    candidates.dedup_by(|a, b| (*a - *b).abs() < 2e-3);
    candidates
        .iter()
        .copied()
        .find(|t| (start..=end).contains(t))
        .map(JulianDate::new)
}
