//! Nighttime data computation service.
//!
//! Composes the ephemeris layers into the per-night summary the search and
//! scheduling services consume: sunrise/sunset, the three twilight tiers,
//! moonrise/moonset, and the lunar phase and illumination.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::astro::events::{crossings, HorizonCrossings};
use crate::astro::{lunar, solar};
use crate::models::angles::normalize_degrees;
use crate::models::time::{reference_noon, JulianDate};

/// Sun altitude thresholds for the twilight tiers, in degrees.
pub const RISE_SET_ALTITUDE: f64 = 0.0;
pub const CIVIL_TWILIGHT_ALTITUDE: f64 = -6.0;
pub const NAUTICAL_TWILIGHT_ALTITUDE: f64 = -12.0;
pub const ASTRONOMICAL_TWILIGHT_ALTITUDE: f64 = -18.0;

/// How a body relates to its altitude threshold over the observing night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    /// The body crosses the threshold during the night
    Crosses,
    /// Circumpolar with respect to the threshold (never goes below)
    AlwaysAbove,
    /// Never reaches the threshold
    AlwaysBelow,
}

/// Rise/set pair for one altitude threshold within the observing night.
///
/// `set` is the evening (downward) crossing, `rise` the morning (upward)
/// one. Either may be absent even when the body does cross the threshold
/// in general, e.g. a night without a moonrise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiseSetWindow {
    pub state: WindowState,
    pub rise: Option<DateTime<Utc>>,
    pub set: Option<DateTime<Utc>>,
}

impl RiseSetWindow {
    fn from_crossings(result: HorizonCrossings) -> Self {
        match result {
            HorizonCrossings::Events { rise, set } => RiseSetWindow {
                state: WindowState::Crosses,
                rise: rise.map(|jd| jd.to_datetime()),
                set: set.map(|jd| jd.to_datetime()),
            },
            HorizonCrossings::AlwaysAbove => RiseSetWindow {
                state: WindowState::AlwaysAbove,
                rise: None,
                set: None,
            },
            HorizonCrossings::AlwaysBelow => RiseSetWindow {
                state: WindowState::AlwaysBelow,
                rise: None,
                set: None,
            },
        }
    }
}

/// Lunar phase, eight-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoonPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl MoonPhase {
    /// Derive the phase name from the cycle fraction (0 = new, 0.5 = full).
    pub fn from_phase_value(value: f64) -> Self {
        const PHASES: [MoonPhase; 8] = [
            MoonPhase::NewMoon,
            MoonPhase::WaxingCrescent,
            MoonPhase::FirstQuarter,
            MoonPhase::WaxingGibbous,
            MoonPhase::FullMoon,
            MoonPhase::WaningGibbous,
            MoonPhase::LastQuarter,
            MoonPhase::WaningCrescent,
        ];
        let index = ((value.rem_euclid(1.0) * 8.0).round() as usize) % 8;
        PHASES[index]
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            MoonPhase::NewMoon => "New Moon",
            MoonPhase::WaxingCrescent => "Waxing Crescent",
            MoonPhase::FirstQuarter => "First Quarter",
            MoonPhase::WaxingGibbous => "Waxing Gibbous",
            MoonPhase::FullMoon => "Full Moon",
            MoonPhase::WaningGibbous => "Waning Gibbous",
            MoonPhase::LastQuarter => "Last Quarter",
            MoonPhase::WaningCrescent => "Waning Crescent",
        }
    }
}

impl std::fmt::Display for MoonPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Per-night solar and lunar summary for one observer location.
///
/// Deterministic for a given (latitude, longitude, date), so results are
/// safe to cache by that key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NighttimeData {
    /// The query instant
    pub date: DateTime<Utc>,
    /// Noon anchor of the observing night containing `date`
    pub reference_date: DateTime<Utc>,
    /// Sunrise/sunset (0 degrees)
    pub sun: RiseSetWindow,
    /// Civil twilight (-6 degrees)
    pub civil_twilight: RiseSetWindow,
    /// Nautical twilight (-12 degrees)
    pub nautical_twilight: RiseSetWindow,
    /// Astronomical twilight (-18 degrees)
    pub astronomical_twilight: RiseSetWindow,
    /// Moonrise/moonset (0 degrees)
    pub moon: RiseSetWindow,
    /// Phase name derived from the Sun-Moon elongation
    pub moon_phase: MoonPhase,
    /// Cycle fraction in [0, 1): 0 = new, 0.5 = full
    pub moon_phase_value: f64,
    /// Illuminated disc fraction in percent, [0, 100]
    pub moon_illumination: f64,
}

impl NighttimeData {
    /// The full noon-to-noon observing window.
    pub fn night_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.reference_date, self.reference_date + Duration::days(1))
    }

    /// True-darkness window: astronomical dusk to astronomical dawn.
    ///
    /// `None` under a zero-darkness night (polar summer). A night where the
    /// Sun never climbs back above -18 degrees spans the whole window.
    pub fn darkness_window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.window_for(&self.astronomical_twilight)
    }

    /// Observing window for one twilight tier, `None` when that tier never
    /// gets dark enough.
    pub fn window_for(&self, tier: &RiseSetWindow) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let (night_start, night_end) = self.night_window();
        match tier.state {
            WindowState::AlwaysAbove => None,
            WindowState::AlwaysBelow => Some((night_start, night_end)),
            WindowState::Crosses => {
                let start = tier.set.unwrap_or(night_start);
                let end = tier.rise.unwrap_or(night_end);
                if start < end {
                    Some((start, end))
                } else {
                    None
                }
            }
        }
    }
}

/// Compute the nighttime summary for an observer and date.
///
/// All windows are solved over the observing night anchored by
/// [`reference_noon`], so they span midnight correctly. Expected "no event"
/// situations (polar day, a night without a moonrise) surface as absent
/// values, never as errors.
pub fn calculate_nighttime_data(lat_deg: f64, lon_deg: f64, date: DateTime<Utc>) -> NighttimeData {
    let reference_date = reference_noon(date, lon_deg);
    let window_start = JulianDate::from_datetime(reference_date);
    let window_end = JulianDate::new(window_start.value() + 1.0);

    let sun_body = |jd: JulianDate| {
        let p = solar::sun_position(jd);
        (p.ra.value(), p.dec.value())
    };
    let moon_body = |jd: JulianDate| {
        let p = lunar::moon_position(jd);
        (p.ra.value(), p.dec.value())
    };

    let solve = |threshold: f64| {
        RiseSetWindow::from_crossings(crossings(
            window_start,
            window_end,
            lat_deg,
            lon_deg,
            threshold,
            sun_body,
        ))
    };

    let sun = solve(RISE_SET_ALTITUDE);
    let civil_twilight = solve(CIVIL_TWILIGHT_ALTITUDE);
    let nautical_twilight = solve(NAUTICAL_TWILIGHT_ALTITUDE);
    let astronomical_twilight = solve(ASTRONOMICAL_TWILIGHT_ALTITUDE);

    let moon = RiseSetWindow::from_crossings(crossings(
        window_start,
        window_end,
        lat_deg,
        lon_deg,
        RISE_SET_ALTITUDE,
        moon_body,
    ));

    let jd_query = JulianDate::from_datetime(date);
    let sun_longitude = solar::sun_ecliptic_longitude(jd_query);
    let moon_longitude = lunar::moon_position(jd_query).ecliptic_longitude;

    let phase_angle = normalize_degrees(moon_longitude - sun_longitude);
    let moon_phase_value = phase_angle / 360.0;
    let elongation = if phase_angle > 180.0 {
        360.0 - phase_angle
    } else {
        phase_angle
    };
    let moon_illumination =
        ((1.0 - elongation.to_radians().cos()) / 2.0 * 100.0).clamp(0.0, 100.0);

    NighttimeData {
        date,
        reference_date,
        sun,
        civil_twilight,
        nautical_twilight,
        astronomical_twilight,
        moon,
        moon_phase: MoonPhase::from_phase_value(moon_phase_value),
        moon_phase_value,
        moon_illumination,
    }
}
