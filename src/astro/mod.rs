//! In-crate low-precision ephemeris.
//!
//! Closed-form solar and lunar positions, sidereal time, the horizontal
//! projection and the rise/set/twilight solver. Everything here is pure and
//! synchronous; the only shared state is the bounded position memo cache.

mod cache;

pub mod events;
pub mod horizontal;
pub mod lunar;
pub mod solar;

use serde::{Deserialize, Serialize};

/// J2000 equatorial coordinates in degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EquatorialCoord {
    /// Right ascension, [0, 360)
    pub ra: qtty::Degrees,
    /// Declination, [-90, 90]
    pub dec: qtty::Degrees,
}
