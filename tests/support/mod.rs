//! Shared fixtures for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

use skyplan::api::GeographicLocation;
use skyplan::models::catalog::{DeepSkyObject, ObjectType};

/// Roque de los Muchachos Observatory, La Palma.
pub fn roque_de_los_muchachos() -> GeographicLocation {
    GeographicLocation::new(28.7624, -17.8892, Some(2396.0)).unwrap()
}

/// Greenwich Observatory.
pub fn greenwich() -> GeographicLocation {
    GeographicLocation::new(51.4769, 0.0, Some(0.0)).unwrap()
}

/// A mid-January evening, UTC.
pub fn winter_evening() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 22, 0, 0).unwrap()
}

pub fn object(
    id: &str,
    name: &str,
    object_type: ObjectType,
    constellation: &str,
    ra: f64,
    dec: f64,
    magnitude: Option<f64>,
) -> DeepSkyObject {
    DeepSkyObject {
        id: id.to_string(),
        name: name.to_string(),
        alternate_names: Vec::new(),
        object_type,
        constellation: constellation.to_string(),
        ra: qtty::Degrees::new(ra),
        dec: qtty::Degrees::new(dec),
        magnitude,
        major_axis_arcmin: None,
        minor_axis_arcmin: None,
        position_angle_deg: None,
    }
}

/// Small mixed catalog: northern winter showpieces plus a far-southern
/// target that never rises from the fixture sites.
pub fn fixture_catalog() -> Vec<DeepSkyObject> {
    vec![
        object(
            "M31",
            "Andromeda Galaxy",
            ObjectType::Galaxy,
            "AND",
            10.6847,
            41.2690,
            Some(3.4),
        ),
        object(
            "M42",
            "Orion Nebula",
            ObjectType::EmissionNebula,
            "ORI",
            83.8221,
            -5.3911,
            Some(4.0),
        ),
        object(
            "M45",
            "Pleiades",
            ObjectType::OpenCluster,
            "TAU",
            56.75,
            24.1167,
            Some(1.6),
        ),
        object(
            "M13",
            "Hercules Cluster",
            ObjectType::GlobularCluster,
            "HER",
            250.4235,
            36.4613,
            Some(5.8),
        ),
        object(
            "NGC 104",
            "47 Tucanae",
            ObjectType::GlobularCluster,
            "TUC",
            6.0224,
            -72.0813,
            Some(4.1),
        ),
    ]
}
