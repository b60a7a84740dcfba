//! Deep-sky object catalog model and JSON parsing.
//!
//! Catalog entries are immutable: search and enrichment always work on
//! display-ready copies, never on the entries themselves. The bundled
//! catalog dataset is loaded by the caller; this module only provides the
//! parsing seam and the coordinate invariants.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Errors raised for malformed catalog entries.
///
/// These represent caller bugs (out-of-range coordinates in a dataset), not
/// expected runtime conditions.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Right ascension outside [0, 360)
    #[error("Right ascension out of range for '{id}': {value}")]
    RightAscensionOutOfRange { id: String, value: f64 },

    /// Declination outside [-90, 90]
    #[error("Declination out of range for '{id}': {value}")]
    DeclinationOutOfRange { id: String, value: f64 },
}

/// Deep-sky object classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Galaxy,
    EmissionNebula,
    ReflectionNebula,
    PlanetaryNebula,
    SupernovaRemnant,
    DarkNebula,
    OpenCluster,
    GlobularCluster,
    DoubleStar,
    Asterism,
}

impl ObjectType {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ObjectType::Galaxy => "Galaxy",
            ObjectType::EmissionNebula => "Emission Nebula",
            ObjectType::ReflectionNebula => "Reflection Nebula",
            ObjectType::PlanetaryNebula => "Planetary Nebula",
            ObjectType::SupernovaRemnant => "Supernova Remnant",
            ObjectType::DarkNebula => "Dark Nebula",
            ObjectType::OpenCluster => "Open Cluster",
            ObjectType::GlobularCluster => "Globular Cluster",
            ObjectType::DoubleStar => "Double Star",
            ObjectType::Asterism => "Asterism",
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Immutable static catalog entry (J2000 coordinates).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepSkyObject {
    /// Catalog identifier shown to the user (e.g. "NGC 7000")
    pub id: String,
    /// Primary display name
    pub name: String,
    /// Alternate designations, ordered by preference
    #[serde(default)]
    pub alternate_names: Vec<String>,
    /// Object classification
    pub object_type: ObjectType,
    /// IAU constellation code (e.g. "AND")
    pub constellation: String,
    /// Right ascension in degrees, J2000, [0, 360)
    pub ra: qtty::Degrees,
    /// Declination in degrees, J2000, [-90, 90]
    pub dec: qtty::Degrees,
    /// Apparent visual magnitude, if catalogued
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnitude: Option<f64>,
    /// Angular size major axis in arcminutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major_axis_arcmin: Option<f64>,
    /// Angular size minor axis in arcminutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minor_axis_arcmin: Option<f64>,
    /// Position angle in degrees east of north
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_angle_deg: Option<f64>,
}

impl DeepSkyObject {
    /// Validate the coordinate invariants of an entry.
    pub fn validate(&self) -> std::result::Result<(), CatalogError> {
        let ra = self.ra.value();
        if !(0.0..360.0).contains(&ra) || ra.is_nan() {
            return Err(CatalogError::RightAscensionOutOfRange {
                id: self.id.clone(),
                value: ra,
            });
        }
        let dec = self.dec.value();
        if !(-90.0..=90.0).contains(&dec) || dec.is_nan() {
            return Err(CatalogError::DeclinationOutOfRange {
                id: self.id.clone(),
                value: dec,
            });
        }
        Ok(())
    }

    /// Case-insensitive substring match across id, name and alternate names.
    pub fn matches_name(&self, query_lower: &str) -> bool {
        if self.id.to_lowercase().contains(query_lower)
            || self.name.to_lowercase().contains(query_lower)
        {
            return true;
        }
        self.alternate_names
            .iter()
            .any(|alias| alias.to_lowercase().contains(query_lower))
    }
}

/// A parsed catalog with provenance checksum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Dataset name
    #[serde(default)]
    pub name: String,
    /// SHA256 checksum of the source JSON
    #[serde(default)]
    pub checksum: String,
    /// Catalog entries
    pub objects: Vec<DeepSkyObject>,
}

#[derive(serde::Deserialize)]
struct CatalogInput {
    #[serde(default)]
    name: String,
    objects: Vec<DeepSkyObject>,
}

/// Parse a catalog from a JSON string.
///
/// Accepts either a wrapper object `{"name": ..., "objects": [...]}` or a
/// bare array of entries. Every entry's coordinate invariants are checked;
/// a checksum of the source text is attached for provenance.
///
/// # Arguments
///
/// * `catalog_json` - Catalog JSON (snake_case field names)
///
/// # Returns
///
/// A validated `Catalog` with computed checksum.
pub fn parse_catalog_json_str(catalog_json: &str) -> Result<Catalog> {
    let trimmed = catalog_json.trim();

    // Try wrapper form first, then bare array form.
    let (name, objects) = match serde_json::from_str::<CatalogInput>(trimmed) {
        Ok(input) => (input.name, input.objects),
        Err(_) => {
            let objects: Vec<DeepSkyObject> = serde_json::from_str(trimmed)
                .context("Failed to deserialize catalog JSON using Serde")?;
            (String::new(), objects)
        }
    };

    for object in &objects {
        object
            .validate()
            .with_context(|| format!("Invalid catalog entry '{}'", object.id))?;
    }

    Ok(Catalog {
        name,
        checksum: compute_catalog_checksum(catalog_json),
        objects,
    })
}

/// Compute a checksum for the catalog JSON
fn compute_catalog_checksum(json_str: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(json_str.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}
