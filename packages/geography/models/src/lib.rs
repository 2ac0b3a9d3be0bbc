#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Jurisdiction and boundary resolution types.
//!
//! A [`Jurisdiction`] is either an incorporated city/town matched from the
//! census place boundaries, or a county's unincorporated remainder
//! synthesized by subtracting its cities from the county polygon. These
//! types also carry the findings of resolution ([`ResolutionGap`],
//! [`MatchReport`]) and of the demographic join ([`DemographicGap`]).

pub mod fips;

use geo::MultiPolygon;
use rhna_housing_models::County;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Coordinate reference systems the resolver can convert between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crs {
    /// WGS 84 longitude/latitude (EPSG:4326).
    Wgs84,
    /// NAD83 longitude/latitude (EPSG:4269), used by TIGER/Line files.
    Nad83,
    /// Spherical Web Mercator in meters (EPSG:3857).
    WebMercator,
}

impl Crs {
    /// EPSG code for this CRS.
    #[must_use]
    pub const fn epsg(self) -> u32 {
        match self {
            Self::Wgs84 => 4326,
            Self::Nad83 => 4269,
            Self::WebMercator => 3857,
        }
    }

    /// Looks up a CRS by EPSG code.
    #[must_use]
    pub const fn from_epsg(code: u32) -> Option<Self> {
        match code {
            4326 => Some(Self::Wgs84),
            4269 => Some(Self::Nad83),
            3857 | 900_913 => Some(Self::WebMercator),
            _ => None,
        }
    }

    /// Parses the CRS identifiers found in `GeoJSON` `crs` members:
    /// `"EPSG:4269"`, `"urn:ogc:def:crs:EPSG::4269"` and
    /// `"urn:ogc:def:crs:OGC:1.3:CRS84"`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.ends_with("CRS84") {
            return Some(Self::Wgs84);
        }
        let code = name.rsplit(':').next()?;
        Self::from_epsg(code.parse().ok()?)
    }

    /// Whether coordinates are longitude/latitude degrees.
    #[must_use]
    pub const fn is_geographic(self) -> bool {
        matches!(self, Self::Wgs84 | Self::Nad83)
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// Whether a jurisdiction is a city or a county remainder.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JurisdictionKind {
    /// An incorporated city or town.
    Incorporated,
    /// County land outside every incorporated place.
    Unincorporated,
}

/// Population and existing housing stock for a geography.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    /// Resident population.
    pub population: u64,
    /// Existing housing units as of the baseline year.
    pub existing_units: u64,
}

/// Census geography level requested from the demographic source.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GeographyLevel {
    /// Census designated/incorporated places.
    Place,
    /// Counties.
    County,
}

/// A resolved jurisdiction with its boundary.
///
/// `demographics` is `None` until the demographic join attaches counts, and
/// stays `None` when the source had no usable record for `geoid`.
#[derive(Debug, Clone, PartialEq)]
pub struct Jurisdiction {
    /// Unique name (e.g. "Oakland", "Marin Unincorporated").
    pub name: String,
    /// County the jurisdiction belongs to.
    pub county: County,
    /// City or unincorporated remainder.
    pub kind: JurisdictionKind,
    /// Place GEOID for cities, county GEOID for remainders.
    pub geoid: String,
    /// Boundary in the county layer's CRS.
    pub geometry: MultiPolygon<f64>,
    /// Population and housing stock.
    pub demographics: Option<Demographics>,
}

impl Jurisdiction {
    /// Returns a copy of this jurisdiction with demographics attached.
    #[must_use]
    pub fn with_demographics(&self, demographics: Option<Demographics>) -> Self {
        Self {
            demographics,
            ..self.clone()
        }
    }

    /// Geometry-free view for serialization.
    #[must_use]
    pub fn summary(&self) -> JurisdictionSummary {
        JurisdictionSummary {
            name: self.name.clone(),
            county: self.county,
            kind: self.kind,
            geoid: self.geoid.clone(),
            population: self.demographics.map(|d| d.population),
            existing_units: self.demographics.map(|d| d.existing_units),
        }
    }
}

/// A [`Jurisdiction`] without its geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JurisdictionSummary {
    /// Jurisdiction name.
    pub name: String,
    /// County.
    pub county: County,
    /// City or unincorporated remainder.
    pub kind: JurisdictionKind,
    /// Place or county GEOID.
    pub geoid: String,
    /// Resident population, if known.
    pub population: Option<u64>,
    /// Existing housing units, if known.
    pub existing_units: Option<u64>,
}

/// A jurisdiction that could not be fully resolved to a boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionGap {
    /// A target-table name matched no place boundary.
    MissingGeometry {
        /// Jurisdiction name from the target table.
        jurisdiction: String,
        /// County from the target table.
        county: County,
    },
    /// The place matched but nothing was left after clipping to the study
    /// area.
    EmptyGeometry {
        /// Jurisdiction name.
        jurisdiction: String,
        /// Place GEOID.
        geoid: String,
    },
    /// Several places share the name; the largest was kept.
    AmbiguousName {
        /// Shared name.
        jurisdiction: String,
        /// Every candidate GEOID.
        geoids: Vec<String>,
        /// GEOID that was kept.
        kept: String,
    },
    /// The target table names an unincorporated area for a county whose
    /// remainder was dropped as fully incorporated.
    NoRemainder {
        /// Unincorporated jurisdiction name.
        jurisdiction: String,
        /// County.
        county: County,
    },
}

impl ResolutionGap {
    /// Jurisdiction the gap refers to.
    #[must_use]
    pub fn jurisdiction(&self) -> &str {
        match self {
            Self::MissingGeometry { jurisdiction, .. }
            | Self::EmptyGeometry { jurisdiction, .. }
            | Self::AmbiguousName { jurisdiction, .. }
            | Self::NoRemainder { jurisdiction, .. } => jurisdiction,
        }
    }

    /// Whether the jurisdiction ended up without any geometry.
    #[must_use]
    pub const fn is_geometry_less(&self) -> bool {
        matches!(
            self,
            Self::MissingGeometry { .. } | Self::EmptyGeometry { .. } | Self::NoRemainder { .. }
        )
    }
}

impl std::fmt::Display for ResolutionGap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingGeometry {
                jurisdiction,
                county,
            } => write!(f, "{jurisdiction} ({county}): no matching place boundary"),
            Self::EmptyGeometry {
                jurisdiction,
                geoid,
            } => write!(f, "{jurisdiction} ({geoid}): empty after clipping to study area"),
            Self::AmbiguousName {
                jurisdiction,
                geoids,
                kept,
            } => write!(
                f,
                "{jurisdiction}: {} places share this name ({}), kept {kept}",
                geoids.len(),
                geoids.join(", ")
            ),
            Self::NoRemainder {
                jurisdiction,
                county,
            } => write!(
                f,
                "{jurisdiction}: {county} is fully incorporated, no remainder geometry"
            ),
        }
    }
}

/// A jurisdiction left without demographic counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DemographicGap {
    /// The source returned nothing for the GEOID.
    MissingRecord {
        /// Jurisdiction name.
        jurisdiction: String,
        /// GEOID that was looked up.
        geoid: String,
        /// Level it was looked up at.
        level: GeographyLevel,
    },
    /// An unincorporated remainder could not be apportioned because some
    /// incorporated places in its county have no counts.
    IncompleteCounty {
        /// Unincorporated jurisdiction name.
        jurisdiction: String,
        /// County.
        county: County,
        /// Incorporated jurisdictions lacking counts.
        missing_places: Vec<String>,
    },
}

impl DemographicGap {
    /// Jurisdiction the gap refers to.
    #[must_use]
    pub fn jurisdiction(&self) -> &str {
        match self {
            Self::MissingRecord { jurisdiction, .. }
            | Self::IncompleteCounty { jurisdiction, .. } => jurisdiction,
        }
    }
}

impl std::fmt::Display for DemographicGap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRecord {
                jurisdiction,
                geoid,
                level,
            } => write!(f, "{jurisdiction}: no {level} record for GEOID {geoid}"),
            Self::IncompleteCounty {
                jurisdiction,
                county,
                missing_places,
            } => write!(
                f,
                "{jurisdiction}: cannot apportion {county} totals, missing {}",
                missing_places.join(", ")
            ),
        }
    }
}

/// Outcome of matching an authoritative name list against a candidate
/// dataset that shares no join key with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    /// Names present on both sides.
    pub matched: Vec<String>,
    /// Authoritative names with no candidate.
    pub missing: Vec<String>,
    /// Candidate names absent from the authoritative list.
    pub extra: Vec<String>,
}

impl MatchReport {
    /// Compares two name sets. Output lists are sorted and deduplicated.
    #[must_use]
    pub fn between<'a>(
        authoritative: impl IntoIterator<Item = &'a str>,
        candidates: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        use std::collections::BTreeSet;

        let authoritative: BTreeSet<&str> = authoritative.into_iter().collect();
        let candidates: BTreeSet<&str> = candidates.into_iter().collect();

        Self {
            matched: authoritative
                .intersection(&candidates)
                .map(|s| (*s).to_string())
                .collect(),
            missing: authoritative
                .difference(&candidates)
                .map(|s| (*s).to_string())
                .collect(),
            extra: candidates
                .difference(&authoritative)
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    /// Whether every authoritative name found a candidate.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}
