#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Normalized source tables.
//!
//! Every input dataset (allocation targets, permit activity, place and
//! county boundaries) is loaded into the types defined here, with canonical
//! field names regardless of how the publishing agency labelled its
//! columns. Column mappings and name aliases are configuration, declared in
//! [`columns`] and [`aliases`].

pub mod aliases;
pub mod columns;

pub use aliases::NameAliases;
pub use columns::{BoundaryColumns, PermitColumns, TargetColumns};

use geo::MultiPolygon;
use rhna_geography_models::Crs;
use rhna_housing_models::{County, IncomeLevel, PermitCategory};
use serde::{Deserialize, Serialize};

/// Unit counts broken down by the four income levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUnits {
    /// Very-low income units.
    pub very_low: u64,
    /// Low income units.
    pub low: u64,
    /// Moderate income units.
    pub moderate: u64,
    /// Above-moderate income units.
    pub above_moderate: u64,
}

impl LevelUnits {
    /// Returns the count for one level.
    #[must_use]
    pub const fn get(&self, level: IncomeLevel) -> u64 {
        match level {
            IncomeLevel::VeryLow => self.very_low,
            IncomeLevel::Low => self.low,
            IncomeLevel::Moderate => self.moderate,
            IncomeLevel::AboveModerate => self.above_moderate,
        }
    }

    /// Mutable access to the count for one level.
    pub fn get_mut(&mut self, level: IncomeLevel) -> &mut u64 {
        match level {
            IncomeLevel::VeryLow => &mut self.very_low,
            IncomeLevel::Low => &mut self.low,
            IncomeLevel::Moderate => &mut self.moderate,
            IncomeLevel::AboveModerate => &mut self.above_moderate,
        }
    }

    /// Sum across all four levels.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.very_low + self.low + self.moderate + self.above_moderate
    }
}

/// One row of the allocation-target table: a jurisdiction's eight-year
/// targets by income level, plus the published total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JurisdictionTargets {
    /// Jurisdiction name after alias and unincorporated rewrites.
    pub jurisdiction: String,
    /// County.
    pub county: County,
    /// Targets per income level.
    pub units: LevelUnits,
    /// Total column as published.
    pub reported_total: u64,
}

impl JurisdictionTargets {
    /// Expands into one [`AllocationTarget`] per income level.
    #[must_use]
    pub fn to_allocation_targets(&self) -> Vec<AllocationTarget> {
        IncomeLevel::all()
            .iter()
            .map(|&income_level| AllocationTarget {
                jurisdiction: self.jurisdiction.clone(),
                county: self.county,
                income_level,
                target_units: self.units.get(income_level),
            })
            .collect()
    }

    /// Returns `(reported, computed)` when the published total disagrees
    /// with the sum of the income-level targets.
    #[must_use]
    pub const fn total_mismatch(&self) -> Option<(u64, u64)> {
        let computed = self.units.total();
        if computed == self.reported_total {
            None
        } else {
            Some((self.reported_total, computed))
        }
    }
}

/// A target unit count for one jurisdiction and income level over the
/// planning horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationTarget {
    /// Jurisdiction name.
    pub jurisdiction: String,
    /// County.
    pub county: County,
    /// Income level.
    pub income_level: IncomeLevel,
    /// Target units over the full horizon.
    pub target_units: u64,
}

/// Permitted units for one jurisdiction, year, income level and structure
/// category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermitRecord {
    /// Jurisdiction name after alias and unincorporated rewrites.
    pub jurisdiction: String,
    /// County, from the FIPS column.
    pub county: County,
    /// Permit year.
    pub year: u16,
    /// Income level.
    pub income_level: IncomeLevel,
    /// Permitted units.
    pub units: u64,
    /// Structure category.
    pub category: PermitCategory,
    /// Whether the project lies in a transit priority area.
    pub is_transit_priority_area: bool,
}

/// A named polygon from a boundary dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    /// Name property (place or county name).
    pub name: String,
    /// GEOID property.
    pub geoid: String,
    /// Polygon or multipolygon boundary.
    pub geometry: MultiPolygon<f64>,
}

/// A boundary dataset with its coordinate reference system.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryLayer {
    /// CRS of every feature's coordinates.
    pub crs: Crs,
    /// Features in file order.
    pub features: Vec<BoundaryFeature>,
}
