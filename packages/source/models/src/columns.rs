//! Raw-field to canonical-field mappings for each source table.
//!
//! Defaults match the column names used by the published ABAG/HCD
//! datasets; any of them can be overridden from the pipeline TOML.

use rhna_housing_models::IncomeLevel;
use serde::{Deserialize, Serialize};

/// Column names in the allocation-target CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetColumns {
    /// County name column.
    pub county: String,
    /// Jurisdiction name column.
    pub jurisdiction: String,
    /// Very-low income target column.
    pub very_low: String,
    /// Low income target column.
    pub low: String,
    /// Moderate income target column.
    pub moderate: String,
    /// Above-moderate income target column.
    pub above_moderate: String,
    /// Published total column.
    pub total: String,
}

impl Default for TargetColumns {
    fn default() -> Self {
        Self {
            county: "County".to_string(),
            jurisdiction: "Jurisdiction".to_string(),
            very_low: "Very Low".to_string(),
            low: "Low".to_string(),
            moderate: "Moderate".to_string(),
            above_moderate: "Above Moderate".to_string(),
            total: "Total".to_string(),
        }
    }
}

impl TargetColumns {
    /// Column holding the given level's target.
    #[must_use]
    pub fn level(&self, level: IncomeLevel) -> &str {
        match level {
            IncomeLevel::VeryLow => &self.very_low,
            IncomeLevel::Low => &self.low,
            IncomeLevel::Moderate => &self.moderate,
            IncomeLevel::AboveModerate => &self.above_moderate,
        }
    }
}

/// Column names in the permit CSV.
///
/// Each income level may be split across several raw columns (e.g.
/// deed-restricted and non-deed-restricted units); they are summed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermitColumns {
    /// Jurisdiction name column.
    pub jurisdiction: String,
    /// County FIPS column.
    pub county_fips: String,
    /// Permit year column.
    pub year: String,
    /// Structure category column.
    pub category: String,
    /// Transit priority area flag column.
    pub tpa: String,
    /// Very-low income unit columns.
    pub very_low: Vec<String>,
    /// Low income unit columns.
    pub low: Vec<String>,
    /// Moderate income unit columns.
    pub moderate: Vec<String>,
    /// Above-moderate income unit columns.
    pub above_moderate: Vec<String>,
}

impl Default for PermitColumns {
    fn default() -> Self {
        Self {
            jurisdiction: "jurisdictn".to_string(),
            county_fips: "countyfp".to_string(),
            year: "permyear".to_string(),
            category: "hcategory".to_string(),
            tpa: "tpa".to_string(),
            very_low: vec!["vlowdr".to_string(), "vlowndr".to_string()],
            low: vec!["lowdr".to_string(), "lowndr".to_string()],
            moderate: vec!["moddr".to_string(), "modndr".to_string()],
            above_moderate: vec!["amod".to_string()],
        }
    }
}

impl PermitColumns {
    /// Columns summed into the given level's units.
    #[must_use]
    pub fn level(&self, level: IncomeLevel) -> &[String] {
        match level {
            IncomeLevel::VeryLow => &self.very_low,
            IncomeLevel::Low => &self.low,
            IncomeLevel::Moderate => &self.moderate,
            IncomeLevel::AboveModerate => &self.above_moderate,
        }
    }
}

/// Property names in a boundary `GeoJSON` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryColumns {
    /// Feature name property.
    pub name: String,
    /// Feature GEOID property.
    pub geoid: String,
}

impl Default for BoundaryColumns {
    fn default() -> Self {
        Self {
            name: "NAME".to_string(),
            geoid: "GEOID".to_string(),
        }
    }
}
