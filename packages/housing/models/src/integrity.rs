//! Data-integrity findings.
//!
//! An integrity violation invalidates the affected jurisdiction's row but
//! does not stop the run. Violations are collected and handed back with the
//! pipeline output.

use serde::{Deserialize, Serialize};

use crate::County;

/// Which demographic quantity a violation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemographicField {
    /// Resident population.
    Population,
    /// Existing housing units.
    HousingUnits,
}

impl std::fmt::Display for DemographicField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Population => write!(f, "population"),
            Self::HousingUnits => write!(f, "housing units"),
        }
    }
}

/// A row that failed a consistency check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityViolation {
    /// A target row's reported total differs from the sum of its four
    /// income-level targets.
    TargetTotalMismatch {
        /// Jurisdiction name.
        jurisdiction: String,
        /// County the jurisdiction belongs to.
        county: County,
        /// Total column as published.
        reported: u64,
        /// Sum of the four income-level columns.
        computed: u64,
    },
    /// County total minus the incorporated places' sum came out negative,
    /// meaning the incorporated set for the county is inconsistent.
    NegativeRemainder {
        /// Unincorporated jurisdiction name.
        jurisdiction: String,
        /// County being apportioned.
        county: County,
        /// Quantity that went negative.
        field: DemographicField,
        /// County-level total from the demographic source.
        county_total: u64,
        /// Sum over incorporated places in the county.
        incorporated_sum: u64,
    },
}

impl IntegrityViolation {
    /// Jurisdiction the violation is attributed to.
    #[must_use]
    pub fn jurisdiction(&self) -> &str {
        match self {
            Self::TargetTotalMismatch { jurisdiction, .. }
            | Self::NegativeRemainder { jurisdiction, .. } => jurisdiction,
        }
    }
}

impl std::fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TargetTotalMismatch {
                jurisdiction,
                county,
                reported,
                computed,
            } => write!(
                f,
                "{jurisdiction} ({county}): reported target total {reported} \
                 but income levels sum to {computed}"
            ),
            Self::NegativeRemainder {
                jurisdiction,
                county,
                field,
                county_total,
                incorporated_sum,
            } => {
                #[allow(clippy::cast_possible_wrap)]
                let remainder = *county_total as i64 - *incorporated_sum as i64;
                write!(
                    f,
                    "{jurisdiction} ({county}): {field} remainder is {remainder} \
                     (county {county_total} - incorporated {incorporated_sum})"
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_remainder_message_shows_shortfall() {
        let violation = IntegrityViolation::NegativeRemainder {
            jurisdiction: "Napa Unincorporated".to_string(),
            county: County::Napa,
            field: DemographicField::Population,
            county_total: 500_000,
            incorporated_sum: 510_000,
        };
        assert_eq!(violation.jurisdiction(), "Napa Unincorporated");
        assert!(violation.to_string().contains("remainder is -10000"));
    }
}
