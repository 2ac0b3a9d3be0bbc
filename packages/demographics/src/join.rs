//! Attaching counts to jurisdictions.

use std::collections::BTreeMap;

use rhna_geography_models::{
    DemographicGap, Demographics, GeographyLevel, Jurisdiction, JurisdictionKind,
};
use rhna_housing_models::{County, DemographicField, IntegrityViolation};

use crate::{DemographicSource, DemographicTable, DemographicsError};

/// Output of the demographic join.
#[derive(Debug, Clone, Default)]
pub struct DemographicJoin {
    /// Input jurisdictions with demographics attached where known, in input
    /// order.
    pub jurisdictions: Vec<Jurisdiction>,
    /// Jurisdictions left without counts.
    pub gaps: Vec<DemographicGap>,
    /// Negative unincorporated remainders.
    pub violations: Vec<IntegrityViolation>,
}

/// Fetches place and county estimates from `source` and attaches them.
///
/// # Errors
///
/// Returns [`DemographicsError`] if either fetch fails.
pub fn join_demographics(
    jurisdictions: &[Jurisdiction],
    unresolved_cities: &[(&str, County)],
    source: &dyn DemographicSource,
    state_fips: &str,
    year: u16,
) -> Result<DemographicJoin, DemographicsError> {
    let places = source.fetch(GeographyLevel::Place, state_fips, year)?;
    let counties = source.fetch(GeographyLevel::County, state_fips, year)?;
    Ok(attach_demographics(
        jurisdictions,
        unresolved_cities,
        &places,
        &counties,
    ))
}

/// Attaches counts from already-fetched tables.
///
/// Incorporated jurisdictions look up their place GEOID. An unincorporated
/// remainder gets its county total minus every incorporated jurisdiction
/// of that county; if any of those lacks counts the remainder is left
/// empty with [`DemographicGap::IncompleteCounty`], and a negative
/// difference is reported as [`IntegrityViolation::NegativeRemainder`]
/// rather than clamped.
///
/// `unresolved_cities` are target cities that never got a boundary. They
/// have no GEOID to look up, so they count as cities lacking counts and
/// block their county's remainder too.
#[must_use]
pub fn attach_demographics(
    jurisdictions: &[Jurisdiction],
    unresolved_cities: &[(&str, County)],
    places: &DemographicTable,
    counties: &DemographicTable,
) -> DemographicJoin {
    let mut join = DemographicJoin::default();
    let mut incorporated: BTreeMap<County, Vec<(&str, Option<Demographics>)>> = BTreeMap::new();

    for jurisdiction in jurisdictions {
        if jurisdiction.kind == JurisdictionKind::Incorporated {
            incorporated
                .entry(jurisdiction.county)
                .or_default()
                .push((jurisdiction.name.as_str(), places.get(&jurisdiction.geoid).copied()));
        }
    }
    for &(name, county) in unresolved_cities {
        incorporated.entry(county).or_default().push((name, None));
    }

    for jurisdiction in jurisdictions {
        let demographics = match jurisdiction.kind {
            JurisdictionKind::Incorporated => {
                let found = places.get(&jurisdiction.geoid).copied();
                if found.is_none() {
                    join.record_gap(DemographicGap::MissingRecord {
                        jurisdiction: jurisdiction.name.clone(),
                        geoid: jurisdiction.geoid.clone(),
                        level: GeographyLevel::Place,
                    });
                }
                found
            }
            JurisdictionKind::Unincorporated => {
                let cities = incorporated
                    .get(&jurisdiction.county)
                    .map_or(&[][..], Vec::as_slice);
                join.remainder(jurisdiction, counties, cities)
            }
        };
        join.jurisdictions
            .push(jurisdiction.with_demographics(demographics));
    }

    log::info!(
        "Attached demographics to {} of {} jurisdictions ({} gaps, {} violations)",
        join.jurisdictions
            .iter()
            .filter(|j| j.demographics.is_some())
            .count(),
        join.jurisdictions.len(),
        join.gaps.len(),
        join.violations.len()
    );

    join
}

impl DemographicJoin {
    fn record_gap(&mut self, gap: DemographicGap) {
        log::warn!("Demographic gap: {gap}");
        self.gaps.push(gap);
    }

    /// County total minus the incorporated cities in that county.
    fn remainder(
        &mut self,
        jurisdiction: &Jurisdiction,
        counties: &DemographicTable,
        cities: &[(&str, Option<Demographics>)],
    ) -> Option<Demographics> {
        let Some(county_total) = counties.get(&jurisdiction.geoid).copied() else {
            self.record_gap(DemographicGap::MissingRecord {
                jurisdiction: jurisdiction.name.clone(),
                geoid: jurisdiction.geoid.clone(),
                level: GeographyLevel::County,
            });
            return None;
        };

        let missing_places: Vec<String> = cities
            .iter()
            .filter(|(_, counts)| counts.is_none())
            .map(|(name, _)| (*name).to_string())
            .collect();
        if !missing_places.is_empty() {
            self.record_gap(DemographicGap::IncompleteCounty {
                jurisdiction: jurisdiction.name.clone(),
                county: jurisdiction.county,
                missing_places,
            });
            return None;
        }

        let incorporated = cities
            .iter()
            .filter_map(|(_, counts)| *counts)
            .fold(Demographics::default(), |acc, c| Demographics {
                population: acc.population + c.population,
                existing_units: acc.existing_units + c.existing_units,
            });

        let population = self.subtract(
            jurisdiction,
            DemographicField::Population,
            county_total.population,
            incorporated.population,
        );
        let existing_units = self.subtract(
            jurisdiction,
            DemographicField::HousingUnits,
            county_total.existing_units,
            incorporated.existing_units,
        );

        Some(Demographics {
            population: population?,
            existing_units: existing_units?,
        })
    }

    fn subtract(
        &mut self,
        jurisdiction: &Jurisdiction,
        field: DemographicField,
        county_total: u64,
        incorporated_sum: u64,
    ) -> Option<u64> {
        let remainder = county_total.checked_sub(incorporated_sum);
        if remainder.is_none() {
            let violation = IntegrityViolation::NegativeRemainder {
                jurisdiction: jurisdiction.name.clone(),
                county: jurisdiction.county,
                field,
                county_total,
                incorporated_sum,
            };
            log::warn!("Integrity violation: {violation}");
            self.violations.push(violation);
        }
        remainder
    }
}
