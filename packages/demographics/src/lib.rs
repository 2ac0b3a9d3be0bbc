#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Demographic join for resolved jurisdictions.
//!
//! Population and housing-unit estimates come from a [`DemographicSource`]
//! at place and county level. Cities take their place record directly;
//! unincorporated remainders are apportioned as the county total minus the
//! cities inside it.

pub mod csv_source;
pub mod join;

use std::collections::BTreeMap;

pub use csv_source::{CsvDemographicSource, DemographicColumns, read_demographics};
pub use join::{DemographicJoin, attach_demographics, join_demographics};

use rhna_geography_models::{Demographics, GeographyLevel};
use rhna_source::SourceError;
use thiserror::Error;

/// Errors returned by a demographic source.
#[derive(Debug, Error)]
pub enum DemographicsError {
    /// The backing file could not be read or parsed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The source cannot serve the request at all.
    #[error("No {level} estimates available: {message}")]
    Unavailable {
        /// Level that was requested.
        level: GeographyLevel,
        /// Why.
        message: String,
    },
}

/// Counts keyed by zero-padded GEOID.
pub type DemographicTable = BTreeMap<String, Demographics>;

/// Provider of population and housing-unit estimates.
pub trait DemographicSource {
    /// Fetches every estimate at `level` for the state `state_fips` in
    /// `year`, keyed by GEOID.
    ///
    /// # Errors
    ///
    /// Returns [`DemographicsError`] if the estimates cannot be retrieved.
    fn fetch(
        &self,
        level: GeographyLevel,
        state_fips: &str,
        year: u16,
    ) -> Result<DemographicTable, DemographicsError>;
}

/// Source backed by tables already in memory. The year is ignored.
#[derive(Debug, Clone, Default)]
pub struct MemoryDemographicSource {
    /// Place-level estimates.
    pub places: DemographicTable,
    /// County-level estimates.
    pub counties: DemographicTable,
}

impl DemographicSource for MemoryDemographicSource {
    fn fetch(
        &self,
        level: GeographyLevel,
        state_fips: &str,
        _year: u16,
    ) -> Result<DemographicTable, DemographicsError> {
        let table = match level {
            GeographyLevel::Place => &self.places,
            GeographyLevel::County => &self.counties,
        };
        Ok(table
            .iter()
            .filter(|(geoid, _)| geoid.starts_with(state_fips))
            .map(|(geoid, counts)| (geoid.clone(), *counts))
            .collect())
    }
}
