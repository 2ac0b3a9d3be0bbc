//! Demographic estimates read from per-level CSV extracts.
//!
//! Each file has one row per geography with a GEOID, a population count and
//! a housing-unit count. Multi-year extracts carry a `year` column, which is
//! filtered to the requested baseline year when present.

use std::collections::btree_map::Entry;
use std::io::Read;
use std::path::PathBuf;

use rhna_geography_models::fips::normalize_geoid;
use rhna_geography_models::{Demographics, GeographyLevel};
use rhna_source::parsing::{parse_units, parse_year};
use rhna_source::{Headers, SourceError, open};
use serde::{Deserialize, Serialize};

use crate::{DemographicSource, DemographicTable, DemographicsError};

/// Column names in the demographic CSVs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemographicColumns {
    /// GEOID column.
    pub geoid: String,
    /// Population column.
    pub population: String,
    /// Housing-unit column.
    pub housing_units: String,
    /// Optional year column.
    pub year: String,
}

impl Default for DemographicColumns {
    fn default() -> Self {
        Self {
            geoid: "geoid".to_string(),
            population: "population".to_string(),
            housing_units: "housing_units".to_string(),
            year: "year".to_string(),
        }
    }
}

/// [`DemographicSource`] over one CSV file per geography level.
#[derive(Debug, Clone)]
pub struct CsvDemographicSource {
    /// Place-level CSV.
    pub place_path: PathBuf,
    /// County-level CSV.
    pub county_path: PathBuf,
    /// Column names shared by both files.
    pub columns: DemographicColumns,
}

impl DemographicSource for CsvDemographicSource {
    fn fetch(
        &self,
        level: GeographyLevel,
        state_fips: &str,
        year: u16,
    ) -> Result<DemographicTable, DemographicsError> {
        let path = match level {
            GeographyLevel::Place => &self.place_path,
            GeographyLevel::County => &self.county_path,
        };
        let file = open(path)?;
        let label = path.display().to_string();
        let table = read_demographics(file, &label, level, state_fips, year, &self.columns)?;
        log::info!("Loaded {} {level} estimates for {year} from {label}", table.len());
        Ok(table)
    }
}

/// Reads one level's estimates from any reader, keeping rows in
/// `state_fips` for `year`. `label` identifies the source in error
/// messages.
///
/// GEOIDs are zero-padded to the level's width. When a GEOID repeats, the
/// last row wins.
///
/// # Errors
///
/// Returns [`SourceError`] if a required column is missing or a GEOID,
/// count or year cell is malformed.
pub fn read_demographics<R: Read>(
    reader: R,
    label: &str,
    level: GeographyLevel,
    state_fips: &str,
    year: u16,
    columns: &DemographicColumns,
) -> Result<DemographicTable, SourceError> {
    let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = Headers::new(label, csv.headers()?);

    let geoid_idx = headers.require(&columns.geoid)?;
    let population_idx = headers.require(&columns.population)?;
    let units_idx = headers.require(&columns.housing_units)?;
    let year_idx = headers.find(&columns.year);

    let mut table = DemographicTable::new();

    for (i, record) in csv.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let cell = |idx: usize| record.get(idx).unwrap_or("");
        let invalid = |column: &str, value: &str, message: &str| SourceError::InvalidField {
            file: label.to_string(),
            row,
            column: column.to_string(),
            value: value.to_string(),
            message: message.to_string(),
        };

        if let Some(idx) = year_idx {
            let raw = cell(idx);
            let row_year = parse_year(raw).map_err(|m| invalid(&columns.year, raw, &m))?;
            if row_year != year {
                continue;
            }
        }

        let raw_geoid = cell(geoid_idx);
        let geoid = normalize_geoid(raw_geoid, level)
            .ok_or_else(|| invalid(&columns.geoid, raw_geoid, "not a GEOID"))?;
        if !geoid.starts_with(state_fips) {
            continue;
        }

        let raw_population = cell(population_idx);
        let population =
            parse_units(raw_population).map_err(|m| invalid(&columns.population, raw_population, &m))?;
        let raw_units = cell(units_idx);
        let existing_units =
            parse_units(raw_units).map_err(|m| invalid(&columns.housing_units, raw_units, &m))?;

        let counts = Demographics {
            population,
            existing_units,
        };
        match table.entry(geoid) {
            Entry::Occupied(mut entry) => {
                log::warn!("{label}: GEOID {} repeats at row {row}", entry.key());
                entry.insert(counts);
            }
            Entry::Vacant(entry) => {
                entry.insert(counts);
            }
        }
    }

    Ok(table)
}
