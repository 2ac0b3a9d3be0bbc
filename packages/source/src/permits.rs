//! Permit activity loader.
//!
//! The permit table has one row per permitted project (or per jurisdiction
//! and year, depending on the extract), with unit counts spread across
//! income-level columns. Each row expands to one [`PermitRecord`] per
//! income level so downstream joins work on a long-form table.

use std::io::Read;
use std::path::Path;

use rhna_housing_models::{County, IncomeLevel, PermitCategory};
use rhna_source_models::{NameAliases, PermitColumns, PermitRecord};

use crate::parsing::{canonical_jurisdiction, parse_flag, parse_optional_units, parse_year};
use crate::{Headers, SourceError, open};

/// Loads the permit CSV at `path`.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be read, a required column is
/// missing, or a year, county FIPS, unit count or TPA flag is malformed.
pub fn load_permits(
    path: &Path,
    columns: &PermitColumns,
    aliases: &NameAliases,
) -> Result<Vec<PermitRecord>, SourceError> {
    let file = open(path)?;
    let label = path.display().to_string();
    let permits = read_permits(file, &label, columns, aliases)?;
    log::info!("Loaded {} permit records from {label}", permits.len());
    Ok(permits)
}

/// Reads permit records from any reader. `label` identifies the source in
/// error messages.
///
/// Blank unit cells mean no activity at that level. Unrecognized structure
/// categories map to [`PermitCategory::Other`].
///
/// # Errors
///
/// See [`load_permits`].
pub fn read_permits<R: Read>(
    reader: R,
    label: &str,
    columns: &PermitColumns,
    aliases: &NameAliases,
) -> Result<Vec<PermitRecord>, SourceError> {
    let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = Headers::new(label, csv.headers()?);

    let jurisdiction_idx = headers.require(&columns.jurisdiction)?;
    let county_idx = headers.require(&columns.county_fips)?;
    let year_idx = headers.require(&columns.year)?;
    let category_idx = headers.require(&columns.category)?;
    let tpa_idx = headers.require(&columns.tpa)?;

    let mut level_idx: Vec<(IncomeLevel, Vec<(&str, usize)>)> = Vec::new();
    for &level in IncomeLevel::all() {
        let mut idx = Vec::new();
        for column in columns.level(level) {
            idx.push((column.as_str(), headers.require(column)?));
        }
        level_idx.push((level, idx));
    }

    let mut permits = Vec::new();

    for (i, record) in csv.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let cell = |idx: usize| record.get(idx).unwrap_or("");
        let invalid = |column: &str, value: &str, message: String| SourceError::InvalidField {
            file: label.to_string(),
            row,
            column: column.to_string(),
            value: value.to_string(),
            message,
        };

        let raw_county = cell(county_idx);
        let county = County::from_fips(raw_county).ok_or_else(|| {
            invalid(
                &columns.county_fips,
                raw_county,
                "not a Bay Area county FIPS code".to_string(),
            )
        })?;

        let raw_year = cell(year_idx);
        let year = parse_year(raw_year).map_err(|m| invalid(&columns.year, raw_year, m))?;

        let raw_tpa = cell(tpa_idx);
        let is_transit_priority_area =
            parse_flag(raw_tpa).map_err(|m| invalid(&columns.tpa, raw_tpa, m))?;

        let category = PermitCategory::from_raw(cell(category_idx));
        let jurisdiction = canonical_jurisdiction(cell(jurisdiction_idx), county, aliases);

        for (level, idx) in &level_idx {
            let mut units = 0u64;
            for &(column, col_idx) in idx {
                let raw = cell(col_idx);
                units += parse_optional_units(raw).map_err(|m| invalid(column, raw, m))?;
            }

            permits.push(PermitRecord {
                jurisdiction: jurisdiction.clone(),
                county,
                year,
                income_level: *level,
                units,
                category,
                is_transit_priority_area,
            });
        }
    }

    Ok(permits)
}
