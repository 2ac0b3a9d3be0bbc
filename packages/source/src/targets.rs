//! Allocation-target table loader.
//!
//! One CSV row per jurisdiction: county, jurisdiction name, the four
//! income-level targets and the published total.

use std::io::Read;
use std::path::Path;

use rhna_housing_models::{County, IncomeLevel};
use rhna_source_models::{JurisdictionTargets, LevelUnits, NameAliases, TargetColumns};

use crate::parsing::{canonical_jurisdiction, parse_units};
use crate::{Headers, SourceError, open};

/// Loads the allocation-target CSV at `path`.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be read, a required column is
/// missing, a county is not one of the nine Bay Area counties, or a target
/// cell is not a non-negative integer.
pub fn load_targets(
    path: &Path,
    columns: &TargetColumns,
    aliases: &NameAliases,
) -> Result<Vec<JurisdictionTargets>, SourceError> {
    let file = open(path)?;
    let label = path.display().to_string();
    let targets = read_targets(file, &label, columns, aliases)?;
    log::info!("Loaded {} jurisdiction targets from {label}", targets.len());
    Ok(targets)
}

/// Reads allocation targets from any reader. `label` identifies the source
/// in error messages.
///
/// Rows with a blank jurisdiction cell (spacer or footnote rows) are
/// skipped.
///
/// # Errors
///
/// See [`load_targets`].
pub fn read_targets<R: Read>(
    reader: R,
    label: &str,
    columns: &TargetColumns,
    aliases: &NameAliases,
) -> Result<Vec<JurisdictionTargets>, SourceError> {
    let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = Headers::new(label, csv.headers()?);

    let county_idx = headers.require(&columns.county)?;
    let jurisdiction_idx = headers.require(&columns.jurisdiction)?;
    let total_idx = headers.require(&columns.total)?;
    let mut level_idx = Vec::with_capacity(IncomeLevel::all().len());
    for &level in IncomeLevel::all() {
        let column = columns.level(level);
        level_idx.push((level, column, headers.require(column)?));
    }

    let mut targets = Vec::new();

    for (i, record) in csv.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        let raw_jurisdiction = cell(jurisdiction_idx);
        if raw_jurisdiction.trim().is_empty() {
            log::debug!("{label} row {row}: blank jurisdiction, skipping");
            continue;
        }

        let invalid = |column: &str, value: &str, message: String| SourceError::InvalidField {
            file: label.to_string(),
            row,
            column: column.to_string(),
            value: value.to_string(),
            message,
        };

        let raw_county = cell(county_idx);
        let county = County::from_name(raw_county).ok_or_else(|| {
            invalid(
                &columns.county,
                raw_county,
                "not a Bay Area county".to_string(),
            )
        })?;

        let mut units = LevelUnits::default();
        for &(level, column, idx) in &level_idx {
            let raw = cell(idx);
            *units.get_mut(level) = parse_units(raw).map_err(|m| invalid(column, raw, m))?;
        }

        let raw_total = cell(total_idx);
        let reported_total =
            parse_units(raw_total).map_err(|m| invalid(&columns.total, raw_total, m))?;

        targets.push(JurisdictionTargets {
            jurisdiction: canonical_jurisdiction(raw_jurisdiction, county, aliases),
            county,
            units,
            reported_total,
        });
    }

    Ok(targets)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const CSV: &str = "\
County,Jurisdiction,Very Low,Low,Moderate,Above Moderate,Total
Alameda,Oakland,\"1,900\",\"2,075\",\"2,815\",\"7,816\",\"14,606\"
Alameda,Unincorporated,430,227,295,817,1769
,,,,,,
Napa County,St. Helena,8,5,5,13,31
";

    fn read(csv: &str, aliases: &NameAliases) -> Result<Vec<JurisdictionTargets>, SourceError> {
        read_targets(
            Cursor::new(csv.to_string()),
            "targets.csv",
            &TargetColumns::default(),
            aliases,
        )
    }

    #[test]
    fn loads_and_normalizes_rows() {
        let aliases = NameAliases::new([("St. Helena".to_string(), "Saint Helena".to_string())]);
        let targets = read(CSV, &aliases).unwrap();

        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0].jurisdiction, "Oakland");
        assert_eq!(targets[0].units.very_low, 1900);
        assert_eq!(targets[0].reported_total, 14_606);
        assert_eq!(targets[1].jurisdiction, "Alameda Unincorporated");
        assert_eq!(targets[2].county, County::Napa);
        assert_eq!(targets[2].jurisdiction, "Saint Helena");
    }

    #[test]
    fn malformed_number_is_fatal() {
        let csv = "\
County,Jurisdiction,Very Low,Low,Moderate,Above Moderate,Total
Marin,Novato,abc,1,1,1,3
";
        let err = read(csv, &NameAliases::default()).unwrap_err();
        match err {
            SourceError::InvalidField {
                row, column, value, ..
            } => {
                assert_eq!(row, 1);
                assert_eq!(column, "Very Low");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_county_is_fatal() {
        let csv = "\
County,Jurisdiction,Very Low,Low,Moderate,Above Moderate,Total
Fresno,Clovis,1,1,1,1,4
";
        assert!(matches!(
            read(csv, &NameAliases::default()),
            Err(SourceError::InvalidField { .. })
        ));
    }

    #[test]
    fn missing_column_is_fatal() {
        let csv = "County,Jurisdiction,Very Low\nMarin,Novato,1\n";
        assert!(matches!(
            read(csv, &NameAliases::default()),
            Err(SourceError::MissingColumn { .. })
        ));
    }
}
