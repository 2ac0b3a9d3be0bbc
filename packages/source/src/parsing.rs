//! Shared cell parsing for the tabular sources.
//!
//! Parsers return a short description of the problem on failure; the
//! loaders wrap it in [`crate::SourceError::InvalidField`] with the row and
//! column attached.

use rhna_housing_models::{County, UNINCORPORATED_MARKER};
use rhna_source_models::NameAliases;

/// Parses a non-negative unit count. Thousands separators (`"1,234"`) are
/// accepted.
///
/// # Errors
///
/// Returns a message if the cell is blank, negative, or not an integer.
pub fn parse_units(raw: &str) -> Result<u64, String> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Err("blank value".to_string());
    }
    if cleaned.starts_with('-') {
        return Err("negative unit count".to_string());
    }
    cleaned
        .parse::<u64>()
        .map_err(|_| "not a non-negative integer".to_string())
}

/// Like [`parse_units`], but a blank cell means zero units.
///
/// # Errors
///
/// Returns a message if a non-blank cell is negative or not an integer.
pub fn parse_optional_units(raw: &str) -> Result<u64, String> {
    if raw.trim().is_empty() {
        Ok(0)
    } else {
        parse_units(raw)
    }
}

/// Parses a four-digit permit year.
///
/// # Errors
///
/// Returns a message if the cell is not a plausible year.
pub fn parse_year(raw: &str) -> Result<u16, String> {
    let year: u16 = raw
        .trim()
        .parse()
        .map_err(|_| "not a year".to_string())?;
    if (1900..=2100).contains(&year) {
        Ok(year)
    } else {
        Err("year out of range".to_string())
    }
}

/// Parses a yes/no flag. Blank means `false`.
///
/// # Errors
///
/// Returns a message for anything other than the accepted spellings.
pub fn parse_flag(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "1" | "true" | "t" => Ok(true),
        "" | "n" | "no" | "0" | "false" | "f" => Ok(false),
        _ => Err("not a yes/no flag".to_string()),
    }
}

/// Canonical jurisdiction name for a raw cell.
///
/// The literal `"Unincorporated"` marker becomes `"<County> Unincorporated"`,
/// then configured aliases apply.
#[must_use]
pub fn canonical_jurisdiction(raw: &str, county: County, aliases: &NameAliases) -> String {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case(UNINCORPORATED_MARKER) {
        let name = county.unincorporated_name();
        aliases.canonical(&name).to_string()
    } else {
        aliases.canonical(trimmed).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unit_counts() {
        assert_eq!(parse_units("42"), Ok(42));
        assert_eq!(parse_units(" 1,234 "), Ok(1234));
        assert!(parse_units("").is_err());
        assert!(parse_units("-3").is_err());
        assert!(parse_units("12.5").is_err());
        assert!(parse_units("n/a").is_err());
    }

    #[test]
    fn blank_optional_units_are_zero() {
        assert_eq!(parse_optional_units(""), Ok(0));
        assert_eq!(parse_optional_units("  "), Ok(0));
        assert_eq!(parse_optional_units("7"), Ok(7));
        assert!(parse_optional_units("seven").is_err());
    }

    #[test]
    fn parses_years() {
        assert_eq!(parse_year("2016"), Ok(2016));
        assert!(parse_year("16x").is_err());
        assert!(parse_year("3016").is_err());
    }

    #[test]
    fn parses_flags() {
        assert_eq!(parse_flag("Y"), Ok(true));
        assert_eq!(parse_flag("true"), Ok(true));
        assert_eq!(parse_flag(""), Ok(false));
        assert_eq!(parse_flag("No"), Ok(false));
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn rewrites_unincorporated_marker() {
        let aliases = NameAliases::default();
        assert_eq!(
            canonical_jurisdiction("Unincorporated", County::Sonoma, &aliases),
            "Sonoma Unincorporated"
        );
        assert_eq!(
            canonical_jurisdiction("UNINCORPORATED", County::SanMateo, &aliases),
            "San Mateo Unincorporated"
        );
        assert_eq!(
            canonical_jurisdiction(" Petaluma ", County::Sonoma, &aliases),
            "Petaluma"
        );
    }

    #[test]
    fn applies_aliases() {
        let aliases = NameAliases::new([("St. Helena".to_string(), "Saint Helena".to_string())]);
        assert_eq!(
            canonical_jurisdiction("St. Helena", County::Napa, &aliases),
            "Saint Helena"
        );
    }
}
