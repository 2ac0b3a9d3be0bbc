//! Census GEOID utilities.
//!
//! Place GEOIDs are seven digits (state + place), county GEOIDs five
//! digits (state + county). Spreadsheet round-trips routinely strip the
//! leading zero from California codes, so lookups go through
//! [`normalize_geoid`] first.

use crate::GeographyLevel;

/// Number of digits in a GEOID at the given level.
#[must_use]
pub const fn geoid_width(level: GeographyLevel) -> usize {
    match level {
        GeographyLevel::Place => 7,
        GeographyLevel::County => 5,
    }
}

/// Left-pads a numeric GEOID with zeros to the width of its level.
///
/// Returns `None` if the value is empty, non-numeric, or longer than the
/// level allows.
#[must_use]
pub fn normalize_geoid(raw: &str, level: GeographyLevel) -> Option<String> {
    let raw = raw.trim();
    let width = geoid_width(level);
    if raw.is_empty() || raw.len() > width || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{raw:0>width$}"))
}

/// Derives the two-digit state FIPS code from any GEOID.
#[must_use]
pub fn state_fips(geoid: &str) -> Option<&str> {
    geoid.get(..2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_stripped_leading_zero() {
        assert_eq!(
            normalize_geoid("653000", GeographyLevel::Place).as_deref(),
            Some("0653000")
        );
        assert_eq!(
            normalize_geoid("6001", GeographyLevel::County).as_deref(),
            Some("06001")
        );
        assert_eq!(
            normalize_geoid("06001", GeographyLevel::County).as_deref(),
            Some("06001")
        );
    }

    #[test]
    fn rejects_malformed_geoids() {
        assert_eq!(normalize_geoid("", GeographyLevel::Place), None);
        assert_eq!(normalize_geoid("06A01", GeographyLevel::County), None);
        assert_eq!(normalize_geoid("0600100", GeographyLevel::County), None);
    }

    #[test]
    fn derives_state() {
        assert_eq!(state_fips("0653000"), Some("06"));
        assert_eq!(state_fips("0"), None);
    }
}
