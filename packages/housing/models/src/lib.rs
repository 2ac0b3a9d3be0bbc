#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Housing allocation vocabulary shared across the RHNA progress workspace.
//!
//! Defines the income levels that allocation targets and permits are broken
//! down by, the nine Bay Area counties, permit structure categories, the
//! [`Ratio`] type used for every derived metric, and the
//! [`IntegrityViolation`] findings reported alongside pipeline output.

pub mod integrity;
pub mod ratio;

pub use integrity::{DemographicField, IntegrityViolation};
pub use ratio::{Ratio, Undefined};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Income level of the residents a housing unit is targeted at, relative to
/// area median income.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
pub enum IncomeLevel {
    /// Below 50% of area median income
    #[serde(rename = "vlow")]
    #[strum(serialize = "vlow")]
    VeryLow,
    /// 50-80% of area median income
    #[serde(rename = "low")]
    #[strum(serialize = "low")]
    Low,
    /// 80-120% of area median income
    #[serde(rename = "mod")]
    #[strum(serialize = "mod")]
    Moderate,
    /// Above 120% of area median income
    #[serde(rename = "amod")]
    #[strum(serialize = "amod")]
    AboveModerate,
}

impl IncomeLevel {
    /// Returns all four levels, most to least affordable.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::VeryLow, Self::Low, Self::Moderate, Self::AboveModerate]
    }

    /// Whether units at this level count as affordable housing
    /// (very-low, low and moderate).
    #[must_use]
    pub const fn is_affordable(self) -> bool {
        !matches!(self, Self::AboveModerate)
    }

    /// Human-readable label (e.g. "Very Low").
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::VeryLow => "Very Low",
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::AboveModerate => "Above Moderate",
        }
    }
}

/// A row level in the comparison table: one of the four income levels or
/// the synthetic per-jurisdiction total.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ReportLevel {
    #[serde(rename = "vlow")]
    #[strum(serialize = "vlow")]
    VeryLow,
    #[serde(rename = "low")]
    #[strum(serialize = "low")]
    Low,
    #[serde(rename = "mod")]
    #[strum(serialize = "mod")]
    Moderate,
    #[serde(rename = "amod")]
    #[strum(serialize = "amod")]
    AboveModerate,
    #[serde(rename = "total")]
    #[strum(serialize = "total")]
    Total,
}

impl ReportLevel {
    /// Returns the underlying income level, or `None` for [`Self::Total`].
    #[must_use]
    pub const fn income_level(self) -> Option<IncomeLevel> {
        match self {
            Self::VeryLow => Some(IncomeLevel::VeryLow),
            Self::Low => Some(IncomeLevel::Low),
            Self::Moderate => Some(IncomeLevel::Moderate),
            Self::AboveModerate => Some(IncomeLevel::AboveModerate),
            Self::Total => None,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self.income_level() {
            Some(level) => level.label(),
            None => "Total",
        }
    }
}

impl From<IncomeLevel> for ReportLevel {
    fn from(level: IncomeLevel) -> Self {
        match level {
            IncomeLevel::VeryLow => Self::VeryLow,
            IncomeLevel::Low => Self::Low,
            IncomeLevel::Moderate => Self::Moderate,
            IncomeLevel::AboveModerate => Self::AboveModerate,
        }
    }
}

/// One of the nine counties in the ABAG region.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum County {
    Alameda,
    #[serde(rename = "Contra Costa")]
    #[strum(serialize = "Contra Costa")]
    ContraCosta,
    Marin,
    Napa,
    #[serde(rename = "San Francisco")]
    #[strum(serialize = "San Francisco")]
    SanFrancisco,
    #[serde(rename = "San Mateo")]
    #[strum(serialize = "San Mateo")]
    SanMateo,
    #[serde(rename = "Santa Clara")]
    #[strum(serialize = "Santa Clara")]
    SantaClara,
    Solano,
    Sonoma,
}

/// California state FIPS code.
pub const CALIFORNIA_FIPS: &str = "06";

impl County {
    /// Returns all nine counties in alphabetical order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Alameda,
            Self::ContraCosta,
            Self::Marin,
            Self::Napa,
            Self::SanFrancisco,
            Self::SanMateo,
            Self::SantaClara,
            Self::Solano,
            Self::Sonoma,
        ]
    }

    /// Three-digit county FIPS code within California.
    #[must_use]
    pub const fn fips(self) -> &'static str {
        match self {
            Self::Alameda => "001",
            Self::ContraCosta => "013",
            Self::Marin => "041",
            Self::Napa => "055",
            Self::SanFrancisco => "075",
            Self::SanMateo => "081",
            Self::SantaClara => "085",
            Self::Solano => "095",
            Self::Sonoma => "097",
        }
    }

    /// Five-digit county GEOID (state + county FIPS, e.g. `"06001"`).
    #[must_use]
    pub fn geoid(self) -> String {
        format!("{CALIFORNIA_FIPS}{}", self.fips())
    }

    /// Parses a county FIPS code in any of the forms found in the permit
    /// data: `"1"`, `"001"`, or the full GEOID `"06001"`.
    #[must_use]
    pub fn from_fips(code: &str) -> Option<Self> {
        let code = code.trim();
        let county_part = if code.len() == 5 {
            code.strip_prefix(CALIFORNIA_FIPS)?
        } else {
            code
        };
        let numeric: u16 = county_part.parse().ok()?;
        Self::all()
            .iter()
            .copied()
            .find(|county| county.fips().parse::<u16>().ok() == Some(numeric))
    }

    /// Parses a county name, tolerating a trailing `" County"` suffix and
    /// any letter case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        let trimmed = trimmed
            .strip_suffix(" County")
            .or_else(|| trimmed.strip_suffix(" county"))
            .unwrap_or(trimmed);
        trimmed.parse().ok()
    }

    /// Name of this county's synthesized unincorporated jurisdiction
    /// (e.g. `"Alameda Unincorporated"`).
    #[must_use]
    pub fn unincorporated_name(self) -> String {
        format!("{self} {UNINCORPORATED_MARKER}")
    }
}

/// Literal jurisdiction value used by the source tables for county land
/// outside any city.
pub const UNINCORPORATED_MARKER: &str = "Unincorporated";

/// Structure type of permitted units.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PermitCategory {
    /// Detached single-family home
    SingleFamily,
    /// Accessory dwelling unit
    SecondUnit,
    /// Mobile or manufactured home
    MobileHome,
    /// Building with two to four units
    TwoToFour,
    /// Building with five or more units
    FivePlus,
    /// Anything the source does not classify
    Other,
}

impl PermitCategory {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::SingleFamily,
            Self::SecondUnit,
            Self::MobileHome,
            Self::TwoToFour,
            Self::FivePlus,
            Self::Other,
        ]
    }

    /// Maps a raw category string from the permit data to a category.
    ///
    /// Matching ignores case, spaces, hyphens and underscores. Unrecognized
    /// values map to [`Self::Other`].
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        let key: String = raw
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "sf" | "sfd" | "singlefamily" | "singlefamilydetached" => Self::SingleFamily,
            "su" | "adu" | "secondunit" | "accessorydwellingunit" => Self::SecondUnit,
            "mh" | "mobilehome" | "manufacturedhome" => Self::MobileHome,
            "2to4" | "24" | "2to4units" | "multifamily2to4" => Self::TwoToFour,
            "5+" | "5plus" | "5ormore" | "5+units" | "multifamily5+" => Self::FivePlus,
            _ => Self::Other,
        }
    }

    /// Human-readable label for charts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SingleFamily => "Single Family",
            Self::SecondUnit => "Second Unit",
            Self::MobileHome => "Mobile Home",
            Self::TwoToFour => "2 to 4 Units",
            Self::FivePlus => "5+ Units",
            Self::Other => "Other",
        }
    }
}
