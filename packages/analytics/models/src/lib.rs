#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types for the RHNA progress analytics.
//!
//! The central type is [`ComparisonRow`]: one jurisdiction at one income
//! level (or the per-jurisdiction total), with its scaled target, observed
//! permits and every derived ratio. Summaries, rankings and transit
//! shares are built from those rows.

use std::collections::BTreeMap;

use rhna_geography_models::JurisdictionKind;
use rhna_housing_models::{County, IncomeLevel, PermitCategory, Ratio, ReportLevel};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// First and last permit years observed, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationWindow {
    /// First observed year.
    #[serde(alias = "first_year")]
    pub first_year: u16,
    /// Last observed year.
    #[serde(alias = "last_year")]
    pub last_year: u16,
}

impl Default for ObservationWindow {
    fn default() -> Self {
        Self {
            first_year: 2015,
            last_year: 2017,
        }
    }
}

impl ObservationWindow {
    /// Number of years in the window, zero if the bounds are reversed.
    #[must_use]
    pub const fn years(self) -> u16 {
        if self.last_year < self.first_year {
            0
        } else {
            self.last_year - self.first_year + 1
        }
    }

    /// Whether `year` falls inside the window.
    #[must_use]
    pub const fn contains(self, year: u16) -> bool {
        year >= self.first_year && year <= self.last_year
    }
}

/// Observation window against the planning horizon it samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Horizon {
    /// Years of observed permits.
    pub window: ObservationWindow,
    /// Length of the allocation cycle in years.
    pub horizon_years: u16,
}

impl Default for Horizon {
    fn default() -> Self {
        Self {
            window: ObservationWindow::default(),
            horizon_years: 8,
        }
    }
}

impl Horizon {
    /// Factor applied to full-cycle targets: window length over horizon
    /// length. Zero when the horizon is empty.
    #[must_use]
    pub fn scale_factor(self) -> f64 {
        if self.horizon_years == 0 {
            return 0.0;
        }
        f64::from(self.window.years()) / f64::from(self.horizon_years)
    }
}

/// One jurisdiction at one income level with all derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    /// Jurisdiction name.
    pub jurisdiction: String,
    /// County.
    pub county: County,
    /// City or remainder; `None` when the jurisdiction has no geometry.
    pub kind: Option<JurisdictionKind>,
    /// Income level or total.
    pub income_level: ReportLevel,
    /// Full-cycle target units.
    pub target_units: u64,
    /// Target scaled to the observation window.
    pub target_units_scaled: f64,
    /// Units permitted inside the observation window.
    pub permitted_units: u64,
    /// Existing housing units, if known.
    pub existing_units: Option<u64>,
    /// Population, if known.
    pub population: Option<u64>,
    /// Permitted over scaled target.
    pub progress: Ratio,
    /// Scaled target over existing units.
    pub growth_rate: Ratio,
    /// Region-wide growth rate at this level.
    pub baseline_growth_rate: Ratio,
    /// Growth rate over the baseline.
    pub target_strength: Ratio,
    /// Permitted over existing units.
    pub actual_growth_rate: Ratio,
    /// Actual growth rate over the baseline.
    pub actual_growth_strength: Ratio,
}

impl ComparisonRow {
    /// Value of `metric` for this row.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn metric(&self, metric: Metric) -> Ratio {
        match metric {
            Metric::Progress => self.progress,
            Metric::GrowthRate => self.growth_rate,
            Metric::TargetStrength => self.target_strength,
            Metric::ActualGrowthRate => self.actual_growth_rate,
            Metric::ActualGrowthStrength => self.actual_growth_strength,
            Metric::TargetUnits => Ratio::Value(self.target_units_scaled),
            Metric::PermittedUnits => Ratio::Value(self.permitted_units as f64),
        }
    }
}

/// The full comparison table plus the region-wide baselines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonTable {
    /// Window and horizon the targets were scaled with.
    pub horizon: Horizon,
    /// Rows ordered by jurisdiction, then income level, total last.
    pub rows: Vec<ComparisonRow>,
    /// Region-wide baseline growth rate per level.
    pub baselines: BTreeMap<ReportLevel, Ratio>,
}

impl ComparisonTable {
    /// Rows at one level.
    pub fn level(&self, level: ReportLevel) -> impl Iterator<Item = &ComparisonRow> {
        self.rows.iter().filter(move |row| row.income_level == level)
    }

    /// The row for `jurisdiction` at `level`.
    #[must_use]
    pub fn row(&self, jurisdiction: &str, level: ReportLevel) -> Option<&ComparisonRow> {
        self.rows
            .iter()
            .find(|row| row.jurisdiction == jurisdiction && row.income_level == level)
    }

    /// Distinct jurisdiction names in row order.
    #[must_use]
    pub fn jurisdictions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for row in &self.rows {
            if names.last() != Some(&row.jurisdiction.as_str()) {
                names.push(&row.jurisdiction);
            }
        }
        names
    }
}

/// Rankable quantities on a [`ComparisonRow`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
    /// Permitted over scaled target.
    Progress,
    /// Scaled target over existing units.
    GrowthRate,
    /// Growth rate over the regional baseline.
    TargetStrength,
    /// Permitted over existing units.
    ActualGrowthRate,
    /// Actual growth rate over the regional baseline.
    ActualGrowthStrength,
    /// Scaled target units.
    TargetUnits,
    /// Permitted units.
    PermittedUnits,
}

/// What to do with rows tied with the N-th ranked row.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TiePolicy {
    /// Exactly N rows; ties at the cutoff go to the earlier row.
    #[default]
    Strict,
    /// Every row tied with the N-th row is included.
    IncludeTies,
}

/// A top-N query over comparison rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankQuery {
    /// Metric to rank by, largest first.
    pub metric: Metric,
    /// Only rows at this level.
    pub level: Option<ReportLevel>,
    /// Number of rows.
    pub n: usize,
    /// Only rows whose value is at least this.
    pub threshold: Option<f64>,
    /// Tie handling at the cutoff.
    pub ties: TiePolicy,
}

/// A ranked row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedRow {
    /// One-based rank; tied rows share a rank.
    pub rank: usize,
    /// Metric value.
    pub value: f64,
    /// The row itself.
    pub row: ComparisonRow,
}

/// Ratio-of-sums totals over a group of rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Number of jurisdictions in the group.
    pub jurisdictions: usize,
    /// Sum of full-cycle targets.
    pub target_units: u64,
    /// Sum of scaled targets.
    pub target_units_scaled: f64,
    /// Sum of permitted units.
    pub permitted_units: u64,
    /// Sum of existing units over jurisdictions that have them.
    pub existing_units: u64,
    /// Sum of population over jurisdictions that have it.
    pub population: u64,
    /// Summed permits over summed scaled targets.
    pub progress: Ratio,
    /// Summed scaled targets over summed existing units, counting only
    /// jurisdictions with demographics.
    pub growth_rate: Ratio,
    /// Summed permits over summed existing units, same restriction.
    pub actual_growth_rate: Ratio,
}

/// Summary for one county at one level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountySummary {
    /// County.
    pub county: County,
    /// Level summarized.
    pub income_level: ReportLevel,
    /// Totals.
    #[serde(flatten)]
    pub summary: Summary,
}

/// Region-wide summary for one level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSummary {
    /// Level summarized.
    pub income_level: ReportLevel,
    /// Totals.
    #[serde(flatten)]
    pub summary: Summary,
}

/// Share of a jurisdiction's affordable permits inside transit priority
/// areas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TpaShare {
    /// Jurisdiction name.
    pub jurisdiction: String,
    /// County.
    pub county: County,
    /// Affordable units permitted.
    pub affordable_units: u64,
    /// Affordable units permitted inside a TPA.
    pub tpa_affordable_units: u64,
    /// `tpa_affordable_units / affordable_units`, zero when nothing
    /// affordable was permitted.
    pub share: f64,
}

impl TpaShare {
    /// A row with no permitted units.
    #[must_use]
    pub fn empty(jurisdiction: &str, county: County) -> Self {
        Self {
            jurisdiction: jurisdiction.to_string(),
            county,
            affordable_units: 0,
            tpa_affordable_units: 0,
            share: 0.0,
        }
    }
}

/// Permitted units for one structure type at one income level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionCell {
    /// Structure type.
    pub category: PermitCategory,
    /// Income level.
    pub income_level: IncomeLevel,
    /// Units permitted.
    pub units: u64,
}

/// Permitted units for one structure type across all levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    /// Structure type.
    pub category: PermitCategory,
    /// Units permitted.
    pub units: u64,
}
