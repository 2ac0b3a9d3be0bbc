//! Grouped ratio-of-sums summaries over comparison rows.

use std::collections::{BTreeMap, BTreeSet};

use rhna_analytics_models::{ComparisonRow, CountySummary, LevelSummary, Summary};
use rhna_housing_models::{County, Ratio, ReportLevel};

/// Sums `rows` and derives ratios from the sums.
///
/// Existing units and population only count for rows that have them, and
/// the growth ratios use only those rows' targets and permits, so a
/// jurisdiction without demographics cannot inflate the rate.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize<'a>(rows: impl IntoIterator<Item = &'a ComparisonRow>) -> Summary {
    let mut names = BTreeSet::new();
    let mut target_units = 0;
    let mut target_units_scaled = 0.0;
    let mut permitted_units = 0;
    let mut existing_units = 0;
    let mut population = 0;
    let mut counted_scaled = 0.0;
    let mut counted_permitted = 0;
    let mut any_counted = false;

    for row in rows {
        names.insert(row.jurisdiction.as_str());
        target_units += row.target_units;
        target_units_scaled += row.target_units_scaled;
        permitted_units += row.permitted_units;

        if let Some(existing) = row.existing_units {
            any_counted = true;
            existing_units += existing;
            counted_scaled += row.target_units_scaled;
            counted_permitted += row.permitted_units;
        }
        population += row.population.unwrap_or(0);
    }

    let (growth_rate, actual_growth_rate) = if any_counted {
        (
            Ratio::of(counted_scaled, existing_units as f64),
            Ratio::of(counted_permitted as f64, existing_units as f64),
        )
    } else {
        let missing = Ratio::of_optional(None, None);
        (missing, missing)
    };

    Summary {
        jurisdictions: names.len(),
        target_units,
        target_units_scaled,
        permitted_units,
        existing_units,
        population,
        progress: Ratio::of(permitted_units as f64, target_units_scaled),
        growth_rate,
        actual_growth_rate,
    }
}

/// One summary per (county, level) present in `rows`.
#[must_use]
pub fn summarize_by_county(rows: &[ComparisonRow]) -> Vec<CountySummary> {
    let mut groups: BTreeMap<(County, ReportLevel), Vec<&ComparisonRow>> = BTreeMap::new();
    for row in rows {
        groups
            .entry((row.county, row.income_level))
            .or_default()
            .push(row);
    }

    groups
        .into_iter()
        .map(|((county, income_level), group)| CountySummary {
            county,
            income_level,
            summary: summarize(group),
        })
        .collect()
}

/// One region-wide summary per level present in `rows`.
#[must_use]
pub fn summarize_by_income_level(rows: &[ComparisonRow]) -> Vec<LevelSummary> {
    let mut groups: BTreeMap<ReportLevel, Vec<&ComparisonRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.income_level).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(income_level, group)| LevelSummary {
            income_level,
            summary: summarize(group),
        })
        .collect()
}

/// Region-wide summary of the per-jurisdiction total rows.
#[must_use]
pub fn summarize_region(rows: &[ComparisonRow]) -> Summary {
    summarize(rows.iter().filter(|row| row.income_level == ReportLevel::Total))
}
