//! Breakdowns computed straight from permit records: transit priority
//! area shares and structure-type composition.

use std::collections::BTreeMap;

use rhna_analytics_models::{CategoryTotal, CompositionCell, ObservationWindow, TpaShare};
use rhna_housing_models::{County, IncomeLevel, PermitCategory};
use rhna_source_models::PermitRecord;

/// Per-jurisdiction share of affordable (very-low, low and moderate)
/// permitted units that lie inside a transit priority area, over permits in
/// `window`. Sorted by jurisdiction.
///
/// Every `(name, county)` in `jurisdictions` appears, as does every other
/// jurisdiction with a permit in the window. One with no affordable units
/// has a share of zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn tpa_shares<'a>(
    permits: &'a [PermitRecord],
    window: ObservationWindow,
    jurisdictions: impl IntoIterator<Item = (&'a str, County)>,
) -> Vec<TpaShare> {
    let mut shares: BTreeMap<&str, TpaShare> = jurisdictions
        .into_iter()
        .map(|(name, county)| (name, TpaShare::empty(name, county)))
        .collect();

    for permit in permits.iter().filter(|p| window.contains(p.year)) {
        let share = shares
            .entry(&permit.jurisdiction)
            .or_insert_with(|| TpaShare::empty(&permit.jurisdiction, permit.county));

        if permit.income_level.is_affordable() {
            share.affordable_units += permit.units;
            if permit.is_transit_priority_area {
                share.tpa_affordable_units += permit.units;
            }
        }
    }

    shares
        .into_values()
        .map(|mut share| {
            if share.affordable_units > 0 {
                share.share = share.tpa_affordable_units as f64 / share.affordable_units as f64;
            }
            share
        })
        .collect()
}

/// Region-wide TPA share: summed TPA affordable units over summed
/// affordable units. Zero when nothing affordable was permitted.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn tpa_region_share(shares: &[TpaShare]) -> f64 {
    let affordable: u64 = shares.iter().map(|s| s.affordable_units).sum();
    let in_tpa: u64 = shares.iter().map(|s| s.tpa_affordable_units).sum();
    if affordable == 0 {
        0.0
    } else {
        in_tpa as f64 / affordable as f64
    }
}

/// Units permitted in `window` per (category, income level), omitting
/// empty cells. Ordered by category, then income level.
#[must_use]
pub fn permit_composition(permits: &[PermitRecord], window: ObservationWindow) -> Vec<CompositionCell> {
    let mut cells: BTreeMap<(PermitCategory, IncomeLevel), u64> = BTreeMap::new();

    for permit in permits.iter().filter(|p| window.contains(p.year)) {
        *cells
            .entry((permit.category, permit.income_level))
            .or_insert(0) += permit.units;
    }

    cells
        .into_iter()
        .filter(|(_, units)| *units > 0)
        .map(|((category, income_level), units)| CompositionCell {
            category,
            income_level,
            units,
        })
        .collect()
}

/// Units permitted in `window` per category, across all income levels.
/// Every category is listed, including those with no units.
#[must_use]
pub fn category_totals(permits: &[PermitRecord], window: ObservationWindow) -> Vec<CategoryTotal> {
    PermitCategory::all()
        .iter()
        .map(|&category| CategoryTotal {
            category,
            units: permits
                .iter()
                .filter(|p| p.category == category && window.contains(p.year))
                .map(|p| p.units)
                .sum(),
        })
        .collect()
}
