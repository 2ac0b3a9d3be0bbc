//! Comparison table construction.

use std::collections::{BTreeMap, BTreeSet};

use rhna_analytics_models::{ComparisonRow, ComparisonTable, Horizon};
use rhna_geography_models::{Demographics, Jurisdiction, JurisdictionKind};
use rhna_housing_models::{County, IncomeLevel, IntegrityViolation, Ratio, ReportLevel};
use rhna_source_models::{JurisdictionTargets, LevelUnits, PermitRecord};

/// Output of [`build_comparison`].
#[derive(Debug, Clone, Default)]
pub struct ComparisonBuild {
    /// The comparison table.
    pub table: ComparisonTable,
    /// Target rows whose published total disagreed with their levels.
    pub violations: Vec<IntegrityViolation>,
    /// Permit jurisdiction names matching no target or resolved
    /// jurisdiction, sorted.
    pub unmatched_permit_jurisdictions: Vec<String>,
}

/// Everything known about one jurisdiction before rows are derived.
struct Subject {
    county: County,
    kind: Option<JurisdictionKind>,
    targets: LevelUnits,
    demographics: Option<Demographics>,
}

/// Builds the comparison table.
///
/// The jurisdiction set is every target row plus every resolved
/// jurisdiction, keyed by name. Target rows whose reported total disagrees
/// with their income levels are reported and left out entirely. Permits
/// outside `horizon.window` are ignored; a jurisdiction with no permits at
/// a level gets zero, not a missing row.
///
/// `level_order` sets the row order within a jurisdiction; levels it omits
/// follow in their natural order, and the total row is always last.
#[must_use]
pub fn build_comparison(
    targets: &[JurisdictionTargets],
    permits: &[PermitRecord],
    jurisdictions: &[Jurisdiction],
    horizon: Horizon,
    level_order: &[IncomeLevel],
) -> ComparisonBuild {
    let mut build = ComparisonBuild::default();
    let mut subjects: BTreeMap<String, Subject> = BTreeMap::new();
    let mut rejected: BTreeSet<&str> = BTreeSet::new();

    for target in targets {
        if let Some((reported, computed)) = target.total_mismatch() {
            let violation = IntegrityViolation::TargetTotalMismatch {
                jurisdiction: target.jurisdiction.clone(),
                county: target.county,
                reported,
                computed,
            };
            log::warn!("Integrity violation: {violation}");
            build.violations.push(violation);
            rejected.insert(&target.jurisdiction);
            continue;
        }

        if subjects.contains_key(&target.jurisdiction) {
            log::warn!("Duplicate target row for {}, keeping the last", target.jurisdiction);
        }
        subjects.insert(
            target.jurisdiction.clone(),
            Subject {
                county: target.county,
                kind: None,
                targets: target.units,
                demographics: None,
            },
        );
    }

    for jurisdiction in jurisdictions {
        if rejected.contains(jurisdiction.name.as_str()) {
            continue;
        }
        let subject = subjects
            .entry(jurisdiction.name.clone())
            .or_insert_with(|| Subject {
                county: jurisdiction.county,
                kind: None,
                targets: LevelUnits::default(),
                demographics: None,
            });
        subject.kind = Some(jurisdiction.kind);
        subject.demographics = jurisdiction.demographics;
    }

    let permitted = sum_permits(permits, horizon, &subjects, &rejected, &mut build);
    let factor = horizon.scale_factor();
    let order = full_order(level_order);
    let baselines = baselines(&subjects, factor);

    let mut rows = Vec::with_capacity(subjects.len() * (order.len() + 1));
    for (name, subject) in &subjects {
        let mut total_target = 0;
        let mut total_permitted = 0;

        for &level in &order {
            let target = subject.targets.get(level);
            let units = permitted.get(&(name.as_str(), level)).copied().unwrap_or(0);
            total_target += target;
            total_permitted += units;
            rows.push(derive_row(
                name,
                subject,
                level.into(),
                target,
                units,
                factor,
                baselines[&ReportLevel::from(level)],
            ));
        }

        rows.push(derive_row(
            name,
            subject,
            ReportLevel::Total,
            total_target,
            total_permitted,
            factor,
            baselines[&ReportLevel::Total],
        ));
    }

    log::info!(
        "Built comparison table: {} jurisdictions, {} rows, scale factor {factor}",
        subjects.len(),
        rows.len()
    );

    build.table = ComparisonTable {
        horizon,
        rows,
        baselines,
    };
    build
}

/// Windowed permit sums keyed by (jurisdiction, level). Records names that
/// match no subject into `build`.
fn sum_permits<'a>(
    permits: &'a [PermitRecord],
    horizon: Horizon,
    subjects: &BTreeMap<String, Subject>,
    rejected: &BTreeSet<&str>,
    build: &mut ComparisonBuild,
) -> BTreeMap<(&'a str, IncomeLevel), u64> {
    let mut sums: BTreeMap<(&str, IncomeLevel), u64> = BTreeMap::new();
    let mut unmatched: BTreeSet<&str> = BTreeSet::new();
    let mut outside_window = 0usize;

    for permit in permits {
        let name = permit.jurisdiction.as_str();
        if !subjects.contains_key(name) {
            if !rejected.contains(name) {
                unmatched.insert(name);
            }
            continue;
        }
        if !horizon.window.contains(permit.year) {
            outside_window += 1;
            log::debug!("Ignoring {name} permit from {}", permit.year);
            continue;
        }
        *sums.entry((name, permit.income_level)).or_insert(0) += permit.units;
    }

    if outside_window > 0 {
        log::info!("{outside_window} permit records fell outside the observation window");
    }
    for name in &unmatched {
        log::warn!("Permits for {name} match no jurisdiction");
    }

    build.unmatched_permit_jurisdictions = unmatched.into_iter().map(str::to_string).collect();
    sums
}

/// Region-wide target growth rate per level: summed scaled targets over
/// summed existing units, over jurisdictions with demographics.
#[allow(clippy::cast_precision_loss)]
fn baselines(subjects: &BTreeMap<String, Subject>, factor: f64) -> BTreeMap<ReportLevel, Ratio> {
    let with_counts: Vec<(&LevelUnits, u64)> = subjects
        .values()
        .filter_map(|s| s.demographics.map(|d| (&s.targets, d.existing_units)))
        .collect();

    let mut baselines = BTreeMap::new();
    if with_counts.is_empty() {
        let missing = Ratio::of_optional(None, None);
        for &level in IncomeLevel::all() {
            baselines.insert(level.into(), missing);
        }
        baselines.insert(ReportLevel::Total, missing);
        return baselines;
    }

    let existing: u64 = with_counts.iter().map(|(_, units)| units).sum();
    for &level in IncomeLevel::all() {
        let target: u64 = with_counts.iter().map(|(t, _)| t.get(level)).sum();
        baselines.insert(
            level.into(),
            Ratio::of(target as f64 * factor, existing as f64),
        );
    }
    let total: u64 = with_counts.iter().map(|(t, _)| t.total()).sum();
    baselines.insert(
        ReportLevel::Total,
        Ratio::of(total as f64 * factor, existing as f64),
    );
    baselines
}

#[allow(clippy::cast_precision_loss)]
fn derive_row(
    name: &str,
    subject: &Subject,
    level: ReportLevel,
    target_units: u64,
    permitted_units: u64,
    factor: f64,
    baseline_growth_rate: Ratio,
) -> ComparisonRow {
    let target_units_scaled = target_units as f64 * factor;
    let existing_units = subject.demographics.map(|d| d.existing_units);
    let existing = existing_units.map(|u| u as f64);

    let growth_rate = Ratio::of_optional(Some(target_units_scaled), existing);
    let actual_growth_rate = Ratio::of_optional(Some(permitted_units as f64), existing);

    ComparisonRow {
        jurisdiction: name.to_string(),
        county: subject.county,
        kind: subject.kind,
        income_level: level,
        target_units,
        target_units_scaled,
        permitted_units,
        existing_units,
        population: subject.demographics.map(|d| d.population),
        progress: Ratio::of(permitted_units as f64, target_units_scaled),
        growth_rate,
        baseline_growth_rate,
        target_strength: growth_rate.divide(baseline_growth_rate),
        actual_growth_rate,
        actual_growth_strength: actual_growth_rate.divide(baseline_growth_rate),
    }
}

/// `order` deduplicated, followed by any level it left out.
fn full_order(order: &[IncomeLevel]) -> Vec<IncomeLevel> {
    let mut full: Vec<IncomeLevel> = Vec::with_capacity(IncomeLevel::all().len());
    for level in order.iter().chain(IncomeLevel::all()) {
        if !full.contains(level) {
            full.push(*level);
        }
    }
    full
}

#[cfg(test)]
pub(crate) mod tests {
    use geo::MultiPolygon;
    use rhna_housing_models::{PermitCategory, Undefined};

    use super::*;

    pub fn target(name: &str, county: County, levels: [u64; 4]) -> JurisdictionTargets {
        let units = LevelUnits {
            very_low: levels[0],
            low: levels[1],
            moderate: levels[2],
            above_moderate: levels[3],
        };
        JurisdictionTargets {
            jurisdiction: name.to_string(),
            county,
            units,
            reported_total: units.total(),
        }
    }

    pub fn permit(name: &str, year: u16, level: IncomeLevel, units: u64) -> PermitRecord {
        PermitRecord {
            jurisdiction: name.to_string(),
            county: County::Alameda,
            year,
            income_level: level,
            units,
            category: PermitCategory::FivePlus,
            is_transit_priority_area: false,
        }
    }

    pub fn resolved(name: &str, county: County, existing_units: Option<u64>) -> Jurisdiction {
        Jurisdiction {
            name: name.to_string(),
            county,
            kind: JurisdictionKind::Incorporated,
            geoid: String::new(),
            geometry: MultiPolygon::new(vec![]),
            demographics: existing_units.map(|existing_units| Demographics {
                population: existing_units * 2,
                existing_units,
            }),
        }
    }

    pub fn build(
        targets: &[JurisdictionTargets],
        permits: &[PermitRecord],
        jurisdictions: &[Jurisdiction],
    ) -> ComparisonBuild {
        build_comparison(
            targets,
            permits,
            jurisdictions,
            Horizon::default(),
            IncomeLevel::all(),
        )
    }

    fn close(ratio: Ratio, expected: f64) -> bool {
        ratio.value().is_some_and(|v| (v - expected).abs() < 1e-9)
    }

    #[test]
    fn scales_targets_and_measures_progress() {
        let result = build(
            &[target("Foo", County::Alameda, [100, 0, 0, 0])],
            &[
                permit("Foo", 2015, IncomeLevel::VeryLow, 15),
                permit("Foo", 2017, IncomeLevel::VeryLow, 25),
                permit("Foo", 2018, IncomeLevel::VeryLow, 500),
            ],
            &[],
        );
        let row = result.table.row("Foo", ReportLevel::VeryLow).unwrap();
        assert!((row.target_units_scaled - 37.5).abs() < f64::EPSILON);
        assert_eq!(row.permitted_units, 40);
        assert!(close(row.progress, 40.0 / 37.5));
        assert!((row.progress.as_percent().unwrap() - 106.666_666).abs() < 1e-3);
    }

    #[test]
    fn zero_target_progress_is_undefined() {
        let result = build(
            &[target("Foo", County::Alameda, [100, 0, 0, 0])],
            &[permit("Foo", 2016, IncomeLevel::Low, 3)],
            &[],
        );
        let row = result.table.row("Foo", ReportLevel::Low).unwrap();
        assert_eq!(row.permitted_units, 3);
        assert_eq!(row.progress, Ratio::Undefined(Undefined::ZeroDenominator));
    }

    #[test]
    fn every_target_has_a_row_without_permits() {
        let result = build(&[target("Foo", County::Alameda, [1, 2, 3, 4])], &[], &[]);
        assert_eq!(result.table.rows.len(), 5);
        assert!(result.table.rows.iter().all(|r| r.permitted_units == 0));
        let levels: Vec<ReportLevel> = result.table.rows.iter().map(|r| r.income_level).collect();
        assert_eq!(
            levels,
            vec![
                ReportLevel::VeryLow,
                ReportLevel::Low,
                ReportLevel::Moderate,
                ReportLevel::AboveModerate,
                ReportLevel::Total,
            ]
        );
    }

    #[test]
    fn scaled_targets_are_conserved() {
        let result = build(
            &[
                target("Foo", County::Alameda, [101, 57, 33, 271]),
                target("Bar", County::Marin, [7, 0, 13, 1]),
            ],
            &[],
            &[],
        );
        for name in result.table.jurisdictions() {
            let levels: f64 = result
                .table
                .rows
                .iter()
                .filter(|r| r.jurisdiction == name && r.income_level != ReportLevel::Total)
                .map(|r| r.target_units_scaled)
                .sum();
            let total = result.table.row(name, ReportLevel::Total).unwrap();
            assert!((levels - total.target_units_scaled).abs() < 1e-9);
        }
    }

    #[test]
    fn total_progress_is_ratio_of_sums() {
        let result = build(
            &[target("Foo", County::Alameda, [8, 8, 8, 80])],
            &[
                permit("Foo", 2015, IncomeLevel::VeryLow, 3),
                permit("Foo", 2015, IncomeLevel::AboveModerate, 6),
            ],
            &[],
        );
        let total = result.table.row("Foo", ReportLevel::Total).unwrap();
        assert!(close(total.progress, 9.0 / 39.0));

        let mean_of_ratios = (3.0 / 3.0 + 6.0 / 30.0) / 4.0;
        assert!(!close(total.progress, mean_of_ratios));
    }

    #[test]
    fn target_strength_against_regional_baseline() {
        // 3,000 scaled very-low units over 600,000 existing units.
        let result = build(
            &[
                target("Big", County::SantaClara, [4_000, 0, 0, 0]),
                target("Small", County::Marin, [4_000, 0, 0, 0]),
            ],
            &[permit("Small", 2016, IncomeLevel::VeryLow, 300)],
            &[
                resolved("Big", County::SantaClara, Some(450_000)),
                resolved("Small", County::Marin, Some(150_000)),
            ],
        );

        assert!(close(result.table.baselines[&ReportLevel::VeryLow], 0.005));

        let small = result.table.row("Small", ReportLevel::VeryLow).unwrap();
        assert!(close(small.growth_rate, 0.01));
        assert!(close(small.target_strength, 2.0));
        assert!(close(small.actual_growth_rate, 0.002));
        assert!(close(small.actual_growth_strength, 0.4));
    }

    #[test]
    fn missing_demographics_leave_growth_undefined() {
        let result = build(
            &[
                target("Foo", County::Alameda, [8, 0, 0, 0]),
                target("Bar", County::Alameda, [8, 0, 0, 0]),
            ],
            &[],
            &[
                resolved("Foo", County::Alameda, Some(100)),
                resolved("Bar", County::Alameda, None),
            ],
        );
        let bar = result.table.row("Bar", ReportLevel::VeryLow).unwrap();
        assert_eq!(bar.growth_rate, Ratio::Undefined(Undefined::MissingInput));
        assert_eq!(bar.target_strength, Ratio::Undefined(Undefined::MissingInput));
        assert!(close(result.table.baselines[&ReportLevel::VeryLow], 0.03));
    }

    #[test]
    fn total_mismatch_excludes_jurisdiction() {
        let mut bad = target("Foo", County::Alameda, [1, 1, 1, 1]);
        bad.reported_total = 5;
        let result = build(
            &[bad, target("Bar", County::Alameda, [1, 1, 1, 1])],
            &[permit("Foo", 2015, IncomeLevel::Low, 1)],
            &[resolved("Foo", County::Alameda, Some(10))],
        );
        assert_eq!(result.table.jurisdictions(), vec!["Bar"]);
        assert_eq!(
            result.violations,
            vec![IntegrityViolation::TargetTotalMismatch {
                jurisdiction: "Foo".to_string(),
                county: County::Alameda,
                reported: 5,
                computed: 4,
            }]
        );
        assert!(result.unmatched_permit_jurisdictions.is_empty());
    }

    #[test]
    fn includes_resolved_jurisdictions_and_reports_unmatched_permits() {
        let result = build(
            &[target("Foo", County::Alameda, [1, 1, 1, 1])],
            &[
                permit("Baz", 2015, IncomeLevel::Low, 1),
                permit("Qux", 2015, IncomeLevel::Low, 1),
            ],
            &[resolved("Alameda Unincorporated", County::Alameda, Some(10))],
        );
        assert_eq!(
            result.table.jurisdictions(),
            vec!["Alameda Unincorporated", "Foo"]
        );
        let remainder = result
            .table
            .row("Alameda Unincorporated", ReportLevel::Total)
            .unwrap();
        assert_eq!(remainder.target_units, 0);
        assert!(remainder.kind.is_some());
        assert_eq!(result.table.row("Foo", ReportLevel::Total).unwrap().kind, None);
        assert_eq!(result.unmatched_permit_jurisdictions, vec!["Baz", "Qux"]);
    }

    #[test]
    fn honours_level_order() {
        let result = build_comparison(
            &[target("Foo", County::Alameda, [1, 1, 1, 1])],
            &[],
            &[],
            Horizon::default(),
            &[IncomeLevel::AboveModerate, IncomeLevel::VeryLow],
        );
        let levels: Vec<ReportLevel> = result.table.rows.iter().map(|r| r.income_level).collect();
        assert_eq!(
            levels,
            vec![
                ReportLevel::AboveModerate,
                ReportLevel::VeryLow,
                ReportLevel::Low,
                ReportLevel::Moderate,
                ReportLevel::Total,
            ]
        );
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let targets = [
            target("Foo", County::Alameda, [10, 20, 30, 40]),
            target("Bar", County::Marin, [5, 5, 5, 5]),
        ];
        let permits = [
            permit("Foo", 2015, IncomeLevel::Moderate, 7),
            permit("Bar", 2016, IncomeLevel::VeryLow, 2),
        ];
        let jurisdictions = [
            resolved("Foo", County::Alameda, Some(1_000)),
            resolved("Bar", County::Marin, Some(300)),
        ];
        let first = build(&targets, &permits, &jurisdictions);
        let second = build(&targets, &permits, &jurisdictions);
        assert_eq!(first.table, second.table);
    }
}
