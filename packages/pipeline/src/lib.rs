#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! End-to-end orchestration of the RHNA progress pipeline.
//!
//! [`run`] loads every input named in a [`PipelineConfig`], resolves
//! jurisdictions, joins demographics, builds the comparison table and
//! derives every summary from it. [`run_tables`] does the same from tables
//! already in memory. Data-quality findings never abort a run; they are
//! collected into the [`RunReport`] returned with the output.

pub mod config;
pub mod progress;
pub mod report;

pub use config::{ColumnConfig, ConfigError, InputPaths, PipelineConfig};
pub use progress::{NullProgress, ProgressCallback};
pub use report::RunReport;

use rhna_analytics::{
    build_comparison, category_totals, permit_composition, summarize_by_county,
    summarize_by_income_level, summarize_region, tpa_region_share, tpa_shares,
};
use rhna_analytics_models::{
    CategoryTotal, ComparisonTable, CompositionCell, CountySummary, LevelSummary, Summary,
    TpaShare,
};
use rhna_demographics::{DemographicSource, DemographicsError, join_demographics};
use rhna_geography::{GeoError, resolve};
use rhna_geography_models::{Crs, Jurisdiction, JurisdictionSummary, ResolutionGap};
use rhna_housing_models::{County, ReportLevel};
use rhna_source::{SourceError, load_boundaries, load_permits, load_targets};
use rhna_source_models::{BoundaryLayer, JurisdictionTargets, PermitRecord};
use serde::Serialize;
use thiserror::Error;

/// CRS assumed for boundary files that do not declare one, as `GeoJSON`
/// requires.
pub const DEFAULT_BOUNDARY_CRS: Crs = Crs::Wgs84;

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An input file could not be loaded.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Jurisdictions could not be resolved.
    #[error(transparent)]
    Geo(#[from] GeoError),

    /// Demographic estimates could not be fetched.
    #[error(transparent)]
    Demographics(#[from] DemographicsError),
}

/// The four loaded input tables.
#[derive(Debug, Clone)]
pub struct SourceTables {
    /// Allocation targets, one row per jurisdiction.
    pub targets: Vec<JurisdictionTargets>,
    /// Permit records.
    pub permits: Vec<PermitRecord>,
    /// Census place boundaries.
    pub places: BoundaryLayer,
    /// County boundaries.
    pub counties: BoundaryLayer,
}

impl SourceTables {
    /// Loads every table named in `config.inputs`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] for the first input that fails to load.
    pub fn load(
        config: &PipelineConfig,
        progress: &dyn ProgressCallback,
    ) -> Result<Self, SourceError> {
        let inputs = &config.inputs;
        let columns = &config.columns;

        progress.set_message("Loading allocation targets".to_string());
        let targets = load_targets(&inputs.targets, &columns.targets, &config.aliases)?;
        progress.inc(1);

        progress.set_message("Loading permits".to_string());
        let permits = load_permits(&inputs.permits, &columns.permits, &config.aliases)?;
        progress.inc(1);

        progress.set_message("Loading place boundaries".to_string());
        let places = load_boundaries(&inputs.places, &columns.places, DEFAULT_BOUNDARY_CRS)?;
        progress.inc(1);

        progress.set_message("Loading county boundaries".to_string());
        let counties = load_boundaries(&inputs.counties, &columns.counties, DEFAULT_BOUNDARY_CRS)?;
        progress.inc(1);

        Ok(Self {
            targets,
            permits,
            places,
            counties,
        })
    }
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Resolved jurisdictions with demographics attached, sorted by name.
    pub jurisdictions: Vec<Jurisdiction>,
    /// Long-form comparison table.
    pub comparison: ComparisonTable,
    /// Per-county, per-level summaries.
    pub county_summaries: Vec<CountySummary>,
    /// Region-wide per-level summaries.
    pub level_summaries: Vec<LevelSummary>,
    /// Region-wide totals over the total rows.
    pub region: Summary,
    /// Per-jurisdiction transit priority area shares.
    pub tpa_shares: Vec<TpaShare>,
    /// Region-wide transit priority area share.
    pub tpa_region_share: f64,
    /// Permitted units per structure type and income level.
    pub composition: Vec<CompositionCell>,
    /// Permitted units per structure type.
    pub category_totals: Vec<CategoryTotal>,
    /// Data-quality findings.
    pub report: RunReport,
}

impl PipelineOutput {
    /// Geometry-free view of every resolved jurisdiction.
    #[must_use]
    pub fn jurisdiction_summaries(&self) -> Vec<JurisdictionSummary> {
        self.jurisdictions.iter().map(Jurisdiction::summary).collect()
    }

    /// Serializable view of the whole output.
    #[must_use]
    pub fn export(&self) -> PipelineExport<'_> {
        PipelineExport {
            jurisdictions: self.jurisdiction_summaries(),
            comparison: &self.comparison,
            county_summaries: &self.county_summaries,
            level_summaries: &self.level_summaries,
            region: &self.region,
            tpa_shares: &self.tpa_shares,
            tpa_region_share: self.tpa_region_share,
            composition: &self.composition,
            category_totals: &self.category_totals,
            report: &self.report,
        }
    }
}

/// [`PipelineOutput`] with jurisdictions reduced to summaries.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineExport<'a> {
    /// Resolved jurisdictions.
    pub jurisdictions: Vec<JurisdictionSummary>,
    /// Comparison table.
    pub comparison: &'a ComparisonTable,
    /// Per-county summaries.
    pub county_summaries: &'a [CountySummary],
    /// Per-level summaries.
    pub level_summaries: &'a [LevelSummary],
    /// Region totals.
    pub region: &'a Summary,
    /// TPA shares.
    pub tpa_shares: &'a [TpaShare],
    /// Region TPA share.
    pub tpa_region_share: f64,
    /// Structure-type composition.
    pub composition: &'a [CompositionCell],
    /// Structure-type totals.
    pub category_totals: &'a [CategoryTotal],
    /// Data-quality findings.
    pub report: &'a RunReport,
}

/// Loads every configured input and runs the pipeline.
///
/// # Errors
///
/// Returns [`PipelineError`] if an input cannot be loaded, the study area
/// cannot be built, or the demographic source fails.
pub fn run(
    config: &PipelineConfig,
    demographics: &dyn DemographicSource,
    progress: &dyn ProgressCallback,
) -> Result<PipelineOutput, PipelineError> {
    progress.set_total(8);
    let tables = SourceTables::load(config, progress)?;
    let output = analyze(config, &tables, demographics, progress)?;
    progress.finish(finish_message(&output));
    Ok(output)
}

/// Runs the pipeline over tables that are already loaded.
///
/// # Errors
///
/// Returns [`PipelineError`] if the study area cannot be built or the
/// demographic source fails.
pub fn run_tables(
    config: &PipelineConfig,
    tables: &SourceTables,
    demographics: &dyn DemographicSource,
    progress: &dyn ProgressCallback,
) -> Result<PipelineOutput, PipelineError> {
    progress.set_total(4);
    let output = analyze(config, tables, demographics, progress)?;
    progress.finish(finish_message(&output));
    Ok(output)
}

fn analyze(
    config: &PipelineConfig,
    tables: &SourceTables,
    demographics: &dyn DemographicSource,
    progress: &dyn ProgressCallback,
) -> Result<PipelineOutput, PipelineError> {
    progress.set_message("Resolving jurisdictions".to_string());
    let resolution = resolve(
        &tables.places,
        &tables.counties,
        &tables.targets,
        &config.resolve_options(),
    )?;
    progress.inc(1);

    progress.set_message("Joining demographics".to_string());
    let unresolved_cities: Vec<(&str, County)> = resolution
        .gaps
        .iter()
        .filter_map(|gap| match gap {
            ResolutionGap::MissingGeometry {
                jurisdiction,
                county,
            } => Some((jurisdiction.as_str(), *county)),
            _ => None,
        })
        .collect();
    let join = join_demographics(
        &resolution.jurisdictions,
        &unresolved_cities,
        demographics,
        &config.state_fips,
        config.baseline_year,
    )?;
    progress.inc(1);

    progress.set_message("Building comparison table".to_string());
    let build = build_comparison(
        &tables.targets,
        &tables.permits,
        &join.jurisdictions,
        config.horizon(),
        &config.income_level_order,
    );
    progress.inc(1);

    progress.set_message("Summarizing".to_string());
    let rows = &build.table.rows;
    let county_summaries = summarize_by_county(rows);
    let level_summaries = summarize_by_income_level(rows);
    let region = summarize_region(rows);
    let shares = tpa_shares(
        &tables.permits,
        config.window,
        rows.iter()
            .filter(|row| row.income_level == ReportLevel::Total)
            .map(|row| (row.jurisdiction.as_str(), row.county)),
    );
    let region_share = tpa_region_share(&shares);
    let composition = permit_composition(&tables.permits, config.window);
    let totals = category_totals(&tables.permits, config.window);
    progress.inc(1);

    let mut integrity_violations = build.violations;
    integrity_violations.extend(join.violations);

    let report = RunReport {
        resolution_gaps: resolution.gaps,
        demographic_gaps: join.gaps,
        integrity_violations,
        match_report: resolution.match_report,
        unmatched_permit_jurisdictions: build.unmatched_permit_jurisdictions,
    };

    log::info!(
        "Built {} comparison rows for {} jurisdictions, {} findings",
        build.table.rows.len(),
        join.jurisdictions.len(),
        report.finding_count()
    );

    Ok(PipelineOutput {
        jurisdictions: join.jurisdictions,
        comparison: build.table,
        county_summaries,
        level_summaries,
        region,
        tpa_shares: shares,
        tpa_region_share: region_share,
        composition,
        category_totals: totals,
        report,
    })
}

fn finish_message(output: &PipelineOutput) -> String {
    format!(
        "{} jurisdictions, {} rows, {} findings",
        output.jurisdictions.len(),
        output.comparison.rows.len(),
        output.report.finding_count()
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use geo::{MultiPolygon, Rect, coord};
    use rhna_demographics::MemoryDemographicSource;
    use rhna_geography_models::{DemographicGap, Demographics, JurisdictionKind};
    use rhna_housing_models::{IncomeLevel, PermitCategory};
    use rhna_source_models::{BoundaryFeature, LevelUnits};

    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![
            Rect::new(coord! { x: x0, y: y0 }, coord! { x: x1, y: y1 }).to_polygon(),
        ])
    }

    fn layer(features: &[(&str, &str, MultiPolygon<f64>)]) -> BoundaryLayer {
        BoundaryLayer {
            crs: Crs::Wgs84,
            features: features
                .iter()
                .map(|(name, geoid, geometry)| BoundaryFeature {
                    name: (*name).to_string(),
                    geoid: (*geoid).to_string(),
                    geometry: geometry.clone(),
                })
                .collect(),
        }
    }

    fn target(name: &str, county: County, levels: [u64; 4]) -> JurisdictionTargets {
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

    fn permit(name: &str, year: u16, level: IncomeLevel, units: u64, tpa: bool) -> PermitRecord {
        PermitRecord {
            jurisdiction: name.to_string(),
            county: County::Alameda,
            year,
            income_level: level,
            units,
            category: PermitCategory::FivePlus,
            is_transit_priority_area: tpa,
        }
    }

    fn counts(population: u64, existing_units: u64) -> Demographics {
        Demographics {
            population,
            existing_units,
        }
    }

    fn tables() -> SourceTables {
        SourceTables {
            targets: vec![
                target("Oakland", County::Alameda, [100, 0, 0, 100]),
                target("Berkeley", County::Alameda, [0, 0, 0, 80]),
                target("Alameda Unincorporated", County::Alameda, [20, 0, 0, 0]),
                target("Richmond", County::ContraCosta, [40, 0, 0, 0]),
            ],
            permits: vec![
                permit("Oakland", 2015, IncomeLevel::VeryLow, 15, true),
                permit("Oakland", 2016, IncomeLevel::AboveModerate, 30, true),
                permit("Berkeley", 2017, IncomeLevel::AboveModerate, 30, false),
                permit("Richmond", 2016, IncomeLevel::VeryLow, 5, false),
            ],
            places: layer(&[
                ("Oakland", "0653000", square(0.0, 0.0, 5.0, 5.0)),
                ("Berkeley", "0606000", square(5.0, 0.0, 10.0, 5.0)),
                ("Richmond", "0660620", square(10.0, 0.0, 20.0, 10.0)),
            ]),
            counties: layer(&[
                ("Alameda", "06001", square(0.0, 0.0, 10.0, 10.0)),
                ("Contra Costa", "06013", square(10.0, 0.0, 20.0, 10.0)),
            ]),
        }
    }

    fn demographics() -> MemoryDemographicSource {
        MemoryDemographicSource {
            places: BTreeMap::from([
                ("0653000".to_string(), counts(400_000, 170_000)),
                ("0606000".to_string(), counts(120_000, 50_000)),
                ("0660620".to_string(), counts(110_000, 40_000)),
            ]),
            counties: BTreeMap::from([
                ("06001".to_string(), counts(1_600_000, 600_000)),
                ("06013".to_string(), counts(1_100_000, 400_000)),
            ]),
        }
    }

    fn run_default(tables: &SourceTables) -> PipelineOutput {
        run_tables(
            &PipelineConfig::default(),
            tables,
            &demographics(),
            &NullProgress,
        )
        .unwrap()
    }

    #[test]
    fn end_to_end_over_loaded_tables() {
        let output = run_default(&tables());

        let names: Vec<&str> = output
            .jurisdictions
            .iter()
            .map(|j| j.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["Alameda Unincorporated", "Berkeley", "Oakland", "Richmond"]
        );

        let remainder = &output.jurisdictions[0];
        assert_eq!(remainder.kind, JurisdictionKind::Unincorporated);
        assert_eq!(remainder.demographics, Some(counts(1_080_000, 380_000)));

        let oakland = output
            .comparison
            .row("Oakland", ReportLevel::VeryLow)
            .unwrap();
        assert!((oakland.target_units_scaled - 37.5).abs() < 1e-9);
        assert_eq!(oakland.permitted_units, 15);
        assert!(oakland.progress.value().is_some_and(|v| (v - 0.4).abs() < 1e-9));

        assert_eq!(output.comparison.jurisdictions().len(), 4);
        assert_eq!(output.region.target_units, 340);
        assert_eq!(output.region.permitted_units, 80);
        assert!((output.tpa_region_share - 0.75).abs() < 1e-12);
        assert!(output.report.is_clean());
    }

    #[test]
    fn findings_land_in_the_report() {
        let mut tables = tables();
        tables.targets.push(target("Piedmont", County::Alameda, [1, 0, 0, 0]));
        tables
            .permits
            .push(permit("Atlantis", 2016, IncomeLevel::Low, 3, false));
        tables.targets[1].reported_total = 81;

        let output = run_default(&tables);
        let report = &output.report;

        assert_eq!(
            report.resolution_gaps,
            vec![ResolutionGap::MissingGeometry {
                jurisdiction: "Piedmont".to_string(),
                county: County::Alameda,
            }]
        );
        assert_eq!(report.match_report.missing, vec!["Piedmont".to_string()]);
        assert_eq!(
            report.demographic_gaps,
            vec![DemographicGap::IncompleteCounty {
                jurisdiction: "Alameda Unincorporated".to_string(),
                county: County::Alameda,
                missing_places: vec!["Piedmont".to_string()],
            }]
        );
        assert_eq!(output.jurisdictions[0].demographics, None);
        assert_eq!(report.integrity_violations.len(), 1);
        assert_eq!(report.integrity_violations[0].jurisdiction(), "Berkeley");
        assert_eq!(report.unmatched_permit_jurisdictions, vec!["Atlantis".to_string()]);
        assert!(output.comparison.row("Berkeley", ReportLevel::Total).is_none());
        assert!(!report.is_clean());
    }

    #[test]
    fn every_compared_jurisdiction_has_a_tpa_share() {
        let mut tables = tables();
        tables.permits.retain(|p| p.jurisdiction != "Richmond");

        let output = run_default(&tables);
        let names: Vec<&str> = output
            .tpa_shares
            .iter()
            .map(|s| s.jurisdiction.as_str())
            .collect();
        assert_eq!(names, output.comparison.jurisdictions());

        let richmond = output
            .tpa_shares
            .iter()
            .find(|s| s.jurisdiction == "Richmond")
            .unwrap();
        assert_eq!(richmond.county, County::ContraCosta);
        assert_eq!(richmond.affordable_units, 0);
        assert!(richmond.share.abs() < f64::EPSILON);
        assert!((output.tpa_region_share - 1.0).abs() < 1e-12);
    }

    #[test]
    fn missing_county_boundary_aborts() {
        let mut tables = tables();
        tables.counties.features.truncate(1);
        let err = run_tables(
            &PipelineConfig::default(),
            &tables,
            &demographics(),
            &NullProgress,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Geo(GeoError::MissingCounty { .. })));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let tables = tables();
        let first = run_default(&tables);
        let second = run_default(&tables);
        assert_eq!(first.comparison, second.comparison);
        assert_eq!(first.jurisdictions, second.jurisdictions);
        assert_eq!(first.report, second.report);
    }

    #[test]
    fn export_omits_geometry() {
        let output = run_default(&tables());
        let export = output.export();
        assert_eq!(export.jurisdictions.len(), 4);
        assert_eq!(export.jurisdictions[2].existing_units, Some(170_000));
    }
}
