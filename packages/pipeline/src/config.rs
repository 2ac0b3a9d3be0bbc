//! Pipeline configuration.
//!
//! Everything the pipeline would otherwise hard-code (input paths, column
//! names, the observation window, level ordering, name aliases) lives in a
//! [`PipelineConfig`] read from TOML. Every field has a default, so a file
//! only needs to list what it changes.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rhna_analytics_models::{Horizon, ObservationWindow, TiePolicy};
use rhna_demographics::{CsvDemographicSource, DemographicColumns};
use rhna_geography::ResolveOptions;
use rhna_geography::resolve::DEFAULT_MIN_REMAINDER_FRACTION;
use rhna_housing_models::{CALIFORNIA_FIPS, IncomeLevel};
use rhna_source_models::{BoundaryColumns, NameAliases, PermitColumns, TargetColumns};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading or validating a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Config path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`PipelineConfig`].
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("Invalid config value for {field}: {message}")]
    Invalid {
        /// Offending key.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Input file locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPaths {
    /// Allocation-target CSV.
    pub targets: PathBuf,
    /// Permit CSV.
    pub permits: PathBuf,
    /// Place boundary `GeoJSON`.
    pub places: PathBuf,
    /// County boundary `GeoJSON`.
    pub counties: PathBuf,
    /// Place-level demographic CSV.
    pub place_demographics: PathBuf,
    /// County-level demographic CSV.
    pub county_demographics: PathBuf,
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            targets: PathBuf::from("data/rhna_2015_2023.csv"),
            permits: PathBuf::from("data/permits.csv"),
            places: PathBuf::from("data/places.geojson"),
            counties: PathBuf::from("data/counties.geojson"),
            place_demographics: PathBuf::from("data/place_demographics.csv"),
            county_demographics: PathBuf::from("data/county_demographics.csv"),
        }
    }
}

impl InputPaths {
    fn paths_mut(&mut self) -> [&mut PathBuf; 6] {
        [
            &mut self.targets,
            &mut self.permits,
            &mut self.places,
            &mut self.counties,
            &mut self.place_demographics,
            &mut self.county_demographics,
        ]
    }
}

/// Column mappings for every input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Allocation-target CSV columns.
    pub targets: TargetColumns,
    /// Permit CSV columns.
    pub permits: PermitColumns,
    /// Place `GeoJSON` properties.
    pub places: BoundaryColumns,
    /// County `GeoJSON` properties.
    pub counties: BoundaryColumns,
    /// Demographic CSV columns.
    pub demographics: DemographicColumns,
}

/// Full pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Input file locations.
    pub inputs: InputPaths,
    /// Column mappings.
    pub columns: ColumnConfig,
    /// Observed permit years.
    pub window: ObservationWindow,
    /// Length of the allocation cycle in years.
    pub horizon_years: u16,
    /// State FIPS code passed to the demographic source.
    pub state_fips: String,
    /// Year of the demographic estimates.
    pub baseline_year: u16,
    /// Order of income levels in the comparison table.
    pub income_level_order: Vec<IncomeLevel>,
    /// Name rewrites applied to every source.
    pub aliases: NameAliases,
    /// Place GEOIDs dropped before name matching.
    pub excluded_place_geoids: BTreeSet<String>,
    /// Smallest unincorporated remainder kept, as a fraction of county
    /// area.
    pub min_remainder_fraction: f64,
    /// Default tie handling for rankings.
    pub tie_policy: TiePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inputs: InputPaths::default(),
            columns: ColumnConfig::default(),
            window: ObservationWindow::default(),
            horizon_years: Horizon::default().horizon_years,
            state_fips: CALIFORNIA_FIPS.to_string(),
            baseline_year: 2015,
            income_level_order: IncomeLevel::all().to_vec(),
            aliases: NameAliases::default(),
            excluded_place_geoids: BTreeSet::new(),
            min_remainder_fraction: DEFAULT_MIN_REMAINDER_FRACTION,
            tie_policy: TiePolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Reads a TOML config file. Relative input paths are resolved against
    /// the file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, does not parse,
    /// or fails [`Self::validate`].
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let body = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&body)?;
        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the document does not parse or fails
    /// [`Self::validate`].
    pub fn from_toml_str(body: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(body)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon_years == 0 {
            return Err(ConfigError::Invalid {
                field: "horizon_years",
                message: "must be at least 1".to_string(),
            });
        }
        if self.window.years() == 0 {
            return Err(ConfigError::Invalid {
                field: "window",
                message: format!(
                    "first_year {} is after last_year {}",
                    self.window.first_year, self.window.last_year
                ),
            });
        }
        if !(0.0..1.0).contains(&self.min_remainder_fraction) {
            return Err(ConfigError::Invalid {
                field: "min_remainder_fraction",
                message: format!("{} is not in [0, 1)", self.min_remainder_fraction),
            });
        }
        if self.state_fips.len() != 2 || !self.state_fips.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConfigError::Invalid {
                field: "state_fips",
                message: format!("\"{}\" is not a two-digit FIPS code", self.state_fips),
            });
        }
        Ok(())
    }

    /// Joins every relative input path onto `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in self.inputs.paths_mut() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Window and horizon for target scaling.
    #[must_use]
    pub const fn horizon(&self) -> Horizon {
        Horizon {
            window: self.window,
            horizon_years: self.horizon_years,
        }
    }

    /// Options for the jurisdiction resolver.
    #[must_use]
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            aliases: self.aliases.clone(),
            excluded_place_geoids: self.excluded_place_geoids.clone(),
            min_remainder_fraction: self.min_remainder_fraction,
        }
    }

    /// CSV-backed demographic source over the configured files.
    #[must_use]
    pub fn demographic_source(&self) -> CsvDemographicSource {
        CsvDemographicSource {
            place_path: self.inputs.place_demographics.clone(),
            county_path: self.inputs.county_demographics.clone(),
            columns: self.columns.demographics.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert!((config.horizon().scale_factor() - 0.375).abs() < f64::EPSILON);
        assert_eq!(config.income_level_order.len(), 4);
    }

    #[test]
    fn example_config_matches_defaults() {
        let mut config =
            PipelineConfig::from_toml_str(include_str!("../config/rhna.example.toml")).unwrap();
        assert_eq!(config.aliases.canonical("St. Helena"), "Saint Helena");
        config.aliases = NameAliases::default();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_listed_fields() {
        let config = PipelineConfig::from_toml_str(
            r#"
            horizon_years = 4
            income_level_order = ["amod", "vlow"]

            [window]
            first_year = 2016
            last_year = 2016

            [columns.targets]
            very_low = "VLI"
            "#,
        )
        .unwrap();
        assert!((config.horizon().scale_factor() - 0.25).abs() < f64::EPSILON);
        assert_eq!(
            config.income_level_order,
            vec![IncomeLevel::AboveModerate, IncomeLevel::VeryLow]
        );
        assert_eq!(config.columns.targets.very_low, "VLI");
        assert_eq!(config.columns.targets.low, "Low");
        assert_eq!(config.state_fips, "06");
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            PipelineConfig::from_toml_str("horizon_years = 0"),
            Err(ConfigError::Invalid {
                field: "horizon_years",
                ..
            })
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str("[window]\nfirst_year = 2018\nlast_year = 2015"),
            Err(ConfigError::Invalid { field: "window", .. })
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str("state_fips = \"6\""),
            Err(ConfigError::Invalid {
                field: "state_fips",
                ..
            })
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str("tie_policy = \"sometimes\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn resolves_relative_paths() {
        let mut config = PipelineConfig::default();
        config.inputs.permits = PathBuf::from("/srv/permits.csv");
        config.resolve_paths(Path::new("/etc/rhna"));
        assert_eq!(
            config.inputs.targets,
            PathBuf::from("/etc/rhna/data/rhna_2015_2023.csv")
        );
        assert_eq!(config.inputs.permits, PathBuf::from("/srv/permits.csv"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            PipelineConfig::from_path(Path::new("/nonexistent/rhna.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
