#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the RHNA progress pipeline.
//!
//! Every subcommand runs the full pipeline from a TOML config and prints
//! one slice of the output as JSON. Uses `indicatif-log-bridge` (via
//! [`rhna_cli_utils::init_logger`]) so log lines and the stage bar never
//! fight for the terminal.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use rhna_analytics::top_n;
use rhna_analytics_models::{
    ComparisonRow, LevelSummary, Metric, RankQuery, RankedRow, Summary, TiePolicy,
};
use rhna_cli_utils::IndicatifProgress;
use rhna_housing_models::ReportLevel;
use rhna_pipeline::{PipelineConfig, PipelineOutput, RunReport};
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "rhna",
    about = "Compare Bay Area housing allocation targets against permits"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Common {
    /// Pipeline config file
    #[arg(long, default_value = "rhna.toml")]
    config: PathBuf,
    /// Write JSON here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline and print the run report and region summary
    Run {
        #[command(flatten)]
        common: Common,
    },
    /// Print the comparison table
    Table {
        #[command(flatten)]
        common: Common,
        /// Only rows at this level (vlow, low, mod, amod, total)
        #[arg(long, value_parser = parse_enum::<ReportLevel>)]
        level: Option<ReportLevel>,
    },
    /// Rank jurisdictions by a metric
    Top {
        #[command(flatten)]
        common: Common,
        /// Metric to rank by (e.g. `progress`, `target_strength`)
        #[arg(long, value_parser = parse_enum::<Metric>)]
        metric: Metric,
        /// Number of jurisdictions
        #[arg(short, default_value = "10")]
        n: usize,
        /// Level to rank at
        #[arg(long, default_value = "total", value_parser = parse_enum::<ReportLevel>)]
        level: ReportLevel,
        /// Keep every jurisdiction tied with the last one
        #[arg(long)]
        include_ties: bool,
        /// Only jurisdictions whose value is at least this
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Print only the run report
    Gaps {
        #[command(flatten)]
        common: Common,
    },
    /// Print every output table
    Export {
        #[command(flatten)]
        common: Common,
    },
}

/// Parses any `strum` enum by its serialized name.
fn parse_enum<T: FromStr>(value: &str) -> Result<T, String>
where
    T::Err: Display,
{
    value.parse().map_err(|e: T::Err| format!("{e}: {value}"))
}

impl Commands {
    const fn common(&self) -> &Common {
        match self {
            Self::Run { common }
            | Self::Table { common, .. }
            | Self::Top { common, .. }
            | Self::Gaps { common }
            | Self::Export { common } => common,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary<'a> {
    report: &'a RunReport,
    region: &'a Summary,
    levels: &'a [LevelSummary],
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = rhna_cli_utils::init_logger();
    let cli = Cli::parse();
    let common = cli.command.common();

    let config = PipelineConfig::from_path(&common.config)?;
    let demographics = config.demographic_source();
    let progress = IndicatifProgress::stages_bar(&multi, "Running pipeline");

    let start = Instant::now();
    let output = rhna_pipeline::run(&config, &demographics, progress.as_ref())?;
    log::info!("Pipeline finished in {:.1}s", start.elapsed().as_secs_f64());

    let destination = common.output.as_deref();

    match &cli.command {
        Commands::Run { .. } => emit(
            &RunSummary {
                report: &output.report,
                region: &output.region,
                levels: &output.level_summaries,
            },
            destination,
        )?,
        Commands::Table { level, .. } => match level {
            Some(level) => {
                let rows: Vec<&ComparisonRow> = output.comparison.level(*level).collect();
                emit(&rows, destination)?;
            }
            None => emit(&output.comparison, destination)?,
        },
        Commands::Top {
            metric,
            n,
            level,
            include_ties,
            threshold,
            ..
        } => {
            let query = RankQuery {
                metric: *metric,
                level: Some(*level),
                n: *n,
                threshold: *threshold,
                ties: if *include_ties {
                    TiePolicy::IncludeTies
                } else {
                    config.tie_policy
                },
            };
            emit(&rank(&output, &query), destination)?;
        }
        Commands::Gaps { .. } => emit(&output.report, destination)?,
        Commands::Export { .. } => emit(&output.export(), destination)?,
    }

    if !output.report.is_clean() {
        log::warn!(
            "{} data-quality findings, see the run report",
            output.report.finding_count()
        );
    }

    Ok(())
}

fn rank(output: &PipelineOutput, query: &RankQuery) -> Vec<RankedRow> {
    let ranked = top_n(&output.comparison.rows, query);
    log::info!(
        "Ranked {} jurisdictions by {} at {}",
        ranked.len(),
        query.metric,
        query
            .level
            .map_or_else(|| "every level".to_string(), |l| l.to_string())
    );
    ranked
}

/// Writes `value` as pretty JSON to `path`, or to stdout.
fn emit<T: Serialize + ?Sized>(
    value: &T,
    path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => {
            std::fs::write(path, json + "\n")?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ranking_arguments() {
        let cli = Cli::try_parse_from([
            "rhna",
            "top",
            "--metric",
            "target_strength",
            "--level",
            "vlow",
            "-n",
            "3",
        ])
        .unwrap();
        let Commands::Top {
            metric, n, level, ..
        } = cli.command
        else {
            panic!("expected top");
        };
        assert_eq!(metric, Metric::TargetStrength);
        assert_eq!(level, ReportLevel::VeryLow);
        assert_eq!(n, 3);
    }

    #[test]
    fn ranking_level_defaults_to_total() {
        let cli = Cli::try_parse_from(["rhna", "top", "--metric", "progress"]).unwrap();
        let Commands::Top { level, common, .. } = cli.command else {
            panic!("expected top");
        };
        assert_eq!(level, ReportLevel::Total);
        assert_eq!(common.config, PathBuf::from("rhna.toml"));
    }

    #[test]
    fn table_level_is_optional() {
        let cli = Cli::try_parse_from(["rhna", "table"]).unwrap();
        assert!(matches!(cli.command, Commands::Table { level: None, .. }));

        let cli = Cli::try_parse_from(["rhna", "table", "--level", "amod"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Table {
                level: Some(ReportLevel::AboveModerate),
                ..
            }
        ));
    }

    #[test]
    fn unknown_enum_values_are_rejected() {
        assert!(Cli::try_parse_from(["rhna", "top", "--metric", "speed"]).is_err());
        assert!(Cli::try_parse_from(["rhna", "table", "--level", "middle"]).is_err());
    }
}
