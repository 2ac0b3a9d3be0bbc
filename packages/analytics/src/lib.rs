#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Metric engine and aggregation utilities.
//!
//! [`metrics::build_comparison`] joins scaled targets, windowed permits and
//! demographics into the long-form comparison table. The remaining modules
//! reduce that table (or the raw permits) into grouped summaries, rankings,
//! transit shares and structure-type breakdowns. Every aggregate is a
//! ratio of sums.

pub mod aggregate;
pub mod metrics;
pub mod permits;
pub mod ranking;

pub use aggregate::{summarize, summarize_by_county, summarize_by_income_level, summarize_region};
pub use metrics::{ComparisonBuild, build_comparison};
pub use permits::{category_totals, permit_composition, tpa_region_share, tpa_shares};
pub use ranking::top_n;
