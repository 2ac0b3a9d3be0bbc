#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Jurisdiction resolution.
//!
//! Turns the census place and county boundary layers into the canonical
//! jurisdiction set: places are reprojected into the county layer's CRS,
//! clipped to the nine-county study area and matched by name against the
//! allocation-target table, then each county's unincorporated remainder is
//! synthesized by subtracting its cities from the county polygon.

pub mod crs;
pub mod resolve;

pub use resolve::{Resolution, ResolveOptions, resolve};

use rhna_housing_models::County;
use thiserror::Error;

/// Errors that can occur during jurisdiction resolution.
#[derive(Debug, Error)]
pub enum GeoError {
    /// The target table references a county with no boundary.
    #[error("County layer has no boundary for {county}")]
    MissingCounty {
        /// County without a boundary.
        county: County,
    },

    /// None of the county features are Bay Area counties.
    #[error("County layer contains no Bay Area counties")]
    EmptyStudyArea,
}
