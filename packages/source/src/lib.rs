#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Source loaders for the RHNA progress pipeline.
//!
//! Each loader reads one input file into the normalized tables defined in
//! [`rhna_source_models`]. Malformed input is fatal: a numeric cell that
//! does not parse aborts the load with the file, row and column identified,
//! rather than being zero-filled.
//!
//! Every loader has a `read_*` variant taking any [`std::io::Read`] and a
//! `load_*` variant taking a file path.

pub mod boundaries;
pub mod parsing;
pub mod permits;
pub mod targets;

use std::fs::File;
use std::path::{Path, PathBuf};

pub use boundaries::{load_boundaries, read_boundaries};
pub use permits::{load_permits, read_permits};
pub use targets::{load_targets, read_targets};

/// Errors that can occur while loading a source file.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The file could not be opened or read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// CSV decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// `GeoJSON` decoding failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// A required column is absent from the header row.
    #[error("{file}: missing required column \"{column}\"")]
    MissingColumn {
        /// Source label.
        file: String,
        /// Column that was expected.
        column: String,
    },

    /// A cell failed to parse as its expected type.
    #[error("{file} row {row}, column \"{column}\": {message} (value: \"{value}\")")]
    InvalidField {
        /// Source label.
        file: String,
        /// One-based data row number (header excluded).
        row: usize,
        /// Column name.
        column: String,
        /// Raw cell value.
        value: String,
        /// What was wrong with it.
        message: String,
    },

    /// A boundary feature lacks a required property.
    #[error("{file} feature {index}: missing property \"{property}\"")]
    MissingProperty {
        /// Source label.
        file: String,
        /// Zero-based feature index.
        index: usize,
        /// Property that was expected.
        property: String,
    },

    /// The boundary file declares a CRS the pipeline cannot convert.
    #[error("{file}: unsupported coordinate reference system \"{name}\"")]
    UnsupportedCrs {
        /// Source label.
        file: String,
        /// CRS identifier as declared.
        name: String,
    },

    /// The document is valid `GeoJSON` but not a feature collection.
    #[error("{file}: expected a GeoJSON FeatureCollection")]
    NotFeatureCollection {
        /// Source label.
        file: String,
    },
}

/// Opens a source file, attaching the path to any error.
///
/// # Errors
///
/// Returns [`SourceError::Io`] if the file cannot be opened.
pub fn open(path: &Path) -> Result<File, SourceError> {
    File::open(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Header-name to column-index lookup for one CSV file.
///
/// Header cells are trimmed and a leading UTF-8 byte-order mark is dropped.
pub struct Headers<'a> {
    file: &'a str,
    names: Vec<String>,
}

impl<'a> Headers<'a> {
    /// Indexes the header row of `file`.
    #[must_use]
    pub fn new(file: &'a str, record: &csv::StringRecord) -> Self {
        let names = record
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        Self { file, names }
    }

    /// Index of a required column.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MissingColumn`] if no header matches.
    pub fn require(&self, column: &str) -> Result<usize, SourceError> {
        self.names
            .iter()
            .position(|name| name == column)
            .ok_or_else(|| SourceError::MissingColumn {
                file: self.file.to_string(),
                column: column.to_string(),
            })
    }

    /// Index of an optional column.
    #[must_use]
    pub fn find(&self, column: &str) -> Option<usize> {
        self.names.iter().position(|name| name == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_ignore_bom_and_padding() {
        let record = csv::StringRecord::from(vec!["\u{feff}County", " Jurisdiction "]);
        let headers = Headers::new("targets.csv", &record);
        assert_eq!(headers.require("County").unwrap(), 0);
        assert_eq!(headers.require("Jurisdiction").unwrap(), 1);
        assert!(matches!(
            headers.require("Total"),
            Err(SourceError::MissingColumn { .. })
        ));
    }

    #[test]
    fn open_reports_path() {
        let err = open(Path::new("/nonexistent/targets.csv")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/targets.csv"));
    }
}
