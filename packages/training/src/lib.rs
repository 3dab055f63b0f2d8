#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Inputs to a classification run: the region of interest and the labeled
//! training points, both read from `GeoJSON`.
//!
//! Training points arrive as one file per land-cover class. Every point in
//! a file takes that file's class id; the files are merged into a single
//! [`TrainingPoints`] set before being sent to the engine.

pub mod points;
pub mod region;

use std::path::PathBuf;

use lulc_classification_models::LandCoverClass;
use thiserror::Error;

pub use points::{TrainingPoint, TrainingPoints};
pub use region::Region;

/// Errors that can occur while loading training inputs.
#[derive(Debug, Error)]
pub enum TrainingError {
    /// Reading a file failed.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid `GeoJSON`.
    #[error("Invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The `GeoJSON` is valid but holds the wrong kind of geometry.
    #[error("Geometry error: {message}")]
    Geometry {
        /// Description of the problem.
        message: String,
    },

    /// One or more classes have no training points.
    #[error("No training points for: {}", format_classes(classes))]
    MissingClasses {
        /// Classes without points, in class-id order.
        classes: Vec<LandCoverClass>,
    },
}

fn format_classes(classes: &[LandCoverClass]) -> String {
    classes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn read_file(path: &std::path::Path) -> Result<String, TrainingError> {
    std::fs::read_to_string(path).map_err(|source| TrainingError::Io {
        path: path.to_path_buf(),
        source,
    })
}
