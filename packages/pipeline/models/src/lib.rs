#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for the classification pipeline.
//!
//! This crate contains only the run configuration (read from TOML) and the
//! serializable per-period report. It performs no network access.

pub mod config;
pub mod report;

use std::path::PathBuf;

use lulc_classification_models::InvalidDateRangeError;
use thiserror::Error;

pub use config::PipelineConfig;
pub use report::{LayerOutput, PeriodReport, RunReport};

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the config file failed.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`PipelineConfig`].
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value is out of range or inconsistent.
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// Description of the problem.
        message: String,
    },

    /// A period's start date is not before its end date.
    #[error("Invalid date range: {0}")]
    InvalidDate(#[from] InvalidDateRangeError),
}
