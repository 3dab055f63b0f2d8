#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Land-cover classification of a region for a sequence of periods.
//!
//! For every configured period the pipeline builds a lazy
//! [`ClassificationGraph`](graph::ClassificationGraph): a cloud-filtered
//! median composite, spectral indices, sampled and balanced training data,
//! a seeded train/test split, a random forest, mode smoothing, an error
//! matrix and a per-class area reduction. [`run::run`] evaluates the
//! graphs one period at a time through an [`Engine`](lulc_engine::Engine)
//! and collects a [`RunReport`](lulc_pipeline_models::RunReport).

pub mod balance;
pub mod evaluate;
pub mod graph;
pub mod indices;
pub mod layers;
pub mod progress;
pub mod report;
pub mod run;
pub mod seeds;

#[cfg(test)]
mod test_support;

use std::{path::PathBuf, time::Duration};

use lulc_classification_models::DateRange;
use lulc_engine::{
    EngineError, RetryPolicy,
    rest::{RestEngine, RestEngineConfig, resolve_token},
};
use lulc_pipeline_models::{ConfigError, config::EngineSettings};
use lulc_training::TrainingError;
use thiserror::Error;

/// Errors that can occur while running the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Remote evaluation failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Region or training data could not be loaded.
    #[error(transparent)]
    Training(#[from] TrainingError),

    /// Configuration is unreadable or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No scene passed the filters of a period.
    #[error(
        "No scenes for period {label} ({range}) with cloud cover below {max_cloud_percent}%"
    )]
    NoScenes {
        /// Period label.
        label: String,
        /// Acquisition window.
        range: DateRange,
        /// Cloud cover threshold in percent.
        max_cloud_percent: f64,
    },

    /// A materialized value does not have the expected shape.
    #[error("Unexpected result: {message}")]
    Decode {
        /// Description of the mismatch.
        message: String,
    },

    /// Writing an output file failed.
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        /// Output path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Creates a [`RestEngine`] from the engine settings, reading the access
/// token from the configured environment variable.
///
/// # Errors
///
/// Returns [`PipelineError::Engine`] if no token is available or the HTTP
/// client cannot be built.
pub fn connect(settings: &EngineSettings) -> Result<RestEngine, PipelineError> {
    let token = resolve_token(&settings.token_env)?;
    log::debug!(
        "Connecting to {} as project {}",
        settings.base_url,
        settings.project
    );
    Ok(RestEngine::new(RestEngineConfig {
        base_url: settings.base_url.clone(),
        project: settings.project.clone(),
        token,
        timeout: Duration::from_secs(settings.timeout_secs),
        retry: RetryPolicy {
            max_retries: settings.max_retries,
            base_delay: Duration::from_millis(settings.retry_base_delay_ms),
        },
    })?)
}
