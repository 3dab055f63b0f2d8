#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Lazy geospatial expression graphs and the engine that evaluates them.
//!
//! Imagery retrieval, band math, classifier training and area reduction
//! all happen on a remote analysis platform. This crate builds the
//! declarative graphs describing that work ([`Image`], [`ImageCollection`],
//! [`FeatureCollection`], [`Classifier`], ...), encodes them into the
//! platform's wire format ([`encode`]), and evaluates them through the
//! [`Engine`] trait. [`rest::RestEngine`] speaks the platform's REST API.

pub mod classifier;
pub mod collection;
pub mod encode;
pub mod expr;
pub mod filter;
pub mod geometry;
pub mod image;
pub mod reducer;
pub mod rest;
mod retry;

use serde::de::DeserializeOwned;
use thiserror::Error;

pub use classifier::Classifier;
pub use collection::{Feature, FeatureCollection, ImageCollection};
pub use encode::encode;
pub use expr::{ComputedObject, Expr};
pub use filter::Filter;
pub use geometry::Geometry;
pub use image::Image;
pub use reducer::{Kernel, Reducer};
pub use retry::RetryPolicy;

/// Errors that can occur while evaluating a graph.
#[derive(Debug, Error)]
pub enum EngineError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The platform rejected or failed the request.
    #[error("Remote error (HTTP {status}): {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Error message reported by the platform.
        message: String,
    },

    /// No usable credentials.
    #[error("Authentication error: {message}")]
    Auth {
        /// Description of what is missing.
        message: String,
    },

    /// The platform answered with an unexpected shape.
    #[error("Decode error: {message}")]
    Decode {
        /// Description of the mismatch.
        message: String,
    },
}

/// Evaluates lazy graphs.
#[async_trait::async_trait]
pub trait Engine: Send + Sync {
    /// Materializes `expr` and returns the resulting value.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the request fails or the platform
    /// reports an error.
    async fn compute(&self, expr: &Expr) -> Result<serde_json::Value, EngineError>;

    /// Renders a visualized image as PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the request fails or the platform
    /// reports an error.
    async fn thumbnail(&self, image: &Image) -> Result<Vec<u8>, EngineError>;
}

/// Materializes `expr` and deserializes the result into `T`.
///
/// # Errors
///
/// Returns [`EngineError::Decode`] if the result does not have the shape of
/// `T`, or any error from [`Engine::compute`].
pub async fn compute_typed<T: DeserializeOwned>(
    engine: &dyn Engine,
    expr: &Expr,
) -> Result<T, EngineError> {
    let value = engine.compute(expr).await?;
    serde_json::from_value(value).map_err(|e| EngineError::Decode {
        message: format!(
            "expected {} from {}: {e}",
            std::any::type_name::<T>(),
            expr.function_name().unwrap_or("value")
        ),
    })
}
