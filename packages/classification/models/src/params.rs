//! Tunable parameters for each processing step.
//!
//! All parameter structs deserialize from TOML with every field optional;
//! missing fields take the values the classification was calibrated with.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Random-forest classifier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RandomForestParams {
    /// Number of decision trees.
    pub number_of_trees: u32,
    /// Fraction of the training input to bag per tree, in `(0, 1]`.
    pub bag_fraction: f64,
    /// Minimum number of training points in a leaf.
    pub min_leaf_population: u32,
    /// Variables per split; `None` lets the platform use `sqrt(n)`.
    pub variables_per_split: Option<u32>,
    /// Maximum leaf nodes per tree; `None` means unlimited.
    pub max_nodes: Option<u32>,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            number_of_trees: 500,
            bag_fraction: 0.7,
            min_leaf_population: 3,
            variables_per_split: None,
            max_nodes: None,
        }
    }
}

/// Settings for sampling the feature image at training points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SamplingParams {
    /// Nominal ground sample distance in metres.
    pub scale: f64,
    /// Tile parallelism hint passed to the platform.
    pub tile_scale: f64,
    /// Whether sampled features keep their point geometry.
    pub geometries: bool,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            scale: 15.0,
            tile_scale: 16.0,
            geometries: true,
        }
    }
}

/// How per-class samples are combined into the balanced training set.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BalanceStrategy {
    /// Every natural sample of a class plus up to `target_per_class` of its
    /// samples drawn again in random order.
    #[default]
    NaturalPlusSample,
    /// Only up to `target_per_class` randomly ordered samples per class.
    Capped,
}

/// Per-class balancing of the sampled training set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct BalanceParams {
    /// Number of random samples drawn per class.
    pub target_per_class: u32,
    /// How drawn samples are merged with natural samples.
    pub strategy: BalanceStrategy,
}

impl Default for BalanceParams {
    fn default() -> Self {
        Self {
            target_per_class: 150,
            strategy: BalanceStrategy::NaturalPlusSample,
        }
    }
}

/// Train/test partition of the balanced set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SplitParams {
    /// Rows whose random column is below this value are used for training.
    pub train_fraction: f64,
}

impl Default for SplitParams {
    fn default() -> Self {
        Self {
            train_fraction: 0.8,
        }
    }
}

/// Shape of the focal kernel.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum KernelShape {
    /// Disc of the given radius.
    #[default]
    Circle,
    /// Square of side `2 * radius + 1`.
    Square,
}

/// Units the kernel radius is expressed in.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum KernelUnits {
    /// Radius in pixels.
    #[default]
    Pixels,
    /// Radius in metres.
    Meters,
}

/// Majority filter applied to the raw classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SmoothingParams {
    /// Kernel radius.
    pub radius: f64,
    /// Kernel shape.
    pub kernel: KernelShape,
    /// Units of `radius`.
    pub units: KernelUnits,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            radius: 2.0,
            kernel: KernelShape::Circle,
            units: KernelUnits::Pixels,
        }
    }
}

/// Grouped pixel-area reduction over the region of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AreaReductionParams {
    /// Nominal scale in metres.
    pub scale: f64,
    /// Upper bound on pixels the reduction may touch.
    pub max_pixels: f64,
}

impl Default for AreaReductionParams {
    fn default() -> Self {
        Self {
            scale: 15.0,
            max_pixels: 1e13,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_calibrated_values() {
        let rf = RandomForestParams::default();
        assert_eq!(rf.number_of_trees, 500);
        assert!((rf.bag_fraction - 0.7).abs() < f64::EPSILON);
        assert_eq!(rf.min_leaf_population, 3);

        let sampling = SamplingParams::default();
        assert!((sampling.scale - 15.0).abs() < f64::EPSILON);
        assert!((sampling.tile_scale - 16.0).abs() < f64::EPSILON);
        assert!(sampling.geometries);

        assert_eq!(BalanceParams::default().target_per_class, 150);
        assert!((SplitParams::default().train_fraction - 0.8).abs() < f64::EPSILON);
        assert_eq!(SmoothingParams::default().kernel, KernelShape::Circle);
        assert!((AreaReductionParams::default().max_pixels - 1e13).abs() < 1.0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let rf: RandomForestParams =
            serde_json::from_str(r#"{ "number_of_trees": 100 }"#).unwrap();
        assert_eq!(rf.number_of_trees, 100);
        assert_eq!(rf.min_leaf_population, 3);
    }

    #[test]
    fn balance_strategy_parses_snake_case() {
        let params: BalanceParams = serde_json::from_str(r#"{ "strategy": "capped" }"#).unwrap();
        assert_eq!(params.strategy, BalanceStrategy::Capped);
        assert_eq!(BalanceStrategy::NaturalPlusSample.to_string(), "natural_plus_sample");
    }
}
