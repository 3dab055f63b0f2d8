#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Land-cover classification vocabulary shared across the lulc workspace.
//!
//! Defines the five land-cover classes and their class ids, the Sentinel-2
//! bands fed to the classifier, the spectral indices derived from them,
//! the tunable parameters of each processing step, and the accuracy and
//! area types produced once a classification has been materialized.

pub mod indices;
pub mod metrics;
pub mod params;
pub mod period;
pub mod vis;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use indices::{IndexFormula, SpectralIndex};
pub use metrics::{AreaByClass, ConfusionMatrix, InvalidMatrixError};
pub use period::{DateRange, InvalidDateRangeError};

/// Name of the feature property carrying the class id.
pub const CLASS_PROPERTY: &str = "Class";

/// Name of the property the classifier writes predictions into.
pub const PREDICTION_PROPERTY: &str = "classification";

/// A land-cover class with its fixed class id.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum LandCoverClass {
    /// Class 0: open water, rivers and reservoirs
    #[strum(to_string = "Water")]
    Water = 0,
    /// Class 1: cropland and orchards
    #[strum(to_string = "Agriculture")]
    Agriculture = 1,
    /// Class 2: closed and open canopy forest
    #[strum(to_string = "Forest")]
    Forest = 2,
    /// Class 3: bare soil, rock, dry riverbeds
    #[strum(to_string = "Barren_land")]
    BarrenLand = 3,
    /// Class 4: built-up surfaces
    #[strum(to_string = "Urban_area")]
    UrbanArea = 4,
}

impl LandCoverClass {
    /// Number of land-cover classes.
    pub const COUNT: usize = 5;

    /// Returns the class id written into the `Class` property.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Creates a class from its class id.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is not in the range 0-4.
    pub const fn from_id(id: i64) -> Result<Self, InvalidClassError> {
        match id {
            0 => Ok(Self::Water),
            1 => Ok(Self::Agriculture),
            2 => Ok(Self::Forest),
            3 => Ok(Self::BarrenLand),
            4 => Ok(Self::UrbanArea),
            _ => Err(InvalidClassError { id }),
        }
    }

    /// Returns all classes ordered by class id.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Water,
            Self::Agriculture,
            Self::Forest,
            Self::BarrenLand,
            Self::UrbanArea,
        ]
    }

    /// Returns the color used for this class on classification maps.
    #[must_use]
    pub const fn palette_color(self) -> &'static str {
        match self {
            Self::Water => "blue",
            Self::Agriculture => "yellow",
            Self::Forest => "green",
            Self::BarrenLand => "grey",
            Self::UrbanArea => "red",
        }
    }
}

/// Error returned when a class id falls outside the known taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidClassError {
    /// The offending class id.
    pub id: i64,
}

impl std::fmt::Display for InvalidClassError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid land-cover class id {}: expected 0-4", self.id)
    }
}

impl std::error::Error for InvalidClassError {}

/// Sentinel-2 MSI surface-reflectance bands used as classifier inputs.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Band {
    /// Blue, 490 nm
    B2,
    /// Green, 560 nm
    B3,
    /// Red, 665 nm
    B4,
    /// Red edge 1, 705 nm
    B5,
    /// Red edge 2, 740 nm
    B6,
    /// Red edge 3, 783 nm
    B7,
    /// Near infrared, 842 nm
    B8,
    /// Narrow near infrared, 865 nm
    B8A,
    /// Short-wave infrared 1, 1610 nm
    B11,
    /// Short-wave infrared 2, 2190 nm
    B12,
}

impl Band {
    /// The ten raw bands selected from each composite, in selection order.
    pub const RAW: [Self; 10] = [
        Self::B2,
        Self::B3,
        Self::B4,
        Self::B5,
        Self::B6,
        Self::B7,
        Self::B8,
        Self::B8A,
        Self::B11,
        Self::B12,
    ];
}

/// Returns the 16 classifier input properties: the ten raw bands followed
/// by the six feature indices.
#[must_use]
pub fn feature_names() -> Vec<String> {
    Band::RAW
        .iter()
        .map(ToString::to_string)
        .chain(
            SpectralIndex::FEATURES
                .iter()
                .map(|index| index.band_name().to_string()),
        )
        .collect()
}
