//! Visualization parameters for rendered map layers.

use serde::{Deserialize, Serialize};

use crate::{Band, LandCoverClass};

/// Stretch and palette applied when rendering a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisParams {
    /// Bands to render; `None` renders the single band of the image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bands: Option<Vec<String>>,
    /// Value mapped to the first palette color (or black).
    pub min: f64,
    /// Value mapped to the last palette color (or white).
    pub max: f64,
    /// Color ramp for single-band layers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub palette: Vec<String>,
}

impl VisParams {
    fn ramp(min: f64, max: f64, palette: &[&str]) -> Self {
        Self {
            bands: None,
            min,
            max,
            palette: palette.iter().map(ToString::to_string).collect(),
        }
    }

    /// One color per land-cover class, class ids 0-4.
    #[must_use]
    pub fn classification() -> Self {
        let palette: Vec<&str> = LandCoverClass::all()
            .iter()
            .map(|c| c.palette_color())
            .collect();
        Self::ramp(0.0, 4.0, &palette)
    }

    /// NDVI from bare (white) to vegetated (green).
    #[must_use]
    pub fn ndvi() -> Self {
        Self::ramp(0.0, 1.0, &["white", "green"])
    }

    /// Diverging NDBI ramp.
    #[must_use]
    pub fn ndbi() -> Self {
        Self::ramp(-1.0, 1.0, &["blue", "white", "red"])
    }

    /// MNDWI from dry (white) to water (blue).
    #[must_use]
    pub fn mndwi() -> Self {
        Self::ramp(-1.0, 1.0, &["white", "blue"])
    }

    /// True color composite of surface reflectance.
    #[must_use]
    pub fn true_color() -> Self {
        Self {
            bands: Some(
                [Band::B4, Band::B3, Band::B2]
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            ),
            min: 0.0,
            max: 3000.0,
            palette: Vec::new(),
        }
    }
}
