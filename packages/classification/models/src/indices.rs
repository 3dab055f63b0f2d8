//! Spectral indices derived from composite bands.
//!
//! Each index is a fixed formula over the Sentinel-2 bands. The formulas
//! are sent to the analysis platform as band math; [`SpectralIndex::evaluate`]
//! computes the same formula for a single pixel so the definitions can be
//! checked without a remote round trip.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::Band;

/// Spectral indices computed from the composite image.
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SpectralIndex {
    /// Normalized Difference Vegetation Index
    Ndvi,
    /// Modified Normalized Difference Water Index (Xu, SWIR based)
    Mndwi,
    /// Normalized Difference Red Edge Index
    Ndre,
    /// Enhanced Vegetation Index
    Evi,
    /// Normalized Difference Moisture Index
    Ndmi,
    /// Bare Soil Index (red/NIR normalized difference variant)
    Bsi,
    /// Normalized Difference Built-up Index (display only)
    Ndbi,
}

/// The band arithmetic behind a [`SpectralIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormula {
    /// `(a - b) / (a + b)`
    NormalizedDifference {
        /// Positive band.
        a: Band,
        /// Negative band.
        b: Band,
    },
    /// `2.5 * (nir - red) / (nir + 6 * red - 7.5 * blue + 1)`
    Enhanced {
        /// Near-infrared band.
        nir: Band,
        /// Red band.
        red: Band,
        /// Blue band.
        blue: Band,
    },
}

/// EVI gain factor.
pub const EVI_GAIN: f64 = 2.5;
/// EVI red aerosol-resistance coefficient.
pub const EVI_C1: f64 = 6.0;
/// EVI blue aerosol-resistance coefficient.
pub const EVI_C2: f64 = 7.5;
/// EVI canopy background adjustment.
pub const EVI_L: f64 = 1.0;

impl SpectralIndex {
    /// Indices appended to the composite as classifier features, in band order.
    pub const FEATURES: [Self; 6] = [
        Self::Ndvi,
        Self::Mndwi,
        Self::Ndre,
        Self::Evi,
        Self::Ndmi,
        Self::Bsi,
    ];

    /// Returns the output band name of this index.
    #[must_use]
    pub const fn band_name(self) -> &'static str {
        match self {
            Self::Ndvi => "NDVI",
            Self::Mndwi => "MNDWI",
            Self::Ndre => "NDRE",
            Self::Evi => "EVI",
            Self::Ndmi => "NDMI",
            Self::Bsi => "BSI",
            Self::Ndbi => "NDBI",
        }
    }

    /// Returns the band arithmetic for this index.
    #[must_use]
    pub const fn formula(self) -> IndexFormula {
        use Band::{B2, B3, B4, B8, B8A, B11};

        match self {
            Self::Ndvi => IndexFormula::NormalizedDifference { a: B8, b: B4 },
            Self::Mndwi => IndexFormula::NormalizedDifference { a: B3, b: B11 },
            Self::Ndre => IndexFormula::NormalizedDifference { a: B8A, b: B4 },
            Self::Ndmi => IndexFormula::NormalizedDifference { a: B8A, b: B11 },
            Self::Bsi => IndexFormula::NormalizedDifference { a: B4, b: B8 },
            Self::Ndbi => IndexFormula::NormalizedDifference { a: B11, b: B8 },
            Self::Evi => IndexFormula::Enhanced {
                nir: B8,
                red: B4,
                blue: B2,
            },
        }
    }

    /// Evaluates the index for one pixel given a band lookup.
    ///
    /// Returns `None` where the denominator is zero.
    #[must_use]
    pub fn evaluate(self, band: impl Fn(Band) -> f64) -> Option<f64> {
        match self.formula() {
            IndexFormula::NormalizedDifference { a, b } => normalized_difference(band(a), band(b)),
            IndexFormula::Enhanced { nir, red, blue } => {
                let (nir, red, blue) = (band(nir), band(red), band(blue));
                let denominator = nir + EVI_C1 * red - EVI_C2 * blue + EVI_L;
                if denominator == 0.0 {
                    return None;
                }
                Some(EVI_GAIN * (nir - red) / denominator)
            }
        }
    }
}

/// `(a - b) / (a + b)`, or `None` when `a + b` is zero.
#[must_use]
pub fn normalized_difference(a: f64, b: f64) -> Option<f64> {
    let sum = a + b;
    if sum == 0.0 {
        return None;
    }
    Some((a - b) / sum)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn pixel(b2: f64, b3: f64, b4: f64, b8: f64, b8a: f64, b11: f64) -> impl Fn(Band) -> f64 {
        move |band| match band {
            Band::B2 => b2,
            Band::B3 => b3,
            Band::B4 => b4,
            Band::B8 => b8,
            Band::B8A => b8a,
            Band::B11 => b11,
            _ => 0.0,
        }
    }

    #[test]
    fn ndvi_of_dense_vegetation() {
        let value = SpectralIndex::Ndvi
            .evaluate(pixel(300.0, 500.0, 400.0, 3600.0, 3400.0, 1500.0))
            .unwrap();
        assert!((value - 0.8).abs() < 1e-12);
    }

    #[test]
    fn bsi_is_negated_ndvi() {
        let px = pixel(300.0, 500.0, 900.0, 2100.0, 2000.0, 1800.0);
        let ndvi = SpectralIndex::Ndvi.evaluate(&px).unwrap();
        let bsi = SpectralIndex::Bsi.evaluate(&px).unwrap();
        assert!((ndvi + bsi).abs() < 1e-12);
    }

    #[test]
    fn evi_matches_reference_formula() {
        let (blue, red, nir) = (0.05, 0.08, 0.40);
        let expected = 2.5 * ((nir - red) / (nir + 6.0 * red - 7.5 * blue + 1.0));
        let value = SpectralIndex::Evi
            .evaluate(pixel(blue, 0.0, red, nir, 0.0, 0.0))
            .unwrap();
        assert!((value - expected).abs() < 1e-12);
    }

    #[test]
    fn evi_undefined_when_denominator_vanishes() {
        // 0.5 + 6 * 0.25 - 7.5 * 0.4 + 1 == 0
        assert!(
            SpectralIndex::Evi
                .evaluate(pixel(0.4, 0.0, 0.25, 0.5, 0.0, 0.0))
                .is_none()
        );
    }

    #[test]
    fn normalized_difference_of_zero_bands_is_undefined() {
        assert!(normalized_difference(0.0, 0.0).is_none());
    }

    #[test]
    fn feature_indices_exclude_ndbi() {
        assert!(!SpectralIndex::FEATURES.contains(&SpectralIndex::Ndbi));
        assert_eq!(SpectralIndex::Ndbi.to_string(), "NDBI");
    }

    proptest! {
        #[test]
        fn ndvi_and_mndwi_are_bounded(
            b3 in 0.0f64..10_000.0,
            b4 in 0.0f64..10_000.0,
            b8 in 0.0f64..10_000.0,
            b11 in 0.0f64..10_000.0,
        ) {
            let px = pixel(0.0, b3, b4, b8, 0.0, b11);
            for index in [SpectralIndex::Ndvi, SpectralIndex::Mndwi] {
                if let Some(value) = index.evaluate(&px) {
                    prop_assert!((-1.0..=1.0).contains(&value));
                }
            }
        }

        #[test]
        fn evi_is_finite_off_the_singularity(
            b2 in 0.0f64..1.0,
            b4 in 0.0f64..1.0,
            b8 in 0.0f64..1.0,
        ) {
            if let Some(value) = SpectralIndex::Evi.evaluate(pixel(b2, 0.0, b4, b8, 0.0, 0.0)) {
                prop_assert!(value.is_finite());
            }
        }
    }
}
