//! Spectral index images.

use lulc_classification_models::{Band, IndexFormula, SpectralIndex, indices};
use lulc_engine::Image;

/// Builds the single-band image of `index` from `composite`, named after
/// the index.
#[must_use]
pub fn index_image(composite: &Image, index: SpectralIndex) -> Image {
    let image = match index.formula() {
        IndexFormula::NormalizedDifference { a, b } => {
            composite.normalized_difference(a.as_ref(), b.as_ref())
        }
        IndexFormula::Enhanced { nir, red, blue } => enhanced(composite, nir, red, blue),
    };
    image.rename([index.band_name()])
}

fn enhanced(composite: &Image, nir: Band, red: Band, blue: Band) -> Image {
    let band = |b: Band| composite.select([b.as_ref()]).to_float();
    let (nir, red, blue) = (band(nir), band(red), band(blue));

    let numerator = nir.subtract(&red).multiply(&Image::constant(indices::EVI_GAIN));
    let denominator = nir
        .add(&red.multiply(&Image::constant(indices::EVI_C1)))
        .subtract(&blue.multiply(&Image::constant(indices::EVI_C2)))
        .add(&Image::constant(indices::EVI_L));
    numerator.divide(&denominator)
}

/// Appends the six classifier feature indices to `composite`, in
/// [`SpectralIndex::FEATURES`] order.
#[must_use]
pub fn with_feature_indices(composite: &Image) -> Image {
    SpectralIndex::FEATURES
        .iter()
        .fold(composite.clone(), |image, index| {
            image.add_bands(&index_image(composite, *index))
        })
}
