//! Raster images.

use lulc_classification_models::vis::VisParams;

use crate::{
    classifier::Classifier,
    collection::FeatureCollection,
    expr::{Expr, computed_object},
    geometry::Geometry,
    reducer::{Kernel, Reducer},
};

/// A lazy multi-band raster.
#[derive(Debug, Clone, PartialEq)]
pub struct Image(Expr);

computed_object!(Image);

/// Options for [`Image::sample_regions`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleOptions {
    /// Nominal scale in metres.
    pub scale: f64,
    /// Tile parallelism hint.
    pub tile_scale: f64,
    /// Whether sampled features keep their geometry.
    pub geometries: bool,
}

impl Image {
    /// An image with `value` in every pixel.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self(Expr::call("Image.constant", [("value", Expr::from(value))]))
    }

    /// An image whose pixels hold their own area in square metres.
    #[must_use]
    pub fn pixel_area() -> Self {
        Self(Expr::call("Image.pixelArea", []))
    }

    /// Keeps only the named bands, in the given order.
    #[must_use]
    pub fn select<S: AsRef<str>>(&self, bands: impl IntoIterator<Item = S>) -> Self {
        Self(Expr::call(
            "Image.select",
            [
                ("input", self.0.clone()),
                ("bandSelectors", Expr::strings(bands)),
            ],
        ))
    }

    /// Masks out pixels outside `geometry`.
    #[must_use]
    pub fn clip(&self, geometry: &Geometry) -> Self {
        Self(Expr::call(
            "Image.clip",
            [("input", self.0.clone()), ("geometry", geometry.clone().into())],
        ))
    }

    /// Renames the bands.
    #[must_use]
    pub fn rename<S: AsRef<str>>(&self, names: impl IntoIterator<Item = S>) -> Self {
        Self(Expr::call(
            "Image.rename",
            [("input", self.0.clone()), ("names", Expr::strings(names))],
        ))
    }

    /// Appends the bands of `other`.
    #[must_use]
    pub fn add_bands(&self, other: &Self) -> Self {
        Self(Expr::call(
            "Image.addBands",
            [("dstImg", self.0.clone()), ("srcImg", other.0.clone())],
        ))
    }

    /// `(a - b) / (a + b)` as a single band named `nd`.
    #[must_use]
    pub fn normalized_difference(&self, a: &str, b: &str) -> Self {
        Self(Expr::call(
            "Image.normalizedDifference",
            [
                ("input", self.0.clone()),
                ("bandNames", Expr::strings([a, b])),
            ],
        ))
    }

    /// Casts every band to 32-bit float.
    #[must_use]
    pub fn to_float(&self) -> Self {
        Self(Expr::call("Image.toFloat", [("value", self.0.clone())]))
    }

    /// Pixel-wise sum.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        self.binary("Image.add", other)
    }

    /// Pixel-wise difference.
    #[must_use]
    pub fn subtract(&self, other: &Self) -> Self {
        self.binary("Image.subtract", other)
    }

    /// Pixel-wise product.
    #[must_use]
    pub fn multiply(&self, other: &Self) -> Self {
        self.binary("Image.multiply", other)
    }

    /// Pixel-wise quotient.
    #[must_use]
    pub fn divide(&self, other: &Self) -> Self {
        self.binary("Image.divide", other)
    }

    fn binary(&self, function: &str, other: &Self) -> Self {
        Self(Expr::call(
            function,
            [("image1", self.0.clone()), ("image2", other.0.clone())],
        ))
    }

    /// Samples every band at each feature of `collection`, copying the
    /// listed `properties` onto the samples.
    #[must_use]
    pub fn sample_regions<S: AsRef<str>>(
        &self,
        collection: &FeatureCollection,
        properties: impl IntoIterator<Item = S>,
        options: SampleOptions,
    ) -> FeatureCollection {
        FeatureCollection::from_expr(Expr::call(
            "Image.sampleRegions",
            [
                ("image", self.0.clone()),
                ("collection", collection.clone().into()),
                ("properties", Expr::strings(properties)),
                ("scale", Expr::from(options.scale)),
                ("tileScale", Expr::from(options.tile_scale)),
                ("geometries", Expr::from(options.geometries)),
            ],
        ))
    }

    /// Applies a trained classifier, writing predictions to `output_name`.
    #[must_use]
    pub fn classify(&self, classifier: &Classifier, output_name: &str) -> Self {
        Self(Expr::call(
            "Image.classify",
            [
                ("image", self.0.clone()),
                ("classifier", classifier.clone().into()),
                ("outputName", Expr::from(output_name)),
            ],
        ))
    }

    /// Applies `reducer` over the neighborhood described by `kernel`.
    #[must_use]
    pub fn reduce_neighborhood(&self, reducer: &Reducer, kernel: &Kernel) -> Self {
        Self(Expr::call(
            "Image.reduceNeighborhood",
            [
                ("image", self.0.clone()),
                ("reducer", reducer.clone().into()),
                ("kernel", kernel.clone().into()),
            ],
        ))
    }

    /// Reduces all pixels inside `geometry` to a dictionary.
    #[must_use]
    pub fn reduce_region(
        &self,
        reducer: &Reducer,
        geometry: &Geometry,
        scale: f64,
        max_pixels: f64,
    ) -> Expr {
        Expr::call(
            "Image.reduceRegion",
            [
                ("image", self.0.clone()),
                ("reducer", reducer.clone().into()),
                ("geometry", geometry.clone().into()),
                ("scale", Expr::from(scale)),
                ("maxPixels", Expr::from(max_pixels)),
            ],
        )
    }

    /// Renders to an 8-bit RGB image with the given stretch and palette.
    #[must_use]
    pub fn visualize(&self, vis: &VisParams) -> Self {
        let mut arguments = vec![
            ("image", self.0.clone()),
            ("min", Expr::from(vis.min)),
            ("max", Expr::from(vis.max)),
        ];
        if let Some(bands) = &vis.bands {
            arguments.push(("bands", Expr::strings(bands)));
        }
        if !vis.palette.is_empty() {
            arguments.push(("palette", Expr::strings(&vis.palette)));
        }
        Self(Expr::call("Image.visualize", arguments))
    }
}
