//! Image and feature collections.

use std::collections::BTreeMap;

use crate::{
    classifier::Classifier,
    expr::{Expr, computed_object},
    filter::Filter,
    geometry::Geometry,
    image::Image,
};

/// A lazy stack of images.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCollection(Expr);

computed_object!(ImageCollection);

impl ImageCollection {
    /// Loads a catalog collection by id.
    #[must_use]
    pub fn load(id: &str) -> Self {
        Self(Expr::call("ImageCollection.load", [("id", Expr::from(id))]))
    }

    /// Keeps images passing `filter`.
    #[must_use]
    pub fn filter(&self, filter: &Filter) -> Self {
        Self(filter_collection(&self.0, filter))
    }

    /// Per-pixel, per-band median across the stack.
    #[must_use]
    pub fn median(&self) -> Image {
        Image::from_expr(Expr::call("reduce.median", [("collection", self.0.clone())]))
    }

    /// Number of images.
    #[must_use]
    pub fn size(&self) -> Expr {
        size_of(&self.0)
    }
}

/// A single feature: a geometry plus properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature(Expr);

computed_object!(Feature);

impl Feature {
    /// A feature with the given geometry and properties.
    #[must_use]
    pub fn new(geometry: &Geometry, properties: BTreeMap<String, serde_json::Value>) -> Self {
        Self(Expr::call(
            "Feature",
            [
                ("geometry", geometry.clone().into()),
                (
                    "metadata",
                    Expr::Dictionary(
                        properties
                            .into_iter()
                            .map(|(key, value)| (key, Expr::Constant(value)))
                            .collect(),
                    ),
                ),
            ],
        ))
    }
}

/// A lazy table of features.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection(Expr);

computed_object!(FeatureCollection);

impl FeatureCollection {
    /// A collection of literal features.
    #[must_use]
    pub fn from_features(features: impl IntoIterator<Item = Feature>) -> Self {
        Self(Expr::call(
            "Collection",
            [("features", Expr::array(features.into_iter().map(Expr::from)))],
        ))
    }

    /// Keeps features passing `filter`.
    #[must_use]
    pub fn filter(&self, filter: &Filter) -> Self {
        Self(filter_collection(&self.0, filter))
    }

    /// Adds a uniform random column in `[0, 1)` named `column`.
    #[must_use]
    pub fn random_column(&self, column: &str, seed: u64) -> Self {
        Self(Expr::call(
            "Collection.randomColumn",
            [
                ("collection", self.0.clone()),
                ("columnName", Expr::from(column)),
                ("seed", Expr::from(seed)),
                ("distribution", Expr::from("uniform")),
            ],
        ))
    }

    /// The first `max` features, ordered ascending by `key`.
    #[must_use]
    pub fn limit(&self, max: u32, key: &str) -> Self {
        Self(Expr::call(
            "Collection.limit",
            [
                ("collection", self.0.clone()),
                ("limit", Expr::from(max)),
                ("key", Expr::from(key)),
            ],
        ))
    }

    /// All features of `self` followed by all features of `other`.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        Self(Expr::call(
            "Collection.merge",
            [("collection1", self.0.clone()), ("collection2", other.0.clone())],
        ))
    }

    /// Number of features.
    #[must_use]
    pub fn size(&self) -> Expr {
        size_of(&self.0)
    }

    /// Applies a trained classifier to every feature.
    #[must_use]
    pub fn classify(&self, classifier: &Classifier, output_name: &str) -> Self {
        Self(Expr::call(
            "FeatureCollection.classify",
            [
                ("features", self.0.clone()),
                ("classifier", classifier.clone().into()),
                ("outputName", Expr::from(output_name)),
            ],
        ))
    }

    /// Cross-tabulates the `actual` and `predicted` integer properties.
    ///
    /// With `order`, rows and columns follow the listed values; otherwise
    /// the matrix spans `0..=max` of the observed values.
    #[must_use]
    pub fn error_matrix(&self, actual: &str, predicted: &str, order: Option<&[u8]>) -> Expr {
        let mut arguments = vec![
            ("collection", self.0.clone()),
            ("actual", Expr::from(actual)),
            ("predicted", Expr::from(predicted)),
        ];
        if let Some(order) = order {
            arguments.push(("order", Expr::constant(order.to_vec())));
        }
        Expr::call("Collection.errorMatrix", arguments)
    }
}

fn filter_collection(collection: &Expr, filter: &Filter) -> Expr {
    Expr::call(
        "Collection.filter",
        [("collection", collection.clone()), ("filter", filter.clone().into())],
    )
}

fn size_of(collection: &Expr) -> Expr {
    Expr::call("Collection.size", [("collection", collection.clone())])
}
