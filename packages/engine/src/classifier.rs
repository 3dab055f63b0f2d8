//! Supervised classifiers.

use lulc_classification_models::params::RandomForestParams;

use crate::{
    collection::FeatureCollection,
    expr::{Expr, computed_object},
};

/// A lazy classifier, untrained or trained.
#[derive(Debug, Clone, PartialEq)]
pub struct Classifier(Expr);

computed_object!(Classifier);

impl Classifier {
    /// An untrained random forest.
    #[must_use]
    pub fn random_forest(params: &RandomForestParams, seed: Option<u64>) -> Self {
        let mut arguments = vec![
            ("numberOfTrees", Expr::from(params.number_of_trees)),
            ("minLeafPopulation", Expr::from(params.min_leaf_population)),
            ("bagFraction", Expr::from(params.bag_fraction)),
        ];
        if let Some(variables) = params.variables_per_split {
            arguments.push(("variablesPerSplit", Expr::from(variables)));
        }
        if let Some(max_nodes) = params.max_nodes {
            arguments.push(("maxNodes", Expr::from(max_nodes)));
        }
        if let Some(seed) = seed {
            arguments.push(("seed", Expr::from(seed)));
        }
        Self(Expr::call("Classifier.smileRandomForest", arguments))
    }

    /// Fits the classifier to `features`, predicting `class_property` from
    /// `input_properties`.
    #[must_use]
    pub fn train<S: AsRef<str>>(
        &self,
        features: &FeatureCollection,
        class_property: &str,
        input_properties: impl IntoIterator<Item = S>,
    ) -> Self {
        Self(Expr::call(
            "Classifier.train",
            [
                ("classifier", self.0.clone()),
                ("features", features.clone().into()),
                ("classProperty", Expr::from(class_property)),
                ("inputProperties", Expr::strings(input_properties)),
            ],
        ))
    }
}
