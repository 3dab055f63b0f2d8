//! The lazy per-period classification graph.
//!
//! [`classify`] describes the whole computation for one period: composite,
//! feature indices, sampling, balancing, split, random forest, smoothing,
//! error matrix and area reduction. Nothing is evaluated until
//! [`ClassificationGraph::evaluate`](crate::evaluate) is awaited.

use lulc_classification_models::{
    Band, CLASS_PROPERTY, DateRange, LandCoverClass, PREDICTION_PROPERTY, feature_names,
};
use lulc_engine::{
    Classifier, ComputedObject as _, Expr, FeatureCollection, Filter, Geometry, Image,
    ImageCollection, Kernel, Reducer, encode, image::SampleOptions,
};
use lulc_pipeline_models::{PipelineConfig, config::CollectionSettings};

use crate::{
    balance::{RANDOM_COLUMN, balance, class_subset},
    indices::with_feature_indices,
    seeds::PeriodSeeds,
};

/// Name of the group key in the area reduction output.
pub const AREA_GROUP_NAME: &str = "class";

/// One period to classify.
#[derive(Debug, Clone, PartialEq)]
pub struct Period {
    /// Report label.
    pub label: String,
    /// Acquisition window.
    pub range: DateRange,
    /// Scene cloud cover threshold in percent.
    pub max_cloud_percent: f64,
    /// Seeds for the random draws.
    pub seeds: PeriodSeeds,
}

/// Scenes over `roi` acquired within `range` with cloud cover below
/// `max_cloud_percent`.
#[must_use]
pub fn scenes(
    collection: &CollectionSettings,
    roi: &Geometry,
    range: &DateRange,
    max_cloud_percent: f64,
) -> ImageCollection {
    ImageCollection::load(&collection.id)
        .filter(&Filter::intersects(roi))
        .filter(&Filter::date(range))
        .filter(&Filter::less_than(&collection.cloud_property, max_cloud_percent))
}

/// Median composite of the raw bands, clipped to `roi`.
#[must_use]
pub fn composite(scenes: &ImageCollection, roi: &Geometry) -> Image {
    scenes
        .median()
        .select(Band::RAW.iter().map(AsRef::<str>::as_ref))
        .clip(roi)
}

/// Every lazy artifact of one period.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationGraph {
    /// The period this graph classifies.
    pub period: Period,
    /// Filtered scene collection.
    pub scenes: ImageCollection,
    /// Median composite of the raw bands.
    pub composite: Image,
    /// The 16 classifier input bands.
    pub features: Image,
    /// Training points sampled from `features`.
    pub samples: FeatureCollection,
    /// Balanced samples.
    pub balanced: FeatureCollection,
    /// Training partition.
    pub train: FeatureCollection,
    /// Held-out test partition.
    pub test: FeatureCollection,
    /// Trained random forest.
    pub classifier: Classifier,
    /// Smoothed per-pixel classification.
    pub classification: Image,
    /// Test-partition error matrix as a nested array.
    pub confusion_matrix: Expr,
    /// Pixel area grouped by smoothed class.
    pub areas: Expr,
}

/// Builds the classification graph of `period`.
#[must_use]
pub fn classify(
    period: Period,
    training_points: &FeatureCollection,
    roi: &Geometry,
    config: &PipelineConfig,
) -> ClassificationGraph {
    let scenes = scenes(
        &config.collection,
        roi,
        &period.range,
        period.max_cloud_percent,
    );
    let composite = composite(&scenes, roi);
    let bands = feature_names();
    let features = with_feature_indices(&composite).select(&bands);

    let samples = features.sample_regions(
        training_points,
        [CLASS_PROPERTY],
        SampleOptions {
            scale: config.sampling.scale,
            tile_scale: config.sampling.tile_scale,
            geometries: config.sampling.geometries,
        },
    );
    let balanced = balance(&samples, &config.balance, &period.seeds.class_draws);

    let split = balanced.random_column(RANDOM_COLUMN, period.seeds.split);
    let train = split.filter(&Filter::less_than(
        RANDOM_COLUMN,
        config.split.train_fraction,
    ));
    let test = split.filter(&Filter::greater_than_or_equals(
        RANDOM_COLUMN,
        config.split.train_fraction,
    ));

    let classifier = Classifier::random_forest(&config.classifier, Some(period.seeds.classifier))
        .train(&train, CLASS_PROPERTY, &bands);

    let classification = features
        .classify(&classifier, PREDICTION_PROPERTY)
        .reduce_neighborhood(&Reducer::mode(), &Kernel::from_params(&config.smoothing))
        .rename([PREDICTION_PROPERTY]);

    let class_ids: Vec<u8> = LandCoverClass::all().iter().map(|c| c.id()).collect();
    let confusion_matrix = Expr::call(
        "ConfusionMatrix.array",
        [(
            "confusionMatrix",
            test.classify(&classifier, PREDICTION_PROPERTY).error_matrix(
                CLASS_PROPERTY,
                PREDICTION_PROPERTY,
                Some(class_ids.as_slice()),
            ),
        )],
    );

    let areas = Image::pixel_area().add_bands(&classification).reduce_region(
        &Reducer::sum().group(1, AREA_GROUP_NAME),
        roi,
        config.area.scale,
        config.area.max_pixels,
    );

    ClassificationGraph {
        period,
        scenes,
        composite,
        features,
        samples,
        balanced,
        train,
        test,
        classifier,
        classification,
        confusion_matrix,
        areas,
    }
}

impl ClassificationGraph {
    /// Number of scenes behind the composite.
    #[must_use]
    pub fn scene_count(&self) -> Expr {
        self.scenes.size()
    }

    /// The error matrix together with partition sizes and per-class
    /// balanced counts, evaluated in a single request.
    #[must_use]
    pub fn accuracy_summary(&self) -> Expr {
        let class_counts = Expr::array(
            LandCoverClass::all()
                .iter()
                .map(|class| class_subset(&self.balanced, *class).size()),
        );
        Expr::dictionary([
            ("matrix", self.confusion_matrix.clone()),
            ("train_size", self.train.size()),
            ("test_size", self.test.size()),
            ("class_counts", class_counts),
        ])
    }

    /// The requests this graph issues, encoded, keyed by purpose.
    #[must_use]
    pub fn encoded(&self) -> serde_json::Value {
        serde_json::json!({
            "label": self.period.label,
            "scene_count": encode(&self.scene_count()),
            "accuracy": encode(&self.accuracy_summary()),
            "areas": encode(&self.areas),
            "classification": encode(self.classification.expr()),
        })
    }
}
