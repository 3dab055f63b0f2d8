//! Labeled training points.

use std::{collections::BTreeMap, path::Path};

use geo::Point;
use geojson::GeoJson;
use lulc_classification_models::{CLASS_PROPERTY, LandCoverClass};
use lulc_engine::{Feature, FeatureCollection, Geometry};

use crate::{Region, TrainingError, read_file, region::geometry_kind};

/// One labeled sample location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingPoint {
    /// Land-cover class observed at the point.
    pub class: LandCoverClass,
    /// Longitude/latitude.
    pub location: Point<f64>,
}

/// The merged training points of every class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingPoints {
    points: Vec<TrainingPoint>,
}

impl TrainingPoints {
    /// Loads and merges one `GeoJSON` file per class.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError`] if any file cannot be read or parsed.
    pub fn load<'a>(
        sources: impl IntoIterator<Item = (LandCoverClass, &'a Path)>,
    ) -> Result<Self, TrainingError> {
        let mut merged = Self::default();
        for (class, path) in sources {
            let loaded = Self::parse(class, &read_file(path)?)?;
            log::info!(
                "Loaded {} {class} training point(s) from {}",
                loaded.points.len(),
                path.display()
            );
            merged.merge(loaded);
        }
        Ok(merged)
    }

    /// Parses the points of a single class from `GeoJSON` text.
    ///
    /// Point and multipoint geometries are accepted. A feature carrying a
    /// `Class` property must agree with `class`.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Geometry`] for non-point geometries or a
    /// conflicting `Class` property.
    pub fn parse(class: LandCoverClass, text: &str) -> Result<Self, TrainingError> {
        let geojson: GeoJson = text.parse()?;
        let features = match geojson {
            GeoJson::Geometry(geometry) => vec![(geometry, None)],
            GeoJson::Feature(feature) => labeled(feature).into_iter().collect(),
            GeoJson::FeatureCollection(collection) => {
                collection.features.into_iter().filter_map(labeled).collect()
            }
        };

        let mut points = Vec::new();
        for (geometry, label) in features {
            if let Some(label) = label
                && label != i64::from(class.id())
            {
                return Err(TrainingError::Geometry {
                    message: format!(
                        "{class} point labeled with {CLASS_PROPERTY} {label}, expected {}",
                        class.id()
                    ),
                });
            }
            match geo::Geometry::<f64>::try_from(geometry)? {
                geo::Geometry::Point(location) => points.push(TrainingPoint { class, location }),
                geo::Geometry::MultiPoint(multi) => points.extend(
                    multi
                        .0
                        .into_iter()
                        .map(|location| TrainingPoint { class, location }),
                ),
                other => {
                    return Err(TrainingError::Geometry {
                        message: format!(
                            "{class} training data must be points, found {}",
                            geometry_kind(&other)
                        ),
                    });
                }
            }
        }
        Ok(Self { points })
    }

    /// Appends the points of `other`.
    pub fn merge(&mut self, other: Self) {
        self.points.extend(other.points);
    }

    /// Point count per class, including classes with no points.
    #[must_use]
    pub fn class_counts(&self) -> BTreeMap<LandCoverClass, usize> {
        let mut counts: BTreeMap<LandCoverClass, usize> =
            LandCoverClass::all().iter().map(|c| (*c, 0)).collect();
        for point in &self.points {
            *counts.entry(point.class).or_default() += 1;
        }
        counts
    }

    /// Classes with no points, in class-id order.
    #[must_use]
    pub fn missing_classes(&self) -> Vec<LandCoverClass> {
        self.class_counts()
            .into_iter()
            .filter_map(|(class, count)| (count == 0).then_some(class))
            .collect()
    }

    /// Fails if any class has no points.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::MissingClasses`] listing the empty classes.
    pub fn require_all_classes(&self) -> Result<(), TrainingError> {
        let classes = self.missing_classes();
        if classes.is_empty() {
            Ok(())
        } else {
            Err(TrainingError::MissingClasses { classes })
        }
    }

    /// Number of points falling outside `region`.
    #[must_use]
    pub fn count_outside(&self, region: &Region) -> usize {
        self.points
            .iter()
            .filter(|point| !region.contains(&point.location))
            .count()
    }

    /// The points as an engine feature collection with a `Class` property.
    #[must_use]
    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection::from_features(self.points.iter().map(|point| {
            Feature::new(
                &Geometry::point(point.location.x(), point.location.y()),
                BTreeMap::from([(CLASS_PROPERTY.to_string(), point.class.id().into())]),
            )
        }))
    }
}

fn labeled(feature: geojson::Feature) -> Option<(geojson::Geometry, Option<i64>)> {
    let label = feature
        .property(CLASS_PROPERTY)
        .and_then(serde_json::Value::as_i64);
    feature.geometry.map(|geometry| (geometry, label))
}

#[cfg(test)]
mod tests {
    use lulc_engine::{ComputedObject as _, Expr};

    use super::*;

    const WATER: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"Class": 0}, "geometry": {"type": "Point", "coordinates": [78.001, 17.001]}},
            {"type": "Feature", "properties": {}, "geometry": {"type": "MultiPoint", "coordinates": [[78.002, 17.002], [78.5, 17.5]]}}
        ]
    }"#;

    const FOREST: &str = r#"{"type": "Point", "coordinates": [78.003, 17.003]}"#;

    fn merged() -> TrainingPoints {
        let mut points = TrainingPoints::parse(LandCoverClass::Water, WATER).unwrap();
        points.merge(TrainingPoints::parse(LandCoverClass::Forest, FOREST).unwrap());
        points
    }

    #[test]
    fn counts_include_empty_classes() {
        let counts = merged().class_counts();
        assert_eq!(counts.len(), LandCoverClass::COUNT);
        assert_eq!(counts[&LandCoverClass::Water], 3);
        assert_eq!(counts[&LandCoverClass::Forest], 1);
        assert_eq!(counts[&LandCoverClass::UrbanArea], 0);
    }

    #[test]
    fn missing_classes_are_detected() {
        let points = merged();
        assert_eq!(
            points.missing_classes(),
            [
                LandCoverClass::Agriculture,
                LandCoverClass::BarrenLand,
                LandCoverClass::UrbanArea
            ]
        );
        assert!(matches!(
            points.require_all_classes(),
            Err(TrainingError::MissingClasses { classes }) if classes.len() == 3
        ));
    }

    #[test]
    fn conflicting_label_is_rejected() {
        let err = TrainingPoints::parse(LandCoverClass::Forest, WATER).unwrap_err();
        assert!(err.to_string().contains("Class 0"));
    }

    #[test]
    fn lines_are_rejected() {
        let text = r#"{"type": "LineString", "coordinates": [[0, 0], [1, 1]]}"#;
        let err = TrainingPoints::parse(LandCoverClass::Water, text).unwrap_err();
        assert!(err.to_string().contains("LineString"));
    }

    #[test]
    fn points_outside_region_are_counted() {
        let region = Region::parse(
            r#"{"type": "Polygon", "coordinates": [[[78.0, 17.0], [78.01, 17.0], [78.01, 17.01], [78.0, 17.01], [78.0, 17.0]]]}"#,
        )
        .unwrap();
        assert_eq!(merged().count_outside(&region), 1);
    }

    #[test]
    fn feature_collection_carries_class_ids() {
        let collection = merged().to_feature_collection();
        let Some(Expr::Array(features)) = collection.expr().argument("features") else {
            panic!("features is not an array");
        };
        assert_eq!(features.len(), 4);
        let last = features[3].argument("metadata").unwrap();
        assert_eq!(last, &Expr::dictionary([("Class", Expr::constant(2))]));
    }
}
