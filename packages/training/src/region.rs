//! The region of interest.

use std::path::Path;

use geo::{Contains, GeodesicArea, MultiPolygon, Point, Polygon};
use geojson::GeoJson;
use lulc_engine::{Geometry, geometry::Ring};

use crate::{TrainingError, read_file};

/// The polygonal area every query is bounded by.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    shape: MultiPolygon<f64>,
}

impl Region {
    /// Loads a region from a `GeoJSON` file.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError`] if the file cannot be read or holds no
    /// polygons.
    pub fn load(path: &Path) -> Result<Self, TrainingError> {
        let region = Self::parse(&read_file(path)?)?;
        log::info!(
            "Loaded region of interest from {} ({} polygon(s), {:.2} ha)",
            path.display(),
            region.shape.0.len(),
            region.area_square_meters() / lulc_classification_models::metrics::SQUARE_METERS_PER_HECTARE
        );
        Ok(region)
    }

    /// Parses a region from `GeoJSON` text.
    ///
    /// Accepts a bare geometry, a feature, or a feature collection. All
    /// polygons and multipolygons found are combined into one region.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Geometry`] if a non-polygonal geometry is
    /// present or no polygon is found.
    pub fn parse(text: &str) -> Result<Self, TrainingError> {
        let geojson: GeoJson = text.parse()?;
        let geometries: Vec<geojson::Geometry> = match geojson {
            GeoJson::Geometry(geometry) => vec![geometry],
            GeoJson::Feature(feature) => feature.geometry.into_iter().collect(),
            GeoJson::FeatureCollection(collection) => collection
                .features
                .into_iter()
                .filter_map(|feature| feature.geometry)
                .collect(),
        };

        let mut polygons = Vec::new();
        for geometry in geometries {
            match geo::Geometry::<f64>::try_from(geometry)? {
                geo::Geometry::Polygon(polygon) => polygons.push(polygon),
                geo::Geometry::MultiPolygon(multi) => polygons.extend(multi.0),
                other => {
                    return Err(TrainingError::Geometry {
                        message: format!(
                            "region must be polygonal, found {}",
                            geometry_kind(&other)
                        ),
                    });
                }
            }
        }

        if polygons.is_empty() {
            return Err(TrainingError::Geometry {
                message: "region contains no polygons".to_string(),
            });
        }

        Ok(Self {
            shape: MultiPolygon(polygons),
        })
    }

    /// Geodesic area on the WGS84 ellipsoid, in square metres.
    #[must_use]
    pub fn area_square_meters(&self) -> f64 {
        self.shape.geodesic_area_unsigned()
    }

    /// Whether `point` lies inside the region.
    #[must_use]
    pub fn contains(&self, point: &Point<f64>) -> bool {
        self.shape.contains(point)
    }

    /// The region as an engine geometry.
    #[must_use]
    pub fn to_geometry(&self) -> Geometry {
        match self.shape.0.as_slice() {
            [polygon] => Geometry::polygon(&rings(polygon)),
            polygons => Geometry::multi_polygon(&polygons.iter().map(rings).collect::<Vec<_>>()),
        }
    }
}

fn rings(polygon: &Polygon<f64>) -> Vec<Ring> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| ring.coords().map(|c| (c.x, c.y)).collect())
        .collect()
}

pub(crate) const fn geometry_kind(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::Polygon(_) => "Polygon",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use lulc_engine::ComputedObject as _;

    use super::*;

    const SQUARE: &str = r#"{
        "type": "Feature",
        "properties": {},
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[78.0, 17.0], [78.01, 17.0], [78.01, 17.01], [78.0, 17.01], [78.0, 17.0]]]
        }
    }"#;

    #[test]
    fn parses_feature_polygon() {
        let region = Region::parse(SQUARE).unwrap();
        assert!(region.contains(&Point::new(78.005, 17.005)));
        assert!(!region.contains(&Point::new(78.02, 17.005)));
    }

    #[test]
    fn geodesic_area_of_small_square() {
        // 0.01 degree square near 17N is roughly 1.06 km by 1.11 km.
        let area = Region::parse(SQUARE).unwrap().area_square_meters();
        assert!((1_150_000.0..1_200_000.0).contains(&area), "area was {area}");
    }

    #[test]
    fn collections_are_merged() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry": {"type": "Polygon",
                  "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}},
                {"type": "Feature", "properties": {}, "geometry": {"type": "MultiPolygon",
                  "coordinates": [[[[2, 2], [3, 2], [3, 3], [2, 2]]], [[[4, 4], [5, 4], [5, 5], [4, 4]]]]}}
            ]
        }"#;
        let region = Region::parse(text).unwrap();
        for inside in [Point::new(0.7, 0.3), Point::new(2.7, 2.3), Point::new(4.7, 4.3)] {
            assert!(region.contains(&inside));
        }
        assert_eq!(
            region.to_geometry().expr().function_name(),
            Some("GeometryConstructors.MultiPolygon")
        );
    }

    #[test]
    fn single_polygon_encodes_as_polygon() {
        let geometry = Region::parse(SQUARE).unwrap().to_geometry();
        assert_eq!(
            geometry.expr().function_name(),
            Some("GeometryConstructors.Polygon")
        );
    }

    #[test]
    fn rejects_points() {
        let err = Region::parse(r#"{"type": "Point", "coordinates": [1, 2]}"#).unwrap_err();
        assert!(err.to_string().contains("Point"));
    }

    #[test]
    fn rejects_empty_collection() {
        let err = Region::parse(r#"{"type": "FeatureCollection", "features": []}"#).unwrap_err();
        assert!(matches!(err, TrainingError::Geometry { .. }));
    }
}
