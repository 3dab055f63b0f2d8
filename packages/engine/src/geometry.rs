//! Geometries in longitude/latitude (EPSG:4326).

use serde_json::json;

use crate::expr::{Expr, computed_object};

/// A server-side geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry(Expr);

computed_object!(Geometry);

/// A closed ring of `(longitude, latitude)` pairs.
pub type Ring = Vec<(f64, f64)>;

impl Geometry {
    /// A single point.
    #[must_use]
    pub fn point(lon: f64, lat: f64) -> Self {
        Self(Expr::call(
            "GeometryConstructors.Point",
            [("coordinates", Expr::constant(json!([lon, lat])))],
        ))
    }

    /// A polygon from its exterior ring followed by any holes.
    #[must_use]
    pub fn polygon(rings: &[Ring]) -> Self {
        Self(Expr::call(
            "GeometryConstructors.Polygon",
            [
                ("coordinates", Expr::constant(rings_json(rings))),
                ("evenOdd", Expr::from(true)),
            ],
        ))
    }

    /// A multipolygon; each entry is the ring list of one polygon.
    #[must_use]
    pub fn multi_polygon(polygons: &[Vec<Ring>]) -> Self {
        let coordinates: Vec<serde_json::Value> =
            polygons.iter().map(|rings| rings_json(rings)).collect();
        Self(Expr::call(
            "GeometryConstructors.MultiPolygon",
            [
                ("coordinates", Expr::constant(coordinates)),
                ("evenOdd", Expr::from(true)),
            ],
        ))
    }
}

fn rings_json(rings: &[Ring]) -> serde_json::Value {
    rings
        .iter()
        .map(|ring| {
            ring.iter()
                .map(|(lon, lat)| json!([lon, lat]))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>()
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ComputedObject as _;

    #[test]
    fn point_coordinates_are_lon_lat() {
        let point = Geometry::point(78.5, 17.25);
        assert_eq!(
            point.expr().argument("coordinates").and_then(Expr::as_constant),
            Some(&json!([78.5, 17.25]))
        );
    }

    #[test]
    fn polygon_nests_rings() {
        let ring = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)];
        let polygon = Geometry::polygon(&[ring]);
        assert_eq!(
            polygon.expr().function_name(),
            Some("GeometryConstructors.Polygon")
        );
        assert_eq!(
            polygon
                .expr()
                .argument("coordinates")
                .and_then(Expr::as_constant),
            Some(&json!([[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]))
        );
    }
}
