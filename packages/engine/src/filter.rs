//! Collection filters.

use lulc_classification_models::DateRange;

use crate::{
    expr::{Expr, computed_object},
    geometry::Geometry,
};

/// Property holding an image's acquisition time in epoch milliseconds.
pub const TIME_START_PROPERTY: &str = "system:time_start";

/// A server-side filter predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter(Expr);

computed_object!(Filter);

impl Filter {
    /// Elements whose footprint intersects `geometry`.
    #[must_use]
    pub fn intersects(geometry: &Geometry) -> Self {
        Self(Expr::call(
            "Filter.intersects",
            [
                ("leftField", Expr::from(".all")),
                ("rightValue", geometry.clone().into()),
            ],
        ))
    }

    /// Elements acquired within `range`, start inclusive and end exclusive.
    #[must_use]
    pub fn date(range: &DateRange) -> Self {
        let range = Expr::call(
            "DateRange",
            [
                ("start", Expr::from(range.start_millis())),
                ("end", Expr::from(range.end_millis())),
            ],
        );
        Self(Expr::call(
            "Filter.dateRangeContains",
            [
                ("leftValue", range),
                ("rightField", Expr::from(TIME_START_PROPERTY)),
            ],
        ))
    }

    /// Elements whose `property` is strictly less than `value`.
    #[must_use]
    pub fn less_than(property: &str, value: impl Into<Expr>) -> Self {
        Self::comparison("Filter.lessThan", property, value.into())
    }

    /// Elements whose `property` is greater than or equal to `value`.
    #[must_use]
    pub fn greater_than_or_equals(property: &str, value: impl Into<Expr>) -> Self {
        Self::comparison("Filter.greaterThanOrEquals", property, value.into())
    }

    /// Elements whose `property` equals `value`.
    #[must_use]
    pub fn equals(property: &str, value: impl Into<Expr>) -> Self {
        Self::comparison("Filter.equals", property, value.into())
    }

    fn comparison(function: &str, property: &str, value: Expr) -> Self {
        Self(Expr::call(
            function,
            [("leftField", Expr::from(property)), ("rightValue", value)],
        ))
    }
}
