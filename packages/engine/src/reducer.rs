//! Reducers and focal kernels.

use lulc_classification_models::params::{KernelShape, KernelUnits, SmoothingParams};

use crate::expr::{Expr, computed_object};

/// A lazy aggregation function.
#[derive(Debug, Clone, PartialEq)]
pub struct Reducer(Expr);

computed_object!(Reducer);

impl Reducer {
    /// Most frequent value.
    #[must_use]
    pub fn mode() -> Self {
        Self(Expr::call("Reducer.mode", []))
    }

    /// Sum of values.
    #[must_use]
    pub fn sum() -> Self {
        Self(Expr::call("Reducer.sum", []))
    }

    /// Applies `self` separately per distinct value of input `group_field`,
    /// emitting `{"groups": [{group_name: .., <outputs>}, ..]}`.
    #[must_use]
    pub fn group(&self, group_field: u32, group_name: &str) -> Self {
        Self(Expr::call(
            "Reducer.group",
            [
                ("reducer", self.0.clone()),
                ("groupField", Expr::from(group_field)),
                ("groupName", Expr::from(group_name)),
            ],
        ))
    }
}

/// A lazy neighborhood kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel(Expr);

computed_object!(Kernel);

impl Kernel {
    /// A disc of `radius`.
    #[must_use]
    pub fn circle(radius: f64, units: KernelUnits) -> Self {
        Self::shaped("Kernel.circle", radius, units)
    }

    /// A square of side `2 * radius + 1`.
    #[must_use]
    pub fn square(radius: f64, units: KernelUnits) -> Self {
        Self::shaped("Kernel.square", radius, units)
    }

    /// The kernel described by smoothing settings.
    #[must_use]
    pub fn from_params(params: &SmoothingParams) -> Self {
        match params.kernel {
            KernelShape::Circle => Self::circle(params.radius, params.units),
            KernelShape::Square => Self::square(params.radius, params.units),
        }
    }

    fn shaped(function: &str, radius: f64, units: KernelUnits) -> Self {
        Self(Expr::call(
            function,
            [
                ("radius", Expr::from(radius)),
                ("units", Expr::from(units.as_ref())),
                ("normalize", Expr::from(true)),
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ComputedObject as _;

    #[test]
    fn grouped_sum_nests_reducer() {
        let grouped = Reducer::sum().group(1, "class");
        assert_eq!(grouped.expr().argument("reducer"), Some(Reducer::sum().expr()));
        assert_eq!(
            grouped.expr().argument("groupName").and_then(Expr::as_constant),
            Some(&serde_json::json!("class"))
        );
    }

    #[test]
    fn default_smoothing_is_circle_of_two_pixels() {
        let kernel = Kernel::from_params(&SmoothingParams::default());
        assert_eq!(kernel.expr().function_name(), Some("Kernel.circle"));
        assert_eq!(
            kernel.expr().argument("radius").and_then(Expr::as_constant),
            Some(&serde_json::json!(2.0))
        );
        assert_eq!(
            kernel.expr().argument("units").and_then(Expr::as_constant),
            Some(&serde_json::json!("pixels"))
        );
    }
}
