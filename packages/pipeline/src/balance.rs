//! Per-class balancing of the sampled training set.

use lulc_classification_models::{
    CLASS_PROPERTY, LandCoverClass,
    params::{BalanceParams, BalanceStrategy},
};
use lulc_engine::{FeatureCollection, Filter};

/// Random column added for draws and the train/test split.
pub const RANDOM_COLUMN: &str = "random";

/// The samples of one class.
#[must_use]
pub fn class_subset(samples: &FeatureCollection, class: LandCoverClass) -> FeatureCollection {
    samples.filter(&Filter::equals(CLASS_PROPERTY, u32::from(class.id())))
}

/// Builds the balanced set, class by class in class-id order.
///
/// Each class contributes up to `target_per_class` samples drawn in the
/// order of a seeded random column. With
/// [`BalanceStrategy::NaturalPlusSample`] every natural sample of the
/// class is merged in as well, ahead of the draw.
#[must_use]
pub fn balance(
    samples: &FeatureCollection,
    params: &BalanceParams,
    seeds: &[u64; LandCoverClass::COUNT],
) -> FeatureCollection {
    LandCoverClass::all().iter().zip(seeds).fold(
        FeatureCollection::from_features([]),
        |balanced, (class, seed)| {
            let natural = class_subset(samples, *class);
            let drawn = natural
                .random_column(RANDOM_COLUMN, *seed)
                .limit(params.target_per_class, RANDOM_COLUMN);
            match params.strategy {
                BalanceStrategy::NaturalPlusSample => balanced.merge(&natural).merge(&drawn),
                BalanceStrategy::Capped => balanced.merge(&drawn),
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use lulc_engine::{ComputedObject as _, Expr};

    use super::*;

    fn samples() -> FeatureCollection {
        FeatureCollection::from_expr(Expr::call("Test.samples", []))
    }

    #[test]
    fn natural_plus_sample_merges_both_per_class() {
        let balanced = balance(&samples(), &BalanceParams::default(), &[1, 2, 3, 4, 5]);
        let merges = balanced.expr().invocations_of("Collection.merge");
        assert_eq!(merges.len(), 2 * LandCoverClass::COUNT);

        let limits = balanced.expr().invocations_of("Collection.limit");
        assert!(limits.iter().all(|l| {
            l.argument("limit").and_then(Expr::as_constant) == Some(&serde_json::json!(150))
        }));
    }

    #[test]
    fn capped_only_merges_draws() {
        let params = BalanceParams {
            strategy: BalanceStrategy::Capped,
            ..BalanceParams::default()
        };
        let balanced = balance(&samples(), &params, &[1, 2, 3, 4, 5]);
        assert_eq!(
            balanced.expr().invocations_of("Collection.merge").len(),
            LandCoverClass::COUNT
        );
    }

    #[test]
    fn each_class_draw_uses_its_own_seed() {
        let balanced = balance(&samples(), &BalanceParams::default(), &[10, 20, 30, 40, 50]);
        let mut seeds: Vec<u64> = balanced
            .expr()
            .invocations_of("Collection.randomColumn")
            .into_iter()
            .filter_map(|r| r.argument("seed").and_then(Expr::as_constant))
            .filter_map(serde_json::Value::as_u64)
            .collect();
        seeds.sort_unstable();
        seeds.dedup();
        assert_eq!(seeds, [10, 20, 30, 40, 50]);
    }
}
