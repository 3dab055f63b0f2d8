//! Materialized results of a run.

use std::{collections::BTreeMap, path::PathBuf};

use lulc_classification_models::{AreaByClass, ConfusionMatrix, DateRange, LandCoverClass};
use serde::{Deserialize, Serialize};

/// Results of every period of a run, in evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Seed the run's random choices were derived from.
    pub seed: u64,
    /// Geodesic area of the region of interest in hectares.
    pub region_hectares: f64,
    /// Per-period results.
    pub periods: Vec<PeriodReport>,
    /// Rendered preview composite, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<LayerOutput>,
}

/// Results of one classified period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReport {
    /// Period label, e.g. `"2018"`.
    pub label: String,
    /// Acquisition window.
    pub date_range: DateRange,
    /// Scenes that passed the region, date and cloud filters.
    pub scene_count: u64,
    /// Test-partition error matrix, rows actual and columns predicted.
    pub confusion_matrix: ConfusionMatrix,
    /// Overall accuracy in `[0, 1]`.
    pub overall_accuracy: f64,
    /// Cohen's kappa.
    pub kappa: f64,
    /// Producer's accuracy per class id.
    pub producers_accuracy: Vec<Option<f64>>,
    /// Consumer's accuracy per class id.
    pub consumers_accuracy: Vec<Option<f64>>,
    /// Samples in the training partition.
    pub train_size: u64,
    /// Samples in the test partition.
    pub test_size: u64,
    /// Samples per class in the balanced set.
    pub balanced_counts: BTreeMap<LandCoverClass, u64>,
    /// Classes with no balanced samples.
    pub empty_classes: Vec<LandCoverClass>,
    /// Smoothed classification area per class.
    pub area: AreaByClass,
    /// Whether the classified area fits inside the region.
    pub area_within_region: bool,
    /// Rendered display layers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<LayerOutput>,
}

impl PeriodReport {
    /// Overall accuracy as a percentage.
    #[must_use]
    pub fn accuracy_percent(&self) -> f64 {
        self.overall_accuracy * 100.0
    }
}

/// A display layer written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerOutput {
    /// Layer name, e.g. `"NDVI 2018"`.
    pub name: String,
    /// PNG file.
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn period_report_serializes_to_json_and_back() {
        let mut area = AreaByClass::new();
        area.add(LandCoverClass::Water, 20_000.0);
        let report = PeriodReport {
            label: "2018".to_string(),
            date_range: DateRange::new(
                NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2018, 12, 31).unwrap(),
            )
            .unwrap(),
            scene_count: 4,
            confusion_matrix: ConfusionMatrix::from_rows(vec![vec![3, 1], vec![0, 4]]).unwrap(),
            overall_accuracy: 0.875,
            kappa: 0.75,
            producers_accuracy: vec![Some(0.75), Some(1.0)],
            consumers_accuracy: vec![Some(1.0), Some(0.8)],
            train_size: 30,
            test_size: 8,
            balanced_counts: BTreeMap::from([(LandCoverClass::Water, 20), (LandCoverClass::Forest, 0)]),
            empty_classes: vec![LandCoverClass::Forest],
            area,
            area_within_region: true,
            layers: Vec::new(),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["confusion_matrix"], serde_json::json!([[3, 1], [0, 4]]));
        assert_eq!(json["balanced_counts"]["water"], 20);
        assert!(json.get("layers").is_none());

        let back: PeriodReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
        assert!((back.accuracy_percent() - 87.5).abs() < 1e-9);
    }
}
