//! Console and JSON rendering of run results.

use std::{fmt, path::Path};

use lulc_classification_models::LandCoverClass;
use lulc_pipeline_models::{PeriodReport, RunReport};

use crate::{PipelineError, evaluate::write_file};

/// Console summary of one period's results.
pub struct PeriodSummary<'a>(pub &'a PeriodReport);

impl fmt::Display for PeriodSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let label = &report.label;
        writeln!(f, "Results for {label}:")?;
        writeln!(f, "Confusion Matrix: {}", report.confusion_matrix)?;
        writeln!(f, "Overall Accuracy (%): {:.2}", report.accuracy_percent())?;
        writeln!(f, "Kappa: {:.4}", report.kappa)?;
        writeln!(
            f,
            "Samples: {} train, {} test",
            report.train_size, report.test_size
        )?;
        if !report.empty_classes.is_empty() {
            let names: Vec<String> = report.empty_classes.iter().map(ToString::to_string).collect();
            writeln!(f, "Classes without samples: {}", names.join(", "))?;
        }
        writeln!(f, "Area by Class ({label}):")?;
        for class in LandCoverClass::all() {
            if let Some(hectares) = report.area.hectares(*class) {
                writeln!(f, "{class}: {hectares:.2} hectares")?;
            }
        }
        Ok(())
    }
}

/// Formats a period's results the way they are printed to the console.
#[must_use]
pub fn render_period(report: &PeriodReport) -> String {
    PeriodSummary(report).to_string()
}

/// Writes the run report as pretty-printed JSON, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns [`PipelineError::Json`] if serialization fails or
/// [`PipelineError::Io`] if the file cannot be written.
pub async fn write_json(report: &RunReport, path: &Path) -> Result<(), PipelineError> {
    let json = serde_json::to_vec_pretty(report)?;
    write_file(path, &json).await?;
    log::info!("Wrote report to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;
    use lulc_classification_models::{AreaByClass, ConfusionMatrix, DateRange};

    use super::*;

    fn report() -> PeriodReport {
        let mut area = AreaByClass::new();
        area.add(LandCoverClass::Water, 123_400.0);
        area.add(LandCoverClass::UrbanArea, 5_000.0);
        let matrix = ConfusionMatrix::from_rows(vec![
            vec![9, 1, 0, 0, 0],
            vec![0, 10, 0, 0, 0],
            vec![0, 0, 10, 0, 0],
            vec![0, 0, 0, 10, 0],
            vec![0, 0, 0, 0, 0],
        ])
        .unwrap();
        PeriodReport {
            label: "2024".to_string(),
            date_range: DateRange::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            )
            .unwrap(),
            scene_count: 3,
            overall_accuracy: matrix.accuracy(),
            kappa: matrix.kappa(),
            producers_accuracy: matrix.producers_accuracy(),
            consumers_accuracy: matrix.consumers_accuracy(),
            confusion_matrix: matrix,
            train_size: 160,
            test_size: 40,
            balanced_counts: BTreeMap::new(),
            empty_classes: vec![LandCoverClass::UrbanArea],
            area,
            area_within_region: true,
            layers: Vec::new(),
        }
    }

    #[test]
    fn console_output_lists_metrics_and_areas() {
        let text = render_period(&report());
        assert!(text.starts_with("Results for 2024:\nConfusion Matrix: [[9,1,0,0,0],[0,10"));
        assert!(text.contains("Overall Accuracy (%): 97.50\n"));
        assert!(text.contains("Area by Class (2024):\n"));
        assert!(text.contains("Water: 12.34 hectares\n"));
        assert!(text.contains("Urban_area: 0.50 hectares\n"));
        assert!(!text.contains("Forest:"));
        assert!(text.contains("Classes without samples: Urban_area\n"));
    }

    #[tokio::test]
    async fn json_report_is_written() {
        let path = std::env::temp_dir()
            .join(format!("lulc-report-{}", std::process::id()))
            .join("report.json");
        let run = RunReport {
            seed: 42,
            region_hectares: 100.0,
            periods: vec![report()],
            preview: None,
        };
        write_json(&run, &path).await.unwrap();

        let back: RunReport =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(back.seed, 42);
        assert_eq!(back.periods[0].label, "2024");
        assert_eq!(back.periods[0].confusion_matrix, run.periods[0].confusion_matrix);
        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }
}
