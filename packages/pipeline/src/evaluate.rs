//! Materializes a period's graph into a [`PeriodReport`].
//!
//! Requests are issued in a fixed order: scene count, accuracy summary,
//! area reduction, then one thumbnail per display layer. Scene count comes
//! first so an empty period fails before any classifier is trained.

use std::{collections::BTreeMap, path::Path};

use lulc_classification_models::{
    AreaByClass, ConfusionMatrix, LandCoverClass, metrics::SQUARE_METERS_PER_HECTARE,
};
use lulc_engine::{Engine, compute_typed};
use lulc_pipeline_models::{LayerOutput, PeriodReport};
use serde::Deserialize;

use crate::{
    PipelineError, graph::ClassificationGraph, layers::period_layers,
    progress::ProgressCallback,
};

/// Relative slack allowed between classified and region area.
pub const AREA_TOLERANCE: f64 = 0.01;

/// Display layers rendered per period.
const LAYERS_PER_PERIOD: u64 = 4;

/// Remote requests one period issues.
#[must_use]
pub const fn period_steps(thumbnails: bool) -> u64 {
    if thumbnails { 3 + LAYERS_PER_PERIOD } else { 3 }
}

/// What a period is evaluated against.
pub struct EvaluationContext<'a> {
    /// Evaluates the graph.
    pub engine: &'a dyn Engine,
    /// Receives one step per request.
    pub progress: &'a dyn ProgressCallback,
    /// Geodesic region area, for the area sanity check.
    pub region_square_meters: f64,
    /// Where to write layer thumbnails; none are rendered if unset.
    pub thumbnails_dir: Option<&'a Path>,
}

#[derive(Debug, Deserialize)]
struct AccuracySummary {
    matrix: Vec<Vec<u64>>,
    train_size: u64,
    test_size: u64,
    class_counts: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct GroupedAreas {
    groups: Vec<AreaGroup>,
}

#[derive(Debug, Deserialize)]
struct AreaGroup {
    class: serde_json::Value,
    sum: f64,
}

impl ClassificationGraph {
    /// Evaluates the graph and assembles the period's report.
    ///
    /// # Errors
    ///
    /// * [`PipelineError::NoScenes`] if no scene passed the filters
    /// * [`PipelineError::Decode`] if a result has an unexpected shape
    /// * [`PipelineError::Engine`] if a request fails
    /// * [`PipelineError::Io`] if a thumbnail cannot be written
    pub async fn evaluate(
        &self,
        ctx: &EvaluationContext<'_>,
    ) -> Result<PeriodReport, PipelineError> {
        let label = &self.period.label;

        ctx.progress.set_message(format!("{label}: counting scenes"));
        let scene_count: u64 = compute_typed(ctx.engine, &self.scene_count()).await?;
        ctx.progress.inc(1);
        if scene_count == 0 {
            return Err(PipelineError::NoScenes {
                label: label.clone(),
                range: self.period.range,
                max_cloud_percent: self.period.max_cloud_percent,
            });
        }
        log::info!("{label}: {scene_count} scenes in {}", self.period.range);

        ctx.progress.set_message(format!("{label}: training and assessing"));
        let summary: AccuracySummary =
            compute_typed(ctx.engine, &self.accuracy_summary()).await?;
        ctx.progress.inc(1);
        let confusion_matrix = decode_matrix(summary.matrix)?;
        let balanced_counts = decode_class_counts(&summary.class_counts)?;
        let empty_classes: Vec<LandCoverClass> = balanced_counts
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(class, _)| *class)
            .collect();
        for class in &empty_classes {
            log::warn!("{label}: no training samples for {class}");
        }
        if summary.test_size == 0 {
            log::warn!("{label}: test partition is empty; accuracy is undefined");
        }

        ctx.progress.set_message(format!("{label}: computing areas"));
        let area = decode_areas(&ctx.engine.compute(&self.areas).await?)?;
        ctx.progress.inc(1);
        let area_within_region = area.fits_within(ctx.region_square_meters, AREA_TOLERANCE);
        if !area_within_region {
            log::warn!(
                "{label}: classified area {:.2} ha exceeds region area {:.2} ha",
                area.total_hectares(),
                ctx.region_square_meters / SQUARE_METERS_PER_HECTARE
            );
        }

        let layers = match ctx.thumbnails_dir {
            Some(dir) => self.render_layers(ctx, dir).await?,
            None => Vec::new(),
        };

        Ok(PeriodReport {
            label: label.clone(),
            date_range: self.period.range,
            scene_count,
            overall_accuracy: confusion_matrix.accuracy(),
            kappa: confusion_matrix.kappa(),
            producers_accuracy: confusion_matrix.producers_accuracy(),
            consumers_accuracy: confusion_matrix.consumers_accuracy(),
            confusion_matrix,
            train_size: summary.train_size,
            test_size: summary.test_size,
            balanced_counts,
            empty_classes,
            area,
            area_within_region,
            layers,
        })
    }

    async fn render_layers(
        &self,
        ctx: &EvaluationContext<'_>,
        dir: &Path,
    ) -> Result<Vec<LayerOutput>, PipelineError> {
        let mut outputs = Vec::new();
        for layer in period_layers(self) {
            ctx.progress.set_message(format!("Rendering {}", layer.name));
            let png = ctx.engine.thumbnail(&layer.rendered()).await?;
            let path = dir.join(layer.file_name());
            write_file(&path, &png).await?;
            ctx.progress.inc(1);
            log::debug!("Wrote {}", path.display());
            outputs.push(LayerOutput {
                name: layer.name,
                path,
            });
        }
        Ok(outputs)
    }
}

pub(crate) async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
    let io_err = |source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    tokio::fs::write(path, bytes).await.map_err(io_err)
}

fn decode_matrix(rows: Vec<Vec<u64>>) -> Result<ConfusionMatrix, PipelineError> {
    let matrix = ConfusionMatrix::from_rows(rows).map_err(|e| PipelineError::Decode {
        message: e.to_string(),
    })?;
    if matrix.order() != LandCoverClass::COUNT {
        return Err(PipelineError::Decode {
            message: format!(
                "confusion matrix has order {}, expected {}",
                matrix.order(),
                LandCoverClass::COUNT
            ),
        });
    }
    Ok(matrix)
}

fn decode_class_counts(counts: &[u64]) -> Result<BTreeMap<LandCoverClass, u64>, PipelineError> {
    if counts.len() != LandCoverClass::COUNT {
        return Err(PipelineError::Decode {
            message: format!(
                "expected {} class counts, got {}",
                LandCoverClass::COUNT,
                counts.len()
            ),
        });
    }
    Ok(LandCoverClass::all()
        .iter()
        .copied()
        .zip(counts.iter().copied())
        .collect())
}

/// Decodes a grouped `sum` reduction of pixel area by class id.
///
/// Class ids may arrive as integers or integral floats.
///
/// # Errors
///
/// Returns [`PipelineError::Decode`] if the value is not a list of groups,
/// a group's class is not a known class id, or an area is negative.
pub fn decode_areas(value: &serde_json::Value) -> Result<AreaByClass, PipelineError> {
    let grouped: GroupedAreas =
        serde_json::from_value(value.clone()).map_err(|e| PipelineError::Decode {
            message: format!("area groups: {e}"),
        })?;

    let mut area = AreaByClass::new();
    for group in grouped.groups {
        let class = class_of(&group.class)?;
        if !(group.sum.is_finite() && group.sum >= 0.0) {
            return Err(PipelineError::Decode {
                message: format!("area of {class} is {}", group.sum),
            });
        }
        area.add(class, group.sum);
    }
    Ok(area)
}

fn class_of(value: &serde_json::Value) -> Result<LandCoverClass, PipelineError> {
    let id = value
        .as_i64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() <= 1e6)
                .map(|f| {
                    #[allow(clippy::cast_possible_truncation)]
                    let id = f as i64;
                    id
                })
        })
        .ok_or_else(|| PipelineError::Decode {
            message: format!("area group class {value} is not an integer"),
        })?;
    LandCoverClass::from_id(id).map_err(|e| PipelineError::Decode {
        message: e.to_string(),
    })
}
