//! Runs every configured period in order.

use lulc_classification_models::metrics::SQUARE_METERS_PER_HECTARE;
use lulc_engine::{Engine, Geometry, Image};
use lulc_pipeline_models::{LayerOutput, PeriodReport, PipelineConfig, RunReport};
use lulc_training::{Region, TrainingPoints};

use crate::{
    PipelineError,
    evaluate::{EvaluationContext, period_steps, write_file},
    graph::{ClassificationGraph, Period, classify, scenes},
    layers::preview_layer,
    progress::ProgressCallback,
    seeds::SeedSource,
};

/// Region and training points shared by every period.
#[derive(Debug, Clone)]
pub struct RunInputs {
    /// Region of interest.
    pub region: Region,
    /// Labelled training points.
    pub training: TrainingPoints,
}

impl RunInputs {
    /// Loads the region and training files named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Training`] if a file cannot be read or
    /// parsed, or if `training.require_all_classes` is set and a class has
    /// no points.
    pub fn load(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let region = Region::load(&config.region.path)?;
        let training = TrainingPoints::load(
            config
                .training
                .sources
                .iter()
                .map(|source| (source.class, source.path.as_path())),
        )?;
        Self::new(region, training, config.training.require_all_classes)
    }

    /// Checks the training points against the region.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Training`] if `require_all_classes` is set
    /// and a class has no points.
    pub fn new(
        region: Region,
        training: TrainingPoints,
        require_all_classes: bool,
    ) -> Result<Self, PipelineError> {
        if require_all_classes {
            training.require_all_classes()?;
        }
        for class in training.missing_classes() {
            log::warn!("No training points for {class}; it will be absent from the map");
        }
        let outside = training.count_outside(&region);
        if outside > 0 {
            log::warn!("{outside} training point(s) fall outside the region");
        }
        Ok(Self { region, training })
    }
}

/// Builds one graph per configured period, in configuration order.
///
/// Period seeds are drawn from `seed` in that same order.
///
/// # Errors
///
/// Returns [`PipelineError::Config`] if a period's dates are invalid.
pub fn build_graphs(
    config: &PipelineConfig,
    inputs: &RunInputs,
    seed: u64,
) -> Result<Vec<ClassificationGraph>, PipelineError> {
    let roi = inputs.region.to_geometry();
    let points = inputs.training.to_feature_collection();
    let mut seeds = SeedSource::new(seed);

    config
        .periods
        .iter()
        .map(|settings| -> Result<ClassificationGraph, PipelineError> {
            let period = Period {
                label: settings.label.clone(),
                range: settings.date_range()?,
                max_cloud_percent: settings.max_cloud_percent,
                seeds: seeds.next_period(),
            };
            Ok(classify(period, &points, &roi, config))
        })
        .collect()
}

/// Median of the low-cloud preview scenes, clipped to `roi`.
///
/// # Errors
///
/// Returns [`PipelineError::Config`] if the preview dates are invalid.
pub fn preview_composite(config: &PipelineConfig, roi: &Geometry) -> Result<Image, PipelineError> {
    let range = config.preview.date_range()?;
    Ok(scenes(&config.collection, roi, &range, config.preview.max_cloud_percent)
        .median()
        .clip(roi))
}

/// Classifies every period sequentially and collects the results.
///
/// `on_period` is called with each period's report as soon as it is
/// available. The first failing period aborts the run and clears
/// `progress`.
///
/// # Errors
///
/// Returns the first [`PipelineError`] raised while building or evaluating
/// a period or writing its outputs.
pub async fn run(
    engine: &dyn Engine,
    config: &PipelineConfig,
    inputs: &RunInputs,
    seed: u64,
    progress: &dyn ProgressCallback,
    on_period: impl FnMut(&PeriodReport) + Send,
) -> Result<RunReport, PipelineError> {
    let result = run_periods(engine, config, inputs, seed, progress, on_period).await;
    if result.is_err() {
        progress.finish_and_clear();
    }
    result
}

async fn run_periods(
    engine: &dyn Engine,
    config: &PipelineConfig,
    inputs: &RunInputs,
    seed: u64,
    progress: &dyn ProgressCallback,
    mut on_period: impl FnMut(&PeriodReport) + Send,
) -> Result<RunReport, PipelineError> {
    let graphs = build_graphs(config, inputs, seed)?;
    let thumbnails_dir = config
        .output
        .thumbnails
        .then_some(config.output.dir.as_path());
    let render_preview = thumbnails_dir.is_some() && config.preview.enabled;

    let period_count = graphs.len() as u64;
    progress.set_total(
        period_count * period_steps(thumbnails_dir.is_some()) + u64::from(render_preview),
    );

    let region_square_meters = inputs.region.area_square_meters();

    let preview = match thumbnails_dir {
        Some(dir) if render_preview => {
            let composite = preview_composite(config, &inputs.region.to_geometry())?;
            let layer = preview_layer(&composite);
            progress.set_message(format!("Rendering {}", layer.name));
            let png = engine.thumbnail(&layer.rendered()).await?;
            let path = dir.join(layer.file_name());
            write_file(&path, &png).await?;
            progress.inc(1);
            Some(LayerOutput {
                name: layer.name,
                path,
            })
        }
        _ => None,
    };

    let ctx = EvaluationContext {
        engine,
        progress,
        region_square_meters,
        thumbnails_dir,
    };

    let mut periods = Vec::with_capacity(graphs.len());
    for graph in &graphs {
        log::info!("Classifying period {} ({})", graph.period.label, graph.period.range);
        let report = graph.evaluate(&ctx).await?;
        on_period(&report);
        periods.push(report);
    }
    progress.finish(format!("Classified {period_count} period(s)"));

    Ok(RunReport {
        seed,
        region_hectares: region_square_meters / SQUARE_METERS_PER_HECTARE,
        periods,
        preview,
    })
}
