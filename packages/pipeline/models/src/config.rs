//! Run configuration loaded from TOML.
//!
//! Every section except `[region]` is optional. A minimal file:
//!
//! ```toml
//! [engine]
//! project = "my-cloud-project"
//!
//! [region]
//! path = "data/roi.geojson"
//!
//! [[training.sources]]
//! class = "water"
//! path = "data/water.geojson"
//! ```
//!
//! Dates are quoted ISO strings (`start = "2018-01-01"`).

use std::{
    collections::BTreeSet,
    path::{Component, Path, PathBuf},
};

use chrono::NaiveDate;
use lulc_classification_models::{
    DateRange, LandCoverClass,
    params::{
        AreaReductionParams, BalanceParams, RandomForestParams, SamplingParams, SmoothingParams,
        SplitParams,
    },
};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Complete configuration of a classification run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Remote engine connection.
    #[serde(default)]
    pub engine: EngineSettings,
    /// Source image collection.
    #[serde(default)]
    pub collection: CollectionSettings,
    /// Region of interest.
    pub region: RegionSettings,
    /// Labeled training points.
    #[serde(default)]
    pub training: TrainingSettings,
    /// Periods to classify, evaluated in order.
    #[serde(default = "default_periods")]
    pub periods: Vec<PeriodSettings>,
    /// Low-cloud preview composite.
    #[serde(default)]
    pub preview: PreviewSettings,
    /// Random-forest settings.
    #[serde(default)]
    pub classifier: RandomForestParams,
    /// Sampling of the feature image at training points.
    #[serde(default)]
    pub sampling: SamplingParams,
    /// Per-class balancing.
    #[serde(default)]
    pub balance: BalanceParams,
    /// Train/test split.
    #[serde(default)]
    pub split: SplitParams,
    /// Majority filter.
    #[serde(default)]
    pub smoothing: SmoothingParams,
    /// Area reduction.
    #[serde(default)]
    pub area: AreaReductionParams,
    /// Where results go.
    #[serde(default)]
    pub output: OutputSettings,
    /// Seed for every random choice in the run; drawn at random if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Connection settings for the remote engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Cloud project the computation is billed to.
    #[serde(default)]
    pub project: String,
    /// REST API root.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable holding the OAuth access token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries for transient HTTP failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds; doubles per retry.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

fn default_base_url() -> String {
    "https://earthengine.googleapis.com/v1".to_string()
}

fn default_token_env() -> String {
    "EARTHENGINE_TOKEN".to_string()
}

const fn default_timeout_secs() -> u64 {
    300
}

const fn default_max_retries() -> u32 {
    5
}

const fn default_retry_base_delay_ms() -> u64 {
    2_000
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            project: String::new(),
            base_url: default_base_url(),
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

/// The image collection composites are built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSettings {
    /// Catalog id.
    #[serde(default = "default_collection_id")]
    pub id: String,
    /// Per-scene cloud cover property, in percent.
    #[serde(default = "default_cloud_property")]
    pub cloud_property: String,
}

fn default_collection_id() -> String {
    "COPERNICUS/S2_SR_HARMONIZED".to_string()
}

fn default_cloud_property() -> String {
    "CLOUDY_PIXEL_PERCENTAGE".to_string()
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            id: default_collection_id(),
            cloud_property: default_cloud_property(),
        }
    }
}

/// Region of interest source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSettings {
    /// `GeoJSON` file holding the region polygon(s).
    pub path: PathBuf,
}

/// Training point sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSettings {
    /// One `GeoJSON` file per class.
    #[serde(default)]
    pub sources: Vec<TrainingSource>,
    /// Fail before any request if a class has no points.
    #[serde(default)]
    pub require_all_classes: bool,
}

/// Points of one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSource {
    /// Class every point in the file belongs to.
    pub class: LandCoverClass,
    /// `GeoJSON` file.
    pub path: PathBuf,
}

/// One classification period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSettings {
    /// Label used in the report, e.g. `"2018"`.
    pub label: String,
    /// First acquisition date, inclusive.
    pub start: NaiveDate,
    /// Last acquisition date, exclusive.
    pub end: NaiveDate,
    /// Scenes with cloud cover at or above this percentage are dropped.
    #[serde(default = "default_period_cloud")]
    pub max_cloud_percent: f64,
}

const fn default_period_cloud() -> f64 {
    0.1
}

impl PeriodSettings {
    /// A period covering `year` up to (not including) December 31st.
    #[must_use]
    pub fn calendar_year(year: i32) -> Self {
        Self {
            label: year.to_string(),
            start: NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or_default(),
            max_cloud_percent: default_period_cloud(),
        }
    }

    /// The validated acquisition window.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDate`] unless `start < end`.
    pub fn date_range(&self) -> Result<DateRange, ConfigError> {
        Ok(DateRange::new(self.start, self.end)?)
    }
}

fn default_periods() -> Vec<PeriodSettings> {
    vec![
        PeriodSettings::calendar_year(2018),
        PeriodSettings::calendar_year(2024),
    ]
}

/// The low-cloud composite rendered alongside the periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewSettings {
    /// Whether the preview composite is built.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// First acquisition date, inclusive.
    #[serde(default = "default_preview_start")]
    pub start: NaiveDate,
    /// Last acquisition date, exclusive.
    #[serde(default = "default_preview_end")]
    pub end: NaiveDate,
    /// Cloud cover threshold in percent.
    #[serde(default = "default_preview_cloud")]
    pub max_cloud_percent: f64,
}

const fn default_true() -> bool {
    true
}

fn default_preview_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}

fn default_preview_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 3, 16).unwrap_or_default()
}

const fn default_preview_cloud() -> f64 {
    1.0
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            start: default_preview_start(),
            end: default_preview_end(),
            max_cloud_percent: default_preview_cloud(),
        }
    }
}

impl PreviewSettings {
    /// The validated acquisition window.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDate`] unless `start < end`.
    pub fn date_range(&self) -> Result<DateRange, ConfigError> {
        Ok(DateRange::new(self.start, self.end)?)
    }
}

/// Output locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Directory for the JSON report and thumbnails.
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Whether display layers are rendered to PNG.
    #[serde(default)]
    pub thumbnails: bool,
    /// Whether the JSON report is written.
    #[serde(default = "default_true")]
    pub report: bool,
    /// JSON report file name inside `dir`.
    #[serde(default = "default_report_file")]
    pub report_file: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_report_file() -> String {
    "report.json".to_string()
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            thumbnails: false,
            report: true,
            report_file: default_report_file(),
        }
    }
}

impl OutputSettings {
    /// Full path of the JSON report, if one is written.
    #[must_use]
    pub fn report_path(&self) -> Option<PathBuf> {
        self.report.then(|| self.dir.join(&self.report_file))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let name = self.report_file.as_str();
        let mut components = Path::new(name).components();
        let plain_name = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !plain_name || name.trim().is_empty() || name.ends_with(['/', '\\']) {
            return Err(invalid(format!(
                "output.report_file must be a file name, got {name:?}"
            )));
        }
        Ok(())
    }
}

impl PipelineConfig {
    /// Reads and validates a config file.
    ///
    /// Relative paths inside the file are resolved against its directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, is not valid
    /// TOML, or fails [`PipelineConfig::validate`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Parses and validates a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid TOML or fails
    /// [`PipelineConfig::validate`].
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Prefixes every relative input and output path with `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        resolve(&mut self.region.path);
        for source in &mut self.training.sources {
            resolve(&mut source.path);
        }
        resolve(&mut self.output.dir);
    }

    /// Checks ranges and consistency of every setting.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] or [`ConfigError::InvalidDate`]
    /// describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.periods.is_empty() {
            return Err(invalid("at least one period is required"));
        }
        let mut labels = BTreeSet::new();
        for period in &self.periods {
            period.date_range()?;
            if !labels.insert(period.label.as_str()) {
                return Err(invalid(format!("duplicate period label {:?}", period.label)));
            }
            check_cloud(&period.label, period.max_cloud_percent)?;
        }
        self.preview.date_range()?;
        check_cloud("preview", self.preview.max_cloud_percent)?;

        let mut classes = BTreeSet::new();
        for source in &self.training.sources {
            if !classes.insert(source.class) {
                return Err(invalid(format!(
                    "class {} has more than one training source",
                    source.class
                )));
            }
        }

        if self.classifier.number_of_trees == 0 {
            return Err(invalid("classifier.number_of_trees must be at least 1"));
        }
        if !(self.classifier.bag_fraction > 0.0 && self.classifier.bag_fraction <= 1.0) {
            return Err(invalid("classifier.bag_fraction must be in (0, 1]"));
        }
        if self.classifier.min_leaf_population == 0 {
            return Err(invalid("classifier.min_leaf_population must be at least 1"));
        }
        if !(self.split.train_fraction > 0.0 && self.split.train_fraction < 1.0) {
            return Err(invalid("split.train_fraction must be in (0, 1)"));
        }
        if self.balance.target_per_class == 0 {
            return Err(invalid("balance.target_per_class must be at least 1"));
        }
        if self.sampling.scale <= 0.0 || self.area.scale <= 0.0 {
            return Err(invalid("sampling.scale and area.scale must be positive"));
        }
        if self.sampling.tile_scale <= 0.0 {
            return Err(invalid("sampling.tile_scale must be positive"));
        }
        if self.smoothing.radius <= 0.0 {
            return Err(invalid("smoothing.radius must be positive"));
        }
        if self.area.max_pixels < 1.0 {
            return Err(invalid("area.max_pixels must be at least 1"));
        }
        if self.engine.timeout_secs == 0 {
            return Err(invalid("engine.timeout_secs must be at least 1"));
        }
        self.output.validate()
    }

    /// Checks settings only needed to contact the engine.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if no project is configured.
    pub fn validate_remote(&self) -> Result<(), ConfigError> {
        if self.engine.project.trim().is_empty() {
            return Err(invalid("engine.project is required"));
        }
        Ok(())
    }
}

fn check_cloud(label: &str, percent: f64) -> Result<(), ConfigError> {
    if (0.0..=100.0).contains(&percent) {
        Ok(())
    } else {
        Err(invalid(format!(
            "max_cloud_percent for {label} must be within 0-100, got {percent}"
        )))
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use lulc_classification_models::params::BalanceStrategy;

    use super::*;

    const MINIMAL: &str = r#"
        [region]
        path = "roi.geojson"
    "#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn minimal_config_takes_calibrated_defaults() {
        let config = PipelineConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.periods.len(), 2);
        assert_eq!(config.periods[0].label, "2018");
        assert_eq!(config.periods[0].start, date(2018, 1, 1));
        assert_eq!(config.periods[0].end, date(2018, 12, 31));
        assert_eq!(config.periods[1].label, "2024");
        assert!((config.periods[1].max_cloud_percent - 0.1).abs() < f64::EPSILON);

        assert_eq!(config.collection.id, "COPERNICUS/S2_SR_HARMONIZED");
        assert_eq!(config.classifier.number_of_trees, 500);
        assert_eq!(config.balance.target_per_class, 150);
        assert_eq!(config.balance.strategy, BalanceStrategy::NaturalPlusSample);
        assert!((config.split.train_fraction - 0.8).abs() < f64::EPSILON);
        assert!((config.smoothing.radius - 2.0).abs() < f64::EPSILON);
        assert!(config.preview.enabled);
        assert_eq!(config.preview.end, date(2020, 3, 16));
        assert_eq!(config.engine.token_env, "EARTHENGINE_TOKEN");
        assert_eq!(config.seed, None);
        assert_eq!(
            config.output.report_path(),
            Some(PathBuf::from("output/report.json"))
        );
    }

    #[test]
    fn full_config_overrides_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            seed = 42

            [engine]
            project = "demo"
            max_retries = 1

            [region]
            path = "roi.geojson"

            [training]
            require_all_classes = true

            [[training.sources]]
            class = "water"
            path = "water.geojson"

            [[training.sources]]
            class = "urban_area"
            path = "urban.geojson"

            [[periods]]
            label = "dry"
            start = "2019-01-01"
            end = "2019-04-01"
            max_cloud_percent = 5.0

            [balance]
            strategy = "capped"
            target_per_class = 50

            [smoothing]
            kernel = "square"
            radius = 1.0

            [output]
            thumbnails = true
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, Some(42));
        assert_eq!(config.engine.max_retries, 1);
        assert!(config.validate_remote().is_ok());
        assert_eq!(config.training.sources[1].class, LandCoverClass::UrbanArea);
        assert!(config.training.require_all_classes);
        assert_eq!(config.periods.len(), 1);
        assert_eq!(config.periods[0].label, "dry");
        assert_eq!(config.balance.strategy, BalanceStrategy::Capped);
        assert_eq!(config.balance.target_per_class, 50);
        assert!(config.output.thumbnails);
    }

    #[test]
    fn inverted_period_is_rejected() {
        let err = PipelineConfig::from_toml_str(
            r#"
            [region]
            path = "roi.geojson"

            [[periods]]
            label = "bad"
            start = "2020-05-01"
            end = "2020-01-01"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDate(_)));
    }

    #[test]
    fn duplicate_sources_are_rejected() {
        let err = PipelineConfig::from_toml_str(
            r#"
            [region]
            path = "roi.geojson"

            [[training.sources]]
            class = "forest"
            path = "a.geojson"

            [[training.sources]]
            class = "forest"
            path = "b.geojson"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Forest"));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for snippet in [
            "[split]\ntrain_fraction = 1.0",
            "[classifier]\nbag_fraction = 0.0",
            "[classifier]\nnumber_of_trees = 0",
            "[balance]\ntarget_per_class = 0",
            "[smoothing]\nradius = 0.0",
        ] {
            let text = format!("{MINIMAL}\n{snippet}");
            assert!(
                matches!(
                    PipelineConfig::from_toml_str(&text),
                    Err(ConfigError::Invalid { .. })
                ),
                "accepted {snippet}"
            );
        }
    }

    #[test]
    fn report_can_be_disabled() {
        let config =
            PipelineConfig::from_toml_str(&format!("{MINIMAL}\n[output]\nreport = false")).unwrap();
        assert_eq!(config.output.report_path(), None);

        let config = PipelineConfig::from_toml_str(&format!(
            "{MINIMAL}\n[output]\nreport_file = \"summary.json\""
        ))
        .unwrap();
        assert_eq!(
            config.output.report_path(),
            Some(PathBuf::from("output/summary.json"))
        );
    }

    #[test]
    fn report_file_must_be_a_file_name() {
        for name in ["", "  ", ".", "..", "nested/report.json", "report/", "/tmp/report.json"] {
            let text = format!("{MINIMAL}\n[output]\nreport_file = {name:?}");
            assert!(
                matches!(
                    PipelineConfig::from_toml_str(&text),
                    Err(ConfigError::Invalid { .. })
                ),
                "accepted {name:?}"
            );
        }
    }

    #[test]
    fn missing_project_fails_remote_validation() {
        let config = PipelineConfig::from_toml_str(MINIMAL).unwrap();
        assert!(config.validate_remote().is_err());
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let mut config = PipelineConfig::from_toml_str(MINIMAL).unwrap();
        config.resolve_paths(Path::new("/data/run"));
        assert_eq!(config.region.path, PathBuf::from("/data/run/roi.geojson"));
        assert_eq!(config.output.dir, PathBuf::from("/data/run/output"));
    }

    #[test]
    fn unknown_toml_is_a_toml_error() {
        assert!(matches!(
            PipelineConfig::from_toml_str("region = 3"),
            Err(ConfigError::Toml(_))
        ));
    }
}
