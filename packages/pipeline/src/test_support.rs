use std::sync::Mutex;

use chrono::NaiveDate;
use lulc_classification_models::DateRange;
use lulc_engine::{Engine, EngineError, Expr, Geometry, Image};
use lulc_pipeline_models::PipelineConfig;

use crate::{graph::Period, seeds::SeedSource};

pub fn config() -> PipelineConfig {
    PipelineConfig::from_toml_str("[region]\npath = \"roi.geojson\"").unwrap()
}

pub fn roi() -> Geometry {
    Geometry::polygon(&[vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]])
}

pub fn period(seed: u64) -> Period {
    Period {
        label: "2018".to_string(),
        range: DateRange::new(
            NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2018, 12, 31).unwrap(),
        )
        .unwrap(),
        max_cloud_percent: 0.1,
        seeds: SeedSource::new(seed).next_period(),
    }
}

/// Answers each request by its root node and records what was asked.
pub struct ScriptedEngine {
    pub scene_count: serde_json::Value,
    pub accuracy: serde_json::Value,
    pub areas: serde_json::Value,
    pub calls: Mutex<Vec<String>>,
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self {
            scene_count: serde_json::json!(12),
            accuracy: serde_json::json!({
                "matrix": [
                    [9, 1, 0, 0, 0],
                    [0, 8, 1, 0, 1],
                    [0, 1, 9, 0, 0],
                    [0, 0, 0, 10, 0],
                    [0, 0, 0, 1, 9],
                ],
                "train_size": 200,
                "test_size": 50,
                "class_counts": [50, 50, 50, 50, 50],
            }),
            areas: serde_json::json!({
                "groups": [
                    {"class": 0, "sum": 120_000.0},
                    {"class": 2, "sum": 3_456_789.0},
                    {"class": 4, "sum": 50_000.0},
                ]
            }),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedEngine {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

#[async_trait::async_trait]
impl Engine for ScriptedEngine {
    async fn compute(&self, expr: &Expr) -> Result<serde_json::Value, EngineError> {
        match expr {
            Expr::Dictionary(_) => {
                self.record("accuracy");
                Ok(self.accuracy.clone())
            }
            _ if expr.function_name() == Some("Collection.size") => {
                self.record("scene_count");
                Ok(self.scene_count.clone())
            }
            _ if expr.function_name() == Some("Image.reduceRegion") => {
                self.record("areas");
                Ok(self.areas.clone())
            }
            _ => Err(EngineError::Remote {
                status: 400,
                message: format!("unscripted request {:?}", expr.function_name()),
            }),
        }
    }

    async fn thumbnail(&self, _image: &Image) -> Result<Vec<u8>, EngineError> {
        self.record("thumbnail");
        Ok(b"\x89PNG".to_vec())
    }
}
