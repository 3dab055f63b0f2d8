//! Display layers rendered alongside each period.

use lulc_classification_models::{SpectralIndex, vis::VisParams};
use lulc_engine::Image;

use crate::{graph::ClassificationGraph, indices::index_image};

/// A named image with its visualization.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Display name, e.g. `"NDVI 2018"`.
    pub name: String,
    /// Source image.
    pub image: Image,
    /// Stretch and palette.
    pub vis: VisParams,
}

impl Layer {
    /// The image ready for rendering.
    #[must_use]
    pub fn rendered(&self) -> Image {
        self.image.visualize(&self.vis)
    }

    /// PNG file name derived from the layer name.
    #[must_use]
    pub fn file_name(&self) -> String {
        let stem: String = self
            .name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{stem}.png")
    }
}

/// Classification, NDVI, NDBI and MNDWI layers of one period.
#[must_use]
pub fn period_layers(graph: &ClassificationGraph) -> Vec<Layer> {
    let label = &graph.period.label;
    let index_layer = |index: SpectralIndex, vis: VisParams| Layer {
        name: format!("{} {label}", index.band_name()),
        image: index_image(&graph.composite, index),
        vis,
    };
    vec![
        Layer {
            name: format!("Classification {label}"),
            image: graph.classification.clone(),
            vis: VisParams::classification(),
        },
        index_layer(SpectralIndex::Ndvi, VisParams::ndvi()),
        index_layer(SpectralIndex::Ndbi, VisParams::ndbi()),
        index_layer(SpectralIndex::Mndwi, VisParams::mndwi()),
    ]
}

/// True-color layer of the preview composite.
#[must_use]
pub fn preview_layer(composite: &Image) -> Layer {
    Layer {
        name: "Preview true color".to_string(),
        image: composite.clone(),
        vis: VisParams::true_color(),
    }
}
