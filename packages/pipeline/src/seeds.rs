//! Seeds for the run's random choices.
//!
//! A single run seed is expanded by a [`ChaCha8Rng`] into per-period
//! seeds for each class draw, the train/test split and the classifier, so
//! a fixed run seed reproduces every graph exactly. `ChaCha8Rng` output is
//! fixed by its algorithm, so recorded seeds stay valid across releases.

use lulc_classification_models::LandCoverClass;
use rand::Rng as _;
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{RngCore as _, SeedableRng as _},
};
use serde::{Deserialize, Serialize};

/// Seeds used while building one period's graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSeeds {
    /// Random column seed per class id for the balancing draw.
    pub class_draws: [u64; LandCoverClass::COUNT],
    /// Random column seed for the train/test split.
    pub split: u64,
    /// Random-forest seed.
    pub classifier: u64,
}

/// Deterministic stream of [`PeriodSeeds`].
pub struct SeedSource {
    rng: ChaCha8Rng,
}

impl SeedSource {
    /// A stream derived from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Seeds for the next period.
    pub fn next_period(&mut self) -> PeriodSeeds {
        let mut class_draws = [0; LandCoverClass::COUNT];
        for seed in &mut class_draws {
            *seed = self.draw();
        }
        PeriodSeeds {
            class_draws,
            split: self.draw(),
            classifier: self.draw(),
        }
    }

    // Top 53 bits, which the platform reads losslessly.
    fn draw(&mut self) -> u64 {
        self.rng.next_u64() >> (64 - 53)
    }
}

/// Largest integer a double represents exactly.
const MAX_SAFE_SEED: u64 = (1 << 53) - 1;

/// Returns `configured`, or draws and logs a fresh seed.
#[must_use]
pub fn resolve_seed(configured: Option<u64>) -> u64 {
    configured.unwrap_or_else(|| {
        let seed = rand::rng().random_range(0..=MAX_SAFE_SEED);
        log::info!("No seed configured; using random seed {seed} (pass --seed {seed} to reproduce)");
        seed
    })
}
