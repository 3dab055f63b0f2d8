//! Accuracy and area statistics of a materialized classification.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::LandCoverClass;

/// Square metres in one hectare.
pub const SQUARE_METERS_PER_HECTARE: f64 = 10_000.0;

/// A square error matrix: rows are actual class ids, columns predicted ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u64>>", into = "Vec<Vec<u64>>")]
pub struct ConfusionMatrix {
    rows: Vec<Vec<u64>>,
}

impl ConfusionMatrix {
    /// Creates a confusion matrix from its rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows do not form a square matrix.
    pub fn from_rows(rows: Vec<Vec<u64>>) -> Result<Self, InvalidMatrixError> {
        let order = rows.len();
        if let Some((row, found)) = rows
            .iter()
            .enumerate()
            .find_map(|(i, r)| (r.len() != order).then_some((i, r.len())))
        {
            return Err(InvalidMatrixError { order, row, found });
        }
        Ok(Self { rows })
    }

    /// Number of classes on each axis.
    #[must_use]
    pub fn order(&self) -> usize {
        self.rows.len()
    }

    /// Total number of classified samples.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.rows.iter().flatten().sum()
    }

    /// Number of samples on the diagonal.
    #[must_use]
    pub fn correct(&self) -> u64 {
        self.rows.iter().enumerate().map(|(i, row)| row[i]).sum()
    }

    /// Overall accuracy in `[0, 1]`; `0` for an empty matrix.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.correct() as f64 / total as f64
    }

    /// Cohen's kappa in `[-1, 1]`.
    ///
    /// Returns `0` for an empty matrix and `1` when chance agreement is
    /// total and every sample is correct.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn kappa(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let n = total as f64;
        let observed = self.correct() as f64 / n;
        let expected: f64 = (0..self.order())
            .map(|i| (self.row_total(i) as f64 / n) * (self.column_total(i) as f64 / n))
            .sum();
        if (1.0 - expected).abs() < f64::EPSILON {
            return if (observed - 1.0).abs() < f64::EPSILON {
                1.0
            } else {
                0.0
            };
        }
        ((observed - expected) / (1.0 - expected)).clamp(-1.0, 1.0)
    }

    /// Producer's accuracy (recall) per class id; `None` for classes with
    /// no actual samples.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn producers_accuracy(&self) -> Vec<Option<f64>> {
        (0..self.order())
            .map(|i| {
                let total = self.row_total(i);
                (total > 0).then(|| self.rows[i][i] as f64 / total as f64)
            })
            .collect()
    }

    /// Consumer's accuracy (precision) per class id; `None` for classes
    /// never predicted.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn consumers_accuracy(&self) -> Vec<Option<f64>> {
        (0..self.order())
            .map(|i| {
                let total = self.column_total(i);
                (total > 0).then(|| self.rows[i][i] as f64 / total as f64)
            })
            .collect()
    }

    fn row_total(&self, i: usize) -> u64 {
        self.rows[i].iter().sum()
    }

    fn column_total(&self, j: usize) -> u64 {
        self.rows.iter().map(|row| row[j]).sum()
    }
}

impl TryFrom<Vec<Vec<u64>>> for ConfusionMatrix {
    type Error = InvalidMatrixError;

    fn try_from(rows: Vec<Vec<u64>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<ConfusionMatrix> for Vec<Vec<u64>> {
    fn from(matrix: ConfusionMatrix) -> Self {
        matrix.rows
    }
}

impl std::fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "[")?;
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{value}")?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}

/// Error returned when matrix rows are not all as long as the row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidMatrixError {
    /// Number of rows.
    pub order: usize,
    /// Index of the first offending row.
    pub row: usize,
    /// Length of the offending row.
    pub found: usize,
}

impl std::fmt::Display for InvalidMatrixError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "confusion matrix is not square: row {} has {} columns, expected {}",
            self.row, self.found, self.order
        )
    }
}

impl std::error::Error for InvalidMatrixError {}

/// Summed pixel area per predicted class, in square metres.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaByClass {
    square_meters: BTreeMap<LandCoverClass, f64>,
}

impl AreaByClass {
    /// Creates an empty area table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            square_meters: BTreeMap::new(),
        }
    }

    /// Adds `square_meters` to the area of `class`.
    pub fn add(&mut self, class: LandCoverClass, square_meters: f64) {
        *self.square_meters.entry(class).or_default() += square_meters;
    }

    /// Area of `class` in square metres, if it was observed.
    #[must_use]
    pub fn square_meters(&self, class: LandCoverClass) -> Option<f64> {
        self.square_meters.get(&class).copied()
    }

    /// Area of `class` in hectares, if it was observed.
    #[must_use]
    pub fn hectares(&self, class: LandCoverClass) -> Option<f64> {
        self.square_meters(class)
            .map(|m2| m2 / SQUARE_METERS_PER_HECTARE)
    }

    /// Total classified area in hectares.
    #[must_use]
    pub fn total_hectares(&self) -> f64 {
        self.square_meters.values().sum::<f64>() / SQUARE_METERS_PER_HECTARE
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.square_meters.is_empty()
    }

    /// Whether the total area is no larger than `region_square_meters`
    /// allowing a relative `tolerance` (pixel edges overhang the region).
    #[must_use]
    pub fn fits_within(&self, region_square_meters: f64, tolerance: f64) -> bool {
        let total: f64 = self.square_meters.values().sum();
        total <= region_square_meters * (1.0 + tolerance)
    }
}
