//! Detector image storage.

use ndarray::Array2;

use crate::error::{Error, Result};

/// A 2-D array of pixel intensity counts from the position-sensitive
/// detector, shape `(n_x, n_y)`.
///
/// Immutable once captured; one image is produced externally per
/// dataset by the event-loading collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorImage {
    counts: Array2<f64>,
}

impl DetectorImage {
    /// Wraps a counts array. Fails on an empty image.
    pub fn new(counts: Array2<f64>) -> Result<Self> {
        if counts.is_empty() {
            return Err(Error::EmptyImage);
        }
        Ok(Self { counts })
    }

    /// Builds an image from a flat buffer in row-major `(n_x, n_y)` order.
    pub fn from_flat(n_x: usize, n_y: usize, counts: Vec<f64>) -> Result<Self> {
        if n_x == 0 || n_y == 0 {
            return Err(Error::EmptyImage);
        }
        let expected = n_x * n_y;
        let actual = counts.len();
        let counts = Array2::from_shape_vec((n_x, n_y), counts)
            .map_err(|_| Error::ShapeMismatch { expected, actual })?;
        Ok(Self { counts })
    }

    /// Number of pixels along the horizontal (specular) X-axis.
    #[must_use]
    pub fn n_x(&self) -> usize {
        self.counts.nrows()
    }

    /// Number of pixels along the vertical (low-resolution) Y-axis.
    #[must_use]
    pub fn n_y(&self) -> usize {
        self.counts.ncols()
    }

    /// Borrowed view of the counts.
    #[must_use]
    pub fn counts(&self) -> &Array2<f64> {
        &self.counts
    }

    /// Sum of all pixel counts.
    #[must_use]
    pub fn total_counts(&self) -> f64 {
        self.counts.sum()
    }
}
