//! Error types for refpeak-core.

use thiserror::Error;

/// Result type alias for refpeak operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for refpeak operations.
///
/// Nothing here is fatal to the surrounding reduction pipeline: fit
/// failures are recovered with deterministic defaults and ROI
/// misconfiguration degrades to the computed ranges, so that a report
/// can always be produced.
#[derive(Error, Debug)]
pub enum Error {
    /// Detector image with no pixels.
    #[error("empty detector image")]
    EmptyImage,

    /// Detector image construction from mismatched buffer/shape.
    #[error("invalid image shape: expected {expected} counts, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Inverted pixel range.
    #[error("invalid pixel range: [{min}, {max}]")]
    InvalidRange { min: i64, max: i64 },

    /// Nonlinear least squares did not converge within the retry budget.
    #[error("fit did not converge after {attempts} attempts (last xtol {last_xtol:e})")]
    FitDidNotConverge { attempts: usize, last_xtol: f64 },

    /// Operator-forced ROI that cannot be honored.
    #[error("invalid ROI configuration: {0}")]
    InvalidRoiConfiguration(String),
}
