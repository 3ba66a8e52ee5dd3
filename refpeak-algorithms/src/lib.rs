//! refpeak-algorithms: Peak localization for neutron reflectometry.
//!
//! This crate implements the five stages that turn a 2-D detector
//! image into the ranges consumed by the reflectivity computation:
//! - **Projector** - axis sums with optional search-window masks
//! - **Scanner** - Gaussian-smoothed peak candidate scan along X
//! - **Beam-width fitter** - smooth top-hat fit of the Y footprint
//! - **Reconciler** - instrument ROI / fit / override precedence chain
//! - **Classifier** - direct-beam vs. reflected-beam decision
//!
#![warn(missing_docs)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::missing_panics_doc
)]

mod classifier;
mod lm;
mod pipeline;
mod projector;
mod reconciler;
mod scanner;
mod smooth;
mod tophat;

pub use classifier::{classify, scattering_angle_deg, DIRECT_BEAM_TOLERANCE_DEG};
pub use lm::{curve_fit, LmOptions};
pub use pipeline::{reduce_dataset, reduce_datasets, Dataset};
pub use projector::project;
pub use reconciler::RoiReconciler;
pub use scanner::{PeakCandidate, PeakScanner, ScannerConfig};
pub use tophat::{BeamWidthFitter, TophatConfig};

// Re-export the core contract types
pub use refpeak_core::{
    ClassificationResult, DataType, DetectorImage, PixelRange, ReconciledRanges, RoiConfig,
    RoiHint, RunMetadata,
};
