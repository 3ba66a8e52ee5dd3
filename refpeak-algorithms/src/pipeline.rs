//! Per-dataset reduction pipeline.

use log::debug;
use rayon::prelude::*;
use refpeak_core::{ClassificationResult, DetectorImage, PixelRange, RoiConfig, RoiHint, RunMetadata};

use crate::classifier::classify;
use crate::projector::project;
use crate::reconciler::RoiReconciler;
use crate::scanner::{PeakScanner, ScannerConfig};
use crate::tophat::{BeamWidthFitter, TophatConfig};

/// One dataset to reduce: the detector image with its run metadata and
/// the instrument's declared ROI.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Integrated pixel counts for this dataset.
    pub image: DetectorImage,
    /// Sample metadata from the run's process variables.
    pub metadata: RunMetadata,
    /// Instrument-declared regions of interest.
    pub hint: RoiHint,
}

/// Runs the full localization sequence for one dataset: project,
/// scan the specular peak, fit the beam footprint, reconcile with the
/// ROI hint and overrides, classify.
///
/// When a peak or low-res override is forced, the search is re-scoped
/// to that window before fitting, so the fit cannot wander off to a
/// second beam outside the operator's region.
#[must_use]
pub fn reduce_dataset(dataset: &Dataset, config: &RoiConfig) -> ClassificationResult {
    let image = &dataset.image;
    let n_x = image.n_x();
    let n_y = image.n_y();

    let x_mask = forced_window(config.force_peak, n_x);
    let y_mask = forced_window(config.force_low_res, n_y);
    let (x_projection, y_projection) = project(image, x_mask, y_mask);
    debug!(
        "run {} [{}]: projected {}x{} image (x mask {:?}, y mask {:?})",
        dataset.metadata.run_number,
        dataset.metadata.cross_section,
        n_x,
        n_y,
        x_mask,
        y_mask
    );

    let mut scanner = PeakScanner::new(ScannerConfig {
        panel_width: n_x as f64,
        ..ScannerConfig::default()
    });
    let _candidates = scanner.scan(&x_projection);
    let fitted_peak = scanner.peak_range(n_x);

    let fitter = BeamWidthFitter::new(TophatConfig {
        dead_pixel_margin: config.dead_pixel_margin,
        ..TophatConfig::default()
    });
    let fitted_low_res = fitter.fit(&y_projection);
    debug!(
        "run {} [{}]: fitted peak [{}, {}], low-res [{}, {}]",
        dataset.metadata.run_number,
        dataset.metadata.cross_section,
        fitted_peak.min,
        fitted_peak.max,
        fitted_low_res.min,
        fitted_low_res.max
    );

    let ranges = RoiReconciler::new(config, n_x, n_y).reconcile(
        fitted_peak,
        fitted_low_res,
        &dataset.hint,
    );

    classify(&ranges, &dataset.metadata, config)
}

/// Reduces independent datasets (e.g. the polarization cross-sections
/// of one run) in parallel. No state is shared between datasets.
#[must_use]
pub fn reduce_datasets(datasets: &[Dataset], config: &RoiConfig) -> Vec<ClassificationResult> {
    datasets
        .par_iter()
        .map(|dataset| reduce_dataset(dataset, config))
        .collect()
}

fn forced_window(forced: Option<(i64, i64)>, axis_len: usize) -> Option<PixelRange> {
    let (min, max) = forced?;
    PixelRange::from_signed(min, max)
        .ok()
        .map(|r| r.clamp_to(0, axis_len - 1))
}
