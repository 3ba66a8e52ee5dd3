//! Direct-beam / reflected-beam classification.

use log::info;
use refpeak_core::{ClassificationResult, DataType, ReconciledRanges, RoiConfig, RunMetadata};

/// Scattering angles at or below this magnitude are treated as a
/// direct beam, in degrees.
pub const DIRECT_BEAM_TOLERANCE_DEG: f64 = 0.02;

/// Scattering angle implied by a peak position, in degrees.
///
/// Combines the detector arm angle with the geometric offset between
/// the calibrated direct-beam pixel and the found peak:
///
/// `theta = (DANGLE - DANGLE0)/2 + (DIRPIX - peak) * pitch / (2 d)`
///
/// Operator overwrites for the direct-beam pixel and the angle offset
/// are honored when present.
#[must_use]
pub fn scattering_angle_deg(peak_position: f64, meta: &RunMetadata) -> f64 {
    let arm = (meta.detector_angle_deg - meta.effective_angle_offset_deg()) / 2.0;
    let offset = (meta.effective_direct_beam_pixel() - peak_position) * meta.pixel_pitch_m;
    arm + offset.to_degrees() / (2.0 * meta.sample_detector_distance_m)
}

/// Builds the final classification for one dataset.
///
/// A dataset below the event-count threshold is classified as unknown
/// but keeps its computed ranges: downstream reporting still uses them.
#[must_use]
pub fn classify(
    ranges: &ReconciledRanges,
    meta: &RunMetadata,
    config: &RoiConfig,
) -> ClassificationResult {
    let peak_position = ranges.peak.center();
    let scattering_angle = scattering_angle_deg(peak_position, meta);

    let data_type = if meta.event_count < config.event_count_threshold {
        info!(
            "run {} [{}]: {} events below threshold {}, type unknown",
            meta.run_number, meta.cross_section, meta.event_count, config.event_count_threshold
        );
        DataType::Unknown
    } else if scattering_angle.abs() <= DIRECT_BEAM_TOLERANCE_DEG {
        DataType::DirectBeam
    } else {
        DataType::ReflectedBeam
    };

    info!(
        "run {} [{}]: peak [{}, {}] at {:.1}, theta {:.4} deg, type {}",
        meta.run_number,
        meta.cross_section,
        ranges.peak.min,
        ranges.peak.max,
        peak_position,
        scattering_angle,
        data_type
    );

    ClassificationResult {
        peak_range: ranges.peak,
        peak_position,
        low_res_range: ranges.low_res,
        background_range: ranges.background,
        scattering_angle_deg: scattering_angle,
        data_type,
        use_roi_actual: ranges.use_roi_actual,
    }
}
