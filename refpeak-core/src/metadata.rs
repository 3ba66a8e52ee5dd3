//! Run metadata needed to interpret peak positions.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default pixel pitch of the detector panel, in meters.
pub const DEFAULT_PIXEL_PITCH_M: f64 = 0.0007;

/// Sample metadata for one dataset, supplied by the event-loading
/// collaborator from the run's process variables.
///
/// Angles follow the instrument convention: `detector_angle_deg` is the
/// detector arm angle (DANGLE) and `detector_angle_offset_deg` its
/// calibrated zero (DANGLE0). `direct_beam_pixel` is the X-pixel where
/// the direct beam lands at zero angle (DIRPIX).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunMetadata {
    /// Run number, for diagnostics.
    pub run_number: u32,
    /// Polarization cross-section label (e.g. "Off_Off").
    pub cross_section: String,
    /// Total number of events collected for this dataset.
    pub event_count: u64,
    /// Sample-to-detector distance, in meters.
    pub sample_detector_distance_m: f64,
    /// Calibrated direct-beam X-pixel (DIRPIX).
    pub direct_beam_pixel: f64,
    /// Pixel pitch of the detector, in meters.
    pub pixel_pitch_m: f64,
    /// Detector arm angle (DANGLE), in degrees.
    pub detector_angle_deg: f64,
    /// Calibrated detector angle offset (DANGLE0), in degrees.
    pub detector_angle_offset_deg: f64,
    /// Operator overwrite for the direct-beam pixel.
    pub direct_pixel_overwrite: Option<f64>,
    /// Operator overwrite for the detector angle offset, in degrees.
    pub angle_offset_overwrite: Option<f64>,
}

impl RunMetadata {
    /// Metadata with instrument-typical defaults, for a run with no
    /// angle information (direct-beam calibration geometry).
    #[must_use]
    pub fn new(run_number: u32, cross_section: impl Into<String>, event_count: u64) -> Self {
        Self {
            run_number,
            cross_section: cross_section.into(),
            event_count,
            sample_detector_distance_m: 2.297,
            direct_beam_pixel: 150.0,
            pixel_pitch_m: DEFAULT_PIXEL_PITCH_M,
            detector_angle_deg: 0.0,
            detector_angle_offset_deg: 0.0,
            direct_pixel_overwrite: None,
            angle_offset_overwrite: None,
        }
    }

    /// Direct-beam pixel with any operator overwrite applied.
    #[must_use]
    pub fn effective_direct_beam_pixel(&self) -> f64 {
        self.direct_pixel_overwrite.unwrap_or(self.direct_beam_pixel)
    }

    /// Detector angle offset with any operator overwrite applied.
    #[must_use]
    pub fn effective_angle_offset_deg(&self) -> f64 {
        self.angle_offset_overwrite
            .unwrap_or(self.detector_angle_offset_deg)
    }
}
