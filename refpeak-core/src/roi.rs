//! Region-of-interest hints, overrides, and processing options.

use crate::range::PixelRange;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Regions of interest declared in the instrument's run metadata.
///
/// An absent region is encoded as the trivial `[0, 0]` range, matching
/// the process-variable convention of the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoiHint {
    /// Declared specular peak range along X.
    pub peak: PixelRange,
    /// Declared beam footprint along Y.
    pub low_res: PixelRange,
    /// Declared background range along X.
    pub background: PixelRange,
}

impl RoiHint {
    /// A hint with every region absent.
    #[must_use]
    pub fn absent() -> Self {
        Self {
            peak: PixelRange::trivial(),
            low_res: PixelRange::trivial(),
            background: PixelRange::trivial(),
        }
    }
}

impl Default for RoiHint {
    fn default() -> Self {
        Self::absent()
    }
}

/// Processing options for peak localization and ROI reconciliation.
///
/// Forced ranges are raw signed pairs rather than [`PixelRange`] so a
/// misconfigured (inverted) operator entry can be detected and reported
/// instead of rejected up front.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoiConfig {
    /// Prefer the instrument ROI hint over the fitted peak range.
    pub use_roi: bool,
    /// Re-fit the peak range even when an ROI hint is present.
    pub update_peak_range: bool,
    /// Adopt the instrument's background ROI when available.
    pub use_roi_background: bool,
    /// Compute the background as a band hugging the peak on both sides.
    pub use_tight_background: bool,
    /// Background band width, in pixels.
    pub background_offset: usize,
    /// Operator-forced peak range; always wins when present.
    pub force_peak: Option<(i64, i64)>,
    /// Operator-forced low-resolution range; always wins when present.
    pub force_low_res: Option<(i64, i64)>,
    /// Operator-forced background range; always wins when valid.
    pub force_background: Option<(i64, i64)>,
    /// Below this event count the dataset is classified as unknown.
    pub event_count_threshold: u64,
    /// Edge pixels excluded from peak search on every axis.
    pub dead_pixel_margin: usize,
    /// Fitted low-res ranges narrower than this are discarded.
    pub low_res_minimum_width: usize,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            use_roi: true,
            update_peak_range: false,
            use_roi_background: false,
            use_tight_background: false,
            background_offset: 3,
            force_peak: None,
            force_low_res: None,
            force_background: None,
            event_count_threshold: 10_000,
            dead_pixel_margin: 10,
            low_res_minimum_width: 25,
        }
    }
}

/// Final ranges produced by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReconciledRanges {
    /// Specular peak range along X.
    pub peak: PixelRange,
    /// Beam footprint along Y.
    pub low_res: PixelRange,
    /// Background range along X.
    pub background: PixelRange,
    /// Whether the instrument ROI hint was in fact adopted for the peak.
    pub use_roi_actual: bool,
}
