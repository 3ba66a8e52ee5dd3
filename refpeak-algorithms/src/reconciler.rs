//! Reconciliation of fitted ranges, instrument ROI hints, and
//! operator overrides.

use log::{info, warn};
use refpeak_core::{PixelRange, ReconciledRanges, RoiConfig, RoiHint};

/// Merges fitted peak/footprint ranges with the instrument's declared
/// ROI and any operator-forced ranges into the final peak, low-res,
/// and background ranges.
///
/// Precedence, highest first: operator force, instrument ROI hint
/// (when `use_roi` is set and no re-fit is requested), fitted range.
/// Misconfigured forced regions degrade to the computed range with a
/// logged warning; they never abort the reduction.
#[derive(Debug, Clone)]
pub struct RoiReconciler<'a> {
    config: &'a RoiConfig,
    n_x: usize,
    n_y: usize,
}

impl<'a> RoiReconciler<'a> {
    /// Creates a reconciler for a detector of `n_x` by `n_y` pixels.
    #[must_use]
    pub fn new(config: &'a RoiConfig, n_x: usize, n_y: usize) -> Self {
        Self { config, n_x, n_y }
    }

    /// Applies the precedence chain and returns the final ranges,
    /// clamped to the detector bounds.
    #[must_use]
    pub fn reconcile(
        &self,
        fitted_peak: PixelRange,
        fitted_low_res: PixelRange,
        hint: &RoiHint,
    ) -> ReconciledRanges {
        let config = self.config;

        // Degenerate fits collapse to a point; pad so the reflectivity
        // sum has something to integrate over.
        let mut peak = if fitted_peak.is_degenerate() {
            info!(
                "degenerate peak range [{}, {}], padding by 2",
                fitted_peak.min, fitted_peak.max
            );
            fitted_peak.pad(2)
        } else {
            fitted_peak
        };

        let mut low_res = fitted_low_res;
        if low_res.span() < config.low_res_minimum_width {
            info!(
                "fitted low-res range [{}, {}] narrower than {}, falling back to ROI hint",
                low_res.min, low_res.max, config.low_res_minimum_width
            );
            low_res = self.low_res_fallback(hint);
        }

        // Instrument ROI substitution
        let mut use_roi_actual = false;
        if config.use_roi && !hint.peak.is_trivial() {
            if config.update_peak_range {
                info!("using fitted peak range: [{}, {}]", peak.min, peak.max);
            } else {
                info!(
                    "using ROI peak range: [{}, {}]",
                    hint.peak.min, hint.peak.max
                );
                peak = hint.peak;
                use_roi_actual = true;
            }
            if !hint.low_res.is_trivial() {
                low_res = hint.low_res;
            }
        }

        // Operator overrides always win for their region.
        if let Some(forced) = self.validated_force(config.force_peak, "peak") {
            peak = forced;
            use_roi_actual = false;
        }
        if let Some(forced) = self.validated_force(config.force_low_res, "low-res") {
            low_res = forced;
        }

        let background = self.background_range(peak, hint);

        ReconciledRanges {
            peak: peak.clamp_to(0, self.n_x - 1),
            low_res: low_res.clamp_to(0, self.n_y - 1),
            background: background.clamp_to(0, self.n_x - 1),
            use_roi_actual,
        }
    }

    /// Background precedence: operator force, then the instrument's
    /// background ROI (when enabled and sane), then a band derived
    /// from the final peak range.
    fn background_range(&self, peak: PixelRange, hint: &RoiHint) -> PixelRange {
        let config = self.config;

        if let Some(forced) = self.validated_force(config.force_background, "background") {
            return forced;
        }

        if config.use_roi && config.use_roi_background && !hint.background.is_trivial() {
            // The declared background must precede the peak or fully
            // contain it; anything else is a mis-set process variable.
            let before_peak = hint.background.max < peak.min;
            let contains_peak = hint.background.encloses(&peak);
            if before_peak || contains_peak {
                return hint.background;
            }
            warn!(
                "background ROI [{}, {}] is neither before the peak nor containing it, ignoring",
                hint.background.min, hint.background.max
            );
        }

        let offset = config.background_offset;
        if config.use_tight_background {
            PixelRange {
                min: peak.min.saturating_sub(offset),
                max: peak.max + offset,
            }
        } else {
            // Fixed band immediately preceding the peak.
            PixelRange {
                min: peak.min.saturating_sub(2 * offset),
                max: peak.min.saturating_sub(offset),
            }
        }
    }

    fn low_res_fallback(&self, hint: &RoiHint) -> PixelRange {
        let margin = self.config.dead_pixel_margin;
        let hi = self.n_y.saturating_sub(margin).max(margin);
        if hint.low_res.is_trivial() {
            // No hint either: keep the full usable band.
            PixelRange {
                min: margin.min(hi),
                max: hi,
            }
        } else {
            hint.low_res.clamp_to(margin.min(hi), hi)
        }
    }

    /// Converts a forced raw pair into a range, reporting (not
    /// propagating) inverted entries.
    fn validated_force(&self, forced: Option<(i64, i64)>, region: &str) -> Option<PixelRange> {
        let (min, max) = forced?;
        match PixelRange::from_signed(min, max) {
            Ok(range) => Some(range),
            Err(err) => {
                warn!("forced {region} ROI ({min}, {max}) is invalid, using computed range: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const N_X: usize = 304;
    const N_Y: usize = 256;

    fn reconcile(
        config: &RoiConfig,
        peak: (usize, usize),
        low_res: (usize, usize),
        hint: &RoiHint,
    ) -> ReconciledRanges {
        RoiReconciler::new(config, N_X, N_Y).reconcile(
            PixelRange::new(peak.0, peak.1).unwrap(),
            PixelRange::new(low_res.0, low_res.1).unwrap(),
            hint,
        )
    }

    #[test]
    fn test_fitted_ranges_kept_without_hint() {
        let config = RoiConfig::default();
        let out = reconcile(&config, (144, 157), (60, 200), &RoiHint::absent());
        assert_eq!(out.peak, PixelRange { min: 144, max: 157 });
        assert_eq!(out.low_res, PixelRange { min: 60, max: 200 });
        assert!(!out.use_roi_actual);
    }

    #[test]
    fn test_roi_hint_wins_when_enabled() {
        let config = RoiConfig::default();
        let hint = RoiHint {
            peak: PixelRange { min: 140, max: 160 },
            low_res: PixelRange { min: 50, max: 210 },
            background: PixelRange::trivial(),
        };
        let out = reconcile(&config, (144, 157), (60, 200), &hint);
        assert_eq!(out.peak, hint.peak);
        assert_eq!(out.low_res, hint.low_res);
        assert!(out.use_roi_actual);
    }

    #[test]
    fn test_update_peak_range_keeps_fit() {
        let config = RoiConfig {
            update_peak_range: true,
            ..RoiConfig::default()
        };
        let hint = RoiHint {
            peak: PixelRange { min: 140, max: 160 },
            low_res: PixelRange { min: 50, max: 210 },
            background: PixelRange::trivial(),
        };
        let out = reconcile(&config, (144, 157), (60, 200), &hint);
        assert_eq!(out.peak, PixelRange { min: 144, max: 157 });
        // hint low-res is still adopted
        assert_eq!(out.low_res, hint.low_res);
        assert!(!out.use_roi_actual);
    }

    #[test]
    fn test_force_overrides_everything() {
        let config = RoiConfig {
            force_peak: Some((100, 110)),
            force_low_res: Some((40, 220)),
            force_background: Some((20, 60)),
            ..RoiConfig::default()
        };
        let hint = RoiHint {
            peak: PixelRange { min: 140, max: 160 },
            low_res: PixelRange { min: 50, max: 210 },
            background: PixelRange { min: 30, max: 90 },
        };
        let out = reconcile(&config, (144, 157), (60, 200), &hint);
        assert_eq!(out.peak, PixelRange { min: 100, max: 110 });
        assert_eq!(out.low_res, PixelRange { min: 40, max: 220 });
        assert_eq!(out.background, PixelRange { min: 20, max: 60 });
    }

    #[test]
    fn test_degenerate_peak_padded() {
        let config = RoiConfig::default();
        let out = reconcile(&config, (150, 150), (60, 200), &RoiHint::absent());
        assert_eq!(out.peak, PixelRange { min: 148, max: 152 });
    }

    #[test]
    fn test_narrow_low_res_falls_back_to_hint() {
        let config = RoiConfig {
            use_roi: false,
            ..RoiConfig::default()
        };
        let hint = RoiHint {
            peak: PixelRange::trivial(),
            low_res: PixelRange { min: 5, max: 250 },
            background: PixelRange::trivial(),
        };
        let out = reconcile(&config, (144, 157), (100, 110), &hint);
        // hint clamped to the dead-pixel margins
        assert_eq!(out.low_res, PixelRange { min: 10, max: 246 });
    }

    #[test]
    fn test_low_res_at_minimum_width_is_kept() {
        // a span of exactly the minimum width is not narrow
        let config = RoiConfig::default();
        let out = reconcile(&config, (144, 157), (100, 125), &RoiHint::absent());
        assert_eq!(out.low_res, PixelRange { min: 100, max: 125 });
    }

    #[test]
    fn test_narrow_low_res_without_hint_keeps_usable_band() {
        let config = RoiConfig::default();
        let out = reconcile(&config, (144, 157), (100, 110), &RoiHint::absent());
        assert_eq!(out.low_res, PixelRange { min: 10, max: 246 });
    }

    #[test]
    fn test_tight_background_hugs_peak() {
        let config = RoiConfig {
            use_tight_background: true,
            background_offset: 3,
            ..RoiConfig::default()
        };
        let out = reconcile(&config, (144, 157), (60, 200), &RoiHint::absent());
        assert_eq!(out.background, PixelRange { min: 141, max: 160 });
    }

    #[test]
    fn test_default_background_band_precedes_peak() {
        let config = RoiConfig::default();
        let out = reconcile(&config, (144, 157), (60, 200), &RoiHint::absent());
        assert_eq!(out.background, PixelRange { min: 138, max: 141 });
        assert!(out.background.max <= out.peak.min);
    }

    #[test]
    fn test_inverted_forced_background_ignored_with_warning() {
        let config = RoiConfig {
            force_background: Some((60, 20)),
            use_tight_background: true,
            ..RoiConfig::default()
        };
        let out = reconcile(&config, (144, 157), (60, 200), &RoiHint::absent());
        // falls back to the tight band computed from the peak
        assert_eq!(out.background, PixelRange { min: 141, max: 160 });
    }

    #[test]
    fn test_misplaced_background_hint_ignored() {
        let config = RoiConfig {
            use_roi_background: true,
            ..RoiConfig::default()
        };
        let hint = RoiHint {
            peak: PixelRange { min: 140, max: 160 },
            low_res: PixelRange::trivial(),
            background: PixelRange { min: 150, max: 170 },
            // overlaps the peak without containing it
        };
        let out = reconcile(&config, (144, 157), (60, 200), &hint);
        assert_eq!(out.background, PixelRange { min: 134, max: 137 });
    }

    #[test]
    fn test_background_hint_containing_peak_adopted() {
        let config = RoiConfig {
            use_roi_background: true,
            ..RoiConfig::default()
        };
        let hint = RoiHint {
            peak: PixelRange { min: 140, max: 160 },
            low_res: PixelRange::trivial(),
            background: PixelRange { min: 120, max: 180 },
        };
        let out = reconcile(&config, (144, 157), (60, 200), &hint);
        assert_eq!(out.background, PixelRange { min: 120, max: 180 });
    }

    #[test]
    fn test_idempotent_with_own_output_as_hint() {
        let config = RoiConfig::default();
        let first = reconcile(&config, (144, 157), (60, 200), &RoiHint::absent());
        let hint = RoiHint {
            peak: first.peak,
            low_res: first.low_res,
            background: first.background,
        };
        let second = reconcile(&config, (144, 157), (60, 200), &hint);
        assert_eq!(second.peak, first.peak);
        assert_eq!(second.low_res, first.low_res);
    }

    #[test]
    fn test_all_outputs_clamped() {
        let config = RoiConfig {
            force_peak: Some((290, 400)),
            ..RoiConfig::default()
        };
        let out = reconcile(&config, (144, 157), (60, 200), &RoiHint::absent());
        assert!(out.peak.max <= N_X - 1);
        assert!(out.low_res.max <= N_Y - 1);
        assert!(out.background.max <= N_X - 1);
    }
}
