//! Candidate peak scanning along the specular (X) axis.

use log::debug;
use refpeak_core::PixelRange;

use crate::smooth::gaussian_smooth;

/// Configuration for the peak scanner.
///
/// The position weighting constants encode where the specular peak has
/// historically landed on the detector panel; they were module-level
/// globals in the legacy reduction and are explicit options here.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerConfig {
    /// Gaussian smoothing width applied before maxima detection, in pixels.
    pub smoothing_sigma: f64,
    /// Historical beam center along X, in pixels.
    pub beam_center: f64,
    /// Detector panel extent along X, in pixels.
    pub panel_width: f64,
    /// Variance-like spread of the center weighting term.
    pub center_spread: f64,
    /// Width of the edge band where candidates are penalized, in pixels.
    pub edge_margin: f64,
    /// Half-width assigned to a candidate when no width can be measured.
    pub default_half_width: f64,
    /// Runner-up quality ratio below which the lower-pixel candidate is
    /// preferred (see [`PeakScanner::scan`]).
    pub runner_up_quality_ratio: f64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            smoothing_sigma: 3.0,
            beam_center: 150.0,
            panel_width: 304.0,
            center_spread: 2000.0,
            edge_margin: 100.0,
            default_half_width: 6.0,
            runner_up_quality_ratio: 0.75,
        }
    }
}

/// One candidate peak found on the X-projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakCandidate {
    /// Pixel position of the maximum.
    pub position: usize,
    /// Width at half prominence, in pixels.
    pub width: f64,
    /// Height above the surrounding baseline.
    pub prominence: f64,
    /// Quality score; more negative is better.
    pub quality: f64,
}

/// Finds candidate specular peaks on the X-projection and keeps a
/// running best guess of the peak position and half-width.
#[derive(Debug, Clone)]
pub struct PeakScanner {
    config: ScannerConfig,
    best_position: f64,
    best_half_width: f64,
}

impl PeakScanner {
    /// Creates a scanner with the given configuration.
    #[must_use]
    pub fn new(config: ScannerConfig) -> Self {
        let best_half_width = config.default_half_width;
        Self {
            config,
            best_position: 0.0,
            best_half_width,
        }
    }

    /// Running best-guess peak position, in pixels.
    #[must_use]
    pub fn best_position(&self) -> f64 {
        self.best_position
    }

    /// Running best-guess half-width, in pixels.
    #[must_use]
    pub fn best_half_width(&self) -> f64 {
        self.best_half_width
    }

    /// Scans the X-projection for candidate peaks, best first.
    ///
    /// Candidates are ordered by a quality score
    /// `-(width * prominence * position_weight)` where the position
    /// weight favors the historical beam center and penalizes the
    /// detector edges with a cubic falloff.
    ///
    /// When the runner-up quality is within the configured ratio of the
    /// best and the runner-up sits at a lower pixel index, the
    /// runner-up becomes the best guess. When two beams are visible
    /// (direct + reflected), the declared specular peak is empirically
    /// the one with the smaller angular offset; this is a tuned
    /// convention, not a physical law.
    ///
    /// The best candidate (or the global maximum of the raw projection
    /// when no candidate is found) updates the running best guess.
    pub fn scan(&mut self, x_projection: &[f64]) -> Vec<PeakCandidate> {
        let smoothed = gaussian_smooth(x_projection, self.config.smoothing_sigma);
        let maxima = local_maxima(&smoothed);

        let mut candidates: Vec<PeakCandidate> = maxima
            .iter()
            .map(|&peak| {
                let (prominence, left_base, right_base) = peak_prominence(&smoothed, peak);
                let width = half_prominence_width(&smoothed, peak, prominence, left_base, right_base);
                let quality = -width * prominence * self.position_weight(peak as f64);
                PeakCandidate {
                    position: peak,
                    width,
                    prominence,
                    quality,
                }
            })
            .collect();
        candidates.sort_by(|a, b| a.quality.total_cmp(&b.quality));

        if candidates.is_empty() {
            // Flat or empty projection: fall back to the raw maximum.
            let fallback = argmax(x_projection).unwrap_or(0);
            debug!("no peak candidates, falling back to raw maximum at {fallback}");
            self.best_position = fallback as f64;
            self.best_half_width = self.config.default_half_width;
            return candidates;
        }

        let mut chosen = 0;
        if candidates.len() > 1 {
            let best_q = candidates[0].quality;
            let runner_q = candidates[1].quality;
            if best_q != 0.0
                && (best_q - runner_q) / best_q < self.config.runner_up_quality_ratio
                && candidates[1].position < candidates[0].position
            {
                chosen = 1;
            }
        }
        self.best_position = candidates[chosen].position as f64;
        self.best_half_width = (candidates[chosen].width / 2.0).max(self.config.default_half_width);
        debug!(
            "scanner best guess: x={} half_width={:.2} ({} candidates)",
            self.best_position,
            self.best_half_width,
            candidates.len()
        );

        candidates
    }

    /// Final peak range seeded from the running best guess, clamped to
    /// the detector bounds.
    #[must_use]
    pub fn peak_range(&self, n_x: usize) -> PixelRange {
        PixelRange::from_f64_clamped(
            self.best_position - self.best_half_width.abs(),
            self.best_position + self.best_half_width.abs(),
            n_x - 1,
        )
    }

    fn position_weight(&self, x: f64) -> f64 {
        let center = self.config.beam_center;
        let margin = self.config.edge_margin;
        let n_x = self.config.panel_width;

        let mut weight = (-(center - x) * (center - x) / self.config.center_spread).exp();
        if x < margin {
            weight *= (1.0 - (margin - x).abs() / margin).powi(3);
        } else if x > n_x - margin {
            weight *= (1.0 - (n_x - margin - x).abs() / margin).powi(3);
        }
        weight
    }
}

impl Default for PeakScanner {
    fn default() -> Self {
        Self::new(ScannerConfig::default())
    }
}

/// Local maxima with plateau handling: a plateau of equal samples
/// bounded by lower neighbors yields its midpoint.
fn local_maxima(signal: &[f64]) -> Vec<usize> {
    let mut maxima = Vec::new();
    if signal.len() < 3 {
        return maxima;
    }

    let mut i = 1;
    let i_max = signal.len() - 1;
    while i < i_max {
        if signal[i - 1] < signal[i] {
            let mut i_ahead = i + 1;
            while i_ahead < i_max && signal[i_ahead] == signal[i] {
                i_ahead += 1;
            }
            if signal[i_ahead] < signal[i] {
                maxima.push((i + i_ahead - 1) / 2);
                i = i_ahead;
            }
        }
        i += 1;
    }
    maxima
}

/// Prominence of `peak`: height above the higher of the two minima
/// reached before a taller sample (or the signal end) on each side.
/// Returns `(prominence, left_base, right_base)`.
fn peak_prominence(signal: &[f64], peak: usize) -> (f64, usize, usize) {
    let height = signal[peak];

    let mut left_base = peak;
    let mut left_min = height;
    let mut i = peak;
    while i > 0 {
        i -= 1;
        if signal[i] > height {
            break;
        }
        if signal[i] < left_min {
            left_min = signal[i];
            left_base = i;
        }
    }

    let mut right_base = peak;
    let mut right_min = height;
    let mut i = peak;
    while i < signal.len() - 1 {
        i += 1;
        if signal[i] > height {
            break;
        }
        if signal[i] < right_min {
            right_min = signal[i];
            right_base = i;
        }
    }

    (height - left_min.max(right_min), left_base, right_base)
}

/// Width of `peak` at half its prominence, with linearly interpolated
/// crossings, bounded by the prominence bases.
fn half_prominence_width(
    signal: &[f64],
    peak: usize,
    prominence: f64,
    left_base: usize,
    right_base: usize,
) -> f64 {
    let eval_height = signal[peak] - 0.5 * prominence;

    let mut i = peak;
    while i > left_base && signal[i] > eval_height {
        i -= 1;
    }
    let mut left_ip = i as f64;
    if signal[i] < eval_height {
        left_ip += (eval_height - signal[i]) / (signal[i + 1] - signal[i]);
    }

    let mut i = peak;
    while i < right_base && signal[i] > eval_height {
        i += 1;
    }
    let mut right_ip = i as f64;
    if signal[i] < eval_height {
        right_ip -= (eval_height - signal[i]) / (signal[i - 1] - signal[i]);
    }

    right_ip - left_ip
}

fn argmax(signal: &[f64]) -> Option<usize> {
    signal
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
}
