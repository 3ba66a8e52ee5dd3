//! Pixel ranges on a detector axis.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An ordered pair of pixel indices on one detector axis.
///
/// Both ends are inclusive, matching the `[min, max]` ranges the
/// instrument writes to its run metadata. `min <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PixelRange {
    /// First pixel of the range (inclusive).
    pub min: usize,
    /// Last pixel of the range (inclusive).
    pub max: usize,
}

impl PixelRange {
    /// Creates a range, failing on an inverted pair.
    pub fn new(min: usize, max: usize) -> Result<Self> {
        if min > max {
            return Err(Error::InvalidRange {
                min: min as i64,
                max: max as i64,
            });
        }
        Ok(Self { min, max })
    }

    /// Creates a range from possibly negative or inverted bounds,
    /// saturating negatives at zero. Fails if still inverted.
    pub fn from_signed(min: i64, max: i64) -> Result<Self> {
        if min > max {
            return Err(Error::InvalidRange { min, max });
        }
        Self::new(min.max(0) as usize, max.max(0) as usize)
    }

    /// Creates a range from real-valued bounds, truncating toward zero
    /// and clamping into `[0, last_pixel]`.
    #[must_use]
    pub fn from_f64_clamped(min: f64, max: f64, last_pixel: usize) -> Self {
        let lo = min.max(0.0) as usize;
        let hi = max.max(0.0) as usize;
        let lo = lo.min(last_pixel);
        let hi = hi.min(last_pixel);
        Self {
            min: lo.min(hi),
            max: lo.max(hi),
        }
    }

    /// The trivial `[0, 0]` range, used to encode an absent ROI.
    #[must_use]
    pub fn trivial() -> Self {
        Self { min: 0, max: 0 }
    }

    /// Whether this is the `[0, 0]` placeholder for an absent ROI.
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.min == 0 && self.max == 0
    }

    /// Distance between the two ends, in pixels.
    #[must_use]
    pub fn span(&self) -> usize {
        self.max - self.min
    }

    /// Whether the range has collapsed to a span of at most one pixel.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.span() <= 1
    }

    /// Center of the range as a fractional pixel position.
    #[must_use]
    pub fn center(&self) -> f64 {
        (self.min as f64 + self.max as f64) / 2.0
    }

    /// Pads the range symmetrically by `n` pixels, saturating at zero.
    #[must_use]
    pub fn pad(&self, n: usize) -> Self {
        Self {
            min: self.min.saturating_sub(n),
            max: self.max + n,
        }
    }

    /// Clamps both ends into `[lo, hi]`.
    #[must_use]
    pub fn clamp_to(&self, lo: usize, hi: usize) -> Self {
        let min = self.min.clamp(lo, hi);
        let max = self.max.clamp(lo, hi);
        Self {
            min: min.min(max),
            max,
        }
    }

    /// Whether `pixel` falls inside the range.
    #[must_use]
    pub fn contains(&self, pixel: usize) -> bool {
        pixel >= self.min && pixel <= self.max
    }

    /// Whether `other` lies entirely inside this range.
    #[must_use]
    pub fn encloses(&self, other: &Self) -> bool {
        self.min <= other.min && self.max >= other.max
    }
}
