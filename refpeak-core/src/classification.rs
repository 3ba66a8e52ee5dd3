//! Dataset classification contract.

use std::fmt;

use crate::range::PixelRange;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The typical types of data in magnetic reflectometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataType {
    /// Direct (unreflected) beam, used for calibration.
    DirectBeam,
    /// Reflected beam measurement.
    ReflectedBeam,
    /// Not enough statistics to decide, usually a low-count run.
    Unknown,
}

impl DataType {
    /// Integer code used by the legacy reduction logs
    /// (1 = direct beam, 0 = reflected beam, -1 = unknown).
    #[must_use]
    pub fn code(&self) -> i8 {
        match self {
            Self::DirectBeam => 1,
            Self::ReflectedBeam => 0,
            Self::Unknown => -1,
        }
    }

    /// Decodes the legacy integer code; anything other than 1 or -1 is
    /// taken as a reflected beam.
    #[must_use]
    pub fn from_code(code: i8) -> Self {
        match code {
            1 => Self::DirectBeam,
            -1 => Self::Unknown,
            _ => Self::ReflectedBeam,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DirectBeam => "DIRECT_BEAM",
            Self::ReflectedBeam => "REFLECTED_BEAM",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{name}")
    }
}

/// The sole contract exposed to the reflectivity computation.
///
/// Created once per dataset by the classifier and consumed read-only;
/// an `Unknown` data type does not invalidate the ranges, which are
/// still used for diagnostic reports.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassificationResult {
    /// Specular peak range along X.
    pub peak_range: PixelRange,
    /// Peak center as a fractional pixel position.
    pub peak_position: f64,
    /// Usable beam footprint along Y.
    pub low_res_range: PixelRange,
    /// Background range along X.
    pub background_range: PixelRange,
    /// Scattering angle implied by the peak position, in degrees.
    pub scattering_angle_deg: f64,
    /// Direct beam, reflected beam, or unknown.
    pub data_type: DataType,
    /// Whether the instrument ROI hint was adopted for the peak.
    pub use_roi_actual: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for dt in [DataType::DirectBeam, DataType::ReflectedBeam, DataType::Unknown] {
            assert_eq!(DataType::from_code(dt.code()), dt);
        }
    }

    #[test]
    fn test_unexpected_code_is_reflected_beam() {
        assert_eq!(DataType::from_code(7), DataType::ReflectedBeam);
    }

    #[test]
    fn test_display() {
        assert_eq!(DataType::Unknown.to_string(), "UNKNOWN");
    }
}
