//! Intensity projections of the detector image.

use refpeak_core::{DetectorImage, PixelRange};

/// Reduces the image to its two 1-D projections: counts vs X (summed
/// over Y) and counts vs Y (summed over X).
///
/// Optional masks zero every count outside the given inclusive ranges
/// before projecting, re-scoping a peak search to a restricted window
/// without mutating the original image.
#[must_use]
pub fn project(
    image: &DetectorImage,
    x_mask: Option<PixelRange>,
    y_mask: Option<PixelRange>,
) -> (Vec<f64>, Vec<f64>) {
    let n_x = image.n_x();
    let n_y = image.n_y();
    let counts = image.counts();

    let mut x_vs_counts = vec![0.0; n_x];
    let mut y_vs_counts = vec![0.0; n_y];

    for ix in 0..n_x {
        if let Some(mask) = x_mask {
            if !mask.contains(ix) {
                continue;
            }
        }
        for iy in 0..n_y {
            if let Some(mask) = y_mask {
                if !mask.contains(iy) {
                    continue;
                }
            }
            let c = counts[[ix, iy]];
            x_vs_counts[ix] += c;
            y_vs_counts[iy] += c;
        }
    }

    (x_vs_counts, y_vs_counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_image() -> DetectorImage {
        // 4x3 image, counts = 10*ix + iy
        let mut counts = Vec::new();
        for ix in 0..4 {
            for iy in 0..3 {
                counts.push(f64::from(10 * ix + iy));
            }
        }
        DetectorImage::from_flat(4, 3, counts).unwrap()
    }

    #[test]
    fn test_unmasked_projections() {
        let (x, y) = project(&test_image(), None, None);
        assert_eq!(x.len(), 4);
        assert_eq!(y.len(), 3);
        assert_relative_eq!(x[0], 3.0); // 0 + 1 + 2
        assert_relative_eq!(x[3], 93.0); // 30 + 31 + 32
        assert_relative_eq!(y[0], 60.0); // 0 + 10 + 20 + 30
    }

    #[test]
    fn test_masks_zero_outside_window() {
        let img = test_image();
        let x_mask = PixelRange::new(1, 2).unwrap();
        let (x, y) = project(&img, Some(x_mask), None);
        assert_relative_eq!(x[0], 0.0);
        assert_relative_eq!(x[3], 0.0);
        assert_relative_eq!(x[1], 33.0);
        // Y-projection only sums the two kept columns
        assert_relative_eq!(y[0], 30.0);
    }

    #[test]
    fn test_masking_does_not_mutate_image() {
        let img = test_image();
        let before = img.total_counts();
        let _ = project(&img, Some(PixelRange::new(0, 1).unwrap()), None);
        assert_relative_eq!(img.total_counts(), before);
    }
}
