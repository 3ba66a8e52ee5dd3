//! 1-D smoothing kernels shared by the scanner and the beam-width fitter.

/// Gaussian smoothing with reflected boundaries, kernel truncated at 4σ.
pub(crate) fn gaussian_smooth(signal: &[f64], sigma: f64) -> Vec<f64> {
    let n = signal.len();
    if n == 0 || sigma <= 0.0 {
        return signal.to_vec();
    }

    let radius = (4.0 * sigma + 0.5) as usize;
    let mut kernel = Vec::with_capacity(2 * radius + 1);
    let denom = 2.0 * sigma * sigma;
    for k in -(radius as i64)..=(radius as i64) {
        kernel.push((-(k as f64) * (k as f64) / denom).exp());
    }
    let norm: f64 = kernel.iter().sum();

    let mut out = vec![0.0; n];
    for (i, o) in out.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (j, w) in kernel.iter().enumerate() {
            let idx = i as i64 + j as i64 - radius as i64;
            acc += w * signal[reflect_index(idx, n)];
        }
        *o = acc / norm;
    }
    out
}

/// Reflect an out-of-bounds index back into `[0, n)` without repeating
/// the edge sample, i.e. (d c b a | a b c d | d c b a).
fn reflect_index(idx: i64, n: usize) -> usize {
    let n = n as i64;
    let period = 2 * n;
    let mut i = idx.rem_euclid(period);
    if i >= n {
        i = period - 1 - i;
    }
    i as usize
}

/// Box smoothing with a running window, "valid" mode: the output is
/// shorter than the input by `window - 1` samples and sample `i`
/// corresponds to abscissa `i + window / 2` of the input.
pub(crate) fn box_smooth_valid(signal: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || signal.len() < window {
        return Vec::new();
    }
    let inv = 1.0 / window as f64;
    signal
        .windows(window)
        .map(|w| w.iter().sum::<f64>() * inv)
        .collect()
}
