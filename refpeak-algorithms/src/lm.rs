//! Bounded Levenberg-Marquardt least squares.
//!
//! Small dense solver for the handful-of-parameter curve fits used by
//! the beam-width fitter. The iteration count is capped so a
//! pathological fit cannot stall the reduction; callers recover from
//! [`Error::FitDidNotConverge`] with a deterministic default.

use nalgebra::{DMatrix, DVector};
use refpeak_core::{Error, Result};

/// Options for a single fit attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LmOptions {
    /// Relative step-size tolerance for convergence.
    pub xtol: f64,
    /// Hard cap on accepted-or-rejected iterations.
    pub max_iterations: usize,
    /// Constrain every parameter to be non-negative.
    pub non_negative: bool,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            xtol: 1.0e-6,
            max_iterations: 200,
            non_negative: false,
        }
    }
}

/// Fits `model(x, params)` to `(xs, ys)` by Levenberg-Marquardt,
/// starting from `p0`. Returns the optimized parameters.
///
/// The Jacobian is computed by forward differences and the damped
/// normal equations are solved with an LU decomposition. With
/// `non_negative` set, trial parameters are projected onto the bound
/// after each step.
pub fn curve_fit<F>(model: F, xs: &[f64], ys: &[f64], p0: &[f64], opts: &LmOptions) -> Result<Vec<f64>>
where
    F: Fn(f64, &[f64]) -> f64,
{
    assert_eq!(xs.len(), ys.len());
    let m = xs.len();
    let n = p0.len();
    if m < n {
        return Err(Error::FitDidNotConverge {
            attempts: 0,
            last_xtol: opts.xtol,
        });
    }

    let residuals = |p: &[f64]| -> DVector<f64> {
        DVector::from_iterator(m, xs.iter().zip(ys).map(|(&x, &y)| model(x, p) - y))
    };
    let cost = |r: &DVector<f64>| r.norm_squared();

    let mut params = p0.to_vec();
    if opts.non_negative {
        clamp_non_negative(&mut params);
    }
    let mut r = residuals(&params);
    let mut current_cost = cost(&r);
    let mut lambda = 1.0e-3;

    for _ in 0..opts.max_iterations {
        let jac = forward_jacobian(&model, xs, ys, &params, &r);
        let jt = jac.transpose();
        let mut normal = &jt * &jac;
        let gradient = &jt * &r;

        // Marquardt damping on the diagonal of J^T J
        for i in 0..n {
            let d = normal[(i, i)].max(1.0e-12);
            normal[(i, i)] = d * (1.0 + lambda);
        }

        let Some(step) = normal.lu().solve(&(-&gradient)) else {
            lambda *= 10.0;
            if lambda > 1.0e12 {
                return Err(Error::FitDidNotConverge {
                    attempts: opts.max_iterations,
                    last_xtol: opts.xtol,
                });
            }
            continue;
        };

        let mut trial: Vec<f64> = params.iter().zip(step.iter()).map(|(p, s)| p + s).collect();
        if opts.non_negative {
            clamp_non_negative(&mut trial);
        }
        let trial_r = residuals(&trial);
        let trial_cost = cost(&trial_r);

        if trial_cost <= current_cost {
            let param_norm = params.iter().map(|p| p * p).sum::<f64>().sqrt();
            let step_norm = trial
                .iter()
                .zip(&params)
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f64>()
                .sqrt();
            params = trial;
            r = trial_r;
            current_cost = trial_cost;
            lambda = (lambda * 0.1).max(1.0e-12);
            if step_norm <= opts.xtol * (param_norm + opts.xtol) {
                return Ok(params);
            }
        } else {
            lambda *= 10.0;
            if lambda > 1.0e12 {
                return Err(Error::FitDidNotConverge {
                    attempts: opts.max_iterations,
                    last_xtol: opts.xtol,
                });
            }
        }
    }

    Err(Error::FitDidNotConverge {
        attempts: opts.max_iterations,
        last_xtol: opts.xtol,
    })
}

fn clamp_non_negative(params: &mut [f64]) {
    for p in params {
        if *p < 0.0 {
            *p = 0.0;
        }
    }
}

fn forward_jacobian<F>(
    model: &F,
    xs: &[f64],
    ys: &[f64],
    params: &[f64],
    r0: &DVector<f64>,
) -> DMatrix<f64>
where
    F: Fn(f64, &[f64]) -> f64,
{
    let m = xs.len();
    let n = params.len();
    let mut jac = DMatrix::zeros(m, n);
    let mut perturbed = params.to_vec();
    for j in 0..n {
        let h = f64::EPSILON.sqrt() * params[j].abs().max(1.0);
        perturbed[j] = params[j] + h;
        for (i, &x) in xs.iter().enumerate() {
            let r_perturbed = model(x, &perturbed) - ys[i];
            jac[(i, j)] = (r_perturbed - r0[i]) / h;
        }
        perturbed[j] = params[j];
    }
    jac
}
