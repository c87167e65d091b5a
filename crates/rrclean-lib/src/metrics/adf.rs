//! Augmented Dickey-Fuller unit-root test with a constant term, lag order
//! chosen by AIC and p-values from MacKinnon's (1994) response surface.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdfResult {
    /// t-statistic of the lagged level coefficient.
    pub statistic: f64,
    pub p_value: f64,
    /// Number of lagged differences in the final regression.
    pub used_lag: usize,
    pub nobs: usize,
}

struct OlsFit {
    beta: DVector<f64>,
    /// Diagonal of `(X'X)^-1`.
    inv_diag: DVector<f64>,
    ssr: f64,
    nobs: usize,
}

impl OlsFit {
    fn k(&self) -> usize {
        self.beta.len()
    }

    fn aic(&self) -> f64 {
        let n = self.nobs as f64;
        let llf = -n / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0);
        -2.0 * llf + 2.0 * self.k() as f64
    }

    fn t_value(&self, j: usize) -> f64 {
        let sigma2 = self.ssr / (self.nobs - self.k()) as f64;
        self.beta[j] / (sigma2 * self.inv_diag[j]).sqrt()
    }
}

fn ols(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<OlsFit> {
    let (nobs, k) = x.shape();
    if nobs <= k {
        return None;
    }
    let xt = x.transpose();
    let inv = (&xt * x).try_inverse()?;
    let beta = &inv * (&xt * y);
    let resid = y - x * &beta;
    Some(OlsFit {
        inv_diag: inv.diagonal(),
        ssr: resid.norm_squared(),
        beta,
        nobs,
    })
}

/// Regression of `dx[t]` on `[1, x[t], dx[t-1], .., dx[t-lags]]` for
/// `t` in `first..dx.len()`.
fn design(x: &[f64], dx: &[f64], lags: usize, first: usize) -> (DMatrix<f64>, DVector<f64>) {
    let rows = dx.len() - first;
    let m = DMatrix::from_fn(rows, lags + 2, |r, c| {
        let t = first + r;
        match c {
            0 => 1.0,
            1 => x[t],
            _ => dx[t - (c - 1)],
        }
    });
    let y = DVector::from_iterator(rows, dx[first..].iter().copied());
    (m, y)
}

/// Run the test on `x`. `None` when the series is too short, constant, or
/// every candidate regression is singular.
pub fn adfuller(x: &[f64]) -> Option<AdfResult> {
    let n = x.len();
    if n < 4 || x.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let (lo, hi) = x
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if lo == hi {
        log::warn!("adfuller: series is constant");
        return None;
    }

    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
    let maxlag = schwert.min(n / 2 - 2);
    let dx: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

    // every candidate lag is fitted on the sample the largest lag allows
    let mut best: Option<(f64, usize)> = None;
    for lags in 0..=maxlag {
        let (m, y) = design(x, &dx, lags, maxlag);
        let Some(fit) = ols(&m, &y) else {
            continue;
        };
        let aic = fit.aic();
        if best.map_or(true, |(best_aic, _)| aic < best_aic) {
            best = Some((aic, lags));
        }
    }
    let (_, used_lag) = best?;

    let (m, y) = design(x, &dx, used_lag, used_lag);
    let fit = ols(&m, &y)?;
    let statistic = fit.t_value(1);
    if !statistic.is_finite() {
        log::warn!("adfuller: degenerate regression");
        return None;
    }
    log::debug!("adfuller: stat {statistic:.4} with {used_lag} lags over {} obs", fit.nobs);
    Some(AdfResult {
        statistic,
        p_value: mackinnon_p(statistic),
        used_lag,
        nobs: fit.nobs,
    })
}

/// Approximate p-value for the constant-only, single-series case.
pub fn mackinnon_p(stat: f64) -> f64 {
    const MAX_STAT: f64 = 2.74;
    const MIN_STAT: f64 = -18.83;
    const STAR_STAT: f64 = -1.61;
    const SMALL_P: [f64; 3] = [2.1659, 1.4412, 3.8269e-2];
    const LARGE_P: [f64; 4] = [1.7339, 9.3202e-1, -1.2745e-1, -1.0368e-2];

    if stat > MAX_STAT {
        return 1.0;
    }
    if stat < MIN_STAT {
        return 0.0;
    }
    let coef: &[f64] = if stat <= STAR_STAT { &SMALL_P } else { &LARGE_P };
    let z = coef.iter().rev().fold(0.0, |acc, c| acc * stat + c);
    normal_cdf(z)
}

fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Complementary error function, Chebyshev fit with relative error below
/// 1.2e-7 everywhere.
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87 + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let r = t * poly.exp();
    if x >= 0.0 {
        r
    } else {
        2.0 - r
    }
}
