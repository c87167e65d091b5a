//! One-dimensional interpolants over strictly increasing knots.
//!
//! Both interpolants refuse to extrapolate: evaluating outside
//! `[x_first, x_last]` yields `None`.

/// Something that can be evaluated between its knots.
pub trait Interpolant {
    fn eval(&self, x: f64) -> Option<f64>;

    fn domain(&self) -> (f64, f64);
}

fn segment(xs: &[f64], x: f64) -> Option<usize> {
    let (first, last) = (*xs.first()?, *xs.last()?);
    if !(x >= first && x <= last) {
        return None;
    }
    // index of the left knot of the segment containing x
    let right = xs.partition_point(|&k| k <= x);
    Some(right.saturating_sub(1).min(xs.len().saturating_sub(2)))
}

/// Piecewise-linear interpolation.
#[derive(Debug, Clone)]
pub struct Linear {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl Linear {
    /// Needs at least one knot; knots must be strictly increasing.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Option<Self> {
        if xs.is_empty() || xs.len() != ys.len() || !strictly_increasing(&xs) {
            return None;
        }
        Some(Self { xs, ys })
    }
}

impl Interpolant for Linear {
    fn eval(&self, x: f64) -> Option<f64> {
        if self.xs.len() == 1 {
            return (x == self.xs[0]).then_some(self.ys[0]);
        }
        let k = segment(&self.xs, x)?;
        let (x0, x1) = (self.xs[k], self.xs[k + 1]);
        let (y0, y1) = (self.ys[k], self.ys[k + 1]);
        let t = (x - x0) / (x1 - x0);
        Some(y0 + t * (y1 - y0))
    }

    fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }
}

/// Cubic spline with not-a-knot end conditions.
///
/// Two knots degrade to a straight line and three knots to the parabola
/// through them, matching the usual not-a-knot conventions.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at the knots.
    m: Vec<f64>,
}

impl CubicSpline {
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Option<Self> {
        let n = xs.len();
        if n < 2 || n != ys.len() || !strictly_increasing(&xs) {
            return None;
        }
        let m = match n {
            2 => vec![0.0; 2],
            3 => {
                let (h0, h1) = (xs[1] - xs[0], xs[2] - xs[1]);
                let d0 = (ys[1] - ys[0]) / h0;
                let d1 = (ys[2] - ys[1]) / h1;
                vec![2.0 * (d1 - d0) / (h0 + h1); 3]
            }
            _ => not_a_knot_moments(&xs, &ys),
        };
        Some(Self { xs, ys, m })
    }
}

/// Solve for the knot second derivatives. The end conditions are folded into
/// the first and last interior rows so the system stays tridiagonal.
fn not_a_knot_moments(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let d: Vec<f64> = ys
        .windows(2)
        .zip(&h)
        .map(|(w, &hi)| (w[1] - w[0]) / hi)
        .collect();

    // unknowns m[1..=n-2]
    let size = n - 2;
    let mut sub = vec![0.0; size];
    let mut diag = vec![0.0; size];
    let mut sup = vec![0.0; size];
    let mut rhs = vec![0.0; size];
    for row in 0..size {
        let i = row + 1;
        sub[row] = h[i - 1];
        diag[row] = 2.0 * (h[i - 1] + h[i]);
        sup[row] = h[i];
        rhs[row] = 6.0 * (d[i] - d[i - 1]);
    }
    // m0 = (1 + h0/h1) m1 - (h0/h1) m2
    let r0 = h[0] / h[1];
    diag[0] += h[0] * (1.0 + r0);
    sup[0] -= h[0] * r0;
    // m[n-1] = (1 + h[n-2]/h[n-3]) m[n-2] - (h[n-2]/h[n-3]) m[n-3]
    let rl = h[n - 2] / h[n - 3];
    let last = size - 1;
    diag[last] += h[n - 2] * (1.0 + rl);
    sub[last] -= h[n - 2] * rl;

    let inner = solve_tridiagonal(&sub, &diag, &sup, &rhs);
    let mut m = Vec::with_capacity(n);
    m.push((1.0 + r0) * inner[0] - r0 * inner[1.min(size - 1)]);
    m.extend_from_slice(&inner);
    let tail_a = inner[size - 1];
    let tail_b = if size >= 2 { inner[size - 2] } else { inner[0] };
    m.push((1.0 + rl) * tail_a - rl * tail_b);
    m
}

/// Thomas algorithm. `sub[0]` and `sup[last]` are ignored.
fn solve_tridiagonal(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[f64]) -> Vec<f64> {
    let n = diag.len();
    let mut c = vec![0.0; n];
    let mut r = vec![0.0; n];
    c[0] = sup[0] / diag[0];
    r[0] = rhs[0] / diag[0];
    for i in 1..n {
        let denom = diag[i] - sub[i] * c[i - 1];
        c[i] = if i + 1 < n { sup[i] / denom } else { 0.0 };
        r[i] = (rhs[i] - sub[i] * r[i - 1]) / denom;
    }
    let mut x = vec![0.0; n];
    x[n - 1] = r[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = r[i] - c[i] * x[i + 1];
    }
    x
}

impl Interpolant for CubicSpline {
    fn eval(&self, x: f64) -> Option<f64> {
        let k = segment(&self.xs, x)?;
        let (x0, x1) = (self.xs[k], self.xs[k + 1]);
        let h = x1 - x0;
        let (a, b) = (x1 - x, x - x0);
        let (m0, m1) = (self.m[k], self.m[k + 1]);
        Some(
            m0 * a.powi(3) / (6.0 * h)
                + m1 * b.powi(3) / (6.0 * h)
                + (self.ys[k] / h - m0 * h / 6.0) * a
                + (self.ys[k + 1] / h - m1 * h / 6.0) * b,
        )
    }

    fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }
}

fn strictly_increasing(xs: &[f64]) -> bool {
    xs.iter().all(|x| x.is_finite()) && xs.windows(2).all(|w| w[1] > w[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn linear_does_not_extrapolate() {
        let f = Linear::new(vec![0.0, 2.0], vec![1000.0, 1000.0]).unwrap();
        assert_eq!(f.eval(1.0), Some(1000.0));
        assert_eq!(f.eval(-0.5), None);
        assert_eq!(f.eval(2.5), None);
        assert_eq!(f.eval(2.0), Some(1000.0));
    }

    #[test]
    fn linear_midpoints() {
        let f = Linear::new(vec![0.0, 1.0, 3.0], vec![0.0, 10.0, 30.0]).unwrap();
        assert_close(f.eval(0.5).unwrap(), 5.0, 1e-12);
        assert_close(f.eval(2.0).unwrap(), 20.0, 1e-12);
    }

    #[test]
    fn rejects_unsorted_knots() {
        assert!(Linear::new(vec![1.0, 0.0], vec![1.0, 2.0]).is_none());
        assert!(CubicSpline::new(vec![0.0, 0.0, 1.0], vec![1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn spline_reproduces_cubic_polynomial() {
        // not-a-knot splines are exact for cubics
        let poly = |x: f64| 2.0 + 0.5 * x - 0.3 * x * x + 0.05 * x.powi(3);
        let xs: Vec<f64> = vec![0.0, 1.0, 2.5, 3.0, 4.5, 6.0, 7.0];
        let ys: Vec<f64> = xs.iter().map(|&x| poly(x)).collect();
        let s = CubicSpline::new(xs, ys).unwrap();
        for x in [0.2, 1.7, 2.9, 4.0, 5.5, 6.9] {
            assert_close(s.eval(x).unwrap(), poly(x), 1e-9);
        }
        assert_eq!(s.eval(7.5), None);
    }

    #[test]
    fn spline_with_four_knots_is_the_interpolating_cubic() {
        let poly = |x: f64| 1.0 - x + 2.0 * x.powi(3);
        let xs = vec![0.0, 1.0, 2.0, 4.0];
        let ys: Vec<f64> = xs.iter().map(|&x| poly(x)).collect();
        let s = CubicSpline::new(xs, ys).unwrap();
        assert_close(s.eval(3.0).unwrap(), poly(3.0), 1e-9);
    }

    #[test]
    fn spline_with_three_knots_is_a_parabola() {
        let s = CubicSpline::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 4.0]).unwrap();
        assert_close(s.eval(1.5).unwrap(), 2.25, 1e-12);
    }

    #[test]
    fn spline_through_constant_data() {
        let s = CubicSpline::new(vec![0.0, 2.0, 3.0, 4.0, 5.0], vec![1000.0; 5]).unwrap();
        assert_close(s.eval(1.0).unwrap(), 1000.0, 1e-9);
        assert_eq!(s.domain(), (0.0, 5.0));
    }
}
