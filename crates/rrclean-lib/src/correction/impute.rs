//! Imputation kernels. Each fills pending samples in place and returns how
//! many it resolved; whatever it cannot resolve stays pending.

use crate::config::{clamp_pre_mean, MOVING_AVERAGE_WINDOW};
use crate::interp::{CubicSpline, Interpolant, Linear};
use crate::series::IntervalSeries;

use super::CorrectionMethod;

/// Evaluate `f` at every pending position.
fn fill_from<F: Interpolant>(series: &mut IntervalSeries, f: Option<F>, method: &str) -> usize {
    let Some(f) = f else {
        return 0;
    };
    let mut filled = 0;
    for idx in series.pending_indices() {
        if let Some(v) = f.eval(idx as f64).filter(|v| v.is_finite()) {
            series.intervals_mut()[idx].resolve(v, method);
            filled += 1;
        }
    }
    filled
}

pub(crate) fn linear(series: &mut IntervalSeries) -> usize {
    let (xs, ys) = series.valid_points();
    fill_from(
        series,
        Linear::new(xs, ys),
        CorrectionMethod::LinearInterpolation.name(),
    )
}

pub(crate) fn cubic(series: &mut IntervalSeries) -> usize {
    let (xs, ys) = series.valid_points();
    fill_from(
        series,
        CubicSpline::new(xs, ys),
        CorrectionMethod::CubicSpline.name(),
    )
}

/// Mean of the finite entries, `None` if there are none.
fn nanmean(values: &[f64]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Average of the four overlapping 4-sample means of the 7-sample window
/// centred on each pending sample. `snapshot` is the series right after
/// invalidation, pending samples as NaN.
pub(crate) fn moving_average(series: &mut IntervalSeries, snapshot: &[f64]) -> usize {
    let half = MOVING_AVERAGE_WINDOW / 2;
    let sub = MOVING_AVERAGE_WINDOW - half;
    let n = snapshot.len();
    let mut filled = 0;
    for idx in series.pending_indices() {
        if idx < half || idx + half >= n {
            continue;
        }
        let window = &snapshot[idx - half..=idx + half];
        let means: Option<Vec<f64>> = window.windows(sub).map(nanmean).collect();
        let Some(means) = means else {
            continue;
        };
        let value = means.iter().sum::<f64>() / means.len() as f64;
        series.intervals_mut()[idx].resolve(value, CorrectionMethod::MovingAverage.name());
        filled += 1;
    }
    filled
}

/// Mean of the `window` samples strictly preceding each pending sample, when
/// all of them were valid at invalidation time.
pub(crate) fn pre_mean(series: &mut IntervalSeries, snapshot: &[f64], window: usize) -> usize {
    let window = clamp_pre_mean(window);
    let mut filled = 0;
    for idx in series.pending_indices() {
        if idx < window {
            continue;
        }
        let preceding = &snapshot[idx - window..idx];
        if preceding.iter().any(|v| !v.is_finite()) {
            continue;
        }
        let value = preceding.iter().sum::<f64>() / window as f64;
        series.intervals_mut()[idx].resolve(value, CorrectionMethod::PreMean { window }.name());
        filled += 1;
    }
    filled
}
