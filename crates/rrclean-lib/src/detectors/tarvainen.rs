//! Adaptive-threshold artifact classification after Lipponen & Tarvainen
//! (2019), "A robust algorithm for heart rate variability time series
//! artefact correction using novel beat classification".
//!
//! Successive differences and deviations from a local median are normalised
//! by rolling interquartile thresholds; beats are then classified as ectopic,
//! extra, missed or long/short from where they fall in two subspaces.

use crate::config::TarvainenParams;
use serde::{Deserialize, Serialize};

/// Categorised detector output. Positions are indices into the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TarvainenArtifacts {
    pub extra: Vec<usize>,
    pub missed: Vec<usize>,
    pub ectopic: Vec<usize>,
    pub long_short: Vec<usize>,
}

impl TarvainenArtifacts {
    /// All categories concatenated (extra, missed, ectopic, long/short).
    /// Repeats across categories are kept.
    pub fn into_indices(self) -> Vec<usize> {
        let mut out = self.extra;
        out.extend(self.missed);
        out.extend(self.ectopic);
        out.extend(self.long_short);
        out
    }

    pub fn is_empty(&self) -> bool {
        self.extra.is_empty()
            && self.missed.is_empty()
            && self.ectopic.is_empty()
            && self.long_short.is_empty()
    }
}

/// Centred rolling quantile with shrinking edge windows (at least one
/// sample) and linear interpolation between order statistics. NaN samples
/// are skipped; an all-NaN window yields NaN.
pub(crate) fn rolling_quantile(signal: &[f64], window: usize, quantile: f64) -> Vec<f64> {
    let n = signal.len();
    let window = window.max(1);
    let mut buf = Vec::with_capacity(window);
    (0..n)
        .map(|idx| {
            let end = (idx + window / 2).min(n - 1);
            let start = (idx + window / 2 + 1).saturating_sub(window);
            buf.clear();
            buf.extend(signal[start..=end].iter().copied().filter(|v| !v.is_nan()));
            if buf.is_empty() {
                return f64::NAN;
            }
            buf.sort_by(f64::total_cmp);
            let pos = quantile * (buf.len() - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            buf[lo] + (buf[hi] - buf[lo]) * (pos - lo as f64)
        })
        .collect()
}

/// `alpha` times half the rolling IQR of `|signal|`.
fn dispersion_threshold(signal: &[f64], alpha: f64, window: usize) -> Vec<f64> {
    let magnitude: Vec<f64> = signal.iter().map(|v| v.abs()).collect();
    let q1 = rolling_quantile(&magnitude, window, 0.25);
    let q3 = rolling_quantile(&magnitude, window, 0.75);
    q1.iter()
        .zip(&q3)
        .map(|(lo, hi)| alpha * ((hi - lo) / 2.0))
        .collect()
}

/// Divide each sample by its threshold. A zero threshold means the window
/// shows no spread at all, so the sample carries no evidence and maps to 0.
fn normalise(signal: &mut [f64], thresholds: &[f64]) {
    for (v, t) in signal.iter_mut().zip(thresholds) {
        *v = if *t == 0.0 { 0.0 } else { *v / t };
    }
}

/// Mirror-pad without repeating the edge sample. Needs `signal.len() > pad`.
fn reflect_pad(signal: &[f64], pad: usize) -> Vec<f64> {
    let n = signal.len();
    let mut out = Vec::with_capacity(n + 2 * pad);
    out.extend((1..=pad).rev().map(|k| signal[k]));
    out.extend_from_slice(signal);
    out.extend((1..=pad).map(|k| signal[n - 1 - k]));
    out
}

/// Classify every beat of `rr` (milliseconds).
///
/// NaN thresholds (windows with no valid sample) propagate through the
/// comparisons instead of aborting.
pub fn tarvainen_classify(rr: &[f64], params: &TarvainenParams) -> TarvainenArtifacts {
    let n = rr.len();
    let mut out = TarvainenArtifacts::default();
    if n < 3 {
        return out;
    }
    let TarvainenParams {
        c1,
        c2,
        alpha,
        window,
        median_window,
    } = *params;

    let mut drrs: Vec<f64> = std::iter::once(0.0)
        .chain(rr.windows(2).map(|w| w[1] - w[0]))
        .collect();
    drrs[0] = drrs[1..].iter().sum::<f64>() / (n - 1) as f64;
    let th1 = dispersion_threshold(&drrs, alpha, window);
    normalise(&mut drrs, &th1);

    const PAD: usize = 2;
    let padded = reflect_pad(&drrs, PAD);
    let mut s12 = vec![0.0; n];
    let mut s22 = vec![0.0; n];
    for k in 0..n {
        let p = k + PAD;
        let (prev, next, next2) = (padded[p - 1], padded[p + 1], padded[p + 2]);
        if padded[p] > 0.0 {
            s12[k] = prev.max(next);
        } else if padded[p] < 0.0 {
            s12[k] = prev.min(next);
        }
        if padded[p] >= 0.0 {
            s22[k] = next.min(next2);
        } else if padded[p] < 0.0 {
            s22[k] = next.max(next2);
        }
    }

    let medrr = rolling_quantile(rr, median_window, 0.5);
    let mut mrrs: Vec<f64> = rr
        .iter()
        .zip(&medrr)
        .map(|(r, m)| {
            let dev = r - m;
            if dev < 0.0 {
                dev * 2.0
            } else {
                dev
            }
        })
        .collect();
    let th2 = dispersion_threshold(&mrrs, alpha, window);
    normalise(&mut mrrs, &th2);

    let mut i = 0;
    while i + 2 < n {
        let d = drrs[i];
        // NaN is neither small nor large
        if d.abs() <= 1.0 {
            i += 1;
            continue;
        }
        let eq1 = d > 1.0 && s12[i] < -c1 * d - c2;
        let eq2 = d < -1.0 && s12[i] > -c1 * d + c2;
        if eq1 || eq2 {
            out.ectopic.push(i);
            i += 1;
            continue;
        }
        if !(d.abs() > 1.0 || mrrs[i].abs() > 3.0) {
            i += 1;
            continue;
        }

        let mut candidates = vec![i];
        if drrs[i + 1].abs() < drrs[i + 2].abs() {
            candidates.push(i + 1);
        }
        for j in candidates {
            let long = drrs[j] > 1.0 && s22[j] < -1.0;
            let long_or_short = mrrs[j].abs() > 3.0;
            let short = drrs[j] < -1.0 && s22[j] > 1.0;
            // every evaluated candidate advances the scan
            i += 1;
            if !(long || long_or_short || short) {
                continue;
            }
            let missed = (rr[j] / 2.0 - medrr[j]).abs() < th2[j];
            let extra = (rr[j] + rr[j + 1] - medrr[j]).abs() < th2[j];
            if short && extra {
                out.extra.push(j);
            } else if long && missed {
                out.missed.push(j);
            } else {
                out.long_short.push(j);
            }
        }
    }
    log::debug!(
        "tarvainen: {} extra, {} missed, {} ectopic, {} long/short",
        out.extra.len(),
        out.missed.len(),
        out.ectopic.len(),
        out.long_short.len()
    );
    out
}
