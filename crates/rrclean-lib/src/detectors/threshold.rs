//! Fixed-difference artifact rules after Giles & Draper (2018), "Heart rate
//! variability artifact correction: T1, T2 and T3".
//!
//! Thresholds are in the units of the series (milliseconds). Comparisons
//! against pending (NaN) samples are false, so such samples never match.

use std::collections::BTreeSet;

/// Local spike: the sample differs from both neighbours by more than
/// `threshold`. The last sample only has its predecessor to compare with;
/// the first sample is never flagged.
pub fn find_t1(rr: &[f64], threshold: f64) -> Vec<usize> {
    let n = rr.len();
    if n < 2 {
        return Vec::new();
    }
    let jump = |a: usize, b: usize| (rr[a] - rr[b]).abs() > threshold;
    let mut out: Vec<usize> = (1..n - 1)
        .filter(|&i| jump(i, i - 1) && jump(i + 1, i))
        .collect();
    if jump(n - 1, n - 2) {
        out.push(n - 1);
    }
    out
}

/// Long beat followed by a short one: `rr[i-1] - rr[i] > threshold`. The
/// first sample is compared against its successor (`rr[1] - rr[0]`).
/// Samples already caught by T1 (at `t1_threshold`) are excluded.
pub fn find_t2(rr: &[f64], threshold: f64, t1_threshold: f64) -> Vec<usize> {
    let n = rr.len();
    if n < 2 {
        return Vec::new();
    }
    let candidates = std::iter::once(0)
        .filter(|_| rr[1] - rr[0] > threshold)
        .chain((1..n).filter(|&i| rr[i - 1] - rr[i] > threshold));
    exclude_t1(candidates, rr, t1_threshold)
}

/// Short beat relative to its successor: `rr[i] - rr[i+1] > threshold`. The
/// last sample is compared against its predecessor (`rr[n-1] - rr[n-2]`).
/// Samples already caught by T1 (at `t1_threshold`) are excluded.
pub fn find_t3(rr: &[f64], threshold: f64, t1_threshold: f64) -> Vec<usize> {
    let n = rr.len();
    if n < 2 {
        return Vec::new();
    }
    let candidates = (0..n - 1)
        .filter(|&i| rr[i] - rr[i + 1] > threshold)
        .chain(std::iter::once(n - 1).filter(|_| rr[n - 1] - rr[n - 2] > threshold));
    exclude_t1(candidates, rr, t1_threshold)
}

fn exclude_t1(
    candidates: impl Iterator<Item = usize>,
    rr: &[f64],
    t1_threshold: f64,
) -> Vec<usize> {
    let t1: BTreeSet<usize> = find_t1(rr, t1_threshold).into_iter().collect();
    candidates.filter(|i| !t1.contains(i)).collect()
}
