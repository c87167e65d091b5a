//! Quotient and square filters of Piskorski & Guzik (2005).

use std::collections::BTreeSet;

/// Flag both samples of every consecutive pair whose ratio, in either
/// direction, leaves `[low, high]`.
pub fn find_quotient(rr: &[f64], low: f64, high: f64) -> Vec<usize> {
    let outside = |q: f64| q < low || q > high;
    let mut out = BTreeSet::new();
    for (i, pair) in rr.windows(2).enumerate() {
        let (a, b) = (pair[0], pair[1]);
        if outside(a / b) || outside(b / a) {
            out.insert(i);
            out.insert(i + 1);
        }
    }
    out.into_iter().collect()
}

/// Flag samples at or beyond the physiological limits `min_ms`/`max_ms`,
/// together with their predecessor.
///
/// The predecessor is included because a mis-detected beat shifts the
/// cumulative timing of the previous interval as well.
pub fn find_square(rr: &[f64], min_ms: f64, max_ms: f64) -> Vec<usize> {
    let mut out = BTreeSet::new();
    for (i, &v) in rr.iter().enumerate() {
        if v <= min_ms || v >= max_ms {
            out.insert(i);
            if i > 0 {
                out.insert(i - 1);
            }
        }
    }
    out.into_iter().collect()
}
