//! Artifact correction: select, invalidate, impute or delete, then trim and
//! reconcile the artifact index with the mutated series.

mod impute;

use crate::config::DEFAULT_PRE_MEAN_WINDOW;
use crate::error::{RrError, RrResult};
use crate::series::{
    shift_after_removal, AnalysisRange, ArtifactIndex, ArtifactLabel, IntervalSeries,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Strategy applied to every pending sample of a correction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionMethod {
    LinearInterpolation,
    CubicSpline,
    Deletion,
    /// Fixed 7-sample window.
    MovingAverage,
    /// Mean of the `window` preceding samples (clamped to 2..=10).
    PreMean { window: usize },
}

impl CorrectionMethod {
    /// Name used as the key of `Interval::correction_counts` and in reports.
    pub fn name(&self) -> &'static str {
        match self {
            CorrectionMethod::LinearInterpolation => "linear interpolation",
            CorrectionMethod::CubicSpline => "cubic spline",
            CorrectionMethod::Deletion => "deletion",
            CorrectionMethod::MovingAverage => "moving average",
            CorrectionMethod::PreMean { .. } => "pre mean",
        }
    }
}

impl fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CorrectionMethod {
    type Err = RrError;

    /// Accepts the report names as well as `snake_case`/`kebab-case`
    /// spellings; `pre mean` takes the default window.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "linear" | "linear interpolation" => Ok(CorrectionMethod::LinearInterpolation),
            "cubic" | "cubic spline" => Ok(CorrectionMethod::CubicSpline),
            "deletion" | "delete" => Ok(CorrectionMethod::Deletion),
            "moving average" => Ok(CorrectionMethod::MovingAverage),
            "pre mean" => Ok(CorrectionMethod::PreMean {
                window: DEFAULT_PRE_MEAN_WINDOW,
            }),
            _ => Err(RrError::UnknownMethod(s.to_string())),
        }
    }
}

/// What a correction pass did. Positions in `selected` and `deleted` refer
/// to the series before the pass; `unresolved` refers to the series after.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionOutcome {
    pub selected: Vec<usize>,
    pub imputed: usize,
    /// Removed by deletion, in removal (descending) order.
    pub deleted: Vec<usize>,
    pub trimmed_leading: usize,
    pub trimmed_trailing: usize,
    /// Interior samples still pending after the pass.
    pub unresolved: Vec<usize>,
}

/// Run one correction pass over the samples claimed by `labels` inside
/// `range`.
///
/// Every mutation that changes the series length is applied to `index` at
/// the same time, so on return every stored position is valid for the new
/// series. An empty selection leaves both untouched.
pub fn correct(
    series: &mut IntervalSeries,
    index: &mut ArtifactIndex,
    labels: &[ArtifactLabel],
    method: CorrectionMethod,
    range: AnalysisRange,
) -> RrResult<CorrectionOutcome> {
    range.check(series.len())?;
    let selected = index.union(labels, range);
    if selected.is_empty() {
        log::debug!("nothing selected for correction");
        return Ok(CorrectionOutcome::default());
    }
    let mut outcome = CorrectionOutcome {
        selected: selected.iter().copied().collect(),
        ..Default::default()
    };

    for &idx in &selected {
        let claimant = labels
            .iter()
            .copied()
            .find(|label| index.get(*label).contains(&idx));
        let interval = &mut series.intervals_mut()[idx];
        if interval.artifact.is_none() {
            interval.artifact = claimant;
        }
        interval.value = None;
    }
    log::debug!("invalidated {} samples, applying {method}", selected.len());

    // positions of the corrected samples, kept valid across removals
    let mut resolved: BTreeSet<usize> = selected;
    let snapshot = series.values();
    match method {
        CorrectionMethod::LinearInterpolation => outcome.imputed = impute::linear(series),
        CorrectionMethod::CubicSpline => outcome.imputed = impute::cubic(series),
        CorrectionMethod::Deletion => {
            for idx in series.pending_indices().into_iter().rev() {
                series.remove(idx);
                index.apply_removal(idx);
                shift_after_removal(&mut resolved, idx);
                outcome.deleted.push(idx);
            }
        }
        CorrectionMethod::MovingAverage => {
            outcome.imputed = impute::moving_average(series, &snapshot) + impute::linear(series);
        }
        CorrectionMethod::PreMean { window } => {
            outcome.imputed = impute::pre_mean(series, &snapshot, window) + impute::linear(series);
        }
    }

    while series.get(0).is_some_and(|i| i.is_pending()) {
        series.pop_front();
        index.apply_removal(0);
        shift_after_removal(&mut resolved, 0);
        outcome.trimmed_leading += 1;
    }
    while series.intervals().last().is_some_and(|i| i.is_pending()) {
        let last = series.len() - 1;
        series.pop_back();
        index.apply_removal(last);
        shift_after_removal(&mut resolved, last);
        outcome.trimmed_trailing += 1;
    }
    index.remove_everywhere(&resolved);

    outcome.unresolved = series.pending_indices();
    if !outcome.unresolved.is_empty() {
        log::warn!(
            "{} interior samples could not be corrected: {:?}",
            outcome.unresolved.len(),
            outcome.unresolved
        );
    }
    log::info!(
        "{method}: {} selected, {} imputed, {} deleted, {} trimmed",
        outcome.selected.len(),
        outcome.imputed,
        outcome.deleted.len(),
        outcome.trimmed_leading + outcome.trimmed_trailing
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionConfig;
    use crate::detectors::detect_into;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}"
        );
    }

    fn ramp(n: usize) -> IntervalSeries {
        IntervalSeries::from_values((0..n).map(|i| 800.0 + 10.0 * i as f64))
    }

    fn manual(indices: &[usize]) -> ArtifactIndex {
        let mut index = ArtifactIndex::new();
        for &idx in indices {
            index.mark_manual(idx);
        }
        index
    }

    #[test]
    fn method_names_parse() {
        assert_eq!(
            "moving_average".parse::<CorrectionMethod>().unwrap(),
            CorrectionMethod::MovingAverage
        );
        assert_eq!(
            "Linear Interpolation".parse::<CorrectionMethod>().unwrap(),
            CorrectionMethod::LinearInterpolation
        );
        assert_eq!(
            "pre-mean".parse::<CorrectionMethod>().unwrap(),
            CorrectionMethod::PreMean { window: 4 }
        );
        assert!("median".parse::<CorrectionMethod>().is_err());
    }

    #[test]
    fn linear_fills_gap_exactly() {
        let mut series = IntervalSeries::from_values([1000.0, 1234.0, 1000.0]);
        let mut index = manual(&[1]);
        let range = AnalysisRange::full(series.len());
        let out = correct(
            &mut series,
            &mut index,
            &[ArtifactLabel::Manual],
            CorrectionMethod::LinearInterpolation,
            range,
        )
        .unwrap();
        let sample = series.get(1).unwrap();
        assert_eq!(sample.value, Some(1000.0));
        assert_eq!(sample.artifact, Some(ArtifactLabel::Manual));
        assert_eq!(sample.correction_counts["linear interpolation"], 1);
        assert_eq!(out.imputed, 1);
        assert!(index.is_empty());
    }

    #[test]
    fn spike_with_moving_average_falls_back_to_linear() {
        let mut series = IntervalSeries::from_values([800.0, 800.0, 1600.0, 800.0, 800.0]);
        let mut index = ArtifactIndex::new();
        detect_into(&mut index, &series, &[ArtifactLabel::T1], &DetectionConfig::default());
        let out = correct(
            &mut series,
            &mut index,
            &[ArtifactLabel::T1],
            CorrectionMethod::MovingAverage,
            AnalysisRange::full(5),
        )
        .unwrap();
        assert_eq!(out.selected, vec![2]);
        let sample = series.get(2).unwrap();
        assert_eq!(sample.value, Some(800.0));
        assert_eq!(sample.artifact, Some(ArtifactLabel::T1));
        assert_eq!(sample.correction_counts.get("moving average"), None);
        assert_eq!(sample.correction_counts["linear interpolation"], 1);
        assert!(index.get(ArtifactLabel::T1).is_empty());
    }

    #[test]
    fn moving_average_in_the_interior() {
        let mut series = ramp(12);
        let mut index = manual(&[6]);
        correct(
            &mut series,
            &mut index,
            &[ArtifactLabel::Manual],
            CorrectionMethod::MovingAverage,
            AnalysisRange::full(12),
        )
        .unwrap();
        // symmetric window around a ramp averages back to the ramp value
        assert_close(series.get(6).unwrap().value.unwrap(), 860.0, 1e-9);
        assert_eq!(series.get(6).unwrap().correction_counts["moving average"], 1);
    }

    #[test]
    fn deletion_reindexes_every_label() {
        let mut series = ramp(10);
        let mut index = manual(&[3, 4]);
        index.set(ArtifactLabel::T2, [1, 5, 8], 10);
        index.set(ArtifactLabel::T1, [4, 9], 10);
        let before: Vec<f64> = series.values();
        let out = correct(
            &mut series,
            &mut index,
            &[ArtifactLabel::Manual],
            CorrectionMethod::Deletion,
            AnalysisRange::full(10),
        )
        .unwrap();
        assert_eq!(series.len(), 8);
        assert_eq!(series.original_length(), 10);
        assert_eq!(out.deleted, vec![4, 3]);
        assert_eq!(index.get(ArtifactLabel::T2), &BTreeSet::from([1, 3, 6]));
        assert_eq!(index.get(ArtifactLabel::T1), &BTreeSet::from([7]));
        assert!(index.get(ArtifactLabel::Manual).is_empty());
        // same logical samples after the shift
        let after = series.values();
        assert_eq!(after[3], before[5]);
        assert_eq!(after[6], before[8]);
        assert!(index.max_index().unwrap() < series.len());
    }

    #[test]
    fn empty_selection_is_a_no_op() {
        let mut series = ramp(10);
        let mut index = ArtifactIndex::new();
        index.set(ArtifactLabel::Square, [2, 3], 10);
        let (series_before, index_before) = (series.values(), index.clone());
        let out = correct(
            &mut series,
            &mut index,
            &[ArtifactLabel::T1],
            CorrectionMethod::Deletion,
            AnalysisRange::full(10),
        )
        .unwrap();
        assert_eq!(out, CorrectionOutcome::default());
        assert_eq!(series.values(), series_before);
        assert_eq!(index, index_before);
    }

    #[test]
    fn selection_is_limited_to_range() {
        let mut series = ramp(10);
        let mut index = ArtifactIndex::new();
        index.set(ArtifactLabel::T1, [2, 7], 10);
        let range = AnalysisRange::new(0, 4, 10).unwrap();
        correct(
            &mut series,
            &mut index,
            &[ArtifactLabel::T1],
            CorrectionMethod::LinearInterpolation,
            range,
        )
        .unwrap();
        assert_eq!(index.get(ArtifactLabel::T1), &BTreeSet::from([7]));
        assert_eq!(series.get(7).unwrap().artifact, None);
    }

    #[test]
    fn first_claimant_wins() {
        let mut series = ramp(10);
        let mut index = ArtifactIndex::new();
        index.set(ArtifactLabel::Quotient, [5], 10);
        index.set(ArtifactLabel::T3, [5], 10);
        correct(
            &mut series,
            &mut index,
            &[ArtifactLabel::T3, ArtifactLabel::Quotient],
            CorrectionMethod::CubicSpline,
            AnalysisRange::full(10),
        )
        .unwrap();
        let sample = series.get(5).unwrap();
        assert_eq!(sample.artifact, Some(ArtifactLabel::T3));
        assert_close(sample.value.unwrap(), 850.0, 1e-9);
        assert_eq!(sample.correction_counts["cubic spline"], 1);
    }

    #[test]
    fn pre_mean_with_fallback_near_start() {
        let mut series = ramp(10);
        let mut index = manual(&[1, 6]);
        correct(
            &mut series,
            &mut index,
            &[ArtifactLabel::Manual],
            CorrectionMethod::PreMean { window: 4 },
            AnalysisRange::full(10),
        )
        .unwrap();
        // mean of 820, 830, 840, 850
        assert_eq!(series.get(6).unwrap().value, Some(835.0));
        assert_eq!(series.get(6).unwrap().correction_counts["pre mean"], 1);
        assert_eq!(series.get(1).unwrap().value, Some(810.0));
        assert_eq!(series.get(1).unwrap().correction_counts["linear interpolation"], 1);
    }

    #[test]
    fn unresolvable_edges_are_trimmed() {
        let mut series = ramp(10);
        let mut index = manual(&[0, 4, 9]);
        index.set(ArtifactLabel::T3, [5], 10);
        let out = correct(
            &mut series,
            &mut index,
            &[ArtifactLabel::Manual],
            CorrectionMethod::LinearInterpolation,
            AnalysisRange::full(10),
        )
        .unwrap();
        assert_eq!(series.len(), 8);
        assert_eq!((out.trimmed_leading, out.trimmed_trailing), (1, 1));
        assert!(out.unresolved.is_empty());
        assert_eq!(series.get(0).unwrap().value, Some(810.0));
        assert_eq!(series.get(3).unwrap().value, Some(840.0));
        assert!(index.get(ArtifactLabel::Manual).is_empty());
        assert_eq!(index.get(ArtifactLabel::T3), &BTreeSet::from([4]));
    }

    #[test]
    fn everything_selected_empties_the_series() {
        let mut series = ramp(4);
        let mut index = manual(&[0, 1, 2, 3]);
        let out = correct(
            &mut series,
            &mut index,
            &[ArtifactLabel::Manual],
            CorrectionMethod::CubicSpline,
            AnalysisRange::full(4),
        )
        .unwrap();
        assert!(series.is_empty());
        assert_eq!(out.trimmed_leading, 4);
        assert!(index.is_empty());
    }

    #[test]
    fn invalid_range_is_rejected() {
        let mut series = ramp(4);
        let mut index = manual(&[1]);
        let range = AnalysisRange { start: 2, stop: 9 };
        let err = correct(
            &mut series,
            &mut index,
            &[ArtifactLabel::Manual],
            CorrectionMethod::Deletion,
            range,
        )
        .unwrap_err();
        assert!(matches!(err, RrError::RangeOutOfBounds { .. }));
    }
}
