use crate::error::{RrError, RrResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Which detector (or the user) claimed a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ArtifactLabel {
    Tarvainen,
    Quotient,
    Square,
    T1,
    T2,
    T3,
    Manual,
}

impl ArtifactLabel {
    pub const ALL: [ArtifactLabel; 7] = [
        ArtifactLabel::Tarvainen,
        ArtifactLabel::Quotient,
        ArtifactLabel::Square,
        ArtifactLabel::T1,
        ArtifactLabel::T2,
        ArtifactLabel::T3,
        ArtifactLabel::Manual,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ArtifactLabel::Tarvainen => "Tarvainen",
            ArtifactLabel::Quotient => "Quotient",
            ArtifactLabel::Square => "Square",
            ArtifactLabel::T1 => "T1",
            ArtifactLabel::T2 => "T2",
            ArtifactLabel::T3 => "T3",
            ArtifactLabel::Manual => "Manual",
        }
    }
}

impl fmt::Display for ArtifactLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ArtifactLabel {
    type Err = RrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArtifactLabel::ALL
            .iter()
            .copied()
            .find(|label| label.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RrError::UnknownLabel(s.to_string()))
    }
}

/// One RR sample. `value == None` means the sample is pending correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub value: Option<f64>,
    pub artifact: Option<ArtifactLabel>,
    pub correction_counts: BTreeMap<String, u32>,
}

impl Interval {
    pub fn new(value: f64) -> Self {
        Self {
            value: Some(value),
            artifact: None,
            correction_counts: BTreeMap::new(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.value.is_none()
    }

    pub(crate) fn resolve(&mut self, value: f64, method: &str) {
        self.value = Some(value);
        *self.correction_counts.entry(method.to_string()).or_insert(0) += 1;
    }
}

/// Ordered RR samples of one recording (milliseconds).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntervalSeries {
    intervals: Vec<Interval>,
    original_length: usize,
}

impl IntervalSeries {
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let intervals: Vec<Interval> = values.into_iter().map(Interval::new).collect();
        let original_length = intervals.len();
        Self {
            intervals,
            original_length,
        }
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Length at load time, kept for reporting.
    pub fn original_length(&self) -> usize {
        self.original_length
    }

    pub fn get(&self, index: usize) -> Option<&Interval> {
        self.intervals.get(index)
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub(crate) fn intervals_mut(&mut self) -> &mut [Interval] {
        &mut self.intervals
    }

    /// Numeric view for detectors; pending samples read as NaN.
    pub fn values(&self) -> Vec<f64> {
        self.intervals
            .iter()
            .map(|i| i.value.unwrap_or(f64::NAN))
            .collect()
    }

    /// `(index, value)` pairs of every non-pending sample.
    pub fn valid_points(&self) -> (Vec<f64>, Vec<f64>) {
        self.intervals
            .iter()
            .enumerate()
            .filter_map(|(idx, i)| i.value.map(|v| (idx as f64, v)))
            .unzip()
    }

    pub fn pending_indices(&self) -> Vec<usize> {
        self.intervals
            .iter()
            .enumerate()
            .filter(|(_, i)| i.is_pending())
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Values of an inclusive range; fails if any of them is still pending.
    pub fn range_values(&self, range: AnalysisRange) -> RrResult<Vec<f64>> {
        range.check(self.len())?;
        self.intervals[range.start..=range.stop]
            .iter()
            .enumerate()
            .map(|(offset, i)| {
                i.value.ok_or(RrError::PendingInRange {
                    index: range.start + offset,
                })
            })
            .collect()
    }

    pub(crate) fn remove(&mut self, index: usize) -> Interval {
        self.intervals.remove(index)
    }

    pub(crate) fn pop_front(&mut self) -> Option<Interval> {
        if self.intervals.is_empty() {
            None
        } else {
            Some(self.intervals.remove(0))
        }
    }

    pub(crate) fn pop_back(&mut self) -> Option<Interval> {
        self.intervals.pop()
    }
}

/// Apply the reindex delta of removing position `removed` to one index set.
pub(crate) fn shift_after_removal(set: &mut BTreeSet<usize>, removed: usize) {
    let shifted: BTreeSet<usize> = set
        .iter()
        .filter(|&&idx| idx != removed)
        .map(|&idx| if idx > removed { idx - 1 } else { idx })
        .collect();
    *set = shifted;
}

/// Per-label sets of suspect sample positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactIndex {
    sets: BTreeMap<ArtifactLabel, BTreeSet<usize>>,
}

impl Default for ArtifactIndex {
    fn default() -> Self {
        Self {
            sets: ArtifactLabel::ALL
                .iter()
                .map(|&label| (label, BTreeSet::new()))
                .collect(),
        }
    }
}

impl ArtifactIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, label: ArtifactLabel) -> &BTreeSet<usize> {
        &self.sets[&label]
    }

    fn set_mut(&mut self, label: ArtifactLabel) -> &mut BTreeSet<usize> {
        self.sets.entry(label).or_default()
    }

    /// Replace a label's set with fresh detector output. Positions at or past
    /// `len` are dropped so the index never points outside the series.
    pub fn set<I>(&mut self, label: ArtifactLabel, indices: I, len: usize)
    where
        I: IntoIterator<Item = usize>,
    {
        let set = self.set_mut(label);
        set.clear();
        set.extend(indices.into_iter().filter(|&idx| idx < len));
    }

    pub fn insert(&mut self, label: ArtifactLabel, index: usize) -> bool {
        self.set_mut(label).insert(index)
    }

    pub fn mark_manual(&mut self, index: usize) -> bool {
        self.insert(ArtifactLabel::Manual, index)
    }

    /// Forget the given positions under every label.
    pub fn unmark(&mut self, indices: &[usize]) {
        for set in self.sets.values_mut() {
            for idx in indices {
                set.remove(idx);
            }
        }
    }

    pub fn clear(&mut self) {
        for set in self.sets.values_mut() {
            set.clear();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sets.values().all(|s| s.is_empty())
    }

    /// Union of the chosen labels restricted to an inclusive range.
    pub fn union(&self, labels: &[ArtifactLabel], range: AnalysisRange) -> BTreeSet<usize> {
        labels
            .iter()
            .flat_map(|label| self.get(*label).iter().copied())
            .filter(|&idx| range.contains(idx))
            .collect()
    }

    pub fn counts(&self) -> BTreeMap<ArtifactLabel, usize> {
        self.sets.iter().map(|(k, v)| (*k, v.len())).collect()
    }

    pub fn max_index(&self) -> Option<usize> {
        self.sets.values().filter_map(|s| s.last().copied()).max()
    }

    /// Reindex every label after the sample at `removed` left the series.
    pub fn apply_removal(&mut self, removed: usize) {
        for set in self.sets.values_mut() {
            shift_after_removal(set, removed);
        }
    }

    pub(crate) fn remove_everywhere(&mut self, indices: &BTreeSet<usize>) {
        for set in self.sets.values_mut() {
            set.retain(|idx| !indices.contains(idx));
        }
    }
}

/// Inclusive `[start, stop]` window of the series under analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRange {
    pub start: usize,
    pub stop: usize,
}

impl AnalysisRange {
    pub fn new(start: usize, stop: usize, len: usize) -> RrResult<Self> {
        let range = Self { start, stop };
        range.check(len)?;
        Ok(range)
    }

    /// The whole series. Callers must not use this on an empty series.
    pub fn full(len: usize) -> Self {
        Self {
            start: 0,
            stop: len.saturating_sub(1),
        }
    }

    /// Resolve the window from free-text user input. Unparsable start falls
    /// back to 0; unparsable stop, a stop at or before start, or a stop past
    /// the end falls back to the last sample.
    pub fn from_inputs(start: Option<&str>, stop: Option<&str>, len: usize) -> Self {
        let last = len.saturating_sub(1);
        let start = match start.map(|s| s.trim().parse::<usize>()) {
            Some(Ok(v)) if v <= last => v,
            Some(Ok(_)) | Some(Err(_)) => {
                log::warn!("analysis start could not be used, falling back to 0");
                0
            }
            None => 0,
        };
        let stop = match stop.map(|s| s.trim().parse::<usize>()) {
            Some(Ok(v)) if v > start && v <= last => v,
            Some(_) => {
                log::warn!("analysis stop could not be used, falling back to {last}");
                last
            }
            None => last,
        };
        Self { start, stop }
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index <= self.stop
    }

    pub(crate) fn check(&self, len: usize) -> RrResult<()> {
        if len == 0 {
            return Err(RrError::EmptySeries);
        }
        if self.start > self.stop || self.stop >= len {
            return Err(RrError::RangeOutOfBounds {
                start: self.start,
                stop: self.stop,
                len,
            });
        }
        Ok(())
    }
}
