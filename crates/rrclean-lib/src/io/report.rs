use crate::correction::CorrectionMethod;
use crate::series::{AnalysisRange, ArtifactLabel, IntervalSeries};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Every method in report order.
const METHODS: [CorrectionMethod; 5] = [
    CorrectionMethod::LinearInterpolation,
    CorrectionMethod::CubicSpline,
    CorrectionMethod::Deletion,
    CorrectionMethod::MovingAverage,
    CorrectionMethod::PreMean {
        window: crate::config::DEFAULT_PRE_MEAN_WINDOW,
    },
];

/// Where the corrected series and its statistics go by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub series: PathBuf,
    pub stats: PathBuf,
}

/// `<stem>_clean.txt` for a whole-series export, `<stem>_short_clean.txt`
/// for a sub-range, each with a `_stats.txt` companion next to the input.
pub fn default_output_paths(input: &Path, whole_series: bool) -> OutputPaths {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "rr".to_string());
    let base = if whole_series {
        format!("{stem}_clean")
    } else {
        format!("{stem}_short_clean")
    };
    stats_alongside(input.with_file_name(format!("{base}.txt")))
}

/// Pair an explicit series path with its `<name>_stats.txt` companion.
pub fn stats_alongside(series: PathBuf) -> OutputPaths {
    let stem = series
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stats = series.with_file_name(format!("{stem}_stats.txt"));
    OutputPaths { series, stats }
}

/// One value per line; pending samples are written as `NaN`.
pub fn format_series(series: &IntervalSeries, range: Option<AnalysisRange>) -> String {
    let values = series.values();
    let slice = match range {
        Some(r) => values.get(r.start..=r.stop).unwrap_or_default(),
        None => &values[..],
    };
    slice.iter().map(|v| format!("{v}\n")).collect()
}

pub fn write_series(
    path: &Path,
    series: &IntervalSeries,
    range: Option<AnalysisRange>,
) -> Result<()> {
    if let Some(r) = range {
        r.check(series.len())?;
    }
    std::fs::write(path, format_series(series, range))
        .with_context(|| format!("writing {}", path.display()))
}

/// Companion statistics: removed and corrected counts, per-method and
/// per-label tallies over corrected samples, then the HRV summary.
pub fn statistics_report(series: &IntervalSeries, hrv_summary: &str) -> String {
    let corrected: Vec<_> = series
        .intervals()
        .iter()
        .filter(|i| i.artifact.is_some())
        .collect();
    let mut out = String::new();
    out.push_str(&format!(
        "number of removed artifacts: {}\n",
        series.original_length().saturating_sub(series.len())
    ));
    out.push_str(&format!(
        "number of corrected artifacts: {}\n",
        corrected.len()
    ));
    for method in METHODS {
        let total: u32 = corrected
            .iter()
            .filter_map(|i| i.correction_counts.get(method.name()))
            .sum();
        out.push_str(&format!("Count for {method}: {total}\n"));
    }
    for label in ArtifactLabel::ALL {
        let total = corrected.iter().filter(|i| i.artifact == Some(label)).count();
        if total > 0 {
            out.push_str(&format!("Count for {label}: {total}\n"));
        }
    }
    out.push_str("\nHRV parameters:\n");
    out.push_str(hrv_summary);
    out
}

pub fn write_statistics(path: &Path, series: &IntervalSeries, hrv_summary: &str) -> Result<()> {
    std::fs::write(path, statistics_report(series, hrv_summary))
        .with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::correct;
    use crate::series::ArtifactIndex;

    #[test]
    fn output_names_follow_input_stem() {
        let paths = default_output_paths(Path::new("/data/subject01.txt"), true);
        assert_eq!(paths.series, PathBuf::from("/data/subject01_clean.txt"));
        assert_eq!(paths.stats, PathBuf::from("/data/subject01_clean_stats.txt"));
        let short = default_output_paths(Path::new("rec.csv"), false);
        assert_eq!(short.series, PathBuf::from("rec_short_clean.txt"));
        assert_eq!(short.stats, PathBuf::from("rec_short_clean_stats.txt"));
    }

    #[test]
    fn series_range_is_inclusive() {
        let series = IntervalSeries::from_values([800.0, 812.5, 790.0, 805.0]);
        assert_eq!(format_series(&series, None), "800\n812.5\n790\n805\n");
        let range = AnalysisRange::new(1, 2, 4).unwrap();
        assert_eq!(format_series(&series, Some(range)), "812.5\n790\n");
    }

    #[test]
    fn statistics_count_methods_and_labels() {
        let mut series = IntervalSeries::from_values((0..10).map(|i| 800.0 + i as f64));
        let mut index = ArtifactIndex::new();
        index.set(ArtifactLabel::T1, [4], 10);
        index.mark_manual(6);
        index.mark_manual(9);
        correct(
            &mut series,
            &mut index,
            &[ArtifactLabel::T1, ArtifactLabel::Manual],
            CorrectionMethod::LinearInterpolation,
            AnalysisRange::full(10),
        )
        .unwrap();
        let text = statistics_report(&series, "signal is stationary");
        assert!(text.starts_with(
            "number of removed artifacts: 1\nnumber of corrected artifacts: 2\n"
        ));
        assert!(text.contains("Count for linear interpolation: 2\n"));
        assert!(text.contains("Count for pre mean: 0\n"));
        assert!(text.contains("Count for T1: 1\n"));
        assert!(text.contains("Count for Manual: 1\n"));
        assert!(!text.contains("Count for Square"));
        assert!(text.ends_with("\nHRV parameters:\nsignal is stationary"));
    }

    #[test]
    fn writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let series = IntervalSeries::from_values([800.0, 810.0]);
        let path = dir.path().join("out.txt");
        write_series(&path, &series, None).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "800\n810\n");
        let bad = AnalysisRange { start: 0, stop: 5 };
        assert!(write_series(&path, &series, Some(bad)).is_err());
    }
}
