use assert_cmd::cargo::cargo_bin_cmd;
use rrclean_lib::CorrectionOutcome;
use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
struct CleanOutput {
    original_length: usize,
    length: usize,
    outcome: CorrectionOutcome,
    reset_parameters: Vec<String>,
    remaining_marks: serde_json::Value,
    series_path: PathBuf,
    stats_path: PathBuf,
}

fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .expect("crates dir")
        .parent()
        .expect("workspace root")
        .to_path_buf()
}

fn read_values(path: &Path) -> Result<Vec<f64>, Box<dyn Error>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::parse)
        .collect::<Result<Vec<f64>, _>>()?)
}

fn run_clean(args: &[&str]) -> Result<CleanOutput, Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("rrclean");
    cmd.arg("clean").args(args);
    let out = cmd.assert().success().get_output().stdout.clone();
    Ok(serde_json::from_slice(&out)?)
}

#[test]
fn linear_correction_keeps_length() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let input = workspace_root().join("test_data/rr_artifacts.txt");
    let out_path = dir.path().join("cleaned.txt");
    let result = run_clean(&[
        "--input",
        input.to_str().expect("utf8 path"),
        "--methods",
        "t1",
        "--correction",
        "linear",
        "--out",
        out_path.to_str().expect("utf8 path"),
    ])?;
    assert_eq!(result.original_length, 300);
    assert_eq!(result.length, 300);
    assert_eq!(result.outcome.selected, vec![120, 200, 201]);
    assert!(result.outcome.unresolved.is_empty());
    assert_eq!(result.series_path, out_path);
    assert_eq!(result.stats_path, dir.path().join("cleaned_stats.txt"));

    let values = read_values(&out_path)?;
    assert_eq!(values.len(), 300);
    assert_eq!(values[120], 833.5);
    assert!(values.iter().all(|v| (790.0..=850.0).contains(v)));

    let stats = fs::read_to_string(&result.stats_path)?;
    assert!(stats.starts_with("number of removed artifacts: 0\n"));
    assert!(stats.contains("number of corrected artifacts: 3\n"));
    assert!(stats.contains("Count for linear interpolation: 3\n"));
    assert!(stats.contains("Count for T1: 3\n"));
    assert!(stats.contains("\nHRV parameters:\n"));
    assert!(stats.contains("Time-domain HRV parameters:"));
    Ok(())
}

#[test]
fn deletion_shortens_series_and_uses_default_names() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("subject.txt");
    fs::copy(workspace_root().join("test_data/rr_artifacts.txt"), &input)?;
    let result = run_clean(&[
        "--input",
        input.to_str().expect("utf8 path"),
        "--methods",
        "t1",
        "--correction",
        "deletion",
    ])?;
    assert_eq!(result.length, 297);
    assert_eq!(result.outcome.deleted, vec![201, 200, 120]);
    assert_eq!(result.series_path, dir.path().join("subject_clean.txt"));
    assert_eq!(result.stats_path, dir.path().join("subject_clean_stats.txt"));
    assert_eq!(read_values(&result.series_path)?.len(), 297);
    let stats = fs::read_to_string(&result.stats_path)?;
    assert!(stats.starts_with("number of removed artifacts: 3\n"));
    Ok(())
}

#[test]
fn sub_range_export_is_inclusive() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("subject.csv");
    fs::copy(workspace_root().join("test_data/rr_artifacts.csv"), &input)?;
    let result = run_clean(&[
        "--input",
        input.to_str().expect("utf8 path"),
        "--methods",
        "tarvainen",
        "--correction",
        "moving-average",
        "--start",
        "10",
        "--stop",
        "250",
    ])?;
    assert_eq!(result.series_path, dir.path().join("subject_short_clean.txt"));
    assert_eq!(result.outcome.selected, vec![120, 200, 201]);
    assert!(result.reset_parameters.is_empty());
    assert_eq!(result.remaining_marks["Tarvainen"], 0);
    let values = read_values(&result.series_path)?;
    assert_eq!(values.len(), 241);
    assert!(values.iter().all(|v| (790.0..=850.0).contains(v)));
    Ok(())
}

#[test]
fn manual_marks_are_corrected() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let input = workspace_root().join("test_data/rr_clean.txt");
    let out_path = dir.path().join("manual.txt");
    let result = run_clean(&[
        "--input",
        input.to_str().expect("utf8 path"),
        "--methods",
        "",
        "--manual",
        "0,50",
        "--out",
        out_path.to_str().expect("utf8 path"),
    ])?;
    // the first sample cannot be interpolated and is trimmed
    assert_eq!(result.outcome.selected, vec![0, 50]);
    assert_eq!(result.outcome.trimmed_leading, 1);
    assert_eq!(result.length, 299);
    let stats = fs::read_to_string(&result.stats_path)?;
    assert!(stats.contains("Count for Manual: 1\n"));
    Ok(())
}

#[test]
fn marks_outside_range_are_kept() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let input = workspace_root().join("test_data/rr_artifacts.txt");
    let out_path = dir.path().join("tail.txt");
    let result = run_clean(&[
        "--input",
        input.to_str().expect("utf8 path"),
        "--methods",
        "t1",
        "--correction",
        "pre-mean",
        "--pre-mean-window",
        "four",
        "--start",
        "150",
        "--stop",
        "299",
        "--out",
        out_path.to_str().expect("utf8 path"),
    ])?;
    assert_eq!(result.outcome.selected, vec![200, 201]);
    assert_eq!(result.reset_parameters, vec!["pre_mean_window".to_string()]);
    // the spike at 120 lies before the range and stays marked
    assert_eq!(result.remaining_marks["T1"], 1);
    assert_eq!(result.length, 300);
    assert_eq!(read_values(&out_path)?.len(), 150);
    Ok(())
}
