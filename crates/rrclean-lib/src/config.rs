use crate::correction::CorrectionMethod;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Parameters of the Tarvainen (Lipponen & Tarvainen 2019) detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TarvainenParams {
    pub c1: f64,
    pub c2: f64,
    /// Scale applied to half the rolling interquartile range.
    pub alpha: f64,
    /// Rolling window for the dispersion thresholds.
    pub window: usize,
    /// Rolling window for the local median.
    pub median_window: usize,
}

impl Default for TarvainenParams {
    fn default() -> Self {
        Self {
            c1: 0.13,
            c2: 0.17,
            alpha: 5.2,
            window: 91,
            median_window: 11,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub tarvainen: TarvainenParams,
    /// Giles T1 threshold (ms).
    pub t1_ms: i64,
    /// Giles T2 threshold (ms).
    pub t2_ms: i64,
    /// Giles T3 threshold (ms).
    pub t3_ms: i64,
    pub quotient_low: f64,
    pub quotient_high: f64,
    pub square_min_ms: f64,
    pub square_max_ms: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            tarvainen: TarvainenParams::default(),
            t1_ms: DEFAULT_T1_MS,
            t2_ms: DEFAULT_T2_MS,
            t3_ms: DEFAULT_T3_MS,
            quotient_low: 0.8,
            quotient_high: 1.2,
            square_min_ms: 300.0,
            square_max_ms: 2000.0,
        }
    }
}

pub const DEFAULT_T1_MS: i64 = 200;
pub const DEFAULT_T2_MS: i64 = 400;
pub const DEFAULT_T3_MS: i64 = 400;
pub const DEFAULT_PRE_MEAN_WINDOW: usize = 4;
pub const PRE_MEAN_WINDOW_RANGE: std::ops::RangeInclusive<usize> = 2..=10;
pub const MOVING_AVERAGE_WINDOW: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    pub method: CorrectionMethod,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            method: CorrectionMethod::LinearInterpolation,
        }
    }
}

pub fn clamp_pre_mean(window: usize) -> usize {
    window.clamp(*PRE_MEAN_WINDOW_RANGE.start(), *PRE_MEAN_WINDOW_RANGE.end())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Uniform resampling rate for the periodogram (Hz).
    pub interp_rate_hz: f64,
    /// pNNx threshold (ms); scaled to seconds for series already in seconds.
    pub pnn_threshold_ms: f64,
    pub vlf_band: (f64, f64),
    pub lf_band: (f64, f64),
    pub hf_band: (f64, f64),
    /// p-value at or below which the series is reported stationary.
    pub stationarity_alpha: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            interp_rate_hz: 3.0,
            pnn_threshold_ms: 50.0,
            vlf_band: (0.0033, 0.04),
            lf_band: (0.04, 0.15),
            hf_band: (0.15, 0.4),
            stationarity_alpha: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub detection: DetectionConfig,
    pub correction: CorrectionConfig,
    pub analysis: AnalysisConfig,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("parsing rrclean configuration")
    }
}

/// Read a TOML configuration file; missing keys take their defaults.
pub fn read_config(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    Config::from_toml_str(&contents).with_context(|| format!("in {}", path.display()))
}

/// Outcome of parsing a user-typed integer parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parsed<T> {
    pub value: T,
    /// True when the input was rejected and `value` is the default; the
    /// caller should show `value` back to the user.
    pub fell_back: bool,
}

/// Parse an integer parameter, falling back to `default` when the text is
/// not an integer.
pub fn parse_or_default<T>(text: &str, default: T) -> Parsed<T>
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match text.trim().parse::<T>() {
        Ok(value) => Parsed {
            value,
            fell_back: false,
        },
        Err(_) => {
            log::warn!("could not parse {text:?} as an integer, using default {default}");
            Parsed {
                value: default,
                fell_back: true,
            }
        }
    }
}
