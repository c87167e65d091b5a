use crate::config::AnalysisConfig;
use crate::error::{RrError, RrResult};
use crate::interp::{CubicSpline, Interpolant};
use crate::metrics::adf::adfuller;
use crate::series::{AnalysisRange, IntervalSeries};
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};

/// Fewest samples `analyze` accepts.
pub const MIN_ANALYSIS_SAMPLES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stationarity {
    pub statistic: f64,
    pub p_value: f64,
    pub used_lag: usize,
    pub stationary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HrvTime {
    pub mean_rr: f64,
    /// Population standard deviation.
    pub sdnn: f64,
    pub rmssd: f64,
    /// Percentage of successive differences above the pNNx threshold.
    pub pnnx: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HrvFrequency {
    pub vlf: f64,
    pub lf: f64,
    pub hf: f64,
    pub lf_nu: f64,
    pub hf_nu: f64,
    pub lf_hf: f64,
    /// Periodogram bin width (Hz).
    pub resolution: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HrvNonlinear {
    pub sd1: f64,
    pub sd2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrvReport {
    pub n: usize,
    pub range: AnalysisRange,
    pub stationarity: Option<Stationarity>,
    pub time: HrvTime,
    pub frequency: Option<HrvFrequency>,
    pub nonlinear: HrvNonlinear,
}

fn mean(v: &[f64]) -> f64 {
    v.iter().sum::<f64>() / v.len() as f64
}

fn variance(v: &[f64], ddof: usize) -> f64 {
    let m = mean(v);
    v.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (v.len() - ddof) as f64
}

fn diffs(rr: &[f64]) -> Vec<f64> {
    rr.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Needs at least two samples.
pub fn hrv_time(rr: &[f64], pnn_threshold_ms: f64) -> HrvTime {
    let d = diffs(rr);
    let mean_rr = mean(rr);
    // series already in seconds
    let threshold = if mean_rr < 20.0 {
        pnn_threshold_ms / 1000.0
    } else {
        pnn_threshold_ms
    };
    let over = d.iter().filter(|x| x.abs() > threshold).count();
    HrvTime {
        mean_rr,
        sdnn: variance(rr, 0).sqrt(),
        rmssd: (d.iter().map(|x| x * x).sum::<f64>() / d.len() as f64).sqrt(),
        pnnx: 100.0 * over as f64 / d.len() as f64,
    }
}

/// Poincaré descriptors from sample variances. Needs at least three samples.
pub fn hrv_nonlinear(rr: &[f64]) -> HrvNonlinear {
    let d = diffs(rr);
    let var_d = variance(&d, 1);
    let var_rr = variance(rr, 1);
    HrvNonlinear {
        sd1: (0.5 * var_d).sqrt(),
        sd2: (2.0 * var_rr - 0.5 * var_d).max(0.0).sqrt(),
    }
}

fn median(v: &[f64]) -> f64 {
    let mut sorted = v.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Beat times as the running sum of intervals, in seconds.
fn beat_times(rr: &[f64]) -> Vec<f64> {
    let scale = if median(&rr[1..]) > 20.0 { 1000.0 } else { 1.0 };
    rr.iter()
        .scan(0.0, |acc, v| {
            *acc += v;
            Some(*acc / scale)
        })
        .collect()
}

/// Uniform resampling of the tachogram at `fs` over `[t0, t_last)`.
fn resample(rr: &[f64], fs: f64) -> Option<Vec<f64>> {
    let spline = CubicSpline::new(beat_times(rr), rr.to_vec())?;
    let (t0, t_last) = spline.domain();
    let count = ((t_last - t0) * fs).ceil().max(0.0) as usize;
    (0..count)
        .map(|k| t0 + k as f64 / fs)
        .filter(|t| *t < t_last)
        .map(|t| spline.eval(t))
        .collect()
}

fn detrend_linear(signal: &mut [f64]) {
    let n = signal.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = signal.iter().sum::<f64>() / n;
    let (sxy, sxx) = signal.iter().enumerate().fold((0.0, 0.0), |(sxy, sxx), (i, y)| {
        let dx = i as f64 - x_mean;
        (sxy + dx * (y - y_mean), sxx + dx * dx)
    });
    let slope = sxy / sxx;
    for (i, y) in signal.iter_mut().enumerate() {
        *y -= y_mean + slope * (i as f64 - x_mean);
    }
}

/// One-sided periodogram with density scaling and a boxcar window.
fn periodogram(signal: &[f64], fs: f64) -> Option<(Vec<f64>, Vec<f64>)> {
    let n = signal.len();
    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(n);
    let mut frame = signal.to_vec();
    let mut spectrum = r2c.make_output_vec();
    r2c.process(&mut frame, &mut spectrum).ok()?;
    let scale = 1.0 / (fs * n as f64);
    let powers = spectrum
        .iter()
        .enumerate()
        .map(|(k, val)| {
            let edge = k == 0 || (n % 2 == 0 && k == n / 2);
            val.norm_sqr() * scale * if edge { 1.0 } else { 2.0 }
        })
        .collect();
    let freqs = (0..spectrum.len()).map(|k| k as f64 * fs / n as f64).collect();
    Some((freqs, powers))
}

fn band_power(freqs: &[f64], powers: &[f64], band: (f64, f64), df: f64) -> f64 {
    freqs
        .iter()
        .zip(powers)
        .filter(|(f, _)| **f >= band.0 && **f <= band.1)
        .map(|(_, p)| *p)
        .sum::<f64>()
        * df
}

/// Band powers of the resampled tachogram. `None` when fewer than four
/// samples are available before or after resampling.
pub fn hrv_frequency(rr: &[f64], cfg: &AnalysisConfig) -> Option<HrvFrequency> {
    if rr.len() < 4 {
        return None;
    }
    let fs = cfg.interp_rate_hz;
    let mut signal = resample(rr, fs)?;
    if signal.len() < 4 {
        log::warn!("frequency domain: only {} resampled points", signal.len());
        return None;
    }
    detrend_linear(&mut signal);
    let (freqs, powers) = periodogram(&signal, fs)?;
    let df = fs / signal.len() as f64;
    let vlf = band_power(&freqs, &powers, cfg.vlf_band, df);
    let lf = band_power(&freqs, &powers, cfg.lf_band, df);
    let hf = band_power(&freqs, &powers, cfg.hf_band, df);
    Some(HrvFrequency {
        vlf,
        lf,
        hf,
        lf_nu: 100.0 * lf / (lf + hf),
        hf_nu: 100.0 * hf / (lf + hf),
        lf_hf: lf / hf,
        resolution: df,
    })
}

/// All HRV statistics over an inclusive range of a fully corrected series.
pub fn analyze(
    series: &IntervalSeries,
    range: AnalysisRange,
    cfg: &AnalysisConfig,
) -> RrResult<HrvReport> {
    let rr = series.range_values(range)?;
    if rr.len() < MIN_ANALYSIS_SAMPLES {
        return Err(RrError::InsufficientData {
            needed: MIN_ANALYSIS_SAMPLES,
            got: rr.len(),
        });
    }
    let stationarity = adfuller(&rr).map(|res| Stationarity {
        statistic: res.statistic,
        p_value: res.p_value,
        used_lag: res.used_lag,
        stationary: res.p_value <= cfg.stationarity_alpha,
    });
    if stationarity.is_none() {
        log::warn!("stationarity test skipped for {} samples", rr.len());
    }
    let frequency = hrv_frequency(&rr, cfg);
    if frequency.is_none() {
        log::warn!("frequency-domain analysis skipped for {} samples", rr.len());
    }
    Ok(HrvReport {
        n: rr.len(),
        range,
        stationarity,
        time: hrv_time(&rr, cfg.pnn_threshold_ms),
        frequency,
        nonlinear: hrv_nonlinear(&rr),
    })
}

/// Human-readable report. Without `verbose` only the stationarity line is
/// produced.
pub fn summarize(report: &HrvReport, verbose: bool) -> String {
    let mut text = match report.stationarity {
        Some(s) if s.stationary => format!(
            "signal is stationary (p-value {:.3} for adfuller test)",
            s.p_value
        ),
        Some(s) => format!(
            "WARNING! Non-stationary signal (p-value for adfuller test: {:.3})",
            s.p_value
        ),
        None => "stationarity could not be assessed (series too short or constant)".to_string(),
    };
    if !verbose {
        return text;
    }
    let t = &report.time;
    text.push_str(&format!(
        "\n\nTime-domain HRV parameters:\n\
         Mean RRi [ms]: {:.3}\n\
         SDNN [ms]: {:.3}\n\
         RMSSD [ms]: {:.3}\n\
         pNN50 [%]: {:.3}\n",
        t.mean_rr, t.sdnn, t.rmssd, t.pnnx
    ));
    match &report.frequency {
        Some(f) => {
            text.push_str(&format!(
                "\nFrequency-domain HRV parameters:\n\
                 LF [ms2]: {:.5}\n\
                 HF [ms2]: {:.5}\n\
                 LF [nu]: {:.5}\n\
                 HF [nu]: {:.5}\n\
                 LF/HF: {:.5}\n",
                f.lf, f.hf, f.lf_nu, f.hf_nu, f.lf_hf
            ));
        }
        None => text.push_str("\nFrequency-domain HRV parameters: not available\n"),
    }
    let p = &report.nonlinear;
    text.push_str(&format!(
        "\nPoincare descriptors:\n\
         SD1 [ms]: {:.3}\n\
         SD2 [ms]: {:.3}\n",
        p.sd1, p.sd2
    ));
    text
}
