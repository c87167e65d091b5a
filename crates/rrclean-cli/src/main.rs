use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use rrclean_lib::{
    config::{clamp_pre_mean, parse_or_default, read_config, Config},
    correction::{correct, CorrectionMethod, CorrectionOutcome},
    detectors::{detect_into, Detection},
    io::{
        load_series,
        report::{default_output_paths, stats_alongside, write_series, write_statistics},
    },
    metrics::hrv::{analyze, summarize, HrvReport},
    series::{AnalysisRange, ArtifactIndex, ArtifactLabel, IntervalSeries},
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "rrclean",
    version,
    about = "RR-interval artifact detection, correction and HRV analysis"
)]
struct Cli {
    /// Logging verbosity (e.g., debug, info, warn)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// TOML configuration file; missing keys keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Detector selection and thresholds shared by `detect` and `clean`.
#[derive(clap::Args, Clone, Debug)]
struct DetectArgs {
    /// Detectors to run: tarvainen, quotient, square, t1, t2, t3
    #[arg(long, value_delimiter = ',', default_value = "tarvainen")]
    methods: Vec<String>,
    /// T1 threshold in ms; unparsable input falls back to the default
    #[arg(long)]
    t1: Option<String>,
    /// T2 threshold in ms
    #[arg(long)]
    t2: Option<String>,
    /// T3 threshold in ms
    #[arg(long)]
    t3: Option<String>,
}

/// Inclusive analysis window given as free text.
#[derive(clap::Args, Clone, Debug)]
struct RangeArgs {
    #[arg(long)]
    start: Option<String>,
    #[arg(long)]
    stop: Option<String>,
}

impl RangeArgs {
    fn whole_series(&self) -> bool {
        self.start.is_none() && self.stop.is_none()
    }

    fn resolve(&self, len: usize) -> AnalysisRange {
        AnalysisRange::from_inputs(self.start.as_deref(), self.stop.as_deref(), len)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run artifact detectors and print the flagged positions as JSON
    Detect {
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        detect: DetectArgs,
    },
    /// Compute HRV statistics for a recording
    Hrv {
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        range: RangeArgs,
        /// Print the full summary instead of the stationarity line
        #[arg(long)]
        verbose: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Detect, correct and export a cleaned series with its statistics
    Clean {
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        detect: DetectArgs,
        /// Extra positions to mark manually (comma separated)
        #[arg(long, value_delimiter = ',')]
        manual: Vec<usize>,
        /// Correction method: linear, cubic, deletion, moving-average, pre-mean
        #[arg(long)]
        correction: Option<String>,
        /// Pre-mean window (2..=10); unparsable input falls back to 4
        #[arg(long)]
        pre_mean_window: Option<String>,
        #[command(flatten)]
        range: RangeArgs,
        /// Output path of the cleaned series; defaults next to the input
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => Config::default(),
    };
    match cli.command {
        Commands::Detect { input, detect } => cmd_detect(&input, &detect, &mut config)?,
        Commands::Hrv {
            input,
            range,
            verbose,
            json,
        } => cmd_hrv(&input, &range, verbose, json, &config)?,
        Commands::Clean {
            input,
            detect,
            manual,
            correction,
            pre_mean_window,
            range,
            out,
        } => cmd_clean(
            &input,
            &detect,
            &manual,
            correction.as_deref(),
            pre_mean_window.as_deref(),
            &range,
            out,
            &mut config,
        )?,
    }
    Ok(())
}

fn parse_labels(methods: &[String]) -> Result<Vec<ArtifactLabel>> {
    methods
        .iter()
        .filter(|m| !m.trim().is_empty())
        .map(|m| m.parse::<ArtifactLabel>().map_err(Into::into))
        .collect()
}

/// Fold command-line thresholds into the configuration. Returns the names
/// of the parameters that were reset to their defaults.
fn apply_thresholds(args: &DetectArgs, config: &mut Config) -> Vec<&'static str> {
    let det = &mut config.detection;
    let mut reset = Vec::new();
    for (name, text, slot) in [
        ("t1", &args.t1, &mut det.t1_ms),
        ("t2", &args.t2, &mut det.t2_ms),
        ("t3", &args.t3, &mut det.t3_ms),
    ] {
        if let Some(text) = text {
            let parsed = parse_or_default(text, *slot);
            *slot = parsed.value;
            if parsed.fell_back {
                reset.push(name);
            }
        }
    }
    reset
}

#[derive(Serialize)]
struct DetectOutput {
    len: usize,
    t1_ms: i64,
    t2_ms: i64,
    t3_ms: i64,
    reset_parameters: Vec<&'static str>,
    detections: Vec<Detection>,
    counts: BTreeMap<ArtifactLabel, usize>,
}

fn cmd_detect(input: &Path, args: &DetectArgs, config: &mut Config) -> Result<()> {
    let series = load_series(input)?;
    let labels = parse_labels(&args.methods)?;
    let reset_parameters = apply_thresholds(args, config);
    let mut index = ArtifactIndex::new();
    let detections = detect_into(&mut index, &series, &labels, &config.detection);
    let out = DetectOutput {
        len: series.len(),
        t1_ms: config.detection.t1_ms,
        t2_ms: config.detection.t2_ms,
        t3_ms: config.detection.t3_ms,
        reset_parameters,
        detections,
        counts: index.counts(),
    };
    println!("{}", serde_json::to_string(&out)?);
    Ok(())
}

fn cmd_hrv(
    input: &Path,
    range: &RangeArgs,
    verbose: bool,
    json: bool,
    config: &Config,
) -> Result<()> {
    let series = load_series(input)?;
    let window = range.resolve(series.len());
    let report = analyze(&series, window, &config.analysis)?;
    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("{}", summarize(&report, verbose));
    }
    Ok(())
}

fn resolve_method(
    name: Option<&str>,
    pre_mean_window: Option<&str>,
    config: &Config,
    reset: &mut Vec<&'static str>,
) -> Result<CorrectionMethod> {
    let method = match name {
        Some(name) => name.parse::<CorrectionMethod>()?,
        None => config.correction.method,
    };
    Ok(match method {
        CorrectionMethod::PreMean { window } => {
            let window = match pre_mean_window {
                Some(text) => {
                    let parsed = parse_or_default(text, window);
                    if parsed.fell_back {
                        reset.push("pre_mean_window");
                    }
                    parsed.value
                }
                None => window,
            };
            CorrectionMethod::PreMean {
                window: clamp_pre_mean(window),
            }
        }
        other => other,
    })
}

#[derive(Serialize)]
struct CleanOutput {
    original_length: usize,
    length: usize,
    method: CorrectionMethod,
    reset_parameters: Vec<&'static str>,
    outcome: CorrectionOutcome,
    /// Marks still held after correction, e.g. outside the range.
    remaining_marks: BTreeMap<ArtifactLabel, usize>,
    series_path: PathBuf,
    stats_path: PathBuf,
    hrv: Option<HrvReport>,
}

#[allow(clippy::too_many_arguments)]
fn cmd_clean(
    input: &Path,
    args: &DetectArgs,
    manual: &[usize],
    correction: Option<&str>,
    pre_mean_window: Option<&str>,
    range: &RangeArgs,
    out: Option<PathBuf>,
    config: &mut Config,
) -> Result<()> {
    let mut series = load_series(input)?;
    let mut labels = parse_labels(&args.methods)?;
    let mut reset_parameters = apply_thresholds(args, config);
    let method = resolve_method(correction, pre_mean_window, config, &mut reset_parameters)?;

    let mut index = ArtifactIndex::new();
    detect_into(&mut index, &series, &labels, &config.detection);
    for &idx in manual {
        if idx < series.len() {
            index.mark_manual(idx);
        } else {
            log::warn!("manual mark {idx} is outside a series of {}", series.len());
        }
    }
    if !manual.is_empty() && !labels.contains(&ArtifactLabel::Manual) {
        labels.push(ArtifactLabel::Manual);
    }

    let window = range.resolve(series.len());
    let outcome = correct(&mut series, &mut index, &labels, method, window)?;

    let paths = match out {
        Some(path) => stats_alongside(path),
        None => default_output_paths(input, range.whole_series()),
    };
    let (export_range, hrv) = analyze_cleaned(&series, range, config)?;
    let summary = match &hrv {
        Some(report) => summarize(report, true),
        None => "HRV parameters could not be computed".to_string(),
    };
    write_series(&paths.series, &series, export_range)?;
    write_statistics(&paths.stats, &series, &summary)?;
    log::info!("wrote {}", paths.series.display());

    let result = CleanOutput {
        original_length: series.original_length(),
        length: series.len(),
        method,
        reset_parameters,
        outcome,
        remaining_marks: index.counts(),
        series_path: paths.series,
        stats_path: paths.stats,
        hrv,
    };
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}

/// Re-resolve the window against the corrected series and analyse it.
fn analyze_cleaned(
    series: &IntervalSeries,
    range: &RangeArgs,
    config: &Config,
) -> Result<(Option<AnalysisRange>, Option<HrvReport>)> {
    if series.is_empty() {
        anyhow::bail!("every sample was removed during correction");
    }
    let window = range.resolve(series.len());
    let export = (!range.whole_series()).then_some(window);
    let hrv = match analyze(series, window, &config.analysis) {
        Ok(report) => Some(report),
        Err(err) => {
            log::warn!("HRV analysis skipped: {err}");
            None
        }
    };
    Ok((export, hrv))
}
