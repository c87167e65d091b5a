pub mod filters;
pub mod tarvainen;
pub mod threshold;

use crate::config::DetectionConfig;
use crate::series::{ArtifactIndex, ArtifactLabel, IntervalSeries};
use serde::{Deserialize, Serialize};

pub use filters::{find_quotient, find_square};
pub use tarvainen::{tarvainen_classify, TarvainenArtifacts};
pub use threshold::{find_t1, find_t2, find_t3};

/// Result of one detector run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub label: ArtifactLabel,
    pub indices: Vec<usize>,
}

/// Run one detector over the whole series.
///
/// `Manual` has no algorithm and returns nothing; manual marks go through
/// [`ArtifactIndex::mark_manual`]. Tarvainen output may repeat an index.
pub fn detect(series: &IntervalSeries, label: ArtifactLabel, cfg: &DetectionConfig) -> Vec<usize> {
    let rr = series.values();
    let t1 = cfg.t1_ms as f64;
    match label {
        ArtifactLabel::Tarvainen => tarvainen_classify(&rr, &cfg.tarvainen).into_indices(),
        ArtifactLabel::Quotient => find_quotient(&rr, cfg.quotient_low, cfg.quotient_high),
        ArtifactLabel::Square => find_square(&rr, cfg.square_min_ms, cfg.square_max_ms),
        ArtifactLabel::T1 => find_t1(&rr, t1),
        ArtifactLabel::T2 => find_t2(&rr, cfg.t2_ms as f64, t1),
        ArtifactLabel::T3 => find_t3(&rr, cfg.t3_ms as f64, t1),
        ArtifactLabel::Manual => Vec::new(),
    }
}

/// Run the chosen detectors and replace their sets in `index`.
pub fn detect_into(
    index: &mut ArtifactIndex,
    series: &IntervalSeries,
    labels: &[ArtifactLabel],
    cfg: &DetectionConfig,
) -> Vec<Detection> {
    labels
        .iter()
        .filter(|label| **label != ArtifactLabel::Manual)
        .map(|&label| {
            let indices = detect(series, label, cfg);
            log::info!("{label}: {} suspect samples", indices.len());
            index.set(label, indices.iter().copied(), series.len());
            Detection { label, indices }
        })
        .collect()
}
