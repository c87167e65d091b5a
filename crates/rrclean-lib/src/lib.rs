pub mod config;
pub mod correction;
pub mod detectors;
pub mod error;
pub mod interp;
pub mod io;
pub mod metrics;
pub mod series;

pub use config::*;
pub use correction::{correct, CorrectionMethod, CorrectionOutcome};
pub use detectors::{detect, detect_into, Detection};
pub use error::*;
pub use metrics::*;
pub use series::*;
