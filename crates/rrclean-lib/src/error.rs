use thiserror::Error;

/// Errors surfaced by the analytical core.
#[derive(Debug, Error)]
pub enum RrError {
    #[error("the RR series is empty")]
    EmptySeries,
    #[error("range {start}..={stop} is outside a series of {len} samples")]
    RangeOutOfBounds { start: usize, stop: usize, len: usize },
    #[error("sample {index} is still pending correction")]
    PendingInRange { index: usize },
    #[error("need at least {needed} samples, got {got}")]
    InsufficientData { needed: usize, got: usize },
    #[error("unknown artifact label: {0}")]
    UnknownLabel(String),
    #[error("unknown correction method: {0}")]
    UnknownMethod(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type RrResult<T> = Result<T, RrError>;
