pub mod adf;
pub mod hrv;

pub use adf::{adfuller, mackinnon_p, AdfResult};
pub use hrv::{
    analyze, hrv_frequency, hrv_nonlinear, hrv_time, summarize, HrvFrequency, HrvNonlinear,
    HrvReport, HrvTime, Stationarity,
};
