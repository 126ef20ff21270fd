use core_types::RatioKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Not enough data to perform calculation: need {required} observations, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("{0} requires benchmark returns")]
    MissingBenchmark(RatioKind),

    #[error("Invalid ratio configuration: {0}")]
    InvalidConfig(String),
}
