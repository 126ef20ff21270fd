use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Timestamps must be strictly increasing, found {current} after {previous}")]
    NonIncreasingTimestamps {
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("Series contains no defined values")]
    EmptySeries,
}
