use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request to the price provider failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("The price provider returned an error: {0}")]
    Provider(String),

    #[error("The price provider answered with HTTP status {0}")]
    Status(u16),

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),

    #[error("Downloaded series is malformed: {0}")]
    Series(#[from] CoreError),
}
