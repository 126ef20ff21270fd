use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiagnosticsError {
    #[error("{test} needs at least {required} observations, have {available}")]
    InsufficientData {
        test: &'static str,
        required: usize,
        available: usize,
    },

    #[error("{test} is undefined for a constant series")]
    ZeroVariance { test: &'static str },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Least-squares design matrix is singular in {0}")]
    SingularMatrix(&'static str),

    #[error("Distribution error: {0}")]
    Distribution(String),
}
