use thiserror::Error;

#[derive(Error, Debug)]
pub enum PresentationError {
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Nothing to plot: {0} has no defined values")]
    NothingToPlot(String),
}
