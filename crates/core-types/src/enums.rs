use serde::{Deserialize, Serialize};
use std::fmt;

/// The rolling ratio the analytics engine should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum RatioKind {
    Sharpe,
    Sortino,
    Treynor,
    Alpha,
}

impl RatioKind {
    /// Treynor and Alpha measure the asset against a benchmark.
    pub fn requires_benchmark(&self) -> bool {
        matches!(self, RatioKind::Treynor | RatioKind::Alpha)
    }

    /// Human readable label, e.g. "Sharpe Ratio".
    pub fn label(&self) -> &'static str {
        match self {
            RatioKind::Sharpe => "Sharpe Ratio",
            RatioKind::Sortino => "Sortino Ratio",
            RatioKind::Treynor => "Treynor Ratio",
            RatioKind::Alpha => "Alpha",
        }
    }
}

impl fmt::Display for RatioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which asset return series feeds the covariance term of a rolling beta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum BetaSource {
    /// Asset returns net of the per-period risk-free rate.
    #[default]
    RiskAdjusted,
    /// Asset log returns as downloaded.
    Raw,
}
