//! # Ratiolens Diagnostics
//!
//! Statistical checks run on a single return or price series: summary
//! statistics, normality, autocorrelation, unit roots and seasonal
//! decomposition. Like `analytics`, this crate is pure calculation; every
//! function takes plain slices or a `TimeSeries` and returns a serialisable
//! result.

pub mod autocorrelation;
pub mod decomposition;
pub mod descriptive;
pub mod error;
pub mod normality;
mod ols;
pub mod outcome;
pub mod unitroot;

pub use autocorrelation::{AutocorrelationReport, LjungBoxLag, QqPlot, SerialCorrelation};
pub use decomposition::SeasonalDecomposition;
pub use descriptive::SummaryStatistics;
pub use error::DiagnosticsError;
pub use normality::{AndersonDarling, NormalityReport};
pub use outcome::{CriticalValue, TestOutcome};
pub use unitroot::{NullHypothesis, UnitRootReport, UnitRootTest};
