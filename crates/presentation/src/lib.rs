//! # Ratiolens Presentation
//!
//! Turns analytics and diagnostics results into something a person can read:
//! comfy-table reports for the terminal, standalone SVG charts and short
//! verdict strings. Rolling-ratio output goes through the [`RatioSink`] trait
//! so the binary can pick console, JSON or chart output per invocation.

pub mod chart;
pub mod error;
pub mod report;
pub mod sink;
pub mod tables;
pub mod verdict;

pub use error::PresentationError;
pub use sink::{ConsoleSink, JsonSink, RatioSink, SvgChartSink};
pub use verdict::{DEFAULT_SIGNIFICANCE, Tone, Verdict};
