//! # Ratiolens Analytics
//!
//! Rolling risk/performance ratios and the outlier summary that goes with them.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no I/O and no knowledge of where prices come from. It
//!   depends only on `core-types`.
//! - **Stateless calculation:** `RollingRatioEngine` takes return series and a
//!   `RatioConfig` and produces a `RatioSeries`. `OutlierReport` summarises any
//!   such series.
//!
//! ## Public API
//!
//! - `RollingRatioEngine` / `RatioConfig`: Sharpe, Sortino, Treynor and Alpha.
//! - `OutlierReport`: quartiles, IQR fences and flagged entries.
//! - `rolling`: the trailing-window primitives the engine is built from.
//! - `AnalyticsError`: the errors this crate can return.

pub mod engine;
pub mod error;
pub mod report;
pub mod rolling;

pub use engine::{RatioConfig, RollingRatioEngine};
pub use error::AnalyticsError;
pub use report::{IQR_MULTIPLIER, OutlierReport};
