//! # Ratiolens Core Types
//!
//! Layer 0 of the workspace. Holds the time-indexed series every other crate
//! passes around, plus the small enums that select behaviour in the analytics
//! engine. Nothing in here performs I/O.

pub mod enums;
pub mod error;
pub mod series;

// Re-export the core types to provide a clean public API.
pub use enums::{BetaSource, RatioKind};
pub use error::CoreError;
pub use series::{PriceHistory, RatioSeries, ReturnSeries, TimeSeries};
