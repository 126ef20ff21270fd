use crate::rolling::{mean, quantile};
use chrono::{DateTime, Utc};
use core_types::RatioSeries;
use serde::{Deserialize, Serialize};

/// Distance of the outlier fences from the quartiles, in IQRs.
pub const IQR_MULTIPLIER: f64 = 1.5;

/// Summary of a ratio series with Tukey-style fences.
///
/// Only defined entries participate. Whether forward/backward-filled plug
/// values are among them is decided upstream by `RatioConfig::fill_before_report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub mean: f64,
    /// Entries strictly outside `[lower_bound, upper_bound]`, in time order.
    pub outliers: Vec<(DateTime<Utc>, f64)>,
}

impl OutlierReport {
    /// Builds the report for a ratio series.
    ///
    /// Returns `None` only when the series has no defined entry at all.
    pub fn build(series: &RatioSeries) -> Option<Self> {
        Self::from_points(series.points())
    }

    /// Builds the report for any time-indexed series with optional values.
    pub fn from_points(points: &[(DateTime<Utc>, Option<f64>)]) -> Option<Self> {
        let mut defined: Vec<f64> = points.iter().filter_map(|(_, v)| *v).collect();
        if defined.is_empty() {
            return None;
        }

        let mean = mean(&defined)?;
        defined.sort_by(f64::total_cmp);
        let q1 = quantile(&defined, 0.25)?;
        let q3 = quantile(&defined, 0.75)?;
        let iqr = q3 - q1;
        let lower_bound = q1 - IQR_MULTIPLIER * iqr;
        let upper_bound = q3 + IQR_MULTIPLIER * iqr;

        let outliers = points
            .iter()
            .filter_map(|(ts, v)| v.map(|v| (*ts, v)))
            .filter(|(_, v)| *v < lower_bound || *v > upper_bound)
            .collect();

        Some(Self {
            q1,
            q3,
            iqr,
            lower_bound,
            upper_bound,
            mean,
            outliers,
        })
    }

    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower_bound || value > self.upper_bound
    }
}
