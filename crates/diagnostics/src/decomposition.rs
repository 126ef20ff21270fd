//! Classical multiplicative seasonal decomposition.

use crate::error::DiagnosticsError;
use analytics::OutlierReport;
use analytics::rolling::fill_forward_backward;
use chrono::{DateTime, Utc};
use core_types::TimeSeries;
use serde::{Deserialize, Serialize};

/// `observed = trend * seasonal * residual`, component by component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalDecomposition {
    pub period: usize,
    pub observed: Vec<(DateTime<Utc>, f64)>,
    /// Centred moving average; undefined for the first and last `period / 2` points.
    pub trend: Vec<(DateTime<Utc>, Option<f64>)>,
    pub seasonal: Vec<(DateTime<Utc>, f64)>,
    pub residual: Vec<(DateTime<Utc>, Option<f64>)>,
    /// One seasonal index per phase, averaging to 1.
    pub seasonal_indices: Vec<f64>,
    /// IQR fences of the gap-filled residual.
    pub residual_bounds: Option<OutlierReport>,
}

impl SeasonalDecomposition {
    /// Decomposes a strictly positive series with the given cycle length.
    pub fn multiplicative(series: &TimeSeries, period: usize) -> Result<Self, DiagnosticsError> {
        if period < 2 {
            return Err(DiagnosticsError::InvalidInput(format!(
                "seasonal period must be at least 2, got {period}"
            )));
        }
        let n = series.len();
        if n < 2 * period {
            return Err(DiagnosticsError::InsufficientData {
                test: "Seasonal decomposition",
                required: 2 * period,
                available: n,
            });
        }

        let values = series.values();
        if let Some(v) = values.iter().find(|v| **v <= 0.0) {
            return Err(DiagnosticsError::InvalidInput(format!(
                "multiplicative decomposition needs strictly positive values, found {v}"
            )));
        }

        let trend = centred_moving_average(&values, period);
        let detrended: Vec<Option<f64>> = values
            .iter()
            .zip(&trend)
            .map(|(v, t)| t.map(|t| v / t))
            .collect();

        let mut indices: Vec<f64> = (0..period)
            .map(|phase| {
                let cycle: Vec<f64> = detrended
                    .iter()
                    .skip(phase)
                    .step_by(period)
                    .flatten()
                    .copied()
                    .collect();
                cycle.iter().sum::<f64>() / cycle.len() as f64
            })
            .collect();
        let norm = indices.iter().sum::<f64>() / period as f64;
        indices.iter_mut().for_each(|s| *s /= norm);

        let seasonal: Vec<f64> = (0..n).map(|i| indices[i % period]).collect();
        let residual: Vec<Option<f64>> = values
            .iter()
            .zip(&trend)
            .zip(&seasonal)
            .map(|((v, t), s)| t.map(|t| v / (t * s)))
            .collect();

        let timestamps = series.timestamps();
        let residual_points: Vec<_> = timestamps.iter().copied().zip(residual).collect();
        let filled: Vec<_> = timestamps
            .iter()
            .copied()
            .zip(fill_forward_backward(
                &residual_points.iter().map(|(_, v)| *v).collect::<Vec<_>>(),
            ))
            .collect();
        let residual_bounds = OutlierReport::from_points(&filled);

        tracing::debug!(
            n,
            period,
            outliers = residual_bounds.as_ref().map_or(0, |r| r.outliers.len()),
            "Decomposed series."
        );

        Ok(Self {
            period,
            observed: series.points().to_vec(),
            trend: timestamps.iter().copied().zip(trend).collect(),
            seasonal: timestamps.iter().copied().zip(seasonal).collect(),
            residual: residual_points,
            seasonal_indices: indices,
            residual_bounds,
        })
    }
}

/// Two-sided moving average spanning exactly one cycle. Even periods use the
/// `2 x m` filter with half weight on both end points.
fn centred_moving_average(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let half = period / 2;
    let weights: Vec<f64> = if period % 2 == 0 {
        let mut w = vec![1.0; period + 1];
        w[0] = 0.5;
        w[period] = 0.5;
        w
    } else {
        vec![1.0; period]
    };
    let p = period as f64;

    (0..values.len())
        .map(|i| {
            if i < half || i + half >= values.len() {
                return None;
            }
            let window = &values[i - half..=i + half];
            Some(window.iter().zip(&weights).map(|(v, w)| v * w).sum::<f64>() / p)
        })
        .collect()
}
