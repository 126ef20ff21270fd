//! Serial dependence in a return series.

use crate::descriptive::standard_normal;
use crate::error::DiagnosticsError;
use crate::outcome::TestOutcome;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Durbin-Watson values below this indicate positive autocorrelation.
pub const DW_POSITIVE_BELOW: f64 = 1.5;
/// Durbin-Watson values above this indicate negative autocorrelation.
pub const DW_NEGATIVE_ABOVE: f64 = 2.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutocorrelationReport {
    /// Ljung-Box Q for every lag `1..=max_lag`.
    pub ljung_box: Vec<LjungBoxLag>,
    pub durbin_watson: f64,
    pub qq_plot: QqPlot,
}

impl AutocorrelationReport {
    pub fn from_sample(values: &[f64], max_lag: usize) -> Result<Self, DiagnosticsError> {
        let report = Self {
            ljung_box: ljung_box(values, max_lag)?,
            durbin_watson: durbin_watson(values)?,
            qq_plot: QqPlot::normal(values)?,
        };
        tracing::debug!(
            n = values.len(),
            max_lag,
            dw = report.durbin_watson,
            "Ran autocorrelation tests."
        );
        Ok(report)
    }

    /// True when any lag rejects independence at `significance`.
    pub fn any_lag_significant(&self, significance: f64) -> bool {
        self.ljung_box
            .iter()
            .any(|lag| lag.outcome.rejects_null(significance))
    }

    pub fn durbin_watson_reading(&self) -> SerialCorrelation {
        SerialCorrelation::from_durbin_watson(self.durbin_watson)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LjungBoxLag {
    pub lag: usize,
    pub outcome: TestOutcome,
}

/// Rule-of-thumb reading of a Durbin-Watson statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SerialCorrelation {
    Positive,
    None,
    Negative,
}

impl SerialCorrelation {
    pub fn from_durbin_watson(statistic: f64) -> Self {
        if statistic < DW_POSITIVE_BELOW {
            SerialCorrelation::Positive
        } else if statistic > DW_NEGATIVE_ABOVE {
            SerialCorrelation::Negative
        } else {
            SerialCorrelation::None
        }
    }
}

/// Sample autocorrelations `r_0..=r_max_lag` around the sample mean.
pub fn acf(values: &[f64], max_lag: usize) -> Result<Vec<f64>, DiagnosticsError> {
    let n = values.len();
    if n <= max_lag {
        return Err(DiagnosticsError::InsufficientData {
            test: "Autocorrelation",
            required: max_lag + 1,
            available: n,
        });
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let dev: Vec<f64> = values.iter().map(|v| v - mean).collect();
    let denom: f64 = dev.iter().map(|d| d * d).sum();
    if denom == 0.0 {
        return Err(DiagnosticsError::ZeroVariance {
            test: "Autocorrelation",
        });
    }

    Ok((0..=max_lag)
        .map(|k| {
            let num: f64 = dev[k..].iter().zip(&dev[..n - k]).map(|(a, b)| a * b).sum();
            num / denom
        })
        .collect())
}

/// Cumulative Ljung-Box statistics `Q_k = n(n+2) sum_{j<=k} r_j^2 / (n-j)`
/// with chi-squared(k) p-values.
pub fn ljung_box(values: &[f64], max_lag: usize) -> Result<Vec<LjungBoxLag>, DiagnosticsError> {
    if max_lag == 0 {
        return Err(DiagnosticsError::InvalidInput(
            "Ljung-Box needs at least one lag".to_string(),
        ));
    }
    let r = acf(values, max_lag)?;
    let nf = values.len() as f64;

    let mut q = 0.0;
    let mut lags = Vec::with_capacity(max_lag);
    for k in 1..=max_lag {
        q += r[k] * r[k] / (nf - k as f64);
        let statistic = nf * (nf + 2.0) * q;
        let chi2 = ChiSquared::new(k as f64)
            .map_err(|e| DiagnosticsError::Distribution(e.to_string()))?;
        lags.push(LjungBoxLag {
            lag: k,
            outcome: TestOutcome::new(statistic, chi2.sf(statistic)),
        });
    }
    Ok(lags)
}

/// `sum (e_t - e_{t-1})^2 / sum e_t^2` on the series as given.
pub fn durbin_watson(values: &[f64]) -> Result<f64, DiagnosticsError> {
    if values.len() < 2 {
        return Err(DiagnosticsError::InsufficientData {
            test: "Durbin-Watson",
            required: 2,
            available: values.len(),
        });
    }
    let denom: f64 = values.iter().map(|v| v * v).sum();
    if denom == 0.0 {
        return Err(DiagnosticsError::ZeroVariance {
            test: "Durbin-Watson",
        });
    }
    let num: f64 = values.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
    Ok(num / denom)
}

/// Normal probability plot data with its least-squares line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QqPlot {
    /// Theoretical N(0,1) quantiles (Filliben's order-statistic medians).
    pub theoretical: Vec<f64>,
    /// The sample, sorted ascending.
    pub ordered: Vec<f64>,
    pub slope: f64,
    pub intercept: f64,
    /// Correlation between the two axes.
    pub r: f64,
}

impl QqPlot {
    pub fn normal(values: &[f64]) -> Result<Self, DiagnosticsError> {
        let n = values.len();
        if n < 2 {
            return Err(DiagnosticsError::InsufficientData {
                test: "Q-Q plot",
                required: 2,
                available: n,
            });
        }

        let normal = standard_normal()?;
        let theoretical: Vec<f64> = filliben_medians(n)
            .into_iter()
            .map(|p| normal.inverse_cdf(p))
            .collect();
        let mut ordered = values.to_vec();
        ordered.sort_by(f64::total_cmp);

        let nf = n as f64;
        let mx = theoretical.iter().sum::<f64>() / nf;
        let my = ordered.iter().sum::<f64>() / nf;
        let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
        for (x, y) in theoretical.iter().zip(&ordered) {
            sxx += (x - mx) * (x - mx);
            syy += (y - my) * (y - my);
            sxy += (x - mx) * (y - my);
        }

        let slope = sxy / sxx;
        let r = if syy == 0.0 { 0.0 } else { sxy / (sxx * syy).sqrt() };
        Ok(Self {
            slope,
            intercept: my - slope * mx,
            r,
            theoretical,
            ordered,
        })
    }
}

/// Uniform order-statistic medians used as plotting positions.
fn filliben_medians(n: usize) -> Vec<f64> {
    let nf = n as f64;
    let last = 0.5_f64.powf(1.0 / nf);
    (1..=n)
        .map(|i| {
            if i == 1 {
                1.0 - last
            } else if i == n {
                last
            } else {
                (i as f64 - 0.3175) / (nf + 0.365)
            }
        })
        .collect()
}
