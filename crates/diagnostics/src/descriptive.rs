use crate::error::DiagnosticsError;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;

/// Location, scale and shape of a return sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub count: usize,
    pub mean: f64,
    /// Sample (n - 1) standard deviation.
    pub std_dev: f64,
    /// Adjusted Fisher-Pearson skewness (G1).
    pub skewness: f64,
    /// Bias-corrected excess kurtosis (G2); 0 for a normal sample.
    pub excess_kurtosis: f64,
}

impl SummaryStatistics {
    pub fn from_sample(values: &[f64]) -> Result<Self, DiagnosticsError> {
        let n = values.len();
        if n < 4 {
            return Err(DiagnosticsError::InsufficientData {
                test: "Summary statistics",
                required: 4,
                available: n,
            });
        }

        let m = CentralMoments::of(values);
        let nf = n as f64;

        // A constant sample has no shape; report it as symmetric and mesokurtic.
        let (skewness, excess_kurtosis) = if m.m2 == 0.0 {
            (0.0, 0.0)
        } else {
            let g1 = m.skewness();
            let g2 = m.excess_kurtosis();
            let skew = (nf * (nf - 1.0)).sqrt() / (nf - 2.0) * g1;
            let kurt = ((nf + 1.0) * g2 + 6.0) * (nf - 1.0) / ((nf - 2.0) * (nf - 3.0));
            (skew, kurt)
        };

        Ok(Self {
            count: n,
            mean: m.mean,
            std_dev: (m.m2 * nf / (nf - 1.0)).sqrt(),
            skewness,
            excess_kurtosis,
        })
    }
}

/// Biased central moments of a sample.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CentralMoments {
    pub mean: f64,
    pub m2: f64,
    pub m3: f64,
    pub m4: f64,
}

impl CentralMoments {
    pub fn of(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
        for v in values {
            let d = v - mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }
        Self {
            mean,
            m2: m2 / n,
            m3: m3 / n,
            m4: m4 / n,
        }
    }

    pub fn skewness(&self) -> f64 {
        self.m3 / self.m2.powf(1.5)
    }

    pub fn excess_kurtosis(&self) -> f64 {
        self.m4 / (self.m2 * self.m2) - 3.0
    }
}

pub(crate) fn standard_normal() -> Result<Normal, DiagnosticsError> {
    Normal::new(0.0, 1.0).map_err(|e| DiagnosticsError::Distribution(e.to_string()))
}

/// `c[0] + c[1] x + c[2] x^2 + ...`
pub(crate) fn poly(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

pub(crate) fn sample_std(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    (CentralMoments::of(values).m2 * n / (n - 1.0)).sqrt()
}
