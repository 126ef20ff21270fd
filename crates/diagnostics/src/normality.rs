//! Goodness-of-fit tests of a return sample against the normal distribution.

use crate::descriptive::{CentralMoments, SummaryStatistics, poly, sample_std, standard_normal};
use crate::error::DiagnosticsError;
use crate::outcome::{CriticalValue, TestOutcome};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use std::f64::consts::PI;

/// Largest sample for which the Shapiro-Wilk p-value approximation was fitted.
pub const SHAPIRO_WILK_MAX_N: usize = 5000;

/// Anderson-Darling critical values at 15, 10, 5, 2.5 and 1 % for a normal
/// sample with estimated mean and variance, before the small-sample adjustment.
const AD_NORMAL_CRITICAL: [f64; 5] = [0.576, 0.656, 0.787, 0.918, 1.092];
const AD_SIGNIFICANCE_PCT: [f64; 5] = [15.0, 10.0, 5.0, 2.5, 1.0];

/// Every normality check run by the `normality` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalityReport {
    pub summary: SummaryStatistics,
    pub jarque_bera: TestOutcome,
    pub shapiro_wilk: TestOutcome,
    pub kolmogorov_smirnov: TestOutcome,
    pub anderson_darling: AndersonDarling,
}

impl NormalityReport {
    pub fn from_sample(values: &[f64]) -> Result<Self, DiagnosticsError> {
        let report = Self {
            summary: SummaryStatistics::from_sample(values)?,
            jarque_bera: jarque_bera(values)?,
            shapiro_wilk: shapiro_wilk(values)?,
            kolmogorov_smirnov: kolmogorov_smirnov(values)?,
            anderson_darling: anderson_darling(values)?,
        };
        tracing::debug!(
            n = values.len(),
            jb = report.jarque_bera.statistic,
            sw = report.shapiro_wilk.statistic,
            "Ran normality tests."
        );
        Ok(report)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AndersonDarling {
    pub statistic: f64,
    pub critical_values: Vec<CriticalValue>,
}

impl AndersonDarling {
    /// Whether the statistic exceeds the critical value tabulated for
    /// `significance_pct`. `None` when that level is not tabulated.
    pub fn rejects_at(&self, significance_pct: f64) -> Option<bool> {
        self.critical_values
            .iter()
            .find(|cv| (cv.significance_pct - significance_pct).abs() < 1e-9)
            .map(|cv| self.statistic > cv.value)
    }

    /// Decision at the 5 % level.
    pub fn rejects_normality(&self) -> bool {
        self.rejects_at(5.0).unwrap_or(false)
    }
}

/// Jarque-Bera: `n/6 (S^2 + K^2/4)` with biased sample skewness `S` and
/// excess kurtosis `K`, compared against chi-squared with 2 degrees of freedom.
pub fn jarque_bera(values: &[f64]) -> Result<TestOutcome, DiagnosticsError> {
    ensure_len("Jarque-Bera", values, 2)?;
    let m = CentralMoments::of(values);
    if m.m2 == 0.0 {
        return Err(DiagnosticsError::ZeroVariance {
            test: "Jarque-Bera",
        });
    }

    let s = m.skewness();
    let k = m.excess_kurtosis();
    let statistic = values.len() as f64 / 6.0 * (s * s + k * k / 4.0);

    let chi2 = ChiSquared::new(2.0).map_err(|e| DiagnosticsError::Distribution(e.to_string()))?;
    Ok(TestOutcome::new(statistic, chi2.sf(statistic)))
}

/// Shapiro-Wilk W with Royston's (1995) coefficient and p-value approximations.
///
/// Samples longer than [`SHAPIRO_WILK_MAX_N`] are still tested, but the p-value
/// is extrapolated.
pub fn shapiro_wilk(values: &[f64]) -> Result<TestOutcome, DiagnosticsError> {
    const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
    const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
    const C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
    const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
    const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
    const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
    const G: [f64; 2] = [-2.273, 0.459];

    ensure_len("Shapiro-Wilk", values, 3)?;
    let n = values.len();
    if n > SHAPIRO_WILK_MAX_N {
        tracing::warn!(
            n,
            max = SHAPIRO_WILK_MAX_N,
            "Shapiro-Wilk p-value may be inaccurate for samples this large."
        );
    }

    let mut x = values.to_vec();
    x.sort_by(f64::total_cmp);
    if x[n - 1] - x[0] == 0.0 {
        return Err(DiagnosticsError::ZeroVariance {
            test: "Shapiro-Wilk",
        });
    }

    let normal = standard_normal()?;
    let nf = n as f64;
    let half = n / 2;

    // Weights for the lower half of the order statistics; the upper half mirrors them.
    let a: Vec<f64> = if n == 3 {
        vec![std::f64::consts::FRAC_1_SQRT_2]
    } else {
        let an25 = nf + 0.25;
        let m: Vec<f64> = (1..=half)
            .map(|i| normal.inverse_cdf((i as f64 - 0.375) / an25))
            .collect();
        let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
        let ssumm2 = summ2.sqrt();
        let rsn = 1.0 / nf.sqrt();

        let a1 = poly(&C1, rsn) - m[0] / ssumm2;
        let mut a = Vec::with_capacity(half);
        let (first_free, fac) = if n > 5 {
            let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
            let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
                / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
                .sqrt();
            a.extend([a1, a2]);
            (2, fac)
        } else {
            let fac = ((summ2 - 2.0 * m[0] * m[0]) / (1.0 - 2.0 * a1 * a1)).sqrt();
            a.push(a1);
            (1, fac)
        };
        a.extend(m[first_free..].iter().map(|mi| -mi / fac));
        a
    };

    let mean = x.iter().sum::<f64>() / nf;
    let ss: f64 = x.iter().map(|v| (v - mean) * (v - mean)).sum();
    let b: f64 = a
        .iter()
        .enumerate()
        .map(|(i, ai)| ai * (x[n - 1 - i] - x[i]))
        .sum();
    let w = (b * b / ss).min(1.0);

    if n == 3 {
        let p = 6.0 / PI * (w.sqrt().asin() - PI / 3.0);
        return Ok(TestOutcome::new(w, p.max(0.0)));
    }

    let mut y = (1.0 - w).ln();
    let (mu, sigma) = if n <= 11 {
        let gamma = poly(&G, nf);
        if y >= gamma {
            return Ok(TestOutcome::new(w, 1e-99));
        }
        y = -(gamma - y).ln();
        (poly(&C3, nf), poly(&C4, nf).exp())
    } else {
        let ln_n = nf.ln();
        (poly(&C5, ln_n), poly(&C6, ln_n).exp())
    };

    Ok(TestOutcome::new(w, normal.sf((y - mu) / sigma)))
}

/// One-sample Kolmogorov-Smirnov test against the standard normal N(0, 1).
///
/// The p-value is the asymptotic Kolmogorov distribution evaluated at
/// Stephens' small-sample scaled statistic.
pub fn kolmogorov_smirnov(values: &[f64]) -> Result<TestOutcome, DiagnosticsError> {
    ensure_len("Kolmogorov-Smirnov", values, 1)?;
    let normal = standard_normal()?;

    let mut x = values.to_vec();
    x.sort_by(f64::total_cmp);
    let nf = x.len() as f64;

    let d = x
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let cdf = normal.cdf(*v);
            let above = (i as f64 + 1.0) / nf - cdf;
            let below = cdf - i as f64 / nf;
            above.max(below)
        })
        .fold(0.0, f64::max);

    let en = nf.sqrt();
    let lambda = (en + 0.12 + 0.11 / en) * d;
    Ok(TestOutcome::new(d, kolmogorov_survival(lambda)))
}

/// `P(K > lambda)` for the Kolmogorov distribution.
fn kolmogorov_survival(lambda: f64) -> f64 {
    // Below this the alternating series has not converged and the tail is 1.
    if lambda < 0.27 {
        return 1.0;
    }
    let mut sum = 0.0;
    for k in 1..=100 {
        let kf = k as f64;
        let term = (-2.0 * kf * kf * lambda * lambda).exp();
        sum += if k % 2 == 1 { term } else { -term };
        if term < 1e-16 {
            break;
        }
    }
    (2.0 * sum).clamp(0.0, 1.0)
}

/// Anderson-Darling A^2 for normality with mean and variance estimated from
/// the sample.
pub fn anderson_darling(values: &[f64]) -> Result<AndersonDarling, DiagnosticsError> {
    ensure_len("Anderson-Darling", values, 2)?;
    let normal = standard_normal()?;

    let n = values.len();
    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;
    let std = sample_std(values);
    if std == 0.0 {
        return Err(DiagnosticsError::ZeroVariance {
            test: "Anderson-Darling",
        });
    }

    let mut z: Vec<f64> = values.iter().map(|v| (v - mean) / std).collect();
    z.sort_by(f64::total_cmp);

    let ln_cdf = |v: f64| normal.cdf(v).max(f64::MIN_POSITIVE).ln();
    let s: f64 = (0..n)
        .map(|i| (2.0 * i as f64 + 1.0) * (ln_cdf(z[i]) + ln_cdf(-z[n - 1 - i])))
        .sum();
    let statistic = -nf - s / nf;

    let adjustment = 1.0 + 4.0 / nf - 25.0 / (nf * nf);
    let critical_values = AD_SIGNIFICANCE_PCT
        .iter()
        .zip(AD_NORMAL_CRITICAL)
        .map(|(pct, base)| CriticalValue {
            significance_pct: *pct,
            value: (base / adjustment * 1000.0).round() / 1000.0,
        })
        .collect();

    Ok(AndersonDarling {
        statistic,
        critical_values,
    })
}

fn ensure_len(test: &'static str, values: &[f64], required: usize) -> Result<(), DiagnosticsError> {
    if values.len() < required {
        return Err(DiagnosticsError::InsufficientData {
            test,
            required,
            available: values.len(),
        });
    }
    Ok(())
}
