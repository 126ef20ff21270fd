//! Unit-root and stationarity tests, all with a constant and no trend.

use crate::descriptive::{poly, standard_normal};
use crate::error::DiagnosticsError;
use crate::ols;
use crate::outcome::{CriticalValue, TestOutcome};
use serde::{Deserialize, Serialize};
use statrs::distribution::ContinuousCDF;

/// MacKinnon (2010) finite-sample critical values of the Dickey-Fuller tau
/// with a constant: `b0 + b1/n + b2/n^2 + b3/n^3` at 1, 5 and 10 %.
const TAU_C_CRITICAL: [(f64, [f64; 4]); 3] = [
    (1.0, [-3.43035, -6.5393, -16.786, -79.433]),
    (5.0, [-2.86154, -2.8903, -4.234, -40.040]),
    (10.0, [-2.56677, -1.5384, -2.809, 0.0]),
];

/// MacKinnon (1994) response surface for the p-value of tau with a constant.
const TAU_C_MAX: f64 = 2.74;
const TAU_C_MIN: f64 = -18.83;
const TAU_C_STAR: f64 = -1.61;
const TAU_C_SMALLP: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_C_LARGEP: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

/// Asymptotic KPSS level-stationarity critical values.
const KPSS_C_CRITICAL: [(f64, f64); 4] = [(10.0, 0.347), (5.0, 0.463), (2.5, 0.574), (1.0, 0.739)];

/// What the null hypothesis of a test asserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NullHypothesis {
    /// ADF and Phillips-Perron.
    UnitRoot,
    /// KPSS.
    Stationary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRootTest {
    pub name: String,
    pub null: NullHypothesis,
    pub outcome: TestOutcome,
    /// Lag order (ADF) or long-run variance bandwidth (PP, KPSS).
    pub lags: usize,
    pub nobs: usize,
    pub critical_values: Vec<CriticalValue>,
}

impl UnitRootTest {
    /// Reads the outcome as a stationarity verdict at `significance`.
    pub fn indicates_stationarity(&self, significance: f64) -> bool {
        match self.null {
            NullHypothesis::UnitRoot => self.outcome.p_value <= significance,
            NullHypothesis::Stationary => self.outcome.p_value > significance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRootReport {
    pub adf: UnitRootTest,
    pub phillips_perron: UnitRootTest,
    pub kpss: UnitRootTest,
}

impl UnitRootReport {
    pub fn from_sample(values: &[f64]) -> Result<Self, DiagnosticsError> {
        let report = Self {
            adf: augmented_dickey_fuller(values)?,
            phillips_perron: phillips_perron(values)?,
            kpss: kpss(values)?,
        };
        tracing::debug!(
            n = values.len(),
            adf = report.adf.outcome.statistic,
            adf_lags = report.adf.lags,
            pp = report.phillips_perron.outcome.statistic,
            kpss = report.kpss.outcome.statistic,
            "Ran unit-root tests."
        );
        Ok(report)
    }

    pub fn tests(&self) -> [&UnitRootTest; 3] {
        [&self.adf, &self.phillips_perron, &self.kpss]
    }
}

/// Schwert's rule `ceil(12 (n/100)^(1/4))`.
fn schwert_lags(n: usize) -> usize {
    (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize
}

/// Augmented Dickey-Fuller test with a constant.
///
/// Regresses `dy_t` on `y_{t-1}`, a constant and `p` lagged differences. `p`
/// minimises the AIC over `0..=maxlag` on a common sample; the chosen model
/// is then refitted on every observation it can use.
pub fn augmented_dickey_fuller(values: &[f64]) -> Result<UnitRootTest, DiagnosticsError> {
    const NAME: &str = "Augmented Dickey-Fuller";
    let n = values.len();
    if n < 8 {
        return Err(DiagnosticsError::InsufficientData {
            test: NAME,
            required: 8,
            available: n,
        });
    }

    let maxlag = schwert_lags(n).min(n / 2 - 2);
    let dy: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    // Rows start at `first` so every lag order sees the same observations.
    let design = |lags: usize, first: usize| -> (Vec<f64>, Vec<Vec<f64>>) {
        let y = dy[first..].to_vec();
        let rows = (first..dy.len())
            .map(|j| {
                let mut row = Vec::with_capacity(lags + 2);
                row.push(values[j]);
                row.push(1.0);
                row.extend((1..=lags).map(|i| dy[j - i]));
                row
            })
            .collect();
        (y, rows)
    };

    let mut best = (f64::INFINITY, 0);
    for lags in 0..=maxlag {
        let (y, rows) = design(lags, maxlag);
        let aic = ols::fit(&y, &rows, NAME)?.aic();
        if aic < best.0 {
            best = (aic, lags);
        }
    }
    let lags = best.1;

    let (y, rows) = design(lags, lags);
    let fit = ols::fit(&y, &rows, NAME)?;
    let statistic = fit.t_stat(0);

    Ok(UnitRootTest {
        name: NAME.to_string(),
        null: NullHypothesis::UnitRoot,
        outcome: TestOutcome::new(statistic, mackinnon_p_value(statistic)?),
        lags,
        nobs: fit.nobs,
        critical_values: tau_critical_values(fit.nobs),
    })
}

/// Phillips-Perron Z-tau with a constant and a Bartlett-kernel long-run
/// variance using Schwert's bandwidth.
pub fn phillips_perron(values: &[f64]) -> Result<UnitRootTest, DiagnosticsError> {
    const NAME: &str = "Phillips-Perron";
    let n = values.len();
    if n < 4 {
        return Err(DiagnosticsError::InsufficientData {
            test: NAME,
            required: 4,
            available: n,
        });
    }

    let y = &values[1..];
    let rows: Vec<Vec<f64>> = values[..n - 1].iter().map(|v| vec![*v, 1.0]).collect();
    let fit = ols::fit(y, &rows, NAME)?;

    let nobs = fit.nobs as f64;
    let k = fit.params.len() as f64;
    let rho = fit.params[0];
    let sigma = fit.std_errors[0];
    let s2 = fit.ssr / (nobs - k);
    let gamma0 = fit.ssr / nobs;

    let lags = schwert_lags(n).min(fit.nobs - 1);
    let lam2 = newey_west(&fit.residuals, lags);
    if lam2 <= 0.0 {
        return Err(DiagnosticsError::ZeroVariance { test: NAME });
    }
    let lam = lam2.sqrt();

    let t = (rho - 1.0) / sigma;
    let statistic =
        (gamma0 / lam2).sqrt() * t - 0.5 * ((lam2 - gamma0) / lam) * (nobs * sigma / s2.sqrt());

    Ok(UnitRootTest {
        name: NAME.to_string(),
        null: NullHypothesis::UnitRoot,
        outcome: TestOutcome::new(statistic, mackinnon_p_value(statistic)?),
        lags,
        nobs: fit.nobs,
        critical_values: tau_critical_values(fit.nobs),
    })
}

/// KPSS test of level stationarity with Hobijn et al. (1998) automatic
/// bandwidth selection.
pub fn kpss(values: &[f64]) -> Result<UnitRootTest, DiagnosticsError> {
    const NAME: &str = "Kwiatkowski-Phillips-Schmidt-Shin";
    let n = values.len();
    if n < 4 {
        return Err(DiagnosticsError::InsufficientData {
            test: NAME,
            required: 4,
            available: n,
        });
    }

    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;
    let resid: Vec<f64> = values.iter().map(|v| v - mean).collect();

    let lags = hobijn_bandwidth(&resid)?.min(n - 1);
    let lam = newey_west(&resid, lags);
    if lam <= 0.0 {
        return Err(DiagnosticsError::ZeroVariance { test: NAME });
    }

    let mut partial = 0.0;
    let eta: f64 = resid
        .iter()
        .map(|r| {
            partial += r;
            partial * partial
        })
        .sum();
    let statistic = eta / (nf * nf) / lam;

    Ok(UnitRootTest {
        name: NAME.to_string(),
        null: NullHypothesis::Stationary,
        outcome: TestOutcome::new(statistic, kpss_p_value(statistic)),
        lags,
        nobs: n,
        critical_values: KPSS_C_CRITICAL
            .iter()
            .map(|(pct, value)| CriticalValue {
                significance_pct: *pct,
                value: *value,
            })
            .collect(),
    })
}

/// Bartlett-weighted long-run variance of an already demeaned series.
fn newey_west(resid: &[f64], lags: usize) -> f64 {
    let n = resid.len();
    let nf = n as f64;
    let autocov = |j: usize| -> f64 {
        resid[j..].iter().zip(&resid[..n - j]).map(|(a, b)| a * b).sum::<f64>() / nf
    };

    let mut lrv = autocov(0);
    for j in 1..=lags.min(n - 1) {
        let weight = 1.0 - j as f64 / (lags as f64 + 1.0);
        lrv += 2.0 * weight * autocov(j);
    }
    lrv
}

fn hobijn_bandwidth(resid: &[f64]) -> Result<usize, DiagnosticsError> {
    let n = resid.len();
    let nf = n as f64;
    let covlags = nf.powf(2.0 / 9.0) as usize;

    let mut s0 = resid.iter().map(|r| r * r).sum::<f64>() / nf;
    let mut s1 = 0.0;
    for i in 1..=covlags.min(n - 1) {
        let prod = resid[i..].iter().zip(&resid[..n - i]).map(|(a, b)| a * b).sum::<f64>()
            / (nf / 2.0);
        s0 += prod;
        s1 += i as f64 * prod;
    }
    if s0 <= 0.0 {
        return Err(DiagnosticsError::ZeroVariance {
            test: "KPSS bandwidth selection",
        });
    }

    let s_hat = s1 / s0;
    let gamma_hat = 1.1447 * (s_hat * s_hat).powf(1.0 / 3.0);
    Ok((gamma_hat * nf.powf(1.0 / 3.0)) as usize)
}

/// Approximate p-value of a Dickey-Fuller tau statistic (constant, one
/// unit root).
pub fn mackinnon_p_value(statistic: f64) -> Result<f64, DiagnosticsError> {
    if statistic > TAU_C_MAX {
        return Ok(1.0);
    }
    if statistic < TAU_C_MIN {
        return Ok(0.0);
    }
    let z = if statistic <= TAU_C_STAR {
        poly(&TAU_C_SMALLP, statistic)
    } else {
        poly(&TAU_C_LARGEP, statistic)
    };
    Ok(standard_normal()?.cdf(z))
}

fn tau_critical_values(nobs: usize) -> Vec<CriticalValue> {
    let inv = 1.0 / nobs as f64;
    TAU_C_CRITICAL
        .iter()
        .map(|(pct, b)| CriticalValue {
            significance_pct: *pct,
            value: poly(b, inv),
        })
        .collect()
}

/// Linear interpolation in the KPSS table, clipped to `[0.01, 0.10]`.
fn kpss_p_value(statistic: f64) -> f64 {
    let table: Vec<(f64, f64)> = KPSS_C_CRITICAL
        .iter()
        .map(|(pct, cv)| (*cv, pct / 100.0))
        .collect();

    let (first_cv, first_p) = table[0];
    if statistic <= first_cv {
        return first_p;
    }
    for pair in table.windows(2) {
        let ((lo_cv, lo_p), (hi_cv, hi_p)) = (pair[0], pair[1]);
        if statistic <= hi_cv {
            return lo_p + (statistic - lo_cv) / (hi_cv - lo_cv) * (hi_p - lo_p);
        }
    }
    table[table.len() - 1].1
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    /// Deterministic standard normal draws (64-bit LCG + Box-Muller).
    fn white_noise(n: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        let mut uniform = || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            ((state >> 11) as f64 + 0.5) / (1u64 << 53) as f64
        };
        (0..n)
            .map(|_| {
                let (u1, u2) = (uniform(), uniform());
                (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
            })
            .collect()
    }

    fn random_walk(n: usize, seed: u64) -> Vec<f64> {
        let mut level = 0.0;
        white_noise(n, seed)
            .into_iter()
            .map(|e| {
                level += e;
                level
            })
            .collect()
    }

    #[test]
    fn mackinnon_five_percent_point() {
        // The asymptotic 5 % critical value maps back to roughly p = 0.05.
        assert_abs_diff_eq!(mackinnon_p_value(-2.86).unwrap(), 0.05, epsilon = 2e-3);
    }

    #[test_case(3.0, 1.0 ; "above the surface")]
    #[test_case(-25.0, 0.0 ; "below the surface")]
    fn mackinnon_is_clipped(statistic: f64, expected: f64) {
        assert_eq!(mackinnon_p_value(statistic).unwrap(), expected);
    }

    #[test]
    fn mackinnon_is_monotone_across_the_switch() {
        let grid: Vec<f64> = (0..200).map(|i| -6.0 + i as f64 * 0.04).collect();
        let p: Vec<f64> = grid.iter().map(|t| mackinnon_p_value(*t).unwrap()).collect();
        assert!(p.windows(2).all(|w| w[0] <= w[1] + 1e-3));
        assert!(p[0] < 0.001);
    }

    #[test]
    fn tau_critical_values_for_a_large_sample() {
        let cv = tau_critical_values(10_000);
        assert_abs_diff_eq!(cv[0].value, -3.43035 - 6.5393e-4, epsilon = 1e-6);
        assert_abs_diff_eq!(cv[1].value, -2.86154 - 2.8903e-4, epsilon = 1e-6);
        assert_eq!(cv[2].significance_pct, 10.0);
    }

    #[test_case(0.1, 0.10 ; "below the table")]
    #[test_case(0.347, 0.10 ; "ten percent")]
    #[test_case(0.40, 0.10 - 0.053 / 0.116 * 0.05 ; "interpolated")]
    #[test_case(0.463, 0.05 ; "five percent")]
    #[test_case(0.739, 0.01 ; "one percent")]
    #[test_case(3.0, 0.01 ; "above the table")]
    fn kpss_p_value_interpolation(statistic: f64, expected: f64) {
        assert_abs_diff_eq!(kpss_p_value(statistic), expected, epsilon = 1e-12);
    }

    #[test]
    fn newey_west_without_lags_is_the_variance() {
        let r = [1.0, -1.0, 2.0, -2.0];
        assert_abs_diff_eq!(newey_west(&r, 0), 2.5, epsilon = 1e-12);
        // gamma_1 = (-1 - 2 - 4) / 4, weight 1/2.
        assert_abs_diff_eq!(newey_west(&r, 1), 2.5 - 1.75, epsilon = 1e-12);
    }

    #[test]
    fn white_noise_is_stationary_under_every_test() {
        let noise = white_noise(500, 7);
        let report = UnitRootReport::from_sample(&noise).unwrap();

        assert!(report.adf.outcome.p_value < 0.01, "{:?}", report.adf);
        assert!(report.phillips_perron.outcome.p_value < 0.01, "{:?}", report.phillips_perron);
        assert!(report.kpss.outcome.p_value > 0.05, "{:?}", report.kpss);
        for test in report.tests() {
            assert!(test.indicates_stationarity(0.05), "{}", test.name);
        }
        assert!(report.adf.lags <= schwert_lags(500));
    }

    #[test]
    fn random_walk_is_not_stationary() {
        let walk = random_walk(500, 11);
        let report = UnitRootReport::from_sample(&walk).unwrap();

        assert!(report.adf.outcome.p_value > 0.05, "{:?}", report.adf);
        assert!(report.phillips_perron.outcome.p_value > 0.05, "{:?}", report.phillips_perron);
        assert_eq!(report.kpss.outcome.p_value, 0.01);
        for test in report.tests() {
            assert!(!test.indicates_stationarity(0.05), "{}", test.name);
        }
    }

    #[test]
    fn short_series_are_rejected() {
        assert!(matches!(
            augmented_dickey_fuller(&[1.0, 2.0, 3.0]),
            Err(DiagnosticsError::InsufficientData { required: 8, .. })
        ));
        assert!(matches!(
            phillips_perron(&[1.0, 2.0]),
            Err(DiagnosticsError::InsufficientData { .. })
        ));
        assert!(matches!(
            kpss(&[1.0]),
            Err(DiagnosticsError::InsufficientData { .. })
        ));
    }

    #[test]
    fn constant_series_has_no_kpss_statistic() {
        assert!(matches!(
            kpss(&[0.5; 50]),
            Err(DiagnosticsError::ZeroVariance { .. })
        ));
    }
}
