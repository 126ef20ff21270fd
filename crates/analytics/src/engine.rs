use crate::error::AnalyticsError;
use crate::rolling::{
    checked_ratio, ewm_mean, rolling_cov, rolling_downside_std, rolling_mean, rolling_std,
    rolling_var,
};
use chrono::{DateTime, Utc};
use core_types::{BetaSource, RatioKind, RatioSeries, ReturnSeries};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters for one rolling-ratio computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioConfig {
    pub kind: RatioKind,
    /// Trailing window length in return periods. At least 2.
    pub window: usize,
    /// Annual risk-free rate.
    pub risk_free_rate: f64,
    /// Return periods per year.
    pub annualization_period: u32,
    /// Asset leg of the beta covariance (Treynor and Alpha only).
    pub beta_source: BetaSource,
    /// Forward/backward fill undefined ratio values before returning them.
    pub fill_before_report: bool,
}

impl RatioConfig {
    pub fn new(
        kind: RatioKind,
        window: usize,
        risk_free_rate: f64,
        annualization_period: u32,
    ) -> Self {
        Self {
            kind,
            window,
            risk_free_rate,
            annualization_period,
            beta_source: BetaSource::default(),
            fill_before_report: true,
        }
    }

    pub fn with_beta_source(mut self, beta_source: BetaSource) -> Self {
        self.beta_source = beta_source;
        self
    }

    pub fn with_fill_before_report(mut self, fill: bool) -> Self {
        self.fill_before_report = fill;
        self
    }

    /// The risk-free rate earned over a single return period.
    pub fn periodic_risk_free_rate(&self) -> f64 {
        self.risk_free_rate / self.annualization_period as f64
    }

    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.window < 2 {
            return Err(AnalyticsError::InvalidConfig(format!(
                "window must be at least 2, got {}",
                self.window
            )));
        }
        if self.annualization_period == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "annualization period must be positive".to_string(),
            ));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(AnalyticsError::InvalidConfig(
                "risk-free rate must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// A stateless calculator for rolling risk/performance ratios.
#[derive(Debug, Default)]
pub struct RollingRatioEngine {}

impl RollingRatioEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main entry point for calculating a rolling ratio.
    ///
    /// # Arguments
    ///
    /// * `asset` - Log returns of the analysed asset.
    /// * `benchmark` - Log returns of the benchmark. Required for Treynor and Alpha,
    ///   ignored otherwise.
    /// * `config` - Which ratio to compute and how.
    ///
    /// # Returns
    ///
    /// A `RatioSeries` on the asset index (Sharpe, Sortino, Treynor) or on the
    /// asset/benchmark common index (Alpha). Windows with a zero or undefined
    /// denominator produce `None` at that timestamp, which the fill policy may
    /// later plug.
    pub fn compute(
        &self,
        asset: &ReturnSeries,
        benchmark: Option<&ReturnSeries>,
        config: &RatioConfig,
    ) -> Result<RatioSeries, AnalyticsError> {
        config.validate()?;

        let raw = match config.kind {
            RatioKind::Sharpe => self.sharpe(asset, config)?,
            RatioKind::Sortino => self.sortino(asset, config)?,
            RatioKind::Treynor => {
                let benchmark = benchmark.ok_or(AnalyticsError::MissingBenchmark(config.kind))?;
                self.treynor(asset, benchmark, config)?
            }
            RatioKind::Alpha => {
                let benchmark = benchmark.ok_or(AnalyticsError::MissingBenchmark(config.kind))?;
                self.alpha(asset, benchmark, config)?
            }
        };

        tracing::debug!(
            kind = %config.kind,
            window = config.window,
            points = raw.len(),
            defined = raw.defined_count(),
            "Computed raw rolling ratio."
        );

        let series = if config.fill_before_report {
            raw.filled()
        } else {
            raw
        };

        // Alpha is the one ratio that is smoothed before it is reported.
        if config.kind == RatioKind::Alpha {
            return Ok(smooth(&series, config.window));
        }

        Ok(series)
    }

    /// Mean excess return over its sample standard deviation.
    fn sharpe(
        &self,
        asset: &ReturnSeries,
        config: &RatioConfig,
    ) -> Result<RatioSeries, AnalyticsError> {
        ensure_history(asset.len(), config.window)?;
        let excess = excess_returns(&asset.values(), config.periodic_risk_free_rate());

        let means = rolling_mean(&excess, config.window);
        let stds = rolling_std(&excess, config.window);
        let ratios = means
            .into_iter()
            .zip(stds)
            .map(|(m, s)| checked_ratio(m, s));

        Ok(on_index(config.kind, asset.timestamps(), ratios))
    }

    /// Mean excess return over the standard deviation of the window's negative
    /// excess returns.
    fn sortino(
        &self,
        asset: &ReturnSeries,
        config: &RatioConfig,
    ) -> Result<RatioSeries, AnalyticsError> {
        ensure_history(asset.len(), config.window)?;
        let excess = excess_returns(&asset.values(), config.periodic_risk_free_rate());

        let means = rolling_mean(&excess, config.window);
        let downside = rolling_downside_std(&excess, config.window);
        let ratios = means
            .into_iter()
            .zip(downside)
            .map(|(m, d)| checked_ratio(m, d));

        Ok(on_index(config.kind, asset.timestamps(), ratios))
    }

    /// Mean excess return over the rolling beta against the benchmark.
    ///
    /// Beta is estimated on the dates both series share and then looked up by
    /// asset date; asset dates without benchmark history get no ratio.
    fn treynor(
        &self,
        asset: &ReturnSeries,
        benchmark: &ReturnSeries,
        config: &RatioConfig,
    ) -> Result<RatioSeries, AnalyticsError> {
        let aligned = asset.align(benchmark);
        ensure_history(aligned.len(), config.window)?;

        let betas: HashMap<DateTime<Utc>, Option<f64>> = aligned
            .iter()
            .map(|(ts, _, _)| *ts)
            .zip(rolling_beta(&aligned, config))
            .collect();

        let excess = excess_returns(&asset.values(), config.periodic_risk_free_rate());
        let means = rolling_mean(&excess, config.window);

        let timestamps = asset.timestamps();
        let ratios = timestamps.iter().zip(means).map(|(ts, m)| {
            let beta = betas.get(ts).copied().flatten();
            checked_ratio(m, beta)
        });

        Ok(on_index(config.kind, timestamps.clone(), ratios))
    }

    /// Excess return above the CAPM expectation, before smoothing.
    ///
    /// `expected = rf + beta * (mean(benchmark) - rf)` with `rf` the
    /// per-period risk-free rate; both rolling terms use the same window.
    fn alpha(
        &self,
        asset: &ReturnSeries,
        benchmark: &ReturnSeries,
        config: &RatioConfig,
    ) -> Result<RatioSeries, AnalyticsError> {
        let aligned = asset.align(benchmark);
        ensure_history(aligned.len(), config.window)?;

        let rf = config.periodic_risk_free_rate();
        let bench: Vec<f64> = aligned.iter().map(|(_, _, b)| *b).collect();
        let betas = rolling_beta(&aligned, config);
        let bench_means = rolling_mean(&bench, config.window);

        let alphas = aligned
            .iter()
            .zip(betas.into_iter().zip(bench_means))
            .map(|((_, a, _), (beta, bench_mean))| {
                let expected = rf + beta? * (bench_mean? - rf);
                Some((a - rf) - expected)
            });

        let timestamps = aligned.iter().map(|(ts, _, _)| *ts).collect();
        Ok(on_index(config.kind, timestamps, alphas))
    }
}

/// Rolling `cov(asset leg, benchmark) / var(benchmark)` over aligned triples.
fn rolling_beta(aligned: &[(DateTime<Utc>, f64, f64)], config: &RatioConfig) -> Vec<Option<f64>> {
    let rf = config.periodic_risk_free_rate();
    let leg: Vec<f64> = aligned
        .iter()
        .map(|(_, a, _)| match config.beta_source {
            BetaSource::RiskAdjusted => a - rf,
            BetaSource::Raw => *a,
        })
        .collect();
    let bench: Vec<f64> = aligned.iter().map(|(_, _, b)| *b).collect();

    rolling_cov(&leg, &bench, config.window)
        .into_iter()
        .zip(rolling_var(&bench, config.window))
        .map(|(cov, var)| checked_ratio(cov, var))
        .collect()
}

fn excess_returns(returns: &[f64], periodic_rf: f64) -> Vec<f64> {
    returns.iter().map(|r| r - periodic_rf).collect()
}

fn ensure_history(available: usize, window: usize) -> Result<(), AnalyticsError> {
    if available < window {
        return Err(AnalyticsError::InsufficientData {
            required: window,
            available,
        });
    }
    Ok(())
}

fn on_index(
    kind: RatioKind,
    timestamps: Vec<DateTime<Utc>>,
    values: impl Iterator<Item = Option<f64>>,
) -> RatioSeries {
    RatioSeries::new(kind, timestamps.into_iter().zip(values).collect())
}

/// Exponentially weighted mean with span = window.
fn smooth(series: &RatioSeries, window: usize) -> RatioSeries {
    let smoothed = ewm_mean(&series.values(), window);
    let points = series
        .points()
        .iter()
        .zip(smoothed)
        .map(|((ts, _), v)| (*ts, v))
        .collect();
    RatioSeries::new(series.kind(), points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::OutlierReport;
    use approx::assert_abs_diff_eq;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use test_case::test_case;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn returns(values: &[f64]) -> ReturnSeries {
        returns_from(0, values)
    }

    fn returns_from(start: i64, values: &[f64]) -> ReturnSeries {
        ReturnSeries::new(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (day(start + i as i64), *v))
                .collect(),
        )
        .unwrap()
    }

    fn wavy(n: usize, phase: f64) -> Vec<f64> {
        (0..n)
            .map(|i| 0.02 * ((i as f64) * 0.7 + phase).sin() + 0.001 * (i as f64 * 1.3).cos())
            .collect()
    }

    fn raw(kind: RatioKind, window: usize) -> RatioConfig {
        RatioConfig::new(kind, window, 0.0, 252).with_fill_before_report(false)
    }

    fn assert_series_eq(actual: &RatioSeries, expected: &[Option<f64>]) {
        assert_eq!(actual.len(), expected.len());
        for (i, (got, want)) in actual.values().iter().zip(expected).enumerate() {
            match (got, want) {
                (Some(g), Some(w)) => assert_abs_diff_eq!(*g, *w, epsilon = 1e-9),
                (None, None) => {}
                _ => panic!("position {i}: got {got:?}, want {want:?}"),
            }
        }
    }

    const EXCESS: [f64; 6] = [0.01, 0.02, -0.01, 0.03, -0.02, 0.015];

    #[test]
    fn sharpe_matches_hand_computed_windows() {
        let series = RollingRatioEngine::new()
            .compute(&returns(&EXCESS), None, &raw(RatioKind::Sharpe, 3))
            .unwrap();

        // mean / sample std of [0.01, 0.02, -0.01], [0.02, -0.01, 0.03], ...
        assert_series_eq(
            &series,
            &[
                None,
                None,
                Some(0.436_435_780_471_984_67),
                Some(0.640_512_615_220_348_6),
                Some(0.0),
                Some(0.324_784_901_230_815_44),
            ],
        );
        assert_eq!(series.kind(), RatioKind::Sharpe);
        assert_eq!(series.points()[2].0, day(2));
    }

    #[test]
    fn sharpe_of_constant_excess_is_undefined_everywhere() {
        let series = RollingRatioEngine::new()
            .compute(&returns(&[1.0; 10]), None, &raw(RatioKind::Sharpe, 3))
            .unwrap();
        assert_eq!(series.len(), 10);
        assert_eq!(series.defined_count(), 0);

        // Filling has nothing to carry, so the series stays undefined.
        let filled = RollingRatioEngine::new()
            .compute(&returns(&[1.0; 10]), None, &RatioConfig::new(RatioKind::Sharpe, 3, 0.0, 252))
            .unwrap();
        assert_eq!(filled.defined_count(), 0);
        assert!(OutlierReport::build(&filled).is_none());
    }

    #[test]
    fn risk_free_rate_is_subtracted_per_period() {
        // 0.0252 annual over 252 periods leaves excess returns 0.0001 below the raw ones.
        let shifted: Vec<f64> = EXCESS.iter().map(|r| r + 0.0001).collect();
        let config = RatioConfig::new(RatioKind::Sharpe, 3, 0.0252, 252).with_fill_before_report(false);
        let with_rf = RollingRatioEngine::new()
            .compute(&returns(&shifted), None, &config)
            .unwrap();
        let without = RollingRatioEngine::new()
            .compute(&returns(&EXCESS), None, &raw(RatioKind::Sharpe, 3))
            .unwrap();
        assert_series_eq(&with_rf, &without.values());
    }

    #[test]
    fn sortino_uses_only_negative_excess_in_each_window() {
        let series = RollingRatioEngine::new()
            .compute(&returns(&EXCESS), None, &raw(RatioKind::Sortino, 4))
            .unwrap();

        // Window ending at 3 holds a single negative value.
        assert_series_eq(
            &series,
            &[
                None,
                None,
                None,
                None,
                Some(0.707_106_781_186_547_6),
                Some(0.530_330_085_889_910_5),
            ],
        );
    }

    #[test]
    fn sortino_without_two_losses_is_undefined() {
        let series = RollingRatioEngine::new()
            .compute(&returns(&[0.01, -0.02, 0.03, 0.01, 0.02]), None, &raw(RatioKind::Sortino, 3))
            .unwrap();
        assert_eq!(series.defined_count(), 0);
    }

    #[test]
    fn fill_policy_plugs_the_warm_up_prefix() {
        let filled = RollingRatioEngine::new()
            .compute(
                &returns(&EXCESS),
                None,
                &RatioConfig::new(RatioKind::Sortino, 4, 0.0, 252),
            )
            .unwrap();

        assert_eq!(filled.defined_count(), 6);
        assert_abs_diff_eq!(filled.values()[0].unwrap(), 0.707_106_781_186_547_6, epsilon = 1e-9);
        assert_abs_diff_eq!(filled.values()[4].unwrap(), 0.707_106_781_186_547_6, epsilon = 1e-9);
    }

    #[test_case(RatioKind::Treynor ; "treynor")]
    #[test_case(RatioKind::Alpha ; "alpha")]
    fn benchmark_kinds_require_a_benchmark(kind: RatioKind) {
        let err = RollingRatioEngine::new()
            .compute(&returns(&EXCESS), None, &raw(kind, 3))
            .unwrap_err();
        assert_eq!(err, AnalyticsError::MissingBenchmark(kind));
    }

    #[test_case(RatioKind::Sharpe ; "sharpe")]
    #[test_case(RatioKind::Sortino ; "sortino")]
    fn short_history_is_insufficient(kind: RatioKind) {
        let err = RollingRatioEngine::new()
            .compute(&returns(&[0.01, 0.02]), None, &raw(kind, 3))
            .unwrap_err();
        assert_eq!(err, AnalyticsError::InsufficientData { required: 3, available: 2 });
    }

    #[test]
    fn little_overlap_with_benchmark_is_insufficient() {
        let asset = returns(&wavy(30, 0.0));
        let benchmark = returns_from(28, &wavy(30, 1.0));

        let err = RollingRatioEngine::new()
            .compute(&asset, Some(&benchmark), &raw(RatioKind::Treynor, 5))
            .unwrap_err();
        assert_eq!(err, AnalyticsError::InsufficientData { required: 5, available: 2 });
    }

    #[test_case(1 ; "window of one")]
    #[test_case(0 ; "window of zero")]
    fn degenerate_windows_are_rejected(window: usize) {
        let err = RollingRatioEngine::new()
            .compute(&returns(&EXCESS), None, &raw(RatioKind::Sharpe, window))
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidConfig(_)));
    }

    #[test]
    fn treynor_of_a_levered_benchmark_is_mean_over_leverage() {
        // Asset returns are exactly twice the benchmark, so beta is 2 everywhere.
        let bench = wavy(20, 0.3);
        let asset: Vec<f64> = bench.iter().map(|b| 2.0 * b).collect();

        let series = RollingRatioEngine::new()
            .compute(&returns(&asset), Some(&returns(&bench)), &raw(RatioKind::Treynor, 5))
            .unwrap();

        let means = rolling_mean(&asset, 5);
        for (got, mean) in series.values().iter().zip(means) {
            match (got, mean) {
                (Some(g), Some(m)) => assert_abs_diff_eq!(*g, m / 2.0, epsilon = 1e-12),
                (None, None) => {}
                other => panic!("definedness differs: {other:?}"),
            }
        }
    }

    #[test]
    fn treynor_beta_is_restricted_to_the_asset_index() {
        // Benchmark history starts ten days after the asset's.
        let asset = returns(&wavy(40, 0.0));
        let benchmark = returns_from(10, &wavy(30, 0.9));

        let series = RollingRatioEngine::new()
            .compute(&asset, Some(&benchmark), &raw(RatioKind::Treynor, 5))
            .unwrap();

        assert_eq!(series.len(), 40);
        assert_eq!(series.points()[0].0, day(0));
        // Beta needs five shared observations: days 10..=14.
        assert!(series.values()[..14].iter().all(Option::is_none));
        assert!(series.values()[14..].iter().all(Option::is_some));
    }

    #[test]
    fn beta_is_the_same_for_either_source() {
        let asset = returns(&wavy(30, 0.0));
        let benchmark = returns(&wavy(30, 2.1));
        let aligned = asset.align(&benchmark);

        let config = RatioConfig::new(RatioKind::Treynor, 6, 0.05, 252);
        let adjusted = rolling_beta(
            &aligned,
            &config.clone().with_beta_source(BetaSource::RiskAdjusted),
        );
        let raw_leg = rolling_beta(&aligned, &config.with_beta_source(BetaSource::Raw));

        // Covariance ignores a constant shift of either leg.
        assert_eq!(adjusted.iter().flatten().count(), 25);
        for (a, r) in adjusted.iter().zip(&raw_leg) {
            match (a, r) {
                (Some(a), Some(r)) => assert_abs_diff_eq!(*a, *r, epsilon = 1e-12),
                (None, None) => {}
                other => panic!("definedness differs: {other:?}"),
            }
        }
    }

    #[test]
    fn alpha_is_zero_when_the_asset_tracks_the_capm_line() {
        // With rf = 0 and asset = benchmark, beta is 1 and the raw alpha is
        // r[t] - mean(r window); smoothing must reproduce the EWM of that.
        let bench = wavy(25, 0.4);
        let series = RollingRatioEngine::new()
            .compute(&returns(&bench), Some(&returns(&bench)), &raw(RatioKind::Alpha, 4))
            .unwrap();

        let means = rolling_mean(&bench, 4);
        let raw_alpha: Vec<Option<f64>> = bench
            .iter()
            .zip(&means)
            .map(|(r, m)| m.map(|m| r - m))
            .collect();
        assert_series_eq(&series, &ewm_mean(&raw_alpha, 4));
        assert_eq!(series.values()[2], None);
        assert!(series.values()[3].is_some());
    }

    #[test]
    fn alpha_is_smoothed_after_filling() {
        let asset = returns(&wavy(25, 0.0));
        let benchmark = returns(&wavy(25, 1.7));
        let engine = RollingRatioEngine::new();

        let unfilled = engine
            .compute(&asset, Some(&benchmark), &raw(RatioKind::Alpha, 5))
            .unwrap();
        let filled = engine
            .compute(
                &asset,
                Some(&benchmark),
                &RatioConfig::new(RatioKind::Alpha, 5, 0.0, 252),
            )
            .unwrap();

        assert_eq!(unfilled.defined_count(), 21);
        assert_eq!(filled.defined_count(), 25);
        // The plugged prefix starts the smoother at the first real alpha.
        assert_abs_diff_eq!(
            filled.values()[0].unwrap(),
            unfilled.values()[4].unwrap(),
            epsilon = 1e-12
        );
    }

    proptest! {
        #[test]
        fn unfilled_series_has_n_minus_w_plus_one_defined_points(
            n in 2usize..120,
            w in 2usize..30,
            phase in 0.0f64..6.0,
        ) {
            prop_assume!(w <= n);
            let series = RollingRatioEngine::new()
                .compute(&returns(&wavy(n, phase)), None, &raw(RatioKind::Sharpe, w))
                .unwrap();

            prop_assert_eq!(series.len(), n);
            prop_assert_eq!(series.defined_count(), n - w + 1);
            prop_assert!(series.values()[..w - 1].iter().all(Option::is_none));
        }
    }
}
