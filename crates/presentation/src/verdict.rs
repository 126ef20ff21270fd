//! One-line conclusions drawn from test outcomes at a significance threshold.

use comfy_table::{Cell, Color};
use diagnostics::{
    AndersonDarling, AutocorrelationReport, SerialCorrelation, TestOutcome, UnitRootTest,
};
use std::fmt;

/// Significance used when the caller has no configured threshold.
pub const DEFAULT_SIGNIFICANCE: f64 = 0.05;

/// Whether a conclusion is good or bad news for the usual modelling assumptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Favourable,
    Unfavourable,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub message: &'static str,
    pub tone: Tone,
}

impl Verdict {
    const fn new(message: &'static str, tone: Tone) -> Self {
        Self { message, tone }
    }

    /// Table cell coloured by tone.
    pub fn cell(&self) -> Cell {
        let color = match self.tone {
            Tone::Favourable => Color::Green,
            Tone::Unfavourable => Color::Red,
            Tone::Neutral => Color::Yellow,
        };
        Cell::new(self.message).fg(color)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)
    }
}

const NORMAL: Verdict = Verdict::new("The returns are normally distributed", Tone::Favourable);
const NOT_NORMAL: Verdict = Verdict::new(
    "The returns are not normally distributed",
    Tone::Unfavourable,
);
const STATIONARY: Verdict = Verdict::new("The returns are stationary", Tone::Favourable);
const NOT_STATIONARY: Verdict = Verdict::new("The returns are not stationary", Tone::Unfavourable);

/// Normality is rejected when the p-value falls below `significance`.
pub fn normality(outcome: &TestOutcome, significance: f64) -> Verdict {
    if outcome.rejects_null(significance) {
        NOT_NORMAL
    } else {
        NORMAL
    }
}

/// Compares the statistic with the critical value at `significance`, falling
/// back to the 5% level when that level is not tabulated.
pub fn anderson_darling(result: &AndersonDarling, significance: f64) -> Verdict {
    let rejects = result
        .rejects_at(significance * 100.0)
        .unwrap_or_else(|| result.rejects_normality());
    if rejects { NOT_NORMAL } else { NORMAL }
}

pub fn stationarity(test: &UnitRootTest, significance: f64) -> Verdict {
    if test.indicates_stationarity(significance) {
        STATIONARY
    } else {
        NOT_STATIONARY
    }
}

/// Ljung-Box across all lags: any significant lag means dependence.
pub fn independence(report: &AutocorrelationReport, significance: f64) -> Verdict {
    if report.any_lag_significant(significance) {
        Verdict::new(
            "The log returns are not independently distributed.",
            Tone::Unfavourable,
        )
    } else {
        Verdict::new(
            "The log returns are independently distributed.",
            Tone::Favourable,
        )
    }
}

/// Per-lag significance flag for the Ljung-Box table.
pub fn lag_significance(outcome: &TestOutcome, significance: f64) -> Verdict {
    if outcome.rejects_null(significance) {
        Verdict::new("Yes", Tone::Favourable)
    } else {
        Verdict::new("No", Tone::Unfavourable)
    }
}

pub fn serial_correlation(reading: SerialCorrelation) -> Verdict {
    match reading {
        SerialCorrelation::Positive => Verdict::new("Positive autocorrelation.", Tone::Favourable),
        SerialCorrelation::Negative => {
            Verdict::new("Negative autocorrelation.", Tone::Unfavourable)
        }
        SerialCorrelation::None => Verdict::new("No autocorrelation.", Tone::Neutral),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagnostics::{CriticalValue, NullHypothesis};
    use test_case::test_case;

    fn outcome(p_value: f64) -> TestOutcome {
        TestOutcome::new(1.0, p_value)
    }

    #[test_case(0.01, 0.05, "The returns are not normally distributed" ; "rejected")]
    #[test_case(0.05, 0.05, "The returns are normally distributed" ; "boundary keeps the null")]
    #[test_case(0.03, 0.01, "The returns are normally distributed" ; "stricter threshold")]
    fn normality_follows_the_threshold(p_value: f64, significance: f64, expected: &str) {
        assert_eq!(normality(&outcome(p_value), significance).message, expected);
    }

    fn unit_root(null: NullHypothesis, p_value: f64) -> UnitRootTest {
        UnitRootTest {
            name: "test".to_string(),
            null,
            outcome: outcome(p_value),
            lags: 0,
            nobs: 100,
            critical_values: Vec::new(),
        }
    }

    #[test_case(NullHypothesis::UnitRoot, 0.001, true ; "adf rejects unit root")]
    #[test_case(NullHypothesis::UnitRoot, 0.40, false ; "adf keeps unit root")]
    #[test_case(NullHypothesis::Stationary, 0.10, true ; "kpss keeps stationarity")]
    #[test_case(NullHypothesis::Stationary, 0.01, false ; "kpss rejects stationarity")]
    fn stationarity_reads_the_null(null: NullHypothesis, p_value: f64, stationary: bool) {
        let verdict = stationarity(&unit_root(null, p_value), DEFAULT_SIGNIFICANCE);
        assert_eq!(verdict == STATIONARY, stationary);
    }

    #[test]
    fn anderson_darling_uses_the_matching_critical_value() {
        let result = AndersonDarling {
            statistic: 0.8,
            critical_values: [
                (15.0, 0.555),
                (10.0, 0.632),
                (5.0, 0.759),
                (2.5, 0.885),
                (1.0, 1.053),
            ]
            .into_iter()
            .map(|(significance_pct, value)| CriticalValue { significance_pct, value })
            .collect(),
        };
        assert_eq!(anderson_darling(&result, 0.05), NOT_NORMAL);
        assert_eq!(anderson_darling(&result, 0.01), NORMAL);
        // 3% is not tabulated, so the 5% value decides.
        assert_eq!(anderson_darling(&result, 0.03), NOT_NORMAL);
    }

    #[test_case(SerialCorrelation::Positive, "Positive autocorrelation.", Tone::Favourable)]
    #[test_case(SerialCorrelation::Negative, "Negative autocorrelation.", Tone::Unfavourable)]
    #[test_case(SerialCorrelation::None, "No autocorrelation.", Tone::Neutral)]
    fn durbin_watson_messages(reading: SerialCorrelation, message: &str, tone: Tone) {
        let verdict = serial_correlation(reading);
        assert_eq!(verdict.message, message);
        assert_eq!(verdict.tone, tone);
        assert_eq!(verdict.to_string(), message);
    }

    #[test]
    fn lag_flag() {
        assert_eq!(lag_significance(&outcome(0.001), 0.05).message, "Yes");
        assert_eq!(lag_significance(&outcome(0.5), 0.05).message, "No");
    }
}
