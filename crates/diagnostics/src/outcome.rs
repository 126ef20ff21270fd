use serde::{Deserialize, Serialize};

/// A test statistic together with its p-value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
}

impl TestOutcome {
    pub fn new(statistic: f64, p_value: f64) -> Self {
        Self {
            statistic,
            p_value: p_value.clamp(0.0, 1.0),
        }
    }

    /// True when the null hypothesis is rejected at `significance`.
    pub fn rejects_null(&self, significance: f64) -> bool {
        self.p_value < significance
    }
}

/// A tabulated critical value of a test statistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalValue {
    /// Significance level in percent, e.g. `5.0`.
    pub significance_pct: f64,
    pub value: f64,
}
