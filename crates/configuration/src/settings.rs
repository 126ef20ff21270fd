use crate::error::ConfigError;
use core_types::BetaSource;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section falls back to its `Default` when omitted, so an empty or
/// missing `ratiolens.toml` still yields a usable configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisSettings,
    pub provider: ProviderSettings,
    pub diagnostics: DiagnosticsSettings,
    pub logging: LoggingSettings,
}

/// Parameters shared by every rolling-ratio run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Number of return periods in a year. The risk-free rate is divided by this.
    pub period: u32,
    /// Trailing window size, in return periods.
    pub window: usize,
    /// Annual risk-free rate (e.g., 0.05 for 5%).
    pub risk_free_rate: f64,
    /// Benchmark symbol for Treynor and Alpha.
    pub benchmark: String,
    pub beta_source: BetaSource,
    /// Plug undefined ratio values before the outlier report is computed.
    pub fill_before_report: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            period: 252,
            window: 21,
            risk_free_rate: 0.05,
            benchmark: "^JKSE".to_string(),
            beta_source: BetaSource::RiskAdjusted,
            fill_before_report: true,
        }
    }
}

/// Where and how price history is downloaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,
    /// Yahoo chart range, e.g. "max", "10y", "1y".
    pub range: String,
    /// Bar interval, e.g. "1d".
    pub interval: String,
    /// Use split/dividend adjusted closes when the provider supplies them.
    pub adjusted: bool,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            range: "max".to_string(),
            interval: "1d".to_string(),
            adjusted: true,
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (compatible; ratiolens/0.1)".to_string(),
        }
    }
}

/// Settings for the hypothesis-test commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsSettings {
    /// p-value threshold used to phrase every conclusion.
    pub significance: f64,
    pub ljung_box_lags: usize,
}

impl Default for DiagnosticsSettings {
    fn default() -> Self {
        Self {
            significance: 0.05,
            ljung_box_lags: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is not set.
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "ratiolens.log".to_string(),
        }
    }
}

impl Config {
    /// Rejects values the analytics and diagnostics crates cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.analysis;
        if a.window < 2 {
            return Err(ConfigError::ValidationError(format!(
                "analysis.window must be at least 2, got {}",
                a.window
            )));
        }
        if a.period == 0 {
            return Err(ConfigError::ValidationError(
                "analysis.period must be positive".to_string(),
            ));
        }
        if !a.risk_free_rate.is_finite() {
            return Err(ConfigError::ValidationError(
                "analysis.risk_free_rate must be a finite number".to_string(),
            ));
        }
        if a.benchmark.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "analysis.benchmark must not be empty".to_string(),
            ));
        }

        let d = &self.diagnostics;
        if !(d.significance > 0.0 && d.significance < 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "diagnostics.significance must lie in (0, 1), got {}",
                d.significance
            )));
        }
        if d.ljung_box_lags == 0 {
            return Err(ConfigError::ValidationError(
                "diagnostics.ljung_box_lags must be positive".to_string(),
            ));
        }

        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "provider.timeout_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
