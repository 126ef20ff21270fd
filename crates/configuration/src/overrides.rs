use crate::settings::AnalysisSettings;
use core_types::BetaSource;

/// Command-line flags that take precedence over the file and environment.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct AnalysisOverrides {
    /// Return periods per year [default: 252].
    #[arg(long)]
    pub period: Option<u32>,

    /// Rolling window size in periods [default: 21].
    #[arg(long)]
    pub window: Option<usize>,

    /// Annual risk-free rate [default: 0.05].
    #[arg(long)]
    pub risk_free_rate: Option<f64>,

    /// Benchmark symbol for Treynor and Alpha [default: ^JKSE].
    #[arg(long)]
    pub benchmark: Option<String>,

    /// Asset series used for the covariance term of beta.
    #[arg(long, value_enum)]
    pub beta_source: Option<BetaSource>,

    /// Keep the undefined warm-up values instead of plugging them before the outlier report.
    #[arg(long)]
    pub no_fill: bool,
}

impl AnalysisOverrides {
    pub fn apply(&self, settings: &mut AnalysisSettings) {
        if let Some(period) = self.period {
            settings.period = period;
        }
        if let Some(window) = self.window {
            settings.window = window;
        }
        if let Some(rate) = self.risk_free_rate {
            settings.risk_free_rate = rate;
        }
        if let Some(benchmark) = &self.benchmark {
            settings.benchmark = benchmark.to_uppercase();
        }
        if let Some(source) = self.beta_source {
            settings.beta_source = source;
        }
        if self.no_fill {
            settings.fill_before_report = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_given_flags_override() {
        let mut settings = AnalysisSettings::default();
        let overrides = AnalysisOverrides {
            window: Some(63),
            benchmark: Some("^gspc".to_string()),
            no_fill: true,
            ..Default::default()
        };
        overrides.apply(&mut settings);

        assert_eq!(settings.window, 63);
        assert_eq!(settings.benchmark, "^GSPC");
        assert!(!settings.fill_before_report);
        assert_eq!(settings.period, 252);
        assert_eq!(settings.risk_free_rate, 0.05);
    }
}
