//! Full console reports for the diagnostic commands.

use crate::tables;
use crate::verdict;
use diagnostics::{AutocorrelationReport, NormalityReport, SeasonalDecomposition, UnitRootReport};

pub fn normality(symbol: &str, report: &NormalityReport, significance: f64) -> String {
    let ad = &report.anderson_darling;
    let mut out = String::new();
    out.push_str(&format!("Summary Statistics for {symbol}\n"));
    out.push_str(&format!("{}\n", tables::summary_statistics(&report.summary)));
    out.push_str("\nNormality Tests\n");
    out.push_str(&format!("{}\n", tables::normality_tests(report, significance)));
    out.push_str("\nAnderson-Darling Test\n");
    out.push_str(&format!("Statistic: {:.4}\n", ad.statistic));
    out.push_str(&format!("{}\n", tables::anderson_darling(ad)));
    out.push_str(&format!(
        "Conclusion: {}\n",
        verdict::anderson_darling(ad, significance)
    ));
    out
}

pub fn autocorrelation(symbol: &str, report: &AutocorrelationReport, significance: f64) -> String {
    let mut out = String::new();
    out.push_str(&format!("Results of the Ljung-Box Test for {symbol}:\n"));
    out.push_str(&format!("{}\n", tables::ljung_box(report, significance)));
    out.push_str(&format!("{}\n", verdict::independence(report, significance)));
    out.push_str(&format!("\nDurbin-Watson Statistic: {:.2}\n", report.durbin_watson));
    out.push_str(&format!(
        "{}\n",
        verdict::serial_correlation(report.durbin_watson_reading())
    ));
    let qq = &report.qq_plot;
    out.push_str(&format!(
        "\nNormal Q-Q fit: slope {:.4}, intercept {:.4}, r {:.4}\n",
        qq.slope, qq.intercept, qq.r
    ));
    out
}

pub fn unit_root(symbol: &str, report: &UnitRootReport, significance: f64) -> String {
    let mut out = String::new();
    out.push_str(&format!("Unit Root Tests for {symbol}\n"));
    out.push_str(&format!("{}\n", tables::unit_root(report, significance)));
    out
}

pub fn decomposition(symbol: &str, decomposition: &SeasonalDecomposition) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Seasonal Decomposition of {symbol} with {}-day Period\n",
        decomposition.period
    ));
    out.push_str(&format!("{}\n", tables::seasonal_indices(decomposition)));
    match &decomposition.residual_bounds {
        Some(bounds) => {
            out.push_str("\nResidual\n");
            out.push_str(&format!("{}\n", tables::residual_bounds(bounds)));
            if !bounds.outliers.is_empty() {
                out.push_str(&format!("{}\n", tables::outliers(bounds)));
            }
        }
        None => {
            out.push_str("\nResidual is undefined everywhere.\n");
        }
    }
    out
}
