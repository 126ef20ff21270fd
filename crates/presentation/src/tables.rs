//! comfy-table renderings of every result the binary prints.

use crate::verdict;
use analytics::OutlierReport;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Table};
use core_types::RatioSeries;
use diagnostics::{
    AndersonDarling, AutocorrelationReport, NormalityReport, SeasonalDecomposition,
    SummaryStatistics, UnitRootReport,
};

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header.to_vec());
    table
}

fn align_right(table: &mut Table, columns: &[usize]) {
    for index in columns {
        if let Some(column) = table.column_mut(*index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
}

fn fixed(value: f64) -> String {
    format!("{value:.4}")
}

/// Quartiles, fences and mean of a rolling ratio.
pub fn ratio_summary(series: &RatioSeries, report: &OutlierReport) -> Table {
    let mut table = new_table(&["Statistic", "Value"]);
    table.add_row(vec!["Observations".to_string(), series.len().to_string()]);
    table.add_row(vec!["Defined".to_string(), series.defined_count().to_string()]);
    for (name, value) in [
        ("Mean", report.mean),
        ("Q1", report.q1),
        ("Q3", report.q3),
        ("IQR", report.iqr),
        ("Lower Bound", report.lower_bound),
        ("Upper Bound", report.upper_bound),
    ] {
        table.add_row(vec![name.to_string(), fixed(value)]);
    }
    table.add_row(vec!["Outliers".to_string(), report.outliers.len().to_string()]);
    align_right(&mut table, &[1]);
    table
}

/// One row per point outside the fences.
pub fn outliers(report: &OutlierReport) -> Table {
    let mut table = new_table(&["Date", "Value", "Side"]);
    for (ts, value) in &report.outliers {
        let side = if *value < report.lower_bound {
            "Below"
        } else {
            "Above"
        };
        table.add_row(vec![
            ts.format("%Y-%m-%d").to_string(),
            fixed(*value),
            side.to_string(),
        ]);
    }
    align_right(&mut table, &[1]);
    table
}

pub fn summary_statistics(summary: &SummaryStatistics) -> Table {
    let mut table = new_table(&["Statistic", "Value"]);
    table.add_row(vec!["Observations".to_string(), summary.count.to_string()]);
    table.add_row(vec!["Mean".to_string(), fixed(summary.mean)]);
    table.add_row(vec!["Standard Deviation".to_string(), fixed(summary.std_dev)]);
    table.add_row(vec!["Skewness".to_string(), fixed(summary.skewness)]);
    table.add_row(vec!["Kurtosis".to_string(), fixed(summary.excess_kurtosis)]);
    align_right(&mut table, &[1]);
    table
}

/// Jarque-Bera, Shapiro-Wilk and Kolmogorov-Smirnov with their conclusions.
pub fn normality_tests(report: &NormalityReport, significance: f64) -> Table {
    let mut table = new_table(&["Test", "Statistic", "P-Value", "Conclusion"]);
    for (name, outcome) in [
        ("Jarque-Bera", &report.jarque_bera),
        ("Shapiro-Wilk", &report.shapiro_wilk),
        ("Kolmogorov-Smirnov", &report.kolmogorov_smirnov),
    ] {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(fixed(outcome.statistic)),
            Cell::new(fixed(outcome.p_value)),
            verdict::normality(outcome, significance).cell(),
        ]);
    }
    align_right(&mut table, &[1, 2]);
    table
}

pub fn anderson_darling(result: &AndersonDarling) -> Table {
    let mut table = new_table(&["Significance Level", "Critical Value"]);
    for cv in &result.critical_values {
        table.add_row(vec![format!("{}%", cv.significance_pct), fixed(cv.value)]);
    }
    align_right(&mut table, &[1]);
    table
}

pub fn ljung_box(report: &AutocorrelationReport, significance: f64) -> Table {
    let mut table = new_table(&["Lag", "Ljung-Box Statistic", "P-Value", "Significance"]);
    for lag in &report.ljung_box {
        table.add_row(vec![
            Cell::new(lag.lag),
            Cell::new(fixed(lag.outcome.statistic)),
            Cell::new(fixed(lag.outcome.p_value)),
            verdict::lag_significance(&lag.outcome, significance).cell(),
        ]);
    }
    align_right(&mut table, &[0, 1, 2]);
    table
}

pub fn unit_root(report: &UnitRootReport, significance: f64) -> Table {
    let mut table = new_table(&["Test", "Statistic", "P-Value", "Lags", "Conclusion"]);
    for test in report.tests() {
        table.add_row(vec![
            Cell::new(&test.name),
            Cell::new(fixed(test.outcome.statistic)),
            Cell::new(fixed(test.outcome.p_value)),
            Cell::new(test.lags),
            verdict::stationarity(test, significance).cell(),
        ]);
    }
    align_right(&mut table, &[1, 2, 3]);
    table
}

/// Seasonal index per phase of the cycle.
pub fn seasonal_indices(decomposition: &SeasonalDecomposition) -> Table {
    let mut table = new_table(&["Phase", "Seasonal Index"]);
    for (phase, index) in decomposition.seasonal_indices.iter().enumerate() {
        table.add_row(vec![(phase + 1).to_string(), fixed(*index)]);
    }
    align_right(&mut table, &[0, 1]);
    table
}

/// Fences of the residual component.
pub fn residual_bounds(report: &OutlierReport) -> Table {
    let mut table = new_table(&["Statistic", "Value"]);
    for (name, value) in [
        ("Q1", report.q1),
        ("Q3", report.q3),
        ("IQR", report.iqr),
        ("Lower Bound", report.lower_bound),
        ("Upper Bound", report.upper_bound),
    ] {
        table.add_row(vec![name.to_string(), fixed(value)]);
    }
    table.add_row(vec![
        "Significant Residuals".to_string(),
        report.outliers.len().to_string(),
    ]);
    align_right(&mut table, &[1]);
    table
}
