//! Standalone SVG charts: the rolling ratio with its outlier fences, the four
//! decomposition panels and the normal Q-Q plot.

use crate::error::PresentationError;
use analytics::OutlierReport;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use core_types::RatioSeries;
use diagnostics::{QqPlot, SeasonalDecomposition};

const WIDTH: i32 = 576;
const HEIGHT: i32 = 288;
const PADDING: f64 = 36.0;
const TITLE_BAND: f64 = 24.0;
const SERIES_COLOR: &str = "#348dc1";
const MEAN_COLOR: &str = "#ff9933";
const ACCENT_COLOR: &str = "#8c8c8c";
const RED: &str = "#d62728";
const GREEN: &str = "#2ca02c";

struct Line {
    label: &'static str,
    color: &'static str,
    values: Vec<Option<f64>>,
}

struct Guide {
    value: f64,
    color: &'static str,
    dash: bool,
    label: &'static str,
}

struct Panel<'a> {
    title: &'a str,
    lines: Vec<Line>,
    guides: Vec<Guide>,
    /// `(index, value)` points drawn as red dots.
    markers: Vec<(usize, f64)>,
}

impl Panel<'_> {
    fn extent(&self) -> Option<(f64, f64)> {
        extent(
            self.lines
                .iter()
                .flat_map(|line| line.values.iter().flatten().copied())
                .chain(self.guides.iter().map(|g| g.value)),
        )
    }
}

/// Rolling ratio line with dashed IQR fences, the mean and the outliers marked.
pub fn ratio_chart(
    title: &str,
    series: &RatioSeries,
    report: &OutlierReport,
) -> Result<String, PresentationError> {
    if series.defined_count() == 0 {
        return Err(PresentationError::NothingToPlot(series.kind().to_string()));
    }

    let dates = trading_dates(series.points().iter().map(|(ts, _)| ts));
    let values = series.values();
    let markers = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|v| report.is_outlier(*v)).map(|v| (i, v)))
        .collect();

    let panel = Panel {
        title,
        lines: vec![Line {
            label: series.kind().label(),
            color: SERIES_COLOR,
            values,
        }],
        guides: vec![
            Guide {
                value: report.lower_bound,
                color: RED,
                dash: true,
                label: "Lower Bound",
            },
            Guide {
                value: report.upper_bound,
                color: GREEN,
                dash: true,
                label: "Upper Bound",
            },
            Guide {
                value: report.mean,
                color: MEAN_COLOR,
                dash: false,
                label: "Mean",
            },
        ],
        markers,
    };

    let mut svg = svg_header(WIDTH, HEIGHT);
    render_panel(&mut svg, &dates, &panel, 0.0);
    svg.push_str(svg_footer());
    Ok(svg)
}

/// Observed, trend, seasonal and residual panels stacked vertically. The
/// residual panel carries the IQR fences.
pub fn decomposition_chart(
    title: &str,
    decomposition: &SeasonalDecomposition,
) -> Result<String, PresentationError> {
    if decomposition.observed.is_empty() {
        return Err(PresentationError::NothingToPlot("decomposition".to_string()));
    }

    let dates = trading_dates(decomposition.observed.iter().map(|(ts, _)| ts));
    let residual_guides = decomposition
        .residual_bounds
        .as_ref()
        .map(|bounds| {
            vec![
                Guide {
                    value: bounds.lower_bound,
                    color: GREEN,
                    dash: true,
                    label: "Lower Bound",
                },
                Guide {
                    value: bounds.upper_bound,
                    color: RED,
                    dash: true,
                    label: "Upper Bound",
                },
            ]
        })
        .unwrap_or_default();

    let panels = [
        Panel {
            title: "Original Data",
            lines: vec![Line {
                label: "Original Data",
                color: SERIES_COLOR,
                values: decomposition.observed.iter().map(|(_, v)| Some(*v)).collect(),
            }],
            guides: Vec::new(),
            markers: Vec::new(),
        },
        Panel {
            title: "Trend",
            lines: vec![Line {
                label: "Trend",
                color: SERIES_COLOR,
                values: decomposition.trend.iter().map(|(_, v)| *v).collect(),
            }],
            guides: Vec::new(),
            markers: Vec::new(),
        },
        Panel {
            title: "Seasonal",
            lines: vec![Line {
                label: "Seasonal",
                color: SERIES_COLOR,
                values: decomposition.seasonal.iter().map(|(_, v)| Some(*v)).collect(),
            }],
            guides: Vec::new(),
            markers: Vec::new(),
        },
        Panel {
            title: "Residual",
            lines: vec![Line {
                label: "Residual",
                color: SERIES_COLOR,
                values: decomposition.residual.iter().map(|(_, v)| *v).collect(),
            }],
            guides: residual_guides,
            markers: Vec::new(),
        },
    ];

    let total_height = TITLE_BAND as i32 + HEIGHT * panels.len() as i32;
    let mut svg = svg_header(WIDTH, total_height);
    svg.push_str(&format!(
        r##"<text x="{x:.2}" y="16" font-size="13" fill="#333">{title}</text>"##,
        x = PADDING,
        title = escape_text(title)
    ));
    for (i, panel) in panels.iter().enumerate() {
        render_panel(&mut svg, &dates, panel, TITLE_BAND + (i as i32 * HEIGHT) as f64);
    }
    svg.push_str(svg_footer());
    Ok(svg)
}

/// Ordered sample against theoretical normal quantiles with the fitted line.
pub fn qq_chart(title: &str, qq: &QqPlot) -> Result<String, PresentationError> {
    let (Some(&x_lo), Some(&x_hi)) = (qq.theoretical.first(), qq.theoretical.last()) else {
        return Err(PresentationError::NothingToPlot("Q-Q plot".to_string()));
    };
    let fit = |x: f64| qq.intercept + qq.slope * x;

    let (x_min, x_max) = extent(qq.theoretical.iter().copied())
        .ok_or_else(|| PresentationError::NothingToPlot("Q-Q plot".to_string()))?;
    let (y_min, y_max) = extent(qq.ordered.iter().copied().chain([fit(x_lo), fit(x_hi)]))
        .ok_or_else(|| PresentationError::NothingToPlot("Q-Q plot".to_string()))?;

    let width = WIDTH as f64;
    let height = HEIGHT as f64;
    let mut svg = svg_header(WIDTH, HEIGHT);
    draw_title(&mut svg, title);
    draw_value_axis(&mut svg, y_min, y_max, height);

    for (x, y) in qq.theoretical.iter().zip(&qq.ordered) {
        svg.push_str(&format!(
            r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="2" fill="{color}" />"#,
            cx = scale_x(*x, x_min, x_max, width),
            cy = scale_value(*y, y_min, y_max, height),
            color = SERIES_COLOR
        ));
    }
    svg.push_str(&polyline(
        &[
            (scale_x(x_lo, x_min, x_max, width), scale_value(fit(x_lo), y_min, y_max, height)),
            (scale_x(x_hi, x_min, x_max, width), scale_value(fit(x_hi), y_min, y_max, height)),
        ],
        RED,
    ));

    let axis_y = height - PADDING + 5.0;
    svg.push_str(&format!(
        r##"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="#000" stroke-width="1" />"##,
        x1 = PADDING,
        x2 = width - PADDING,
        y = axis_y
    ));
    for x in [x_min, 0.0, x_max] {
        if x < x_min || x > x_max {
            continue;
        }
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{label:.2}</text>"#,
            x = scale_x(x, x_min, x_max, width),
            y = axis_y + 14.0,
            label = x
        ));
    }
    svg.push_str(&format!(
        r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">Theoretical quantiles</text>"#,
        x = width / 2.0,
        y = height - 4.0
    ));

    svg.push_str(svg_footer());
    Ok(svg)
}

fn render_panel(svg: &mut String, dates: &[NaiveDate], panel: &Panel, top: f64) {
    let width = WIDTH as f64;
    let height = HEIGHT as f64;
    let Some((min_v, max_v)) = panel.extent() else {
        return;
    };
    let xs = x_positions(dates.len(), width);

    svg.push_str(&format!(r#"<g transform="translate(0,{top:.2})">"#));
    draw_title(svg, panel.title);
    draw_value_axis(svg, min_v, max_v, height);

    for guide in &panel.guides {
        let y = scale_value(guide.value, min_v, max_v, height);
        svg.push_str(&format!(
            r#"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="{color}" stroke-width="1" stroke-dasharray="{dash}" />"#,
            x1 = PADDING,
            x2 = width - PADDING,
            color = guide.color,
            dash = if guide.dash { "4 3" } else { "0" }
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="end" fill="{color}" font-size="9">{label}</text>"#,
            x = width - PADDING,
            y = y - 4.0,
            color = guide.color,
            label = guide.label
        ));
    }

    for line in &panel.lines {
        for segment in segments(&line.values, &xs, min_v, max_v, height) {
            svg.push_str(&polyline(&segment, line.color));
        }
    }

    for (idx, value) in &panel.markers {
        if let Some(x) = xs.get(*idx) {
            svg.push_str(&format!(
                r#"<circle cx="{x:.2}" cy="{cy:.2}" r="3" fill="{color}" />"#,
                cy = scale_value(*value, min_v, max_v, height),
                color = RED
            ));
        }
    }

    add_time_axis(svg, dates, &xs, width, height);
    if panel.lines.len() > 1 {
        draw_line_legend(svg, &panel.lines);
    }
    svg.push_str("</g>");
}

/// Splits a line at undefined values so gaps are not bridged.
fn segments(
    values: &[Option<f64>],
    xs: &[f64],
    min_v: f64,
    max_v: f64,
    height: f64,
) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (value, x) in values.iter().zip(xs) {
        match value.filter(|v| v.is_finite()) {
            Some(v) => current.push((*x, scale_value(v, min_v, max_v, height))),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn trading_dates<'a>(timestamps: impl Iterator<Item = &'a DateTime<Utc>>) -> Vec<NaiveDate> {
    timestamps.map(|ts| ts.date_naive()).collect()
}

fn extent(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for value in values.into_iter().filter(|v| v.is_finite()) {
        min_v = min_v.min(value);
        max_v = max_v.max(value);
    }

    if !min_v.is_finite() || !max_v.is_finite() {
        return None;
    }

    if min_v == max_v {
        let adjust = if min_v == 0.0 { 1.0 } else { min_v.abs() * 0.1 };
        min_v -= adjust;
        max_v += adjust;
    }

    Some((min_v, max_v))
}

fn scale_value(value: f64, min_v: f64, max_v: f64, height: f64) -> f64 {
    if (max_v - min_v).abs() < f64::EPSILON {
        return height / 2.0;
    }

    let inner_height = height - 2.0 * PADDING;
    let norm = (value - min_v) / (max_v - min_v);
    PADDING + (1.0 - norm) * inner_height
}

fn scale_x(value: f64, min_v: f64, max_v: f64, width: f64) -> f64 {
    if (max_v - min_v).abs() < f64::EPSILON {
        return width / 2.0;
    }

    let inner_width = width - 2.0 * PADDING;
    PADDING + (value - min_v) / (max_v - min_v) * inner_width
}

fn x_positions(len: usize, width: f64) -> Vec<f64> {
    if len == 0 {
        return Vec::new();
    }

    if len == 1 {
        return vec![width / 2.0];
    }

    let inner_width = width - 2.0 * PADDING;
    (0..len)
        .map(|i| PADDING + inner_width * (i as f64 / (len - 1) as f64))
        .collect()
}

fn polyline(points: &[(f64, f64)], stroke: &str) -> String {
    if points.is_empty() {
        return String::new();
    }

    let coords: String = points
        .iter()
        .map(|(x, y)| format!("{:.2},{:.2}", x, y))
        .collect::<Vec<_>>()
        .join(" ");

    format!(r#"<polyline fill="none" stroke="{stroke}" stroke-width="1.5" points="{coords}" />"#)
}

fn svg_header(width: i32, height: i32) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}"><style>text{{font-family:Arial,sans-serif;font-size:10px;fill:#666}}</style>"#,
        w = width,
        h = height
    )
}

fn svg_footer() -> &'static str {
    "</svg>"
}

fn draw_title(svg: &mut String, title: &str) {
    svg.push_str(&format!(
        r##"<text x="{x:.2}" y="{y:.2}" font-size="12" fill="#333">{title}</text>"##,
        x = PADDING,
        y = PADDING - 14.0,
        title = escape_text(title)
    ));
}

/// Min, middle and max labels down the left edge.
fn draw_value_axis(svg: &mut String, min_v: f64, max_v: f64, height: f64) {
    let span = max_v - min_v;
    let decimals: usize = if span >= 10.0 {
        0
    } else if span >= 1.0 {
        2
    } else {
        4
    };
    for value in [min_v, min_v + span / 2.0, max_v] {
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="end">{label:.precision$}</text>"#,
            precision = decimals,
            x = PADDING - 4.0,
            y = scale_value(value, min_v, max_v, height) + 3.0,
            label = value
        ));
    }
}

fn draw_line_legend(svg: &mut String, lines: &[Line]) {
    let mut y = PADDING + 14.0;
    let x = PADDING + 10.0;
    for line in lines {
        svg.push_str(&format!(
            r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y1:.2}" stroke="{color}" stroke-width="1.5" />"#,
            x1 = x,
            x2 = x + 20.0,
            y1 = y - 4.0,
            color = line.color
        ));
        svg.push_str(&format!(
            r##"<text x="{x:.2}" y="{y:.2}" text-anchor="start" fill="#333">{label}</text>"##,
            x = x + 26.0,
            label = line.label
        ));
        y += 16.0;
    }
}

/// Month ticks for short series, year ticks once the span passes two years.
fn add_time_axis(svg: &mut String, dates: &[NaiveDate], xs: &[f64], width: f64, height: f64) {
    let (Some(first), Some(last)) = (dates.first(), dates.last()) else {
        return;
    };
    let axis_y = height - PADDING + 5.0;

    svg.push_str(&format!(
        r##"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="#000" stroke-width="1" />"##,
        x1 = PADDING,
        x2 = width - PADDING,
        y = axis_y
    ));

    let months = (last.year() - first.year()) * 12 + last.month() as i32 - first.month() as i32;
    let yearly = months > 24;

    let mut last_key: Option<(i32, u32)> = None;
    for (date, x) in dates.iter().zip(xs) {
        let key = if yearly {
            (date.year(), 1)
        } else {
            (date.year(), date.month())
        };
        if last_key == Some(key) {
            continue;
        }
        last_key = Some(key);

        let label = if yearly {
            date.format("%Y").to_string()
        } else {
            date.format("%Y-%m").to_string()
        };
        svg.push_str(&format!(
            r##"<line x1="{x:.2}" y1="{y1:.2}" x2="{x:.2}" y2="{y2:.2}" stroke="#dddddd" stroke-width="0.5" />"##,
            y1 = PADDING,
            y2 = height - PADDING
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle" fill="{color}">{label}</text>"#,
            y = axis_y + 16.0,
            color = ACCENT_COLOR
        ));
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use core_types::{RatioKind, TimeSeries};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn ratio(values: &[Option<f64>]) -> RatioSeries {
        RatioSeries::new(
            RatioKind::Sharpe,
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (day(i as i64), *v))
                .collect(),
        )
    }

    #[test]
    fn ratio_chart_marks_every_outlier() {
        let mut values = vec![None, None, None];
        values.extend((1..=20).map(|i| Some(i as f64)));
        values.push(Some(100.0));
        let series = ratio(&values);
        let report = OutlierReport::build(&series).unwrap();

        let svg = ratio_chart("Rolling Sharpe Ratio for BBCA.JK", &series, &report).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<circle").count(), report.outliers.len());
        assert_eq!(report.outliers.len(), 1);
        assert_eq!(svg.matches(r#"stroke-dasharray="4 3""#).count(), 2);
        assert!(svg.contains("Mean"));
        assert!(svg.contains("2024-01"));
    }

    #[test]
    fn gaps_split_the_line() {
        let series = ratio(&[None, Some(1.0), Some(2.0), None, Some(3.0), Some(4.0)]);
        let report = OutlierReport::build(&series).unwrap();
        let svg = ratio_chart("gaps", &series, &report).unwrap();
        assert_eq!(svg.matches("<polyline").count(), 2);
    }

    #[test]
    fn undefined_series_has_nothing_to_plot() {
        let series = ratio(&[None, None]);
        let report = OutlierReport::from_points(&[(day(0), Some(1.0))]).unwrap();
        assert!(matches!(
            ratio_chart("empty", &series, &report),
            Err(PresentationError::NothingToPlot(_))
        ));
    }

    #[test]
    fn values_scale_into_the_padded_area() {
        let height = HEIGHT as f64;
        assert_eq!(scale_value(0.0, 0.0, 1.0, height), height - PADDING);
        assert_eq!(scale_value(1.0, 0.0, 1.0, height), PADDING);
        assert_eq!(scale_value(5.0, 5.0, 5.0, height), height / 2.0);

        let xs = x_positions(3, WIDTH as f64);
        assert_eq!(xs, vec![PADDING, WIDTH as f64 / 2.0, WIDTH as f64 - PADDING]);
        assert_eq!(x_positions(1, 100.0), vec![50.0]);
    }

    #[test]
    fn flat_extent_is_widened() {
        assert_eq!(extent([2.0, 2.0]), Some((1.8, 2.2)));
        assert_eq!(extent([0.0]), Some((-1.0, 1.0)));
        assert_eq!(extent([f64::NAN]), None);
    }

    #[test]
    fn titles_are_escaped() {
        assert_eq!(escape_text("S&P <500>"), "S&amp;P &lt;500&gt;");
    }

    #[test]
    fn decomposition_has_four_panels() {
        let season = [0.9, 1.1, 1.0, 1.0];
        let points = (0..40)
            .map(|i| (day(i), 100.0 * season[i as usize % 4] + i as f64))
            .collect();
        let d = SeasonalDecomposition::multiplicative(&TimeSeries::new(points).unwrap(), 4)
            .unwrap();

        let svg = decomposition_chart("Seasonal Decomposition of BBCA.JK", &d).unwrap();
        for title in ["Original Data", "Trend", "Seasonal", "Residual"] {
            assert!(svg.contains(&format!(">{title}</text>")), "missing {title}");
        }
        assert_eq!(svg.matches("<g transform").count(), 4);
        assert!(svg.contains("Upper Bound"));
    }

    #[test]
    fn qq_chart_draws_each_observation() {
        let qq = QqPlot::normal(&[0.3, -0.1, 0.4, 0.15, -0.2, 0.05, -0.35]).unwrap();
        let svg = qq_chart("Normal Q-Q", &qq).unwrap();
        assert_eq!(svg.matches("<circle").count(), 7);
        assert_eq!(svg.matches("<polyline").count(), 1);
        assert!(svg.contains("Theoretical quantiles"));
    }
}
