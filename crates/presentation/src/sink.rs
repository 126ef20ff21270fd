use crate::chart;
use crate::error::PresentationError;
use crate::tables;
use analytics::OutlierReport;
use core_types::{RatioKind, RatioSeries};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Destination for a finished rolling-ratio computation.
pub trait RatioSink {
    fn present(
        &mut self,
        title: &str,
        series: &RatioSeries,
        report: &OutlierReport,
    ) -> Result<(), PresentationError>;
}

/// Writes the summary and outlier tables as text.
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RatioSink for ConsoleSink<W> {
    fn present(
        &mut self,
        title: &str,
        series: &RatioSeries,
        report: &OutlierReport,
    ) -> Result<(), PresentationError> {
        writeln!(self.out, "{title}")?;
        writeln!(self.out, "{}", tables::ratio_summary(series, report))?;
        if report.outliers.is_empty() {
            writeln!(self.out, "No outliers outside the IQR fences.")?;
        } else {
            writeln!(self.out, "\nOutliers")?;
            writeln!(self.out, "{}", tables::outliers(report))?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Renders the ratio chart to an SVG file.
pub struct SvgChartSink {
    path: PathBuf,
}

impl SvgChartSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RatioSink for SvgChartSink {
    fn present(
        &mut self,
        title: &str,
        series: &RatioSeries,
        report: &OutlierReport,
    ) -> Result<(), PresentationError> {
        let svg = chart::ratio_chart(title, series, report)?;
        std::fs::write(self.path(), svg)?;
        tracing::info!(path = %self.path().display(), "Wrote ratio chart.");
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    title: &'a str,
    kind: RatioKind,
    observations: usize,
    defined: usize,
    report: &'a OutlierReport,
}

/// Writes the outlier report as pretty-printed JSON.
pub struct JsonSink<W: Write> {
    out: W,
}

impl JsonSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RatioSink for JsonSink<W> {
    fn present(
        &mut self,
        title: &str,
        series: &RatioSeries,
        report: &OutlierReport,
    ) -> Result<(), PresentationError> {
        let document = JsonDocument {
            title,
            kind: series.kind(),
            observations: series.len(),
            defined: series.defined_count(),
            report,
        };
        serde_json::to_writer_pretty(&mut self.out, &document)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
