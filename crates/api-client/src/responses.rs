use crate::error::ApiError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

// Using `#[serde(rename_all = "camelCase")]` to automatically map from JSON camelCase to Rust snake_case.

/// Top-level body of `GET /v8/finance/chart/{symbol}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartEnvelope {
    pub chart: ChartBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartBody {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    // Absent entirely when the symbol exists but has no bars in range.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: String,
    pub currency: Option<String>,
    pub exchange_name: Option<String>,
    /// Exchange offset from UTC, in seconds.
    #[serde(default)]
    pub gmtoffset: i64,
    // There are more fields, but these are the ones we use.
}

#[derive(Debug, Clone, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
    #[serde(default)]
    pub adjclose: Vec<AdjClose>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdjClose {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

/// Represents an error object from the chart API.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

impl ChartResult {
    /// Converts the parallel timestamp/close arrays into date-stamped closes.
    ///
    /// Each epoch is shifted into exchange-local time and truncated to midnight,
    /// so bars from exchanges in different time zones share an index. When two
    /// bars land on the same date the later defined value wins.
    pub fn into_points(
        self,
        adjusted: bool,
    ) -> Result<Vec<(DateTime<Utc>, Option<f64>)>, ApiError> {
        let closes = match (adjusted, self.indicators.adjclose.into_iter().next()) {
            (true, Some(adj)) if !adj.adjclose.is_empty() => adj.adjclose,
            _ => self
                .indicators
                .quote
                .into_iter()
                .next()
                .map(|q| q.close)
                .unwrap_or_default(),
        };

        if closes.len() != self.timestamp.len() {
            return Err(ApiError::InvalidData(format!(
                "{} timestamps but {} closes for {}",
                self.timestamp.len(),
                closes.len(),
                self.meta.symbol
            )));
        }

        let mut by_date: BTreeMap<DateTime<Utc>, Option<f64>> = BTreeMap::new();
        let mut duplicates = 0usize;
        for (epoch, close) in self.timestamp.into_iter().zip(closes) {
            let date = trading_date(epoch, self.meta.gmtoffset)?;
            by_date
                .entry(date)
                .and_modify(|existing| {
                    duplicates += 1;
                    if close.is_some() {
                        *existing = close;
                    }
                })
                .or_insert(close);
        }

        if duplicates > 0 {
            tracing::warn!(
                symbol = %self.meta.symbol,
                duplicates,
                "Collapsed bars sharing a trading date."
            );
        }

        Ok(by_date.into_iter().collect())
    }
}

fn trading_date(epoch: i64, gmtoffset: i64) -> Result<DateTime<Utc>, ApiError> {
    let local = DateTime::from_timestamp(epoch + gmtoffset, 0)
        .ok_or_else(|| ApiError::InvalidData(format!("Invalid timestamp: {epoch}")))?;
    local
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ApiError::InvalidData(format!("Invalid timestamp: {epoch}")))
}
