use crate::error::ApiError;
use crate::responses::ChartEnvelope;
use async_trait::async_trait;
use configuration::ProviderSettings;
use core_types::PriceHistory;
use std::time::Duration;

pub mod error;
pub mod responses;

// --- Public API ---
pub use responses::{ChartError, ChartResult};

/// The abstract interface for a source of daily closing prices.
/// The binary only talks to this trait, so tests can swap in a canned provider.
#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    /// Fetches the full closing-price history for `symbol`.
    ///
    /// Gaps are returned as `None`; the caller decides how to fill them.
    /// An unknown symbol may yield an empty history rather than an error.
    async fn fetch_close_prices(&self, symbol: &str) -> Result<PriceHistory, ApiError>;
}

/// A concrete implementation of `PriceHistoryProvider` for the Yahoo Finance chart API.
#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
    base_url: String,
    range: String,
    interval: String,
    adjusted: bool,
}

impl YahooClient {
    pub fn new(settings: &ProviderSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            range: settings.range.clone(),
            interval: settings.interval.clone(),
            adjusted: settings.adjusted,
        })
    }

    fn chart_url(&self, symbol: &str) -> String {
        // Index symbols such as ^JKSE carry a caret that must be escaped in the path.
        format!(
            "{}/v8/finance/chart/{}",
            self.base_url,
            symbol.replace('^', "%5E")
        )
    }
}

#[async_trait]
impl PriceHistoryProvider for YahooClient {
    async fn fetch_close_prices(&self, symbol: &str) -> Result<PriceHistory, ApiError> {
        let url = self.chart_url(symbol);
        tracing::debug!(%url, "Requesting price history.");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("range", self.range.as_str()),
                ("interval", self.interval.as_str()),
                ("includeAdjustedClose", "true"),
            ])
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        let envelope = match serde_json::from_str::<ChartEnvelope>(&text) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                return Err(ApiError::Deserialization(e.to_string()));
            }
            Err(_) => return Err(ApiError::Status(status.as_u16())),
        };

        if let Some(error) = envelope.chart.error {
            return Err(ApiError::Provider(format!(
                "{}: {}",
                error.code, error.description
            )));
        }
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
            tracing::warn!(symbol, "Provider returned no chart result.");
            return Ok(PriceHistory::new(symbol, Vec::new())?);
        };

        let points = result.into_points(self.adjusted)?;
        let history = PriceHistory::new(symbol, points)?;
        tracing::info!(
            symbol,
            bars = history.len(),
            gaps = history.gap_count(),
            "Downloaded price history."
        );
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_symbols_are_escaped() {
        let settings = ProviderSettings {
            base_url: "http://localhost:1234/".to_string(),
            ..Default::default()
        };
        let client = YahooClient::new(&settings).unwrap();
        assert_eq!(
            client.chart_url("^JKSE"),
            "http://localhost:1234/v8/finance/chart/%5EJKSE"
        );
        assert_eq!(
            client.chart_url("BBCA.JK"),
            "http://localhost:1234/v8/finance/chart/BBCA.JK"
        );
    }
}
