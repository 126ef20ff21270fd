use crate::enums::RatioKind;
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closing prices exactly as the provider delivered them. `None` marks a gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    symbol: String,
    points: Vec<(DateTime<Utc>, Option<f64>)>,
}

impl PriceHistory {
    pub fn new(
        symbol: impl Into<String>,
        points: Vec<(DateTime<Utc>, Option<f64>)>,
    ) -> Result<Self, CoreError> {
        ensure_increasing(&points)?;
        Ok(Self {
            symbol: symbol.into(),
            points,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[(DateTime<Utc>, Option<f64>)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of gaps that `fill_gaps` will plug.
    pub fn gap_count(&self) -> usize {
        self.points.iter().filter(|(_, v)| v.is_none()).count()
    }

    /// Forward-fills then backward-fills the gaps, producing a dense price series.
    pub fn fill_gaps(&self) -> Result<TimeSeries, CoreError> {
        let values: Vec<Option<f64>> = self.points.iter().map(|(_, v)| *v).collect();
        let filled = fill_forward_backward(&values);

        let points = self
            .points
            .iter()
            .zip(filled)
            .map(|((ts, _), v)| v.map(|v| (*ts, v)).ok_or(CoreError::EmptySeries))
            .collect::<Result<Vec<_>, _>>()?;

        if points.is_empty() {
            return Err(CoreError::EmptySeries);
        }

        tracing::debug!(
            symbol = %self.symbol,
            gaps = self.gap_count(),
            "Filled gaps in price history."
        );
        Ok(TimeSeries { points })
    }
}

/// A dense, strictly time-ordered numeric series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    points: Vec<(DateTime<Utc>, f64)>,
}

impl TimeSeries {
    pub fn new(points: Vec<(DateTime<Utc>, f64)>) -> Result<Self, CoreError> {
        ensure_increasing(&points)?;
        Ok(Self { points })
    }

    pub fn points(&self) -> &[(DateTime<Utc>, f64)] {
        &self.points
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|(ts, _)| *ts).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Natural-log relative change between consecutive observations.
    ///
    /// The first observation has no predecessor and is dropped, so the result
    /// has `len() - 1` points.
    pub fn log_returns(&self) -> Result<ReturnSeries, CoreError> {
        ReturnSeries::from_prices(self)
    }
}

/// Log returns of a price series. Never contains undefined values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    series: TimeSeries,
}

impl ReturnSeries {
    /// Wraps already-computed returns, rejecting non-finite values.
    pub fn new(points: Vec<(DateTime<Utc>, f64)>) -> Result<Self, CoreError> {
        if let Some((ts, v)) = points.iter().find(|(_, v)| !v.is_finite()) {
            return Err(CoreError::InvalidInput(
                "returns".to_string(),
                format!("non-finite value {v} at {ts}"),
            ));
        }
        Ok(Self {
            series: TimeSeries::new(points)?,
        })
    }

    pub fn from_prices(prices: &TimeSeries) -> Result<Self, CoreError> {
        let points = prices
            .points
            .windows(2)
            .map(|w| (w[1].0, (w[1].1 / w[0].1).ln()))
            .collect();
        Self::new(points)
    }

    pub fn points(&self) -> &[(DateTime<Utc>, f64)] {
        self.series.points()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.series.timestamps()
    }

    pub fn values(&self) -> Vec<f64> {
        self.series.values()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Inner join on timestamp: `(timestamp, self value, other value)` for
    /// every timestamp present in both series.
    pub fn align(&self, other: &ReturnSeries) -> Vec<(DateTime<Utc>, f64, f64)> {
        let (left, right) = (self.points(), other.points());
        let mut joined = Vec::with_capacity(left.len().min(right.len()));
        let (mut i, mut j) = (0, 0);

        while i < left.len() && j < right.len() {
            match left[i].0.cmp(&right[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    joined.push((left[i].0, left[i].1, right[j].1));
                    i += 1;
                    j += 1;
                }
            }
        }

        joined
    }
}

/// A rolling ratio aligned to the index of the returns it was rolled over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioSeries {
    kind: RatioKind,
    points: Vec<(DateTime<Utc>, Option<f64>)>,
}

impl RatioSeries {
    pub fn new(kind: RatioKind, points: Vec<(DateTime<Utc>, Option<f64>)>) -> Self {
        Self { kind, points }
    }

    pub fn kind(&self) -> RatioKind {
        self.kind
    }

    pub fn points(&self) -> &[(DateTime<Utc>, Option<f64>)] {
        &self.points
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn defined_count(&self) -> usize {
        self.points.iter().filter(|(_, v)| v.is_some()).count()
    }

    /// Copy with undefined entries plugged by the nearest defined value,
    /// carried forward first and then backward.
    pub fn filled(&self) -> Self {
        let filled = fill_forward_backward(&self.values());
        let points = self
            .points
            .iter()
            .zip(filled)
            .map(|((ts, _), v)| (*ts, v))
            .collect();
        Self {
            kind: self.kind,
            points,
        }
    }
}

/// Carries the last defined value forward, then the first defined value
/// backward over any leading gap. An all-`None` input stays all-`None`.
pub fn fill_forward_backward(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    let mut last = None;
    for v in values {
        if v.is_some() {
            last = *v;
        }
        out.push(last);
    }

    if let Some(first) = values.iter().flatten().next() {
        for slot in out.iter_mut().take_while(|v| v.is_none()) {
            *slot = Some(*first);
        }
    }

    out
}

fn ensure_increasing<T>(points: &[(DateTime<Utc>, T)]) -> Result<(), CoreError> {
    for w in points.windows(2) {
        if w[1].0 <= w[0].0 {
            return Err(CoreError::NonIncreasingTimestamps {
                previous: w[0].0,
                current: w[1].0,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    #[test]
    fn fill_carries_forward_then_backward() {
        let filled = fill_forward_backward(&[None, None, Some(2.0), None, Some(3.0), None]);
        assert_eq!(
            filled,
            vec![Some(2.0), Some(2.0), Some(2.0), Some(2.0), Some(3.0), Some(3.0)]
        );
    }

    #[test]
    fn fill_of_all_gaps_stays_empty() {
        assert_eq!(fill_forward_backward(&[None, None]), vec![None, None]);
    }

    #[test]
    fn price_history_rejects_duplicate_timestamps() {
        let err = PriceHistory::new("BBCA.JK", vec![(day(0), Some(1.0)), (day(0), Some(2.0))])
            .unwrap_err();
        assert!(matches!(err, CoreError::NonIncreasingTimestamps { .. }));
    }

    #[test]
    fn fill_gaps_then_log_returns() {
        let history = PriceHistory::new(
            "BBCA.JK",
            vec![
                (day(0), None),
                (day(1), Some(100.0)),
                (day(2), None),
                (day(3), Some(110.0)),
            ],
        )
        .unwrap();
        assert_eq!(history.gap_count(), 2);

        let prices = history.fill_gaps().unwrap();
        assert_eq!(prices.values(), vec![100.0, 100.0, 100.0, 110.0]);

        let returns = prices.log_returns().unwrap();
        assert_eq!(returns.len(), 3);
        assert_eq!(returns.timestamps()[0], day(1));
        assert_relative_eq!(returns.values()[0], 0.0);
        assert_relative_eq!(returns.values()[2], (1.1_f64).ln(), epsilon = 1e-12);
    }

    #[test]
    fn fill_gaps_of_empty_history_fails() {
        let history = PriceHistory::new("NOPE", vec![(day(0), None)]).unwrap();
        assert_eq!(history.fill_gaps().unwrap_err(), CoreError::EmptySeries);

        let empty = PriceHistory::new("NOPE", vec![]).unwrap();
        assert_eq!(empty.fill_gaps().unwrap_err(), CoreError::EmptySeries);
    }

    #[test]
    fn non_positive_prices_are_rejected() {
        let prices = TimeSeries::new(vec![(day(0), 1.0), (day(1), 0.0)]).unwrap();
        assert!(matches!(
            prices.log_returns().unwrap_err(),
            CoreError::InvalidInput(..)
        ));
    }

    #[test]
    fn align_is_an_inner_join() {
        let a = ReturnSeries::new(vec![(day(0), 1.0), (day(1), 2.0), (day(3), 4.0)]).unwrap();
        let b = ReturnSeries::new(vec![(day(1), 20.0), (day(2), 30.0), (day(3), 40.0)]).unwrap();

        let joined = a.align(&b);
        assert_eq!(joined, vec![(day(1), 2.0, 20.0), (day(3), 4.0, 40.0)]);
    }

    #[test]
    fn ratio_series_filled_keeps_kind_and_index() {
        let series = RatioSeries::new(
            RatioKind::Sortino,
            vec![(day(0), None), (day(1), Some(0.5)), (day(2), None)],
        );
        let filled = series.filled();
        assert_eq!(filled.kind(), RatioKind::Sortino);
        assert_eq!(filled.defined_count(), 3);
        assert_eq!(filled.values(), vec![Some(0.5), Some(0.5), Some(0.5)]);
        assert_eq!(series.defined_count(), 1);
    }
}
