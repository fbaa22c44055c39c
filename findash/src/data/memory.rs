//! In-memory market data source.
//!
//! Serves fixed snapshots and bars; used for fixtures and tests. Counts every
//! snapshot fetch so callers can observe how often the provider was hit.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::provider::{MarketDataSource, SourceError};
use crate::price::{self, Interval, PriceBar};
use crate::snapshot::FinancialSnapshot;

/// Source backed by in-memory maps.
#[derive(Debug, Default)]
pub struct StaticSource {
    snapshots: HashMap<String, FinancialSnapshot>,
    prices: HashMap<String, Vec<PriceBar>>,
    failures: HashMap<String, SourceError>,
    latency: Option<Duration>,
    fetches: AtomicUsize,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve this snapshot under its own ticker.
    pub fn with_snapshot(mut self, snapshot: FinancialSnapshot) -> Self {
        self.snapshots.insert(snapshot.ticker.clone(), snapshot);
        self
    }

    /// Serve daily bars for a ticker.
    pub fn with_prices(mut self, ticker: impl Into<String>, bars: Vec<PriceBar>) -> Self {
        self.prices.insert(ticker.into(), bars);
        self
    }

    /// Fail every request for a ticker with the given error.
    pub fn with_failure(mut self, ticker: impl Into<String>, error: SourceError) -> Self {
        self.failures.insert(ticker.into(), error);
        self
    }

    /// Delay every snapshot fetch.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of snapshot fetches served so far, failures included.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_snapshot(&self, ticker: &str) -> Result<FinancialSnapshot, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(err) = self.failures.get(ticker) {
            return Err(err.clone());
        }

        self.snapshots
            .get(ticker)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(ticker.to_string()))
    }

    async fn fetch_price_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Vec<PriceBar>, SourceError> {
        if let Some(err) = self.failures.get(ticker) {
            return Err(err.clone());
        }

        let mut bars = self
            .prices
            .get(ticker)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(ticker.to_string()))?;
        bars.sort_by_key(|b| b.date);

        Ok(price::resample(&price::within(&bars, start, end), interval))
    }
}
