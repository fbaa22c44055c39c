//! Single-ticker analysis pipeline: source → cache → ratio engine.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

use findash_common::Config;

use super::cache::ResultCache;
use super::provider::{MarketDataSource, SourceError};
use crate::price::{self, Interval, PriceSummary};
use crate::ratios::{RatioEngine, RatioResult};

/// Analyses one ticker at a time against an injected source and cache.
#[derive(Clone)]
pub struct AnalysisService {
    source: Arc<dyn MarketDataSource>,
    cache: Arc<ResultCache>,
    engine: RatioEngine,
}

impl AnalysisService {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        cache: Arc<ResultCache>,
        engine: RatioEngine,
    ) -> Self {
        Self {
            source,
            cache,
            engine,
        }
    }

    /// Build a service whose cache and engine follow `config`.
    pub fn from_config(config: &Config, source: Arc<dyn MarketDataSource>) -> Self {
        Self::new(
            source,
            Arc::new(ResultCache::from_config(&config.cache)),
            RatioEngine::with_config(config.engine.clone()),
        )
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn engine(&self) -> &RatioEngine {
        &self.engine
    }

    /// Compute the ratios for a ticker.
    ///
    /// Never fails: a source error or malformed snapshot is reported in
    /// [`RatioResult::error`].
    pub async fn analyze(&self, ticker: &str) -> RatioResult {
        let ticker = normalize_ticker(ticker);
        let outcome = self.cache.get_or_fetch(&ticker, self.source.as_ref()).await;
        let result = self.engine.evaluate(&ticker, outcome);

        info!(
            ticker = %ticker,
            source = %self.source.name(),
            ok = !result.is_error(),
            "Analysis complete"
        );
        result
    }

    /// Key price statistics over `[start, end]` at the given interval.
    pub async fn price_summary(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<PriceSummary, SourceError> {
        let ticker = normalize_ticker(ticker);
        let bars = self
            .source
            .fetch_price_history(&ticker, start, end, interval)
            .await?;
        Ok(price::summarize(&bars))
    }
}

fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}
