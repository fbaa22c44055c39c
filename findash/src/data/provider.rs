//! Market data source abstraction.
//!
//! Defines the `MarketDataSource` trait that every snapshot provider
//! implements. The ratio engine never talks to a source directly; it only
//! sees the snapshot (or the error) a source produced.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::price::{Interval, PriceBar};
use crate::snapshot::FinancialSnapshot;

// ============================================================================
// Source Error
// ============================================================================

/// Errors a market data source can report.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SourceError {
    /// The provider has no data for this ticker
    #[error("Data not available: {0}")]
    NotFound(String),

    /// The provider throttled the request
    #[error("Rate limited by {0}")]
    RateLimited(String),

    /// The provider answered with something that is not a snapshot
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The provider could not be reached
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

impl SourceError {
    /// Check if the error is worth retrying later.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Unavailable(_))
    }
}

// ============================================================================
// Market Data Source Trait
// ============================================================================

/// A supplier of per-ticker financial snapshots and price history.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Source name for logging (e.g., "file", "static")
    fn name(&self) -> &str;

    /// Fetch the latest financial snapshot for a ticker.
    async fn fetch_snapshot(&self, ticker: &str) -> Result<FinancialSnapshot, SourceError>;

    /// Fetch oldest-first price bars for a ticker.
    ///
    /// # Arguments
    /// * `ticker` - Ticker symbol (e.g., "AAPL")
    /// * `start` - First date to include
    /// * `end` - Last date to include
    /// * `interval` - Bar interval
    async fn fetch_price_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Vec<PriceBar>, SourceError>;
}
