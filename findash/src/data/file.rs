//! Directory-backed market data source.
//!
//! Layout:
//!
//! ```text
//! <dir>/AAPL.json          FinancialSnapshot
//! <dir>/AAPL.prices.json   [PriceBar], daily, oldest first
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::provider::{MarketDataSource, SourceError};
use crate::price::{self, Interval, PriceBar};
use crate::snapshot::FinancialSnapshot;

/// Reads snapshots and price bars from JSON files in a directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn snapshot_path(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.json", ticker))
    }

    fn prices_path(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.prices.json", ticker))
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        ticker: &str,
        path: &Path,
    ) -> Result<T, SourceError> {
        // Tickers name files; never let one escape the directory
        if ticker.is_empty() || ticker.contains(['/', '\\']) || ticker.contains("..") {
            return Err(SourceError::NotFound(ticker.to_string()));
        }

        debug!(ticker = %ticker, path = %path.display(), "Reading market data file");

        let content = tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => SourceError::NotFound(ticker.to_string()),
            _ => SourceError::Unavailable(format!("{}: {}", path.display(), e)),
        })?;

        serde_json::from_str(&content)
            .map_err(|e| SourceError::Malformed(format!("{}: {}", path.display(), e)))
    }
}

#[async_trait]
impl MarketDataSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_snapshot(&self, ticker: &str) -> Result<FinancialSnapshot, SourceError> {
        let mut snapshot: FinancialSnapshot =
            self.read_json(ticker, &self.snapshot_path(ticker)).await?;

        // The file name is the ticker
        if snapshot.ticker != ticker {
            if !snapshot.ticker.is_empty() {
                warn!(
                    ticker = %ticker,
                    file_ticker = %snapshot.ticker,
                    "Snapshot ticker differs from file name, using file name"
                );
            }
            snapshot.ticker = ticker.to_string();
        }
        Ok(snapshot)
    }

    async fn fetch_price_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Vec<PriceBar>, SourceError> {
        let mut bars: Vec<PriceBar> = self.read_json(ticker, &self.prices_path(ticker)).await?;
        bars.sort_by_key(|b| b.date);
        Ok(price::resample(&price::within(&bars, start, end), interval))
    }
}
