//! Findash - print fundamental ratios for one or more tickers as JSON.
//!
//! ```text
//! findash AAPL MSFT
//! ```

use anyhow::{bail, Context, Result};
use std::sync::Arc;

use findash::data::{AnalysisService, FileSource, RateLimitedSource};
use findash_common::config::Config;
use findash_common::logging::init_from_config;

#[tokio::main]
async fn main() -> Result<()> {
    let started = std::time::Instant::now();

    let tickers: Vec<String> = std::env::args().skip(1).collect();
    if tickers.is_empty() {
        bail!("usage: findash <TICKER>...");
    }

    let config = Config::load_with_env().context("Failed to load configuration")?;
    init_from_config(&config.observability);

    tracing::info!("Findash v{}", env!("CARGO_PKG_VERSION"));

    let source = RateLimitedSource::new(
        FileSource::new(&config.provider.data_dir),
        config.provider.requests_per_minute,
    );
    let service = AnalysisService::from_config(&config, Arc::new(source));

    let mut results = Vec::with_capacity(tickers.len());
    for ticker in &tickers {
        results.push(service.analyze(ticker).await);
    }

    let json = serde_json::to_string_pretty(&results).context("Failed to serialize results")?;
    println!("{}", json);

    let elapsed = started.elapsed();
    tracing::info!(
        tickers = tickers.len(),
        duration_ms = elapsed.as_millis() as u64,
        "Done in {:?}",
        elapsed
    );

    Ok(())
}
