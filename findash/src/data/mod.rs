//! Market data plumbing.
//!
//! Everything that gets a [`FinancialSnapshot`](crate::snapshot::FinancialSnapshot)
//! to the ratio engine:
//!
//! - **provider**: the `MarketDataSource` trait and its errors
//! - **memory** / **file**: concrete sources
//! - **rate_limiter**: token bucket throttling wrapped around any source
//! - **cache**: per-ticker TTL cache with single-flight refresh
//! - **service**: the single-ticker analysis pipeline

pub mod cache;
pub mod file;
pub mod memory;
pub mod provider;
pub mod rate_limiter;
pub mod service;

pub use cache::{CacheStats, ResultCache};
pub use file::FileSource;
pub use memory::StaticSource;
pub use provider::{MarketDataSource, SourceError};
pub use rate_limiter::{RateLimitedSource, RateLimiter, SharedRateLimiter};
pub use service::AnalysisService;
