//! Token bucket throttling for market data providers.
//!
//! Providers publish a requests-per-minute allowance. `RateLimiter` enforces
//! it ahead of time, and `RateLimitedSource` wraps any source so every
//! provider call spends a token first.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use super::provider::{MarketDataSource, SourceError};
use crate::price::{Interval, PriceBar};
use crate::snapshot::FinancialSnapshot;

/// Tokens are stored in thousandths.
const TOKEN_SCALE: u64 = 1000;

// ============================================================================
// Rate Limiter
// ============================================================================

/// A token bucket refilled continuously at `requests_per_minute / 60_000`
/// tokens per millisecond, holding at most one second's worth of requests.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: u32,
    tokens: AtomicU64,
    refill_per_ms: f64,
    last_refill: Mutex<Instant>,
    name: String,
}

impl RateLimiter {
    /// Create a limiter for a provider allowance.
    ///
    /// # Arguments
    /// * `name` - Provider name for logging
    /// * `requests_per_minute` - Allowance; zero is treated as one
    pub fn new(name: impl Into<String>, requests_per_minute: u32) -> Self {
        let rpm = requests_per_minute.max(1);
        let capacity = (rpm as f64 / 60.0).ceil() as u32;

        Self {
            capacity: capacity.max(1),
            tokens: AtomicU64::new(capacity.max(1) as u64 * TOKEN_SCALE),
            refill_per_ms: rpm as f64 / 60_000.0,
            last_refill: Mutex::new(Instant::now()),
            name: name.into(),
        }
    }

    /// Wait until a token is available and take it.
    pub async fn acquire(&self) {
        loop {
            if self.try_acquire() {
                return;
            }

            let wait_ms = (1.0 / self.refill_per_ms).ceil() as u64;
            let wait = Duration::from_millis(wait_ms.clamp(10, 1000));

            debug!(
                limiter = %self.name,
                wait_ms = wait.as_millis() as u64,
                "Rate limited, waiting for token"
            );

            tokio::time::sleep(wait).await;
        }
    }

    /// Take a token if one is available.
    pub fn try_acquire(&self) -> bool {
        self.refill();

        loop {
            let current = self.tokens.load(Ordering::Relaxed);
            if current < TOKEN_SCALE {
                return false;
            }

            if self
                .tokens
                .compare_exchange_weak(
                    current,
                    current - TOKEN_SCALE,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                )
                .is_ok()
            {
                return true;
            }
        }
    }

    fn refill(&self) {
        // Another caller is already refilling
        let Ok(mut last_refill) = self.last_refill.try_lock() else {
            return;
        };

        let now = Instant::now();
        let elapsed_ms = now.duration_since(*last_refill).as_millis() as f64;
        let earned = (elapsed_ms * self.refill_per_ms * TOKEN_SCALE as f64) as u64;
        if earned == 0 {
            return;
        }

        let max = self.capacity as u64 * TOKEN_SCALE;
        let _ = self
            .tokens
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some((current + earned).min(max))
            });
        *last_refill = now;
    }

    /// Tokens currently available.
    pub fn available_tokens(&self) -> f64 {
        self.refill();
        self.tokens.load(Ordering::Relaxed) as f64 / TOKEN_SCALE as f64
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}

/// Rate limiter shared between sources hitting the same provider.
pub type SharedRateLimiter = Arc<RateLimiter>;

// ============================================================================
// Rate Limited Source
// ============================================================================

/// A source that spends one token per provider call.
pub struct RateLimitedSource<S> {
    inner: S,
    limiter: SharedRateLimiter,
}

impl<S: MarketDataSource> RateLimitedSource<S> {
    /// Wrap a source with its own limiter.
    pub fn new(inner: S, requests_per_minute: u32) -> Self {
        let limiter = Arc::new(RateLimiter::new(inner.name(), requests_per_minute));
        Self { inner, limiter }
    }

    /// Wrap a source with a limiter shared with other sources.
    pub fn with_limiter(inner: S, limiter: SharedRateLimiter) -> Self {
        Self { inner, limiter }
    }

    pub fn limiter(&self) -> &SharedRateLimiter {
        &self.limiter
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: MarketDataSource> MarketDataSource for RateLimitedSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch_snapshot(&self, ticker: &str) -> Result<FinancialSnapshot, SourceError> {
        self.limiter.acquire().await;
        self.inner.fetch_snapshot(ticker).await
    }

    async fn fetch_price_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Vec<PriceBar>, SourceError> {
        self.limiter.acquire().await;
        self.inner
            .fetch_price_history(ticker, start, end, interval)
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
