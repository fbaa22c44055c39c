//! Findash Library
//!
//! Fundamental ratio analysis for a single-page financial dashboard. A
//! [`FinancialSnapshot`](snapshot::FinancialSnapshot) of raw statement lines
//! goes in; a [`RatioResult`](ratios::RatioResult) of descriptive metrics
//! comes out.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ MarketData    │──▶│ ResultCache   │──▶│ RatioEngine   │──▶ RatioResult
//! │ Source (+RL)  │   │ (TTL, per-    │   │ (pure)        │
//! │               │   │  ticker lock) │   │               │
//! └───────────────┘   └───────────────┘   └───────────────┘
//! ```
//!
//! # Key Concepts
//!
//! - **Unavailable, not zero**: a metric whose inputs are missing, or whose
//!   denominator is zero, is `None`. Missing inputs are resolved explicitly
//!   through [`MissingPolicy`](snapshot::MissingPolicy).
//! - **Descriptive only**: classifications such as "high quality" growth or
//!   "concerning" liquidity describe the figures; they are not advice.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod data;
pub mod price;
pub mod ratios;
pub mod snapshot;

pub use data::{AnalysisService, FileSource, MarketDataSource, ResultCache, SourceError};
pub use ratios::{RatioEngine, RatioResult};
pub use snapshot::FinancialSnapshot;
