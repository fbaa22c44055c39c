//! Fundamental Ratio Module.
//!
//! Derives descriptive metrics from a [`FinancialSnapshot`](crate::snapshot::FinancialSnapshot):
//!
//! 1. **Cost of capital**: CAPM cost of equity, WACC
//! 2. **Value creation**: ROIC (two conventions), NOPAT, EVA
//! 3. **Growth**: revenue / EPS / FCF CAGR and growth quality
//! 4. **Solvency**: leverage and coverage ratios with advisory flags
//! 5. **Liquidity**: current / quick / cash / cash-flow ratios
//!
//! # Usage
//!
//! ```ignore
//! use findash::ratios::RatioEngine;
//!
//! let engine = RatioEngine::new();
//! let result = engine.compute(&snapshot);
//!
//! println!("WACC: {:?}", result.cost_of_capital.wacc);
//! println!("Liquidity: {}", result.liquidity.classification);
//! ```

pub mod engine;
pub mod growth;
pub mod types;

pub use engine::{classify_liquidity, compute_eva, RatioEngine, SnapshotOutcome};
pub use growth::{
    compute_cagr, compute_growth_quality, first_available, growth_with_fallback, series_growth,
    SeriesOrder,
};
pub use types::{
    GrowthAssessment, GrowthQuality, GrowthTrend, LiquidityClass, LiquidityReport, RatioResult,
    ResultError, ReturnMetrics, SolvencyFlag, SolvencyReport, SolvencyStatus, TaxRateSource,
    ValuationMetrics, WaccResult,
};
