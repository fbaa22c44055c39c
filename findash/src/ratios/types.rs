//! Ratio engine output types.
//!
//! Every metric is `Option<f64>`: `None` is the explicit "unavailable" marker
//! and is rendered as "N/D" by the presentation layer. Percentages are decimal
//! fractions (0.0823 = 8.23%).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::snapshot::SnapshotError;

// ============================================================================
// Cost of Capital
// ============================================================================

/// Where the applied tax rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxRateSource {
    /// Configured statutory rate
    Fixed,
    /// income_tax_expense / pre_tax_income
    Effective,
    /// Effective rate requested but not derivable; statutory rate used
    FixedFallback,
}

/// WACC and its components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaccResult {
    pub wacc: Option<f64>,
    /// Long-term + short-term debt
    pub total_debt: Option<f64>,
    /// Equity market value used as E
    pub market_cap: Option<f64>,
    /// CAPM cost of equity (Re)
    pub cost_of_equity: Option<f64>,
    /// Pre-tax cost of debt (Rd)
    pub cost_of_debt: Option<f64>,
    /// Tax rate applied to the debt shield
    pub tax_rate: Option<f64>,
    pub tax_source: Option<TaxRateSource>,
}

/// Value-creation metrics.
///
/// Two ROIC conventions are kept apart:
/// - `roic`: EBIT / (total debt + total equity)
/// - `roic_nopat`: EBIT × (1 − t) / (equity + debt − cash)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnMetrics {
    pub roic: Option<f64>,
    pub roic_nopat: Option<f64>,
    pub nopat: Option<f64>,
    /// roic − wacc
    pub eva: Option<f64>,
    /// roic_nopat − wacc
    pub eva_nopat: Option<f64>,
}

impl ReturnMetrics {
    /// Whether the company earns more than its cost of capital.
    ///
    /// `None` when EVA is unavailable.
    pub fn creates_value(&self) -> Option<bool> {
        self.eva.map(|eva| eva > 0.0)
    }
}

// ============================================================================
// Valuation
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationMetrics {
    pub market_cap: Option<f64>,
    /// price / EPS
    pub pe_ratio: Option<f64>,
    /// market cap / book equity
    pub pb_ratio: Option<f64>,
}

// ============================================================================
// Growth
// ============================================================================

/// Direction of growth across revenue, EPS and FCF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthTrend {
    ConsistentPositive,
    Inconsistent,
    InsufficientData,
}

impl std::fmt::Display for GrowthTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConsistentPositive => write!(f, "consistent positive growth"),
            Self::Inconsistent => write!(f, "inconsistent growth"),
            Self::InsufficientData => write!(f, "insufficient data"),
        }
    }
}

/// How growth converts down the income statement into cash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthQuality {
    /// fcf_growth > eps_growth > revenue_growth
    HighQuality,
    /// eps_growth > revenue_growth
    Efficient,
    Weak,
    InsufficientData,
}

impl std::fmt::Display for GrowthQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HighQuality => write!(f, "high quality"),
            Self::Efficient => write!(f, "efficient"),
            Self::Weak => write!(f, "weak"),
            Self::InsufficientData => write!(f, "insufficient data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthAssessment {
    pub revenue_growth: Option<f64>,
    pub eps_growth: Option<f64>,
    pub fcf_growth: Option<f64>,
    pub trend: GrowthTrend,
    pub quality: GrowthQuality,
}

impl Default for GrowthAssessment {
    fn default() -> Self {
        Self {
            revenue_growth: None,
            eps_growth: None,
            fcf_growth: None,
            trend: GrowthTrend::InsufficientData,
            quality: GrowthQuality::InsufficientData,
        }
    }
}

// ============================================================================
// Solvency
// ============================================================================

/// A breached solvency threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolvencyFlag {
    /// debt_to_equity ≥ 1.0
    HighLeverage,
    /// debt_to_assets ≥ 0.5
    AssetHeavyDebt,
    /// interest_coverage < 3.0
    WeakInterestCoverage,
    /// cash_flow_to_debt < 0.2
    LowCashFlowCoverage,
    /// net_debt_to_ebitda > 3.0
    SlowDeleveraging,
}

impl SolvencyFlag {
    /// Advisory text shown next to the ratio.
    pub fn advisory(&self) -> &'static str {
        match self {
            Self::HighLeverage => {
                "Debt-to-equity of 1.0 or more: the company is financed more by debt than by equity"
            }
            Self::AssetHeavyDebt => {
                "Debt-to-assets of 0.5 or more: at least half of the assets are debt-financed"
            }
            Self::WeakInterestCoverage => {
                "Interest coverage below 3.0: operating profit leaves a thin margin over interest"
            }
            Self::LowCashFlowCoverage => {
                "Cash-flow-to-debt below 0.2: operating cash flow covers little of the debt load"
            }
            Self::SlowDeleveraging => {
                "Net debt above 3x operating earnings: repaying debt would take more than three years"
            }
        }
    }
}

impl std::fmt::Display for SolvencyFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.advisory())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolvencyStatus {
    Sustainable,
    Unsustainable,
    /// No solvency ratio could be computed
    InsufficientData,
}

impl std::fmt::Display for SolvencyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sustainable => write!(f, "sustainable"),
            Self::Unsustainable => write!(f, "unsustainable"),
            Self::InsufficientData => write!(f, "insufficient data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolvencyReport {
    pub debt_to_equity: Option<f64>,
    pub debt_to_assets: Option<f64>,
    pub interest_coverage: Option<f64>,
    pub cash_flow_to_debt: Option<f64>,
    pub net_debt_to_ebitda: Option<f64>,
    pub status: SolvencyStatus,
    /// Every breached threshold, in ratio order
    pub flags: Vec<SolvencyFlag>,
}

impl SolvencyReport {
    pub fn is_unsustainable(&self) -> bool {
        self.status == SolvencyStatus::Unsustainable
    }

    /// Advisory messages for the triggered flags.
    pub fn reasons(&self) -> Vec<&'static str> {
        self.flags.iter().map(SolvencyFlag::advisory).collect()
    }
}

impl Default for SolvencyReport {
    fn default() -> Self {
        Self {
            debt_to_equity: None,
            debt_to_assets: None,
            interest_coverage: None,
            cash_flow_to_debt: None,
            net_debt_to_ebitda: None,
            status: SolvencyStatus::InsufficientData,
            flags: Vec::new(),
        }
    }
}

// ============================================================================
// Liquidity
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityClass {
    Excellent,
    Acceptable,
    Concerning,
    InsufficientData,
}

impl std::fmt::Display for LiquidityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excellent => write!(f, "excellent"),
            Self::Acceptable => write!(f, "acceptable"),
            Self::Concerning => write!(f, "concerning"),
            Self::InsufficientData => write!(f, "insufficient data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityReport {
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub cash_ratio: Option<f64>,
    /// operating_cash_flow / current_liabilities
    pub cash_flow_ratio: Option<f64>,
    pub classification: LiquidityClass,
}

impl Default for LiquidityReport {
    fn default() -> Self {
        Self {
            current_ratio: None,
            quick_ratio: None,
            cash_ratio: None,
            cash_flow_ratio: None,
            classification: LiquidityClass::InsufficientData,
        }
    }
}

// ============================================================================
// Result
// ============================================================================

/// Why a result carries no metrics.
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ResultError {
    /// The data source could not produce a snapshot
    #[error("no snapshot available: {0}")]
    SourceUnavailable(String),

    /// A snapshot arrived but has the wrong shape
    #[error("malformed snapshot: {0}")]
    Malformed(SnapshotError),
}

/// Every derived metric for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioResult {
    pub ticker: String,
    pub name: Option<String>,
    pub valuation: ValuationMetrics,
    pub cost_of_capital: WaccResult,
    pub returns: ReturnMetrics,
    pub growth: GrowthAssessment,
    pub solvency: SolvencyReport,
    pub liquidity: LiquidityReport,
    /// Set when no computation was attempted
    pub error: Option<ResultError>,
    pub computed_at: DateTime<Utc>,
}

impl RatioResult {
    /// A result with every metric unavailable and the error recorded.
    pub fn failed(ticker: impl Into<String>, error: ResultError) -> Self {
        Self {
            ticker: ticker.into(),
            name: None,
            valuation: ValuationMetrics::default(),
            cost_of_capital: WaccResult::default(),
            returns: ReturnMetrics::default(),
            growth: GrowthAssessment::default(),
            solvency: SolvencyReport::default(),
            liquidity: LiquidityReport::default(),
            error: Some(error),
            computed_at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(LiquidityClass::InsufficientData.to_string(), "insufficient data");
        assert_eq!(SolvencyStatus::Unsustainable.to_string(), "unsustainable");
        assert_eq!(GrowthTrend::ConsistentPositive.to_string(), "consistent positive growth");
        assert_eq!(GrowthQuality::HighQuality.to_string(), "high quality");
    }

    #[test]
    fn test_solvency_flags_have_distinct_advisories() {
        let flags = [
            SolvencyFlag::HighLeverage,
            SolvencyFlag::AssetHeavyDebt,
            SolvencyFlag::WeakInterestCoverage,
            SolvencyFlag::LowCashFlowCoverage,
            SolvencyFlag::SlowDeleveraging,
        ];
        let mut messages: Vec<&str> = flags.iter().map(|f| f.advisory()).collect();
        messages.sort_unstable();
        messages.dedup();
        assert_eq!(messages.len(), flags.len());
    }

    #[test]
    fn test_failed_result_has_no_metrics() {
        let result = RatioResult::failed("MSFT", ResultError::SourceUnavailable("timeout".into()));
        assert!(result.is_error());
        assert_eq!(result.cost_of_capital.wacc, None);
        assert_eq!(result.liquidity.classification, LiquidityClass::InsufficientData);
        assert_eq!(result.solvency.status, SolvencyStatus::InsufficientData);
        assert_eq!(result.returns.creates_value(), None);
    }

    #[test]
    fn test_result_error_serializes_tagged() {
        let json = serde_json::to_value(ResultError::SourceUnavailable("down".into())).unwrap();
        assert_eq!(json["kind"], "source_unavailable");
        assert_eq!(json["detail"], "down");
    }
}
