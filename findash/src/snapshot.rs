//! Financial snapshot model.
//!
//! A [`FinancialSnapshot`] is the immutable per-ticker input of the ratio
//! engine: identity, market data, selected statement line items, and up to
//! four years of history for growth calculations. Every number is optional so
//! that "not reported" stays distinct from a reported zero.
//!
//! Scalar fields are read through [`FinancialSnapshot::field`], which returns a
//! [`Field`] that has to be resolved with an explicit [`MissingPolicy`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of annual values kept per history series.
pub const MAX_HISTORY_YEARS: usize = 4;

// ============================================================================
// Field Access
// ============================================================================

/// Logical name of a scalar line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    Price,
    SharesOutstanding,
    Beta,
    MarketCap,
    Eps,
    LongTermDebt,
    ShortTermDebt,
    TotalEquity,
    TotalAssets,
    Cash,
    CurrentAssets,
    CurrentLiabilities,
    Inventory,
    Ebit,
    PreTaxIncome,
    IncomeTaxExpense,
    InterestExpense,
    OperatingCashFlow,
    FreeCashFlow,
    CurrentRatio,
    QuickRatio,
    CashRatio,
}

impl FieldKey {
    /// Every scalar key, in declaration order.
    pub const ALL: [FieldKey; 22] = [
        Self::Price,
        Self::SharesOutstanding,
        Self::Beta,
        Self::MarketCap,
        Self::Eps,
        Self::LongTermDebt,
        Self::ShortTermDebt,
        Self::TotalEquity,
        Self::TotalAssets,
        Self::Cash,
        Self::CurrentAssets,
        Self::CurrentLiabilities,
        Self::Inventory,
        Self::Ebit,
        Self::PreTaxIncome,
        Self::IncomeTaxExpense,
        Self::InterestExpense,
        Self::OperatingCashFlow,
        Self::FreeCashFlow,
        Self::CurrentRatio,
        Self::QuickRatio,
        Self::CashRatio,
    ];

    /// Logical field name as it appears in serialized snapshots.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::SharesOutstanding => "shares_outstanding",
            Self::Beta => "beta",
            Self::MarketCap => "market_cap",
            Self::Eps => "eps",
            Self::LongTermDebt => "long_term_debt",
            Self::ShortTermDebt => "short_term_debt",
            Self::TotalEquity => "total_equity",
            Self::TotalAssets => "total_assets",
            Self::Cash => "cash",
            Self::CurrentAssets => "current_assets",
            Self::CurrentLiabilities => "current_liabilities",
            Self::Inventory => "inventory",
            Self::Ebit => "ebit",
            Self::PreTaxIncome => "pre_tax_income",
            Self::IncomeTaxExpense => "income_tax_expense",
            Self::InterestExpense => "interest_expense",
            Self::OperatingCashFlow => "operating_cash_flow",
            Self::FreeCashFlow => "free_cash_flow",
            Self::CurrentRatio => "current_ratio",
            Self::QuickRatio => "quick_ratio",
            Self::CashRatio => "cash_ratio",
        }
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a call site wants when a field is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Treat an absent value as 0.0.
    Zero,
    /// Propagate absence as "unavailable".
    Unavailable,
}

/// A scalar read from a snapshot, not yet resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use = "a field has no value until it is resolved with a MissingPolicy"]
pub struct Field {
    key: FieldKey,
    value: Option<f64>,
}

impl Field {
    /// Resolve the field under the given policy.
    pub fn resolve(self, policy: MissingPolicy) -> Option<f64> {
        match (self.value, policy) {
            (Some(v), _) => Some(v),
            (None, MissingPolicy::Zero) => Some(0.0),
            (None, MissingPolicy::Unavailable) => None,
        }
    }

    /// Shorthand for `resolve(MissingPolicy::Unavailable)`.
    pub fn required(self) -> Option<f64> {
        self.resolve(MissingPolicy::Unavailable)
    }

    /// Shorthand for `resolve(MissingPolicy::Zero)`.
    pub fn or_zero(self) -> f64 {
        self.value.unwrap_or(0.0)
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    pub fn key(&self) -> FieldKey {
        self.key
    }
}

/// Logical name of a history series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKey {
    Revenue,
    NetIncome,
    Eps,
    FreeCashFlow,
    OperatingCashFlow,
}

impl SeriesKey {
    pub const ALL: [SeriesKey; 5] = [
        Self::Revenue,
        Self::NetIncome,
        Self::Eps,
        Self::FreeCashFlow,
        Self::OperatingCashFlow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::NetIncome => "net_income",
            Self::Eps => "eps",
            Self::FreeCashFlow => "free_cash_flow",
            Self::OperatingCashFlow => "operating_cash_flow",
        }
    }
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Annual history, most recent year first. Entries may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct History {
    pub revenue: Vec<Option<f64>>,
    pub net_income: Vec<Option<f64>>,
    pub eps: Vec<Option<f64>>,
    pub free_cash_flow: Vec<Option<f64>>,
    pub operating_cash_flow: Vec<Option<f64>>,
}

/// Raw financial inputs for one ticker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialSnapshot {
    // === Identity ===
    pub ticker: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,

    // === Market ===
    pub price: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub beta: Option<f64>,
    /// Reported market capitalization
    pub market_cap: Option<f64>,
    /// Trailing earnings per share
    pub eps: Option<f64>,

    // === Balance sheet ===
    pub long_term_debt: Option<f64>,
    pub short_term_debt: Option<f64>,
    pub total_equity: Option<f64>,
    pub total_assets: Option<f64>,
    /// Cash and equivalents
    pub cash: Option<f64>,
    pub current_assets: Option<f64>,
    pub current_liabilities: Option<f64>,
    pub inventory: Option<f64>,

    // === Income statement ===
    pub ebit: Option<f64>,
    /// Earnings before tax (EBT)
    pub pre_tax_income: Option<f64>,
    pub income_tax_expense: Option<f64>,
    pub interest_expense: Option<f64>,

    // === Cash flow statement ===
    pub operating_cash_flow: Option<f64>,
    pub free_cash_flow: Option<f64>,

    // === Provider-computed liquidity ratios ===
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub cash_ratio: Option<f64>,

    pub history: History,
}

impl FinancialSnapshot {
    /// Create an empty snapshot for a ticker.
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Default::default()
        }
    }

    /// Read a scalar line item.
    pub fn field(&self, key: FieldKey) -> Field {
        let value = match key {
            FieldKey::Price => self.price,
            FieldKey::SharesOutstanding => self.shares_outstanding,
            FieldKey::Beta => self.beta,
            FieldKey::MarketCap => self.market_cap,
            FieldKey::Eps => self.eps,
            FieldKey::LongTermDebt => self.long_term_debt,
            FieldKey::ShortTermDebt => self.short_term_debt,
            FieldKey::TotalEquity => self.total_equity,
            FieldKey::TotalAssets => self.total_assets,
            FieldKey::Cash => self.cash,
            FieldKey::CurrentAssets => self.current_assets,
            FieldKey::CurrentLiabilities => self.current_liabilities,
            FieldKey::Inventory => self.inventory,
            FieldKey::Ebit => self.ebit,
            FieldKey::PreTaxIncome => self.pre_tax_income,
            FieldKey::IncomeTaxExpense => self.income_tax_expense,
            FieldKey::InterestExpense => self.interest_expense,
            FieldKey::OperatingCashFlow => self.operating_cash_flow,
            FieldKey::FreeCashFlow => self.free_cash_flow,
            FieldKey::CurrentRatio => self.current_ratio,
            FieldKey::QuickRatio => self.quick_ratio,
            FieldKey::CashRatio => self.cash_ratio,
        };
        Field { key, value }
    }

    /// Read a history series (most recent first).
    pub fn series(&self, key: SeriesKey) -> &[Option<f64>] {
        match key {
            SeriesKey::Revenue => &self.history.revenue,
            SeriesKey::NetIncome => &self.history.net_income,
            SeriesKey::Eps => &self.history.eps,
            SeriesKey::FreeCashFlow => &self.history.free_cash_flow,
            SeriesKey::OperatingCashFlow => &self.history.operating_cash_flow,
        }
    }

    /// Equity market value: price × shares outstanding, unavailable if either
    /// factor is missing.
    pub fn market_cap(&self) -> Option<f64> {
        let price = self.field(FieldKey::Price).required()?;
        let shares = self.field(FieldKey::SharesOutstanding).required()?;
        Some(price * shares)
    }

    /// [`market_cap`](Self::market_cap), else the provider-reported cap.
    pub fn market_cap_or_reported(&self) -> Option<f64> {
        self.market_cap()
            .or_else(|| self.field(FieldKey::MarketCap).required())
    }

    /// Check the snapshot's shape.
    ///
    /// Absent fields are never an error here; only values that cannot be
    /// computed on are.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.ticker.trim().is_empty() {
            return Err(SnapshotError::EmptyTicker);
        }

        for key in FieldKey::ALL {
            if let Some(v) = self.field(key).required() {
                if !v.is_finite() {
                    return Err(SnapshotError::NonFinite {
                        field: key.as_str().to_string(),
                    });
                }
            }
        }

        for key in [FieldKey::Price, FieldKey::SharesOutstanding] {
            if self.field(key).or_zero() < 0.0 {
                return Err(SnapshotError::Negative { field: key });
            }
        }

        for key in SeriesKey::ALL {
            let series = self.series(key);
            if series.len() > MAX_HISTORY_YEARS {
                return Err(SnapshotError::SeriesTooLong {
                    series: key,
                    len: series.len(),
                });
            }
            if series.iter().flatten().any(|v| !v.is_finite()) {
                return Err(SnapshotError::NonFinite {
                    field: format!("history.{}", key),
                });
            }
        }

        Ok(())
    }
}

/// A snapshot that cannot be computed on.
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
pub enum SnapshotError {
    #[error("snapshot has no ticker")]
    EmptyTicker,

    #[error("field {field} is not a finite number")]
    NonFinite { field: String },

    #[error("field {field} is negative")]
    Negative { field: FieldKey },

    #[error("series {series} has {len} entries, at most {} allowed", MAX_HISTORY_YEARS)]
    SeriesTooLong { series: SeriesKey, len: usize },
}

// ============================================================================
// Tests
// ============================================================================
