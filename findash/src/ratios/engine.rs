//! Ratio Engine.
//!
//! Pure transformation of a [`FinancialSnapshot`] into a [`RatioResult`]:
//! cost of capital, returns on capital, growth, solvency and liquidity.
//! No operation panics or returns an error on missing data; a metric whose
//! inputs are missing or whose denominator is zero is `None`.

use chrono::Utc;
use tracing::{debug, warn};

use findash_common::config::{EngineConfig, TaxPolicy};

use super::growth::{compute_growth_quality, first_available, growth_with_fallback, series_growth};
use super::types::*;
use crate::data::SourceError;
use crate::snapshot::{FieldKey, FinancialSnapshot, MissingPolicy, SeriesKey};

/// Outcome of asking a data source for a snapshot.
pub type SnapshotOutcome = Result<FinancialSnapshot, SourceError>;

// Solvency thresholds
const MAX_DEBT_TO_EQUITY: f64 = 1.0;
const MAX_DEBT_TO_ASSETS: f64 = 0.5;
const MIN_INTEREST_COVERAGE: f64 = 3.0;
const MIN_CASH_FLOW_TO_DEBT: f64 = 0.2;
const MAX_NET_DEBT_TO_EBITDA: f64 = 3.0;

/// Fundamental ratio engine.
///
/// Stateless apart from its market assumptions; safe to share across threads
/// and to run concurrently for independent snapshots.
#[derive(Debug, Clone, Default)]
pub struct RatioEngine {
    config: EngineConfig,
}

impl RatioEngine {
    /// Create an engine with default assumptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom assumptions.
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compute a result from a data source outcome.
    ///
    /// A fetch failure or a malformed snapshot short-circuits into an error
    /// result without touching any formula. The result is always keyed under
    /// `ticker`.
    pub fn evaluate(&self, ticker: &str, outcome: SnapshotOutcome) -> RatioResult {
        match outcome {
            Ok(snapshot) => match snapshot.validate() {
                Ok(()) => RatioResult {
                    ticker: ticker.to_string(),
                    ..self.compute(&snapshot)
                },
                Err(e) => {
                    warn!(ticker = %ticker, error = %e, "Malformed snapshot, skipping computation");
                    RatioResult::failed(ticker, ResultError::Malformed(e))
                }
            },
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "No snapshot available");
                RatioResult::failed(ticker, ResultError::SourceUnavailable(e.to_string()))
            }
        }
    }

    /// Compute every metric for a snapshot.
    pub fn compute(&self, snapshot: &FinancialSnapshot) -> RatioResult {
        let valuation = self.compute_valuation(snapshot);
        let cost_of_capital = self.compute_wacc(snapshot);
        let returns = self.compute_returns(snapshot, &cost_of_capital);
        let growth = self.compute_growth(snapshot);
        let solvency = self.compute_solvency_ratios(snapshot);
        let liquidity = self.compute_liquidity_ratios(snapshot);

        debug!(
            ticker = %snapshot.ticker,
            wacc = ?cost_of_capital.wacc,
            roic = ?returns.roic,
            eva = ?returns.eva,
            solvency = %solvency.status,
            liquidity = %liquidity.classification,
            "Computed ratios"
        );

        RatioResult {
            ticker: snapshot.ticker.clone(),
            name: snapshot.name.clone(),
            valuation,
            cost_of_capital,
            returns,
            growth,
            solvency,
            liquidity,
            error: None,
            computed_at: Utc::now(),
        }
    }

    /// Weighted average cost of capital.
    ///
    /// `wacc = E/(E+D)·Re + D/(E+D)·Rd·(1 − t)`, unavailable when Re, E or D is
    /// unavailable or E + D = 0.
    pub fn compute_wacc(&self, snapshot: &FinancialSnapshot) -> WaccResult {
        let total_debt = total_debt(snapshot);
        let market_cap = snapshot.market_cap();
        let cost_of_equity = self.cost_of_equity(snapshot);
        let cost_of_debt = total_debt.map(|d| if d > 0.0 { self.config.cost_of_debt } else { 0.0 });
        let (tax_rate, tax_source) = self.tax_rate(snapshot);

        let wacc = match (cost_of_equity, market_cap, total_debt, cost_of_debt) {
            (Some(re), Some(e), Some(d), Some(rd)) => {
                let capital = e + d;
                if capital == 0.0 {
                    None
                } else {
                    let w = (e / capital) * re + (d / capital) * rd * (1.0 - tax_rate);
                    w.is_finite().then_some(w)
                }
            }
            _ => None,
        };

        WaccResult {
            wacc,
            total_debt,
            market_cap,
            cost_of_equity,
            cost_of_debt,
            tax_rate: Some(tax_rate),
            tax_source: Some(tax_source),
        }
    }

    /// ROIC as EBIT / (total debt + total equity).
    pub fn compute_roic(&self, snapshot: &FinancialSnapshot, wacc: &WaccResult) -> Option<f64> {
        let equity = snapshot.field(FieldKey::TotalEquity).required();
        let invested_capital = add(wacc.total_debt, equity);
        safe_div(snapshot.field(FieldKey::Ebit).required(), invested_capital)
    }

    /// NOPAT for the applied tax rate: EBIT × (1 − t).
    pub fn compute_nopat(&self, snapshot: &FinancialSnapshot, wacc: &WaccResult) -> Option<f64> {
        let tax_rate = wacc.tax_rate.unwrap_or(self.config.corporate_tax_rate);
        snapshot
            .field(FieldKey::Ebit)
            .required()
            .map(|ebit| ebit * (1.0 - tax_rate))
    }

    /// ROIC as NOPAT / (equity + debt − cash).
    pub fn compute_roic_nopat(
        &self,
        snapshot: &FinancialSnapshot,
        wacc: &WaccResult,
    ) -> Option<f64> {
        let equity = snapshot.field(FieldKey::TotalEquity).required();
        let cash = snapshot.field(FieldKey::Cash).required();
        let net_debt = sub(wacc.total_debt, cash);
        safe_div(self.compute_nopat(snapshot, wacc), add(equity, net_debt))
    }

    /// Both ROIC conventions and their EVA.
    pub fn compute_returns(&self, snapshot: &FinancialSnapshot, wacc: &WaccResult) -> ReturnMetrics {
        let roic = self.compute_roic(snapshot, wacc);
        let roic_nopat = self.compute_roic_nopat(snapshot, wacc);

        ReturnMetrics {
            roic,
            roic_nopat,
            nopat: self.compute_nopat(snapshot, wacc),
            eva: compute_eva(roic, wacc.wacc),
            eva_nopat: compute_eva(roic_nopat, wacc.wacc),
        }
    }

    /// Revenue, EPS and FCF growth with their classification.
    ///
    /// EPS growth falls back to net income growth and FCF growth to
    /// operating cash flow growth when the preferred series yields nothing.
    pub fn compute_growth(&self, snapshot: &FinancialSnapshot) -> GrowthAssessment {
        let revenue = series_growth(snapshot, SeriesKey::Revenue);
        let eps = growth_with_fallback(snapshot, &[SeriesKey::Eps, SeriesKey::NetIncome]);
        let fcf = growth_with_fallback(
            snapshot,
            &[SeriesKey::FreeCashFlow, SeriesKey::OperatingCashFlow],
        );
        compute_growth_quality(revenue, eps, fcf)
    }

    /// Price multiples.
    pub fn compute_valuation(&self, snapshot: &FinancialSnapshot) -> ValuationMetrics {
        let market_cap = snapshot.market_cap_or_reported();
        let price = snapshot.field(FieldKey::Price).required();
        let eps = positive(snapshot.field(FieldKey::Eps).required());
        let equity = positive(snapshot.field(FieldKey::TotalEquity).required());

        ValuationMetrics {
            market_cap,
            pe_ratio: safe_div(price, eps),
            pb_ratio: safe_div(market_cap, equity),
        }
    }

    /// Leverage and coverage ratios with their sustainability flags.
    ///
    /// Every available ratio is checked against its threshold independently;
    /// any breach marks the company unsustainable.
    pub fn compute_solvency_ratios(&self, snapshot: &FinancialSnapshot) -> SolvencyReport {
        let debt = total_debt(snapshot);
        let ebit = snapshot.field(FieldKey::Ebit).required();
        let cash = snapshot.field(FieldKey::Cash).required();

        let debt_to_equity = safe_div(debt, snapshot.field(FieldKey::TotalEquity).required());
        let debt_to_assets = safe_div(debt, snapshot.field(FieldKey::TotalAssets).required());
        let interest_coverage =
            safe_div(ebit, snapshot.field(FieldKey::InterestExpense).required());
        let cash_flow_to_debt =
            safe_div(snapshot.field(FieldKey::OperatingCashFlow).required(), debt);
        let net_debt_to_ebitda = safe_div(sub(debt, cash), ebit);

        let checks = [
            (debt_to_equity.map(|v| v >= MAX_DEBT_TO_EQUITY), SolvencyFlag::HighLeverage),
            (debt_to_assets.map(|v| v >= MAX_DEBT_TO_ASSETS), SolvencyFlag::AssetHeavyDebt),
            (
                interest_coverage.map(|v| v < MIN_INTEREST_COVERAGE),
                SolvencyFlag::WeakInterestCoverage,
            ),
            (
                cash_flow_to_debt.map(|v| v < MIN_CASH_FLOW_TO_DEBT),
                SolvencyFlag::LowCashFlowCoverage,
            ),
            (
                net_debt_to_ebitda.map(|v| v > MAX_NET_DEBT_TO_EBITDA),
                SolvencyFlag::SlowDeleveraging,
            ),
        ];

        let evaluated = checks.iter().filter(|(breached, _)| breached.is_some()).count();
        let flags: Vec<SolvencyFlag> = checks
            .iter()
            .filter(|(breached, _)| *breached == Some(true))
            .map(|(_, flag)| *flag)
            .collect();

        let status = if !flags.is_empty() {
            SolvencyStatus::Unsustainable
        } else if evaluated == 0 {
            SolvencyStatus::InsufficientData
        } else {
            SolvencyStatus::Sustainable
        };

        SolvencyReport {
            debt_to_equity,
            debt_to_assets,
            interest_coverage,
            cash_flow_to_debt,
            net_debt_to_ebitda,
            status,
            flags,
        }
    }

    /// Liquidity ratios and their classification.
    ///
    /// Provider-reported ratios are preferred; otherwise each is derived from
    /// balance-sheet lines. Classification needs all four ratios.
    pub fn compute_liquidity_ratios(&self, snapshot: &FinancialSnapshot) -> LiquidityReport {
        let current_assets = snapshot.field(FieldKey::CurrentAssets).required();
        let current_liabilities = snapshot.field(FieldKey::CurrentLiabilities).required();
        let inventory = snapshot
            .field(FieldKey::Inventory)
            .resolve(MissingPolicy::Zero);

        let current_ratio = first_available([
            snapshot.field(FieldKey::CurrentRatio).required(),
            safe_div(current_assets, current_liabilities),
        ]);
        let quick_ratio = first_available([
            snapshot.field(FieldKey::QuickRatio).required(),
            safe_div(sub(current_assets, inventory), current_liabilities),
        ]);
        let cash_ratio = first_available([
            snapshot.field(FieldKey::CashRatio).required(),
            safe_div(snapshot.field(FieldKey::Cash).required(), current_liabilities),
        ]);
        let cash_flow_ratio = safe_div(
            snapshot.field(FieldKey::OperatingCashFlow).required(),
            current_liabilities,
        );

        let classification = classify_liquidity(current_ratio, quick_ratio, cash_ratio, cash_flow_ratio);

        LiquidityReport {
            current_ratio,
            quick_ratio,
            cash_ratio,
            cash_flow_ratio,
            classification,
        }
    }

    /// CAPM: `Re = rf + beta × (market_return − rf)`.
    fn cost_of_equity(&self, snapshot: &FinancialSnapshot) -> Option<f64> {
        let rf = self.config.risk_free_rate;
        snapshot
            .field(FieldKey::Beta)
            .required()
            .map(|beta| rf + beta * (self.config.market_return - rf))
    }

    /// Tax rate under the configured policy.
    fn tax_rate(&self, snapshot: &FinancialSnapshot) -> (f64, TaxRateSource) {
        let fixed = self.config.corporate_tax_rate;
        match self.config.tax_policy {
            TaxPolicy::Fixed => (fixed, TaxRateSource::Fixed),
            TaxPolicy::Effective => {
                let tax = snapshot.field(FieldKey::IncomeTaxExpense).required();
                let pre_tax = snapshot.field(FieldKey::PreTaxIncome).required();
                match safe_div(tax, pre_tax) {
                    Some(rate) if (0.0..=1.0).contains(&rate) => (rate, TaxRateSource::Effective),
                    _ => (fixed, TaxRateSource::FixedFallback),
                }
            }
        }
    }
}

/// Economic value added: `roic − wacc`.
pub fn compute_eva(roic: Option<f64>, wacc: Option<f64>) -> Option<f64> {
    Some(roic? - wacc?)
}

/// Classify four liquidity ratios; any missing ratio means insufficient data.
pub fn classify_liquidity(
    current_ratio: Option<f64>,
    quick_ratio: Option<f64>,
    cash_ratio: Option<f64>,
    cash_flow_ratio: Option<f64>,
) -> LiquidityClass {
    let (Some(current), Some(quick), Some(cash), Some(cash_flow)) =
        (current_ratio, quick_ratio, cash_ratio, cash_flow_ratio)
    else {
        return LiquidityClass::InsufficientData;
    };

    if current > 1.5 && quick > 1.0 && cash > 0.5 && cash_flow > 0.4 {
        LiquidityClass::Excellent
    } else if current < 1.0 || quick < 0.5 || cash < 0.2 || cash_flow < 0.2 {
        LiquidityClass::Concerning
    } else {
        LiquidityClass::Acceptable
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Long-term + short-term debt; a missing component counts as zero unless
/// both are missing.
fn total_debt(snapshot: &FinancialSnapshot) -> Option<f64> {
    let long_term = snapshot.field(FieldKey::LongTermDebt);
    let short_term = snapshot.field(FieldKey::ShortTermDebt);
    if !long_term.is_present() && !short_term.is_present() {
        return None;
    }
    Some(long_term.or_zero() + short_term.or_zero())
}

/// Division that is unavailable on a missing operand, a zero denominator, or
/// a non-finite quotient.
fn safe_div(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if d == 0.0 {
        return None;
    }
    let q = n / d;
    q.is_finite().then_some(q)
}

fn add(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? + b?)
}

fn sub(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? - b?)
}

fn positive(v: Option<f64>) -> Option<f64> {
    v.filter(|x| *x > 0.0)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_snapshot() -> FinancialSnapshot {
        FinancialSnapshot {
            ticker: "TEST".to_string(),
            name: Some("Test Corp".to_string()),
            price: Some(50.0),
            shares_outstanding: Some(100.0),
            beta: Some(1.2),
            eps: Some(2.5),
            long_term_debt: Some(1500.0),
            short_term_debt: Some(500.0),
            total_equity: Some(3000.0),
            total_assets: Some(8000.0),
            cash: Some(400.0),
            current_assets: Some(2400.0),
            current_liabilities: Some(1200.0),
            inventory: Some(600.0),
            ebit: Some(900.0),
            pre_tax_income: Some(800.0),
            income_tax_expense: Some(200.0),
            interest_expense: Some(100.0),
            operating_cash_flow: Some(700.0),
            ..Default::default()
        }
    }

    fn approx(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("metric should be available");
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    fn fixed_tax_engine() -> RatioEngine {
        RatioEngine::with_config(EngineConfig {
            tax_policy: TaxPolicy::Fixed,
            ..EngineConfig::default()
        })
    }

    #[test]
    fn test_wacc_fixed_tax() {
        let engine = fixed_tax_engine();
        let result = engine.compute_wacc(&make_test_snapshot());

        // E = 5000, D = 2000, Re = 0.04 + 1.2 * 0.05 = 0.10
        approx(result.total_debt, 2000.0);
        approx(result.market_cap, 5000.0);
        approx(result.cost_of_equity, 0.10);
        approx(result.cost_of_debt, 0.055);
        let expected = (5000.0 / 7000.0) * 0.10 + (2000.0 / 7000.0) * 0.055 * (1.0 - 0.21);
        approx(result.wacc, expected);
        assert_eq!(result.tax_source, Some(TaxRateSource::Fixed));
    }

    #[test]
    fn test_wacc_effective_tax() {
        let engine = RatioEngine::new();
        let result = engine.compute_wacc(&make_test_snapshot());

        approx(result.tax_rate, 0.25);
        assert_eq!(result.tax_source, Some(TaxRateSource::Effective));
        let expected = (5000.0 / 7000.0) * 0.10 + (2000.0 / 7000.0) * 0.055 * 0.75;
        approx(result.wacc, expected);
    }

    #[test]
    fn test_effective_tax_falls_back_on_zero_pre_tax_income() {
        let mut snapshot = make_test_snapshot();
        snapshot.pre_tax_income = Some(0.0);

        let result = RatioEngine::new().compute_wacc(&snapshot);
        approx(result.tax_rate, 0.21);
        assert_eq!(result.tax_source, Some(TaxRateSource::FixedFallback));
    }

    #[test]
    fn test_effective_tax_falls_back_on_implausible_rate() {
        let mut snapshot = make_test_snapshot();
        snapshot.income_tax_expense = Some(-50.0);

        let result = RatioEngine::new().compute_wacc(&snapshot);
        assert_eq!(result.tax_source, Some(TaxRateSource::FixedFallback));
    }

    #[test]
    fn test_total_debt_missing_component_counts_as_zero() {
        let mut snapshot = make_test_snapshot();
        snapshot.short_term_debt = None;
        approx(RatioEngine::new().compute_wacc(&snapshot).total_debt, 1500.0);

        snapshot.long_term_debt = None;
        let result = RatioEngine::new().compute_wacc(&snapshot);
        assert_eq!(result.total_debt, None);
        assert_eq!(result.wacc, None);
    }

    #[test]
    fn test_wacc_debt_free_company() {
        let mut snapshot = make_test_snapshot();
        snapshot.long_term_debt = Some(0.0);
        snapshot.short_term_debt = Some(0.0);

        let result = fixed_tax_engine().compute_wacc(&snapshot);
        approx(result.cost_of_debt, 0.0);
        approx(result.wacc, 0.10);
    }

    #[test]
    fn test_wacc_unavailable_without_beta() {
        let mut snapshot = make_test_snapshot();
        snapshot.beta = None;
        let result = RatioEngine::new().compute_wacc(&snapshot);
        assert_eq!(result.cost_of_equity, None);
        assert_eq!(result.wacc, None);
        approx(result.total_debt, 2000.0);
    }

    #[test]
    fn test_wacc_needs_price_and_shares() {
        let snapshot = FinancialSnapshot {
            ticker: "CAP".to_string(),
            market_cap: Some(5000.0),
            beta: Some(1.2),
            long_term_debt: Some(2000.0),
            ..Default::default()
        };

        let result = RatioEngine::new().compute_wacc(&snapshot);
        assert_eq!(result.market_cap, None);
        assert_eq!(result.wacc, None);

        let mut priced = snapshot.clone();
        priced.price = Some(50.0);
        assert_eq!(RatioEngine::new().compute_wacc(&priced).wacc, None);

        // Valuation still uses the reported cap
        let valuation = RatioEngine::new().compute_valuation(&snapshot);
        approx(valuation.market_cap, 5000.0);
    }

    #[test]
    fn test_wacc_unavailable_when_capital_is_zero() {
        let mut snapshot = make_test_snapshot();
        snapshot.price = Some(0.0);
        snapshot.long_term_debt = Some(0.0);
        snapshot.short_term_debt = Some(0.0);
        assert_eq!(RatioEngine::new().compute_wacc(&snapshot).wacc, None);
    }

    #[test]
    fn test_roic_conventions_are_distinct() {
        let engine = fixed_tax_engine();
        let snapshot = make_test_snapshot();
        let wacc = engine.compute_wacc(&snapshot);
        let returns = engine.compute_returns(&snapshot, &wacc);

        // 900 / (2000 + 3000)
        approx(returns.roic, 0.18);
        // 900 * 0.79 / (3000 + 2000 - 400)
        approx(returns.nopat, 711.0);
        approx(returns.roic_nopat, 711.0 / 4600.0);
        approx(returns.eva, 0.18 - wacc.wacc.unwrap());
        assert_eq!(returns.creates_value(), Some(true));
    }

    #[test]
    fn test_roic_unavailable_on_zero_invested_capital() {
        let mut snapshot = make_test_snapshot();
        snapshot.long_term_debt = Some(0.0);
        snapshot.short_term_debt = Some(0.0);
        snapshot.total_equity = Some(0.0);

        let engine = RatioEngine::new();
        let wacc = engine.compute_wacc(&snapshot);
        assert_eq!(engine.compute_roic(&snapshot, &wacc), None);
    }

    #[test]
    fn test_roic_nopat_needs_cash() {
        let mut snapshot = make_test_snapshot();
        snapshot.cash = None;
        let engine = RatioEngine::new();
        let wacc = engine.compute_wacc(&snapshot);
        assert_eq!(engine.compute_roic_nopat(&snapshot, &wacc), None);
        assert!(engine.compute_roic(&snapshot, &wacc).is_some());
    }

    #[test]
    fn test_eva() {
        approx(compute_eva(Some(0.12), Some(0.09)), 0.03);
        assert_eq!(compute_eva(Some(0.12), None), None);
        assert_eq!(compute_eva(None, Some(0.09)), None);
    }

    #[test]
    fn test_solvency_sustainable() {
        let report = RatioEngine::new().compute_solvency_ratios(&make_test_snapshot());

        approx(report.debt_to_equity, 2000.0 / 3000.0);
        approx(report.debt_to_assets, 0.25);
        approx(report.interest_coverage, 9.0);
        approx(report.cash_flow_to_debt, 0.35);
        approx(report.net_debt_to_ebitda, 1600.0 / 900.0);
        assert_eq!(report.status, SolvencyStatus::Sustainable);
        assert!(report.flags.is_empty());
    }

    #[test]
    fn test_solvency_single_breach() {
        // D/E = 1.2, D/A = 0.3, coverage = 5, CF/D = 0.3, net debt / EBIT = 2
        let snapshot = FinancialSnapshot {
            ticker: "LEV".to_string(),
            long_term_debt: Some(1200.0),
            total_equity: Some(1000.0),
            total_assets: Some(4000.0),
            ebit: Some(500.0),
            interest_expense: Some(100.0),
            operating_cash_flow: Some(360.0),
            cash: Some(200.0),
            ..Default::default()
        };

        let report = RatioEngine::new().compute_solvency_ratios(&snapshot);
        approx(report.debt_to_equity, 1.2);
        approx(report.net_debt_to_ebitda, 2.0);
        assert!(report.is_unsustainable());
        assert_eq!(report.flags, vec![SolvencyFlag::HighLeverage]);
        assert_eq!(report.reasons().len(), 1);
    }

    #[test]
    fn test_solvency_every_breach_is_reported() {
        let snapshot = FinancialSnapshot {
            ticker: "DIST".to_string(),
            long_term_debt: Some(5000.0),
            total_equity: Some(1000.0),
            total_assets: Some(6000.0),
            ebit: Some(200.0),
            interest_expense: Some(150.0),
            operating_cash_flow: Some(100.0),
            cash: Some(100.0),
            ..Default::default()
        };

        let report = RatioEngine::new().compute_solvency_ratios(&snapshot);
        assert_eq!(
            report.flags,
            vec![
                SolvencyFlag::HighLeverage,
                SolvencyFlag::AssetHeavyDebt,
                SolvencyFlag::WeakInterestCoverage,
                SolvencyFlag::LowCashFlowCoverage,
                SolvencyFlag::SlowDeleveraging,
            ]
        );
    }

    #[test]
    fn test_solvency_zero_equity_and_missing_interest() {
        let mut snapshot = make_test_snapshot();
        snapshot.total_equity = Some(0.0);
        snapshot.interest_expense = None;

        let report = RatioEngine::new().compute_solvency_ratios(&snapshot);
        assert_eq!(report.debt_to_equity, None);
        assert_eq!(report.interest_coverage, None);
        assert_eq!(report.status, SolvencyStatus::Sustainable);
    }

    #[test]
    fn test_solvency_insufficient_data() {
        let report = RatioEngine::new().compute_solvency_ratios(&FinancialSnapshot::new("EMPTY"));
        assert_eq!(report.status, SolvencyStatus::InsufficientData);
        assert!(report.flags.is_empty());
    }

    #[test]
    fn test_liquidity_derived_from_balance_sheet() {
        let report = RatioEngine::new().compute_liquidity_ratios(&make_test_snapshot());

        approx(report.current_ratio, 2.0);
        approx(report.quick_ratio, 1.5);
        approx(report.cash_ratio, 400.0 / 1200.0);
        approx(report.cash_flow_ratio, 700.0 / 1200.0);
        assert_eq!(report.classification, LiquidityClass::Acceptable);
    }

    #[test]
    fn test_liquidity_prefers_reported_ratios() {
        let mut snapshot = make_test_snapshot();
        snapshot.cash_ratio = Some(0.6);

        let report = RatioEngine::new().compute_liquidity_ratios(&snapshot);
        approx(report.cash_ratio, 0.6);
        assert_eq!(report.classification, LiquidityClass::Excellent);
    }

    #[test]
    fn test_classify_liquidity() {
        assert_eq!(
            classify_liquidity(Some(2.0), Some(1.5), Some(0.6), Some(0.5)),
            LiquidityClass::Excellent
        );
        assert_eq!(
            classify_liquidity(Some(0.9), Some(1.5), Some(0.6), Some(0.5)),
            LiquidityClass::Concerning
        );
        assert_eq!(
            classify_liquidity(Some(1.2), Some(0.8), Some(0.3), Some(0.3)),
            LiquidityClass::Acceptable
        );
        assert_eq!(
            classify_liquidity(Some(2.0), None, Some(0.6), Some(0.5)),
            LiquidityClass::InsufficientData
        );
    }

    #[test]
    fn test_liquidity_zero_current_liabilities() {
        let mut snapshot = make_test_snapshot();
        snapshot.current_liabilities = Some(0.0);

        let report = RatioEngine::new().compute_liquidity_ratios(&snapshot);
        assert_eq!(report.current_ratio, None);
        assert_eq!(report.cash_flow_ratio, None);
        assert_eq!(report.classification, LiquidityClass::InsufficientData);
    }

    #[test]
    fn test_valuation_multiples() {
        let valuation = RatioEngine::new().compute_valuation(&make_test_snapshot());
        approx(valuation.pe_ratio, 20.0);
        approx(valuation.pb_ratio, 5000.0 / 3000.0);

        let mut loss_making = make_test_snapshot();
        loss_making.eps = Some(-1.0);
        assert_eq!(RatioEngine::new().compute_valuation(&loss_making).pe_ratio, None);
    }

    #[test]
    fn test_growth_uses_fallbacks() {
        let mut snapshot = make_test_snapshot();
        snapshot.history.revenue = vec![Some(110.0), Some(100.0)];
        snapshot.history.net_income = vec![Some(120.0), Some(100.0)];
        snapshot.history.operating_cash_flow = vec![Some(130.0), Some(100.0)];

        let growth = RatioEngine::new().compute_growth(&snapshot);
        approx(growth.revenue_growth, 0.10);
        approx(growth.eps_growth, 0.20);
        approx(growth.fcf_growth, 0.30);
        assert_eq!(growth.quality, GrowthQuality::HighQuality);
    }

    #[test]
    fn test_evaluate_source_failure_short_circuits() {
        let result = RatioEngine::new().evaluate(
            "GONE",
            Err(SourceError::NotFound("GONE".to_string())),
        );
        assert!(matches!(result.error, Some(ResultError::SourceUnavailable(_))));
        assert_eq!(result.ticker, "GONE");
        assert_eq!(result.cost_of_capital.wacc, None);
    }

    #[test]
    fn test_evaluate_malformed_snapshot() {
        let mut snapshot = make_test_snapshot();
        snapshot.ebit = Some(f64::INFINITY);

        let result = RatioEngine::new().evaluate("TEST", Ok(snapshot));
        assert!(matches!(result.error, Some(ResultError::Malformed(_))));
        assert_eq!(result.returns.roic, None);
    }

    #[test]
    fn test_evaluate_keys_result_by_requested_ticker() {
        let result = RatioEngine::new().evaluate("ASKED", Ok(make_test_snapshot()));
        assert_eq!(result.ticker, "ASKED");
        assert!(!result.is_error());
    }

    #[test]
    fn test_evaluate_valid_snapshot() {
        let result = RatioEngine::new().evaluate("TEST", Ok(make_test_snapshot()));
        assert!(!result.is_error());
        assert_eq!(result.name.as_deref(), Some("Test Corp"));
        assert!(result.cost_of_capital.wacc.is_some());
    }
}
