//! Integration tests for the file-backed analysis pipeline.

use std::fs;
use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use findash::data::{AnalysisService, FileSource, RateLimitedSource};
use findash::price::Interval;
use findash::ratios::{LiquidityClass, ResultError, SolvencyStatus, TaxRateSource};
use findash_common::Config;

const AAPL: &str = r#"{
    "ticker": "AAPL",
    "name": "Apple Inc.",
    "price": 50.0,
    "shares_outstanding": 100.0,
    "beta": 1.2,
    "eps": 2.5,
    "long_term_debt": 1500.0,
    "short_term_debt": 500.0,
    "total_equity": 3000.0,
    "total_assets": 8000.0,
    "cash": 400.0,
    "current_assets": 2400.0,
    "current_liabilities": 1200.0,
    "inventory": 600.0,
    "ebit": 900.0,
    "pre_tax_income": 800.0,
    "income_tax_expense": 200.0,
    "interest_expense": 100.0,
    "operating_cash_flow": 700.0,
    "history": {
        "revenue": [121.0, 110.0, 100.0],
        "eps": [2.5, null, 2.0]
    }
}"#;

fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("AAPL.json"), AAPL).unwrap();
    fs::write(dir.path().join("BAD.json"), r#"{"ticker": "BAD", "price": -3.0}"#).unwrap();

    let bars: Vec<String> = (1..=31)
        .map(|d| {
            format!(
                r#"{{"date": "2024-01-{:02}", "open": 1, "high": {}, "low": 0.5, "close": {}, "volume": 100}}"#,
                d,
                d + 1,
                d
            )
        })
        .collect();
    fs::write(
        dir.path().join("AAPL.prices.json"),
        format!("[{}]", bars.join(",")),
    )
    .unwrap();

    dir
}

fn service(dir: &TempDir) -> AnalysisService {
    let source = RateLimitedSource::new(FileSource::new(dir.path()), 600);
    AnalysisService::from_config(&Config::default(), Arc::new(source))
}

#[tokio::test]
async fn test_analyze_from_files() {
    let dir = data_dir();
    let result = service(&dir).analyze("AAPL").await;

    assert!(result.error.is_none());
    assert_eq!(result.name.as_deref(), Some("Apple Inc."));
    assert_eq!(
        result.cost_of_capital.tax_source,
        Some(TaxRateSource::Effective)
    );
    assert!(result.cost_of_capital.wacc.is_some());
    assert_eq!(result.solvency.status, SolvencyStatus::Sustainable);
    assert_eq!(result.liquidity.classification, LiquidityClass::Acceptable);

    // 121 over 100 across two years
    let revenue = result.growth.revenue_growth.unwrap();
    assert!((revenue - 0.1).abs() < 1e-9);
    // Gap skipped: 2.5 over 2.0 across one year
    let eps = result.growth.eps_growth.unwrap();
    assert!((eps - 0.25).abs() < 1e-9);
}

#[tokio::test]
async fn test_repeated_analysis_hits_cache() {
    let dir = data_dir();
    let svc = service(&dir);

    svc.analyze("AAPL").await;
    fs::remove_file(dir.path().join("AAPL.json")).unwrap();

    let result = svc.analyze("AAPL").await;
    assert!(result.error.is_none());
    assert_eq!(svc.cache().stats().active_entries, 1);
}

#[tokio::test]
async fn test_missing_and_malformed_tickers() {
    let dir = data_dir();
    let svc = service(&dir);

    let missing = svc.analyze("NOPE").await;
    assert!(matches!(missing.error, Some(ResultError::SourceUnavailable(_))));

    let malformed = svc.analyze("BAD").await;
    assert!(matches!(malformed.error, Some(ResultError::Malformed(_))));
    assert_eq!(malformed.cost_of_capital.wacc, None);
}

#[tokio::test]
async fn test_weekly_price_summary() {
    let dir = data_dir();
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();

    let summary = service(&dir)
        .price_summary("AAPL", start, end, Interval::Weekly)
        .await
        .unwrap();

    // Jan 2024 spans ISO weeks 1 through 5
    assert_eq!(summary.bars, 5);
    assert_eq!(summary.last_close, Some(31.0));
    assert_eq!(summary.change_7, None);
    assert_eq!(summary.period_high, Some(32.0));
}
