//! Price history and key statistics.
//!
//! Bars are kept oldest first. Daily bars can be resampled into weekly or
//! monthly bars the way the provider's interval parameter would return them.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Number of bars spanned by the short-term change statistic.
pub const CHANGE_WINDOW: usize = 7;

/// Bar interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1d")]
    Daily,
    #[serde(rename = "1wk")]
    Weekly,
    #[serde(rename = "1mo")]
    Monthly,
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "1d"),
            Self::Weekly => write!(f, "1wk"),
            Self::Monthly => write!(f, "1mo"),
        }
    }
}

impl std::str::FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1d" => Ok(Self::Daily),
            "1wk" => Ok(Self::Weekly),
            "1mo" => Ok(Self::Monthly),
            other => Err(format!("unsupported interval '{}'", other)),
        }
    }
}

/// One OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Key statistics over a price history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub last_close: Option<f64>,
    /// close[-1] − close[-7]
    pub change_7: Option<f64>,
    pub average_volume: Option<f64>,
    pub period_high: Option<f64>,
    pub period_low: Option<f64>,
    pub bars: usize,
}

/// Summarize an oldest-first price history.
pub fn summarize(bars: &[PriceBar]) -> PriceSummary {
    if bars.is_empty() {
        return PriceSummary::default();
    }

    let last_close = bars.last().map(|b| b.close);
    let change_7 = if bars.len() >= CHANGE_WINDOW {
        Some(bars[bars.len() - 1].close - bars[bars.len() - CHANGE_WINDOW].close)
    } else {
        None
    };
    let average_volume = Some(bars.iter().map(|b| b.volume).sum::<f64>() / bars.len() as f64);
    let period_high = bars.iter().map(|b| b.high).reduce(f64::max);
    let period_low = bars.iter().map(|b| b.low).reduce(f64::min);

    PriceSummary {
        last_close,
        change_7,
        average_volume,
        period_high,
        period_low,
        bars: bars.len(),
    }
}

/// Bars whose date falls within `[start, end]`.
pub fn within(bars: &[PriceBar], start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
    bars.iter()
        .filter(|b| b.date >= start && b.date <= end)
        .cloned()
        .collect()
}

/// Resample oldest-first daily bars to the requested interval.
///
/// A resampled bar takes the first open, last close, extreme high/low and
/// summed volume of its period, and is dated on the period's last bar.
pub fn resample(bars: &[PriceBar], interval: Interval) -> Vec<PriceBar> {
    let period_of = |date: NaiveDate| -> (i32, u32) {
        match interval {
            Interval::Daily => (date.year(), date.ordinal()),
            Interval::Weekly => {
                let week = date.iso_week();
                (week.year(), week.week())
            }
            Interval::Monthly => (date.year(), date.month()),
        }
    };

    let mut out: Vec<PriceBar> = Vec::new();
    let mut current: Option<(i32, u32)> = None;

    for bar in bars {
        let period = period_of(bar.date);
        match out.last_mut() {
            Some(agg) if current == Some(period) => {
                agg.date = bar.date;
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume += bar.volume;
            }
            _ => {
                out.push(bar.clone());
                current = Some(period);
            }
        }
    }

    out
}
