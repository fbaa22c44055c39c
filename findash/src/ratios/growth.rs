//! Compound annual growth and growth-quality classification.

use tracing::debug;

use super::types::{GrowthAssessment, GrowthQuality, GrowthTrend};
use crate::snapshot::{FinancialSnapshot, SeriesKey};

/// Chronological order of a value series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesOrder {
    /// Most recent year first (statement history layout)
    NewestFirst,
    /// Oldest year first
    OldestFirst,
}

/// Compound annual growth rate of an annual series.
///
/// Missing entries are dropped first; the remaining values must number at
/// least two. The oldest surviving value is the base, the newest the end, and
/// `years = count - 1`. Unavailable on a zero base or when the result is not a
/// real number (a sign change under a fractional root).
pub fn compute_cagr(values: &[Option<f64>], order: SeriesOrder) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.len() < 2 {
        return None;
    }

    let years = (present.len() - 1) as f64;
    let (first, last) = match order {
        SeriesOrder::NewestFirst => (present[present.len() - 1], present[0]),
        SeriesOrder::OldestFirst => (present[0], present[present.len() - 1]),
    };

    if first == 0.0 {
        return None;
    }

    let cagr = (last / first).powf(1.0 / years) - 1.0;
    cagr.is_finite().then_some(cagr)
}

/// CAGR of one snapshot series.
pub fn series_growth(snapshot: &FinancialSnapshot, key: SeriesKey) -> Option<f64> {
    let growth = compute_cagr(snapshot.series(key), SeriesOrder::NewestFirst);
    debug!(ticker = %snapshot.ticker, series = %key, growth = ?growth, "Computed series CAGR");
    growth
}

/// CAGR of the first series in `keys` that yields a value.
pub fn growth_with_fallback(snapshot: &FinancialSnapshot, keys: &[SeriesKey]) -> Option<f64> {
    first_available(keys.iter().map(|&key| series_growth(snapshot, key)))
}

/// First available candidate.
///
/// Candidates are consumed lazily, so later ones are not computed once an
/// earlier one is available.
pub fn first_available<I>(candidates: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    candidates.into_iter().flatten().next()
}

/// Classify growth direction and quality.
pub fn compute_growth_quality(
    revenue_growth: Option<f64>,
    eps_growth: Option<f64>,
    fcf_growth: Option<f64>,
) -> GrowthAssessment {
    let (trend, quality) = match (revenue_growth, eps_growth, fcf_growth) {
        (Some(revenue), Some(eps), Some(fcf)) => {
            let trend = if revenue > 0.0 && eps > 0.0 && fcf > 0.0 {
                GrowthTrend::ConsistentPositive
            } else {
                GrowthTrend::Inconsistent
            };

            let quality = if fcf > eps && eps > revenue {
                GrowthQuality::HighQuality
            } else if eps > revenue {
                GrowthQuality::Efficient
            } else {
                GrowthQuality::Weak
            };

            (trend, quality)
        }
        _ => (GrowthTrend::InsufficientData, GrowthQuality::InsufficientData),
    };

    GrowthAssessment {
        revenue_growth,
        eps_growth,
        fcf_growth,
        trend,
        quality,
    }
}

// ============================================================================
// Tests
// ============================================================================
