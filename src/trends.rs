//! Trend engine over an ordered sequence of periods (oldest first).
//!
//! The caller's order is authoritative; periods are never sorted here.

use crate::schema::{FieldName, FinancialFields};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Growth rates at or below this value are labelled stable rather than increasing.
pub const DEFAULT_TREND_EPSILON: f64 = 1e-9;

/// Fields tracked in `TrendResult::metric_trends` besides revenue and profit.
pub const SECONDARY_TREND_FIELDS: [FieldName; 3] = [
    FieldName::TotalAssets,
    FieldName::Equity,
    FieldName::OperatingCashFlow,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTrend {
    pub trend: TrendDirection,
    pub growth_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub revenue_trend: TrendDirection,
    pub profit_trend: TrendDirection,
    pub revenue_growth_rate: Option<f64>,
    pub profit_growth_rate: Option<f64>,
    pub periods: usize,
    #[serde(default)]
    pub metric_trends: BTreeMap<FieldName, MetricTrend>,
}

/// `(last - first) / |first| * 100`, unknown when either end is unknown or
/// the base is zero.
pub fn growth_rate(first: Option<f64>, last: Option<f64>) -> Option<f64> {
    let (first, last) = (first?, last?);
    if first == 0.0 {
        return None;
    }
    let rate = (last - first) / first.abs() * 100.0;
    rate.is_finite().then_some(rate)
}

pub fn classify_growth(rate: Option<f64>, epsilon: f64) -> TrendDirection {
    match rate {
        Some(r) if r > epsilon => TrendDirection::Increasing,
        Some(r) if r < 0.0 => TrendDirection::Decreasing,
        _ => TrendDirection::Stable,
    }
}

pub fn compute_metric_trend(
    periods: &[FinancialFields],
    field: FieldName,
    epsilon: f64,
) -> MetricTrend {
    let first = periods.first().and_then(|p| p.get(field));
    let last = periods.last().and_then(|p| p.get(field));
    let growth_rate = if periods.len() < 2 {
        None
    } else {
        growth_rate(first, last)
    };

    MetricTrend {
        trend: classify_growth(growth_rate, epsilon),
        growth_rate,
    }
}

pub fn compute_trends(periods: &[FinancialFields]) -> Option<TrendResult> {
    compute_trends_with(periods, DEFAULT_TREND_EPSILON)
}

pub fn compute_trends_with(periods: &[FinancialFields], epsilon: f64) -> Option<TrendResult> {
    if periods.len() < 2 {
        return None;
    }

    let revenue = compute_metric_trend(periods, FieldName::Revenue, epsilon);
    let profit = compute_metric_trend(periods, FieldName::NetIncome, epsilon);

    let metric_trends = SECONDARY_TREND_FIELDS
        .iter()
        .map(|field| (*field, compute_metric_trend(periods, *field, epsilon)))
        .collect();

    Some(TrendResult {
        revenue_trend: revenue.trend,
        profit_trend: profit.trend,
        revenue_growth_rate: revenue.growth_rate,
        profit_growth_rate: profit.growth_rate,
        periods: periods.len(),
        metric_trends,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn period(revenue: f64, net_income: f64) -> FinancialFields {
        FinancialFields::new()
            .with(FieldName::Revenue, revenue)
            .with(FieldName::NetIncome, net_income)
    }

    #[test]
    fn test_insufficient_periods() {
        assert!(compute_trends(&[]).is_none());
        assert!(compute_trends(&[period(1.0, 1.0)]).is_none());
    }

    #[test]
    fn test_two_period_growth() {
        let trends =
            compute_trends(&[period(4_000_000.0, 350_000.0), period(5_000_000.0, 500_000.0)])
                .unwrap();

        assert_relative_eq!(trends.revenue_growth_rate.unwrap(), 25.0);
        assert_eq!(trends.revenue_trend, TrendDirection::Increasing);
        assert_relative_eq!(
            trends.profit_growth_rate.unwrap(),
            42.857142857142854,
            max_relative = 1e-9
        );
        assert_eq!(trends.profit_trend, TrendDirection::Increasing);
        assert_eq!(trends.periods, 2);
    }

    #[test]
    fn test_uses_first_and_last_without_sorting() {
        let trends = compute_trends(&[
            period(300.0, 30.0),
            period(100.0, 10.0),
            period(150.0, 30.0),
        ])
        .unwrap();

        assert_relative_eq!(trends.revenue_growth_rate.unwrap(), -50.0);
        assert_eq!(trends.revenue_trend, TrendDirection::Decreasing);
        assert_eq!(trends.profit_growth_rate, Some(0.0));
        assert_eq!(trends.profit_trend, TrendDirection::Stable);
    }

    #[test]
    fn test_zero_or_unknown_base_is_stable() {
        let trends = compute_trends(&[
            FinancialFields::new().with(FieldName::Revenue, 0.0),
            period(100.0, 10.0),
        ])
        .unwrap();

        assert_eq!(trends.revenue_growth_rate, None);
        assert_eq!(trends.revenue_trend, TrendDirection::Stable);
        assert_eq!(trends.profit_growth_rate, None);
        assert_eq!(trends.profit_trend, TrendDirection::Stable);
    }

    #[test]
    fn test_negative_base_uses_absolute_value() {
        // Loss narrowing from -200 to -50 is an improvement.
        let trends = compute_trends(&[period(1.0, -200.0), period(1.0, -50.0)]).unwrap();
        assert_relative_eq!(trends.profit_growth_rate.unwrap(), 75.0);
        assert_eq!(trends.profit_trend, TrendDirection::Increasing);
    }

    #[test]
    fn test_classify_growth_boundaries() {
        assert_eq!(classify_growth(Some(0.0), DEFAULT_TREND_EPSILON), TrendDirection::Stable);
        assert_eq!(classify_growth(Some(1e-12), DEFAULT_TREND_EPSILON), TrendDirection::Stable);
        assert_eq!(classify_growth(Some(0.01), DEFAULT_TREND_EPSILON), TrendDirection::Increasing);
        assert_eq!(classify_growth(Some(-0.01), DEFAULT_TREND_EPSILON), TrendDirection::Decreasing);
        assert_eq!(classify_growth(None, DEFAULT_TREND_EPSILON), TrendDirection::Stable);
    }

    #[test]
    fn test_secondary_metric_trends() {
        let periods = [
            FinancialFields::new()
                .with(FieldName::TotalAssets, 1_000.0)
                .with(FieldName::Equity, 400.0),
            FinancialFields::new()
                .with(FieldName::TotalAssets, 1_100.0)
                .with(FieldName::Equity, 300.0),
        ];

        let trends = compute_trends(&periods).unwrap();
        let assets = &trends.metric_trends[&FieldName::TotalAssets];
        assert_relative_eq!(assets.growth_rate.unwrap(), 10.0, max_relative = 1e-12);
        assert_eq!(assets.trend, TrendDirection::Increasing);

        let equity = &trends.metric_trends[&FieldName::Equity];
        assert_eq!(equity.trend, TrendDirection::Decreasing);

        let ocf = &trends.metric_trends[&FieldName::OperatingCashFlow];
        assert_eq!(ocf.growth_rate, None);
        assert_eq!(ocf.trend, TrendDirection::Stable);
    }

    #[test]
    fn test_serialized_labels() {
        let trends = compute_trends(&[period(1.0, 1.0), period(2.0, 0.5)]).unwrap();
        let json = serde_json::to_value(&trends).unwrap();
        assert_eq!(json["revenue_trend"], "increasing");
        assert_eq!(json["profit_trend"], "decreasing");
        assert!(json["metric_trends"]["equity"].is_object());
    }
}
