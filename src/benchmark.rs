//! Peer benchmarking against a fixed per-industry reference table.

use crate::error::{AnalysisError, Result};
use crate::ratios::{RatioName, RatioSet, RatioUnit};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Benchmarked ratios, in output order.
pub const BENCHMARK_METRICS: [RatioName; 7] = [
    RatioName::ProfitMargin,
    RatioName::Roa,
    RatioName::Roe,
    RatioName::CurrentRatio,
    RatioName::QuickRatio,
    RatioName::DebtToAssetRatio,
    RatioName::DebtToEquityRatio,
];

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Industry {
    General,
    Technology,
    Retail,
    Manufacturing,
}

impl Industry {
    pub const ALL: [Industry; 4] = [
        Industry::General,
        Industry::Technology,
        Industry::Retail,
        Industry::Manufacturing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Industry::General => "general",
            Industry::Technology => "technology",
            Industry::Retail => "retail",
            Industry::Manufacturing => "manufacturing",
        }
    }

    /// Maps a free-form label onto a known industry, falling back to `General`.
    pub fn from_label(label: &str) -> Self {
        let key = label.trim().to_lowercase();
        Industry::ALL
            .iter()
            .copied()
            .find(|i| i.as_str() == key)
            .unwrap_or(Industry::General)
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far a metric may drift from its benchmark before it is called out.
/// Percent-unit returns and leverage use percentage points, liquidity uses
/// the raw multiple.
pub fn materiality_threshold(metric: RatioName) -> f64 {
    match metric {
        RatioName::DebtToAssetRatio | RatioName::DebtToEquityRatio => 10.0,
        m if m.unit() == RatioUnit::Multiple => 0.3,
        _ => 5.0,
    }
}

fn higher_is_better(metric: RatioName) -> bool {
    !matches!(
        metric,
        RatioName::DebtToAssetRatio | RatioName::DebtToEquityRatio
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IndustryBaseline {
    #[schemars(description = "Reference ratio values keyed by ratio name (e.g. profit_margin)")]
    pub ratios: BTreeMap<String, f64>,
}

impl IndustryBaseline {
    fn from_pairs(pairs: &[(RatioName, f64)]) -> Self {
        Self {
            ratios: pairs
                .iter()
                .map(|(name, value)| (name.as_str().to_string(), *value))
                .collect(),
        }
    }

    pub fn get(&self, metric: RatioName) -> Option<f64> {
        self.ratios.get(metric.as_str()).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct BenchmarkTable {
    pub industries: BTreeMap<Industry, IndustryBaseline>,
}

impl Default for BenchmarkTable {
    fn default() -> Self {
        use RatioName::*;

        let mut industries = BTreeMap::new();
        industries.insert(
            Industry::General,
            IndustryBaseline::from_pairs(&[
                (ProfitMargin, 8.0),
                (Roa, 5.0),
                (Roe, 12.0),
                (CurrentRatio, 1.5),
                (QuickRatio, 1.0),
                (DebtToAssetRatio, 55.0),
                (DebtToEquityRatio, 110.0),
            ]),
        );
        industries.insert(
            Industry::Technology,
            IndustryBaseline::from_pairs(&[
                (ProfitMargin, 12.0),
                (Roa, 8.0),
                (Roe, 15.0),
                (CurrentRatio, 1.8),
                (QuickRatio, 1.4),
                (DebtToAssetRatio, 45.0),
                (DebtToEquityRatio, 90.0),
            ]),
        );
        industries.insert(
            Industry::Retail,
            IndustryBaseline::from_pairs(&[
                (ProfitMargin, 6.0),
                (Roa, 4.0),
                (Roe, 10.0),
                (CurrentRatio, 1.3),
                (QuickRatio, 0.8),
                (DebtToAssetRatio, 65.0),
                (DebtToEquityRatio, 150.0),
            ]),
        );
        industries.insert(
            Industry::Manufacturing,
            IndustryBaseline::from_pairs(&[
                (ProfitMargin, 9.0),
                (Roa, 6.0),
                (Roe, 13.0),
                (CurrentRatio, 1.6),
                (QuickRatio, 1.1),
                (DebtToAssetRatio, 60.0),
                (DebtToEquityRatio, 130.0),
            ]),
        );

        Self { industries }
    }
}

impl BenchmarkTable {
    pub fn baseline(&self, industry: Industry) -> Option<&IndustryBaseline> {
        self.industries.get(&industry)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.industries.contains_key(&Industry::General) {
            return Err(AnalysisError::InvalidConfig(
                "Benchmark table must contain a 'general' industry".to_string(),
            ));
        }

        for (industry, baseline) in &self.industries {
            for (metric, value) in &baseline.ratios {
                metric.parse::<RatioName>().map_err(|_| {
                    AnalysisError::InvalidConfig(format!(
                        "Industry '{}' references unknown ratio '{}'",
                        industry, metric
                    ))
                })?;
                if !value.is_finite() {
                    return Err(AnalysisError::InvalidConfig(format!(
                        "Industry '{}' has non-finite benchmark for '{}'",
                        industry, metric
                    )));
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub metric: RatioName,
    pub company: f64,
    pub benchmark: f64,
    pub difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub industry: Industry,
    pub metrics: Vec<MetricComparison>,
    pub alerts: Vec<String>,
    pub summary: String,
}

pub fn compute_benchmark(ratios: &RatioSet, industry: &str) -> BenchmarkResult {
    compute_benchmark_with(ratios, industry, &BenchmarkTable::default())
}

pub fn compute_benchmark_with(
    ratios: &RatioSet,
    industry: &str,
    table: &BenchmarkTable,
) -> BenchmarkResult {
    let mut industry = Industry::from_label(industry);
    if table.baseline(industry).is_none() {
        industry = Industry::General;
    }

    let mut metrics = Vec::new();
    let mut alerts = Vec::new();

    if let Some(baseline) = table.baseline(industry) {
        for metric in BENCHMARK_METRICS {
            let (Some(company), Some(benchmark)) = (ratios.get(metric), baseline.get(metric))
            else {
                continue;
            };

            let difference = company - benchmark;
            if let Some(alert) = materiality_alert(metric, difference) {
                alerts.push(alert);
            }

            metrics.push(MetricComparison {
                metric,
                company,
                benchmark,
                difference,
            });
        }
    }

    let summary = build_summary(&metrics);

    BenchmarkResult {
        industry,
        metrics,
        alerts,
        summary,
    }
}

fn materiality_alert(metric: RatioName, difference: f64) -> Option<String> {
    let threshold = materiality_threshold(metric);
    if difference.abs() <= threshold {
        return None;
    }

    let direction = if difference > 0.0 { "above" } else { "below" };
    let favourable = (difference > 0.0) == higher_is_better(metric);
    let qualifier = if favourable { "stronger" } else { "weaker" };

    Some(match metric.unit() {
        RatioUnit::Percent => format!(
            "{} is {:.2} percentage points {} peers ({}).",
            metric.label(),
            difference.abs(),
            direction,
            qualifier
        ),
        RatioUnit::Multiple => format!(
            "{} is {:.2}x {} peers ({}).",
            metric.label(),
            difference.abs(),
            direction,
            qualifier
        ),
    })
}

/// Signed distance from the benchmark where positive always means better
/// than peers (lower leverage counts as better).
fn advantage(comparison: &MetricComparison) -> f64 {
    if higher_is_better(comparison.metric) {
        comparison.difference
    } else {
        -comparison.difference
    }
}

/// One sentence for the strongest metric and one for the weakest.
fn build_summary(comparisons: &[MetricComparison]) -> String {
    if comparisons.is_empty() {
        return String::new();
    }

    let better = comparisons
        .iter()
        .filter(|c| advantage(c) > 0.0)
        .max_by(|a, b| advantage(a).total_cmp(&advantage(b)));
    let weaker = comparisons
        .iter()
        .filter(|c| advantage(c) < 0.0)
        .min_by(|a, b| advantage(a).total_cmp(&advantage(b)));

    let mut parts = Vec::new();
    if let Some(top) = better {
        parts.push(format!(
            "Outperforms peers on {} by {:.2}.",
            top.metric.label(),
            top.difference.abs()
        ));
    }
    if let Some(lag) = weaker {
        parts.push(format!(
            "Lags industry on {} by {:.2}.",
            lag.metric.label(),
            lag.difference.abs()
        ));
    }

    if parts.is_empty() {
        return "Company performance is broadly in line with peer benchmarks.".to_string();
    }

    parts.join(" ")
}
