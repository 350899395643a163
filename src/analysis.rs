use crate::benchmark::{compute_benchmark_with, BenchmarkResult};
use crate::config::AnalyzerConfig;
use crate::dupont::{compute_dupont, DupontDecomposition};
use crate::error::Result;
use crate::ratios::{compute_ratios, RatioSet};
use crate::risks::{assess_risks_with, RiskFinding, Severity};
use crate::schema::FinancialFields;
use crate::trends::{compute_trends_with, TrendResult};
use log::{debug, info};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSummary {
    pub operating: Option<f64>,
    pub investing: Option<f64>,
    pub financing: Option<f64>,
    /// Operating plus investing cash flow, when both are known.
    pub free_cash_flow: Option<f64>,
}

impl CashFlowSummary {
    pub fn from_fields(fields: &FinancialFields) -> Self {
        let free_cash_flow = match (fields.operating_cash_flow, fields.investing_cash_flow) {
            (Some(op), Some(inv)) => Some(op + inv),
            _ => None,
        };

        Self {
            operating: fields.operating_cash_flow,
            investing: fields.investing_cash_flow,
            financing: fields.financing_cash_flow,
            free_cash_flow,
        }
    }
}

/// Everything computed for one request. Built fresh each time and never
/// cached by the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialAnalysis {
    pub fields: FinancialFields,
    pub ratios: RatioSet,
    pub cash_flow: CashFlowSummary,
    pub trends: Option<TrendResult>,
    pub risks: Vec<RiskFinding>,
    pub benchmark: BenchmarkResult,
    pub dupont: Option<DupontDecomposition>,
}

impl FinancialAnalysis {
    pub fn has_risks(&self) -> bool {
        !self.risks.is_empty()
    }

    pub fn high_severity_risks(&self) -> impl Iterator<Item = &RiskFinding> {
        self.risks.iter().filter(|r| r.severity == Severity::High)
    }

    pub fn worst_severity(&self) -> Option<Severity> {
        self.risks.iter().map(|r| r.severity).max()
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FinancialAnalyzer {
    config: AnalyzerConfig,
}

impl FinancialAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Runs every engine over the current period.
    ///
    /// `history` is the ordered (oldest first) sequence of periods used for
    /// trends; it normally ends with the current period. An absent industry
    /// is benchmarked as `general`.
    pub fn analyze(
        &self,
        fields: &FinancialFields,
        history: &[FinancialFields],
        industry: Option<&str>,
    ) -> FinancialAnalysis {
        let known = fields.known().count();
        info!(
            "Analyzing statement with {} known fields and {} historical periods",
            known,
            history.len()
        );
        if known == 0 {
            debug!("No numeric fields available; all ratios will be null");
        }

        let ratios = compute_ratios(fields);
        debug!("Computed {} of the ratio set", ratios.known().count());

        let trends = compute_trends_with(history, self.config.trend_epsilon);
        if trends.is_none() && !history.is_empty() {
            debug!(
                "Trend analysis skipped: {} period(s) supplied, at least 2 required",
                history.len()
            );
        }

        let risks = assess_risks_with(fields, &ratios, &self.config.risk_thresholds);
        let benchmark =
            compute_benchmark_with(&ratios, industry.unwrap_or("general"), &self.config.benchmarks);
        let dupont = compute_dupont(fields);

        info!(
            "Analysis complete: {} risk finding(s), {} benchmark alert(s)",
            risks.len(),
            benchmark.alerts.len()
        );

        FinancialAnalysis {
            fields: fields.clone(),
            ratios,
            cash_flow: CashFlowSummary::from_fields(fields),
            trends,
            risks,
            benchmark,
            dupont,
        }
    }

    /// Analyzes the last period of `periods`, using the whole sequence for trends.
    pub fn analyze_periods(
        &self,
        periods: &[FinancialFields],
        industry: Option<&str>,
    ) -> Option<FinancialAnalysis> {
        let latest = periods.last()?;
        Some(self.analyze(latest, periods, industry))
    }
}
