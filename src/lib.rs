//! # Financial Statement Analyzer
//!
//! Deterministic analysis of financial statement data: ratios, multi-period
//! trends, rule-based risk findings, peer benchmarking and DuPont
//! decomposition.
//!
//! ## Core Concepts
//!
//! - **Fields**: the fourteen canonical line items of a statement. Any of them may be unknown.
//! - **Unknown is not zero**: a missing input, a zero denominator or a non-finite result yields `None`, never `0.0`.
//! - **Engines**: pure functions over [`FinancialFields`] and [`RatioSet`], safe to call from any thread.
//! - **Analyzer**: [`FinancialAnalyzer`] runs every engine with an injected [`AnalyzerConfig`].
//!
//! ## Example
//!
//! ```rust
//! use financial_statement_analyzer::*;
//!
//! let previous = FinancialFields::new()
//!     .with(FieldName::Revenue, 4_000_000.0)
//!     .with(FieldName::NetIncome, 350_000.0);
//! let current = FinancialFields::new()
//!     .with(FieldName::Revenue, 5_000_000.0)
//!     .with(FieldName::NetIncome, 500_000.0)
//!     .with(FieldName::TotalAssets, 10_000_000.0)
//!     .with(FieldName::TotalLiabilities, 6_000_000.0)
//!     .with(FieldName::Equity, 4_000_000.0);
//!
//! let analysis = analyze_statement(&current, &[previous, current.clone()], Some("technology"));
//!
//! assert_eq!(analysis.ratios.roe, Some(12.5));
//! assert!(analysis.risks.is_empty());
//! assert_eq!(analysis.trends.as_ref().unwrap().revenue_trend, TrendDirection::Increasing);
//!
//! let report = ReportGenerator::new().to_markdown(&analysis);
//! assert!(report.contains("## DuPont Analysis"));
//! ```

pub mod analysis;
pub mod benchmark;
pub mod config;
pub mod dupont;
pub mod error;
pub mod extraction;
pub mod ratios;
pub mod report;
pub mod risks;
pub mod schema;
pub mod trends;
pub mod utils;

#[cfg(feature = "gemini")]
pub mod llm;

pub use analysis::{CashFlowSummary, FinancialAnalysis, FinancialAnalyzer};
pub use benchmark::{
    compute_benchmark, compute_benchmark_with, BenchmarkResult, BenchmarkTable, Industry,
    IndustryBaseline, MetricComparison,
};
pub use config::AnalyzerConfig;
pub use dupont::{compute_dupont, DupontDecomposition};
pub use error::{AnalysisError, Result};
pub use extraction::{extract_from_csv, extract_from_rows, extract_from_text, extract_from_xbrl_facts};
pub use ratios::{compute_ratios, RatioName, RatioSet, RatioUnit};
pub use report::{render_prompt_context, ReportGenerator};
pub use risks::{assess_risks, assess_risks_with, RiskFinding, RiskThresholds, Severity};
pub use schema::{FieldName, FinancialFields};
pub use trends::{compute_trends, compute_trends_with, MetricTrend, TrendDirection, TrendResult};
pub use utils::{normalize_value, parse_amount, safe_div};

/// Analyzes one statement with the default configuration.
pub fn analyze_statement(
    fields: &FinancialFields,
    history: &[FinancialFields],
    industry: Option<&str>,
) -> FinancialAnalysis {
    FinancialAnalyzer::default().analyze(fields, history, industry)
}

/// Analyzes a CSV statement export with the default configuration.
pub fn analyze_csv<R: std::io::Read>(reader: R, industry: Option<&str>) -> Result<FinancialAnalysis> {
    let fields = extract_from_csv(reader)?;
    Ok(FinancialAnalyzer::default().analyze(&fields, &[], industry))
}
