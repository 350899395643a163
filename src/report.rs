use crate::analysis::FinancialAnalysis;
use crate::error::Result;
use crate::ratios::{RatioName, RatioUnit};
use crate::utils::format_currency;
use chrono::{Local, NaiveDateTime};
use std::path::Path;

const PROFITABILITY: [RatioName; 5] = [
    RatioName::ProfitMargin,
    RatioName::GrossMargin,
    RatioName::OperatingMargin,
    RatioName::Roa,
    RatioName::Roe,
];
const LIQUIDITY: [RatioName; 3] = [
    RatioName::CurrentRatio,
    RatioName::QuickRatio,
    RatioName::CashRatio,
];
const LEVERAGE: [RatioName; 3] = [
    RatioName::DebtToAssetRatio,
    RatioName::DebtToEquityRatio,
    RatioName::EquityMultiplier,
];
const EFFICIENCY: [RatioName; 1] = [RatioName::AssetTurnover];

const NO_RISKS: &str = "No significant risks identified.";

fn format_ratio(name: RatioName, value: f64) -> String {
    match name.unit() {
        RatioUnit::Percent => format!("{:.2}%", value),
        RatioUnit::Multiple => format!("{:.2}x", value),
    }
}

fn format_growth(rate: Option<f64>) -> String {
    match rate {
        Some(r) => format!("{:.2}%", r),
        None => "n/a".to_string(),
    }
}

/// Renders an analysis as Markdown or plain text.
pub struct ReportGenerator {
    generated_at: NaiveDateTime,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self {
            generated_at: Local::now().naive_local(),
        }
    }

    pub fn with_timestamp(generated_at: NaiveDateTime) -> Self {
        Self { generated_at }
    }

    fn timestamp(&self) -> String {
        self.generated_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    pub fn to_markdown(&self, analysis: &FinancialAnalysis) -> String {
        let mut output = String::new();

        output.push_str("# Financial Statement Analysis Report\n\n");
        output.push_str(&format!("**Generated on:** {}\n\n", self.timestamp()));
        output.push_str("---\n\n");

        output.push_str("## Key Financial Metrics\n\n");
        output.push_str("| Metric | Value |\n");
        output.push_str("|--------|-------|\n");
        for (field, value) in analysis.fields.known() {
            output.push_str(&format!("| {} | {} |\n", field.label(), format_currency(value)));
        }
        output.push('\n');

        output.push_str("## Financial Ratios\n\n");
        for (title, names) in [
            ("Profitability Ratios", &PROFITABILITY[..]),
            ("Liquidity Ratios", &LIQUIDITY[..]),
            ("Leverage Ratios", &LEVERAGE[..]),
            ("Efficiency Ratios", &EFFICIENCY[..]),
        ] {
            let rows: Vec<(RatioName, f64)> = names
                .iter()
                .filter_map(|n| analysis.ratios.get(*n).map(|v| (*n, v)))
                .collect();
            if rows.is_empty() {
                continue;
            }
            output.push_str(&format!("### {}\n\n", title));
            output.push_str("| Ratio | Value |\n");
            output.push_str("|-------|-------|\n");
            for (name, value) in rows {
                output.push_str(&format!("| {} | {} |\n", name.label(), format_ratio(name, value)));
            }
            output.push('\n');
        }

        let cf = &analysis.cash_flow;
        if cf.operating.is_some() || cf.investing.is_some() || cf.financing.is_some() {
            output.push_str("## Cash Flow\n\n");
            for (label, value) in [
                ("Operating", cf.operating),
                ("Investing", cf.investing),
                ("Financing", cf.financing),
                ("Free Cash Flow", cf.free_cash_flow),
            ] {
                if let Some(v) = value {
                    output.push_str(&format!("- **{}:** {}\n", label, format_currency(v)));
                }
            }
            output.push('\n');
        }

        if let Some(dupont) = &analysis.dupont {
            output.push_str("## DuPont Analysis\n\n");
            output.push_str("ROE decomposition:\n\n");
            output.push_str(&format!("- **ROE:** {:.2}%\n", dupont.roe_check));
            output.push_str(&format!("- **Profit Margin:** {:.2}%\n", dupont.profit_margin));
            output.push_str(&format!("- **Asset Turnover:** {:.2}x\n", dupont.asset_turnover));
            output.push_str(&format!(
                "- **Equity Multiplier:** {:.2}x\n\n",
                dupont.equity_multiplier
            ));
        }

        if let Some(trends) = &analysis.trends {
            output.push_str("## Trend Analysis\n\n");
            output.push_str(&format!(
                "- **Revenue Trend:** {} (growth {})\n",
                trends.revenue_trend.as_str(),
                format_growth(trends.revenue_growth_rate)
            ));
            output.push_str(&format!(
                "- **Profit Trend:** {} (growth {})\n",
                trends.profit_trend.as_str(),
                format_growth(trends.profit_growth_rate)
            ));
            for (field, trend) in &trends.metric_trends {
                if trend.growth_rate.is_some() {
                    output.push_str(&format!(
                        "- **{}:** {} (growth {})\n",
                        field.label(),
                        trend.trend.as_str(),
                        format_growth(trend.growth_rate)
                    ));
                }
            }
            output.push('\n');
        }

        output.push_str("## Risk Assessment\n\n");
        if let Some(level) = analysis.worst_severity() {
            output.push_str(&format!("**Overall Risk Level:** {}\n\n", level));
        }
        if analysis.risks.is_empty() {
            output.push_str(&format!("{}\n\n", NO_RISKS));
        }
        for risk in &analysis.risks {
            output.push_str(&format!("### {}\n\n", risk.risk_type));
            output.push_str(&format!("**Severity:** {}\n\n", risk.severity));
            output.push_str(&format!("**Description:** {}\n\n", risk.description));
        }

        let benchmark = &analysis.benchmark;
        if !benchmark.metrics.is_empty() {
            output.push_str("## Peer Benchmarking\n\n");
            output.push_str(&format!("**Industry:** {}\n\n", benchmark.industry));
            if !benchmark.summary.is_empty() {
                output.push_str(&format!("{}\n\n", benchmark.summary));
            }
            output.push_str("| Metric | Company | Benchmark | Difference |\n");
            output.push_str("|--------|---------|-----------|------------|\n");
            for m in &benchmark.metrics {
                output.push_str(&format!(
                    "| {} | {:.2} | {:.2} | {:+.2} |\n",
                    m.metric.label(),
                    m.company,
                    m.benchmark,
                    m.difference
                ));
            }
            output.push('\n');
            if !benchmark.alerts.is_empty() {
                output.push_str("**Alerts:**\n");
                for alert in &benchmark.alerts {
                    output.push_str(&format!("- {}\n", alert));
                }
                output.push('\n');
            }
        }

        let high: Vec<_> = analysis.high_severity_risks().collect();
        if !high.is_empty() {
            output.push_str("## Recommendations\n\n");
            output.push_str("### Immediate Actions Required\n\n");
            for risk in high {
                output.push_str(&format!("- Address {}: {}\n", risk.risk_type, risk.description));
            }
            output.push('\n');
        }

        output.push_str("---\n");
        output.push_str("*This report was generated automatically.*\n");

        output
    }

    pub fn to_text(&self, analysis: &FinancialAnalysis) -> String {
        let rule = "=".repeat(60);
        let thin = "-".repeat(60);
        let mut output = String::new();

        output.push_str(&format!("{}\nFINANCIAL STATEMENT ANALYSIS REPORT\n{}\n", rule, rule));
        output.push_str(&format!("Generated on: {}\n{}\n\n", self.timestamp(), rule));

        output.push_str(&format!("KEY FINANCIAL METRICS\n{}\n", thin));
        for (field, value) in analysis.fields.known() {
            output.push_str(&format!("{}: {}\n", field.label(), format_currency(value)));
        }
        output.push('\n');

        output.push_str(&format!("FINANCIAL RATIOS\n{}\n", thin));
        for (name, value) in analysis.ratios.known() {
            output.push_str(&format!("{}: {}\n", name.label(), format_ratio(name, value)));
        }
        output.push('\n');

        output.push_str(&format!("RISK ASSESSMENT\n{}\n", thin));
        if analysis.risks.is_empty() {
            output.push_str(&format!("{}\n", NO_RISKS));
        }
        for risk in &analysis.risks {
            output.push_str(&format!("[{}] {}\n  {}\n", risk.severity, risk.risk_type, risk.description));
        }
        output.push('\n');

        if let Some(trends) = &analysis.trends {
            output.push_str(&format!("TREND ANALYSIS\n{}\n", thin));
            output.push_str(&format!("Revenue Trend: {}\n", trends.revenue_trend.as_str()));
            output.push_str(&format!("Profit Trend: {}\n\n", trends.profit_trend.as_str()));
        }

        let benchmark = &analysis.benchmark;
        if !benchmark.metrics.is_empty() {
            output.push_str(&format!("PEER BENCHMARKING\n{}\n", thin));
            output.push_str(&format!("Industry: {}\n", benchmark.industry));
            for m in &benchmark.metrics {
                output.push_str(&format!(
                    "{}: Company={:.2} Benchmark={:.2} Difference={:+.2}\n",
                    m.metric.label(),
                    m.company,
                    m.benchmark,
                    m.difference
                ));
            }
            for alert in &benchmark.alerts {
                output.push_str(&format!("  Alert: {}\n", alert));
            }
            output.push('\n');
        }

        output.push_str(&format!("{}\nEnd of Report\n{}\n", rule, rule));
        output
    }

    pub fn write_markdown(&self, analysis: &FinancialAnalysis, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_markdown(analysis))?;
        Ok(())
    }

    pub fn write_text(&self, analysis: &FinancialAnalysis, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_text(analysis))?;
        Ok(())
    }
}

/// The context block handed to a language model when answering questions
/// about a statement. Unknown values are left out rather than shown as zero.
pub fn render_prompt_context(analysis: &FinancialAnalysis) -> String {
    let mut output = String::from("Financial Data Available:\n");
    for (field, value) in analysis.fields.known() {
        output.push_str(&format!("- {}: {:.2}\n", field.as_str(), value));
    }

    output.push_str("\nFinancial Ratios:\n");
    for (name, value) in analysis.ratios.known() {
        output.push_str(&format!("- {}: {}\n", name.as_str(), format_ratio(name, value)));
    }

    output.push_str("\nRisks:\n");
    if analysis.risks.is_empty() {
        output.push_str(&format!("- {}\n", NO_RISKS));
    }
    for risk in &analysis.risks {
        output.push_str(&format!(
            "- {} ({}): {}\n",
            risk.risk_type, risk.severity, risk.description
        ));
    }

    output.push_str("\nTrends:\n");
    match &analysis.trends {
        Some(trends) => {
            output.push_str(&format!(
                "- revenue: {} ({})\n",
                trends.revenue_trend.as_str(),
                format_growth(trends.revenue_growth_rate)
            ));
            output.push_str(&format!(
                "- net_income: {} ({})\n",
                trends.profit_trend.as_str(),
                format_growth(trends.profit_growth_rate)
            ));
        }
        None => output.push_str("- Insufficient data for trend analysis. Need at least 2 periods.\n"),
    }

    if !analysis.benchmark.metrics.is_empty() {
        output.push_str(&format!(
            "\nPeer Benchmark ({}):\n",
            analysis.benchmark.industry
        ));
        for alert in &analysis.benchmark.alerts {
            output.push_str(&format!("- {}\n", alert));
        }
        if !analysis.benchmark.summary.is_empty() {
            output.push_str(&format!("- {}\n", analysis.benchmark.summary));
        }
    }

    output
}
