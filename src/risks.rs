//! Rule-based risk detection.
//!
//! Rules live in a fixed, ordered table and are evaluated in sequence, so the
//! output order is always Profitability, Leverage, Loss, Asset Efficiency.
//! All threshold comparisons are strict: a value sitting exactly on a
//! threshold does not raise a finding.

use crate::error::{AnalysisError, Result};
use crate::ratios::RatioSet;
use crate::schema::FinancialFields;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFinding {
    #[serde(rename = "type")]
    pub risk_type: String,
    pub severity: Severity,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RiskThresholds {
    #[schemars(description = "Profit margin (%) strictly below this raises a Profitability Risk")]
    pub min_profit_margin: f64,

    #[schemars(description = "Debt-to-asset ratio (%) strictly above this raises a Leverage Risk")]
    pub max_debt_to_asset_ratio: f64,

    #[schemars(description = "Net income strictly below this raises a Loss Risk")]
    pub min_net_income: f64,

    #[schemars(description = "ROA (%) strictly below this raises an Asset Efficiency Risk")]
    pub min_roa: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            min_profit_margin: 5.0,
            max_debt_to_asset_ratio: 60.0,
            min_net_income: 0.0,
            min_roa: 2.0,
        }
    }
}

impl RiskThresholds {
    pub fn validate(&self) -> Result<()> {
        let values = [
            ("min_profit_margin", self.min_profit_margin),
            ("max_debt_to_asset_ratio", self.max_debt_to_asset_ratio),
            ("min_net_income", self.min_net_income),
            ("min_roa", self.min_roa),
        ];
        for (name, value) in values {
            if !value.is_finite() {
                return Err(AnalysisError::InvalidConfig(format!(
                    "Risk threshold '{}' must be finite (got {})",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// One entry of the rule table: when `evaluate` yields a description the
/// finding is emitted with this rule's type and severity.
pub struct RiskRule {
    pub risk_type: &'static str,
    pub severity: Severity,
    evaluate: fn(&FinancialFields, &RatioSet, &RiskThresholds) -> Option<String>,
}

impl RiskRule {
    pub fn check(
        &self,
        fields: &FinancialFields,
        ratios: &RatioSet,
        thresholds: &RiskThresholds,
    ) -> Option<RiskFinding> {
        (self.evaluate)(fields, ratios, thresholds).map(|description| RiskFinding {
            risk_type: self.risk_type.to_string(),
            severity: self.severity,
            description,
        })
    }
}

pub static RISK_RULES: [RiskRule; 4] = [
    RiskRule {
        risk_type: "Profitability Risk",
        severity: Severity::Medium,
        evaluate: |_, ratios, t| {
            let margin = ratios.profit_margin?;
            (margin < t.min_profit_margin).then(|| {
                format!(
                    "Profit margin of {:.2}% is below {:.1}%, indicating low profitability",
                    margin, t.min_profit_margin
                )
            })
        },
    },
    RiskRule {
        risk_type: "Leverage Risk",
        severity: Severity::High,
        evaluate: |_, ratios, t| {
            let ratio = ratios.debt_to_asset_ratio?;
            (ratio > t.max_debt_to_asset_ratio).then(|| {
                format!(
                    "Debt-to-asset ratio of {:.2}% exceeds {:.1}%, indicating high leverage",
                    ratio, t.max_debt_to_asset_ratio
                )
            })
        },
    },
    RiskRule {
        risk_type: "Loss Risk",
        severity: Severity::High,
        evaluate: |fields, _, t| {
            let net_income = fields.net_income?;
            (net_income < t.min_net_income)
                .then(|| format!("Company is reporting a net loss of {:.2}", net_income.abs()))
        },
    },
    RiskRule {
        risk_type: "Asset Efficiency Risk",
        severity: Severity::Medium,
        evaluate: |_, ratios, t| {
            let roa = ratios.roa?;
            (roa < t.min_roa).then(|| {
                format!(
                    "Return on assets of {:.2}% is below {:.1}%, indicating poor asset utilization",
                    roa, t.min_roa
                )
            })
        },
    },
];

pub fn assess_risks(fields: &FinancialFields, ratios: &RatioSet) -> Vec<RiskFinding> {
    assess_risks_with(fields, ratios, &RiskThresholds::default())
}

pub fn assess_risks_with(
    fields: &FinancialFields,
    ratios: &RatioSet,
    thresholds: &RiskThresholds,
) -> Vec<RiskFinding> {
    RISK_RULES
        .iter()
        .filter_map(|rule| rule.check(fields, ratios, thresholds))
        .collect()
}
