//! Ratio engine: maps one period's fields to profitability, liquidity,
//! leverage and efficiency ratios.
//!
//! Every ratio is `None` when one of its inputs is unknown or its denominator
//! is exactly zero. Percentage ratios are scaled by 100, the plain multiples
//! (`current_ratio`, `quick_ratio`, `cash_ratio`, `asset_turnover`,
//! `equity_multiplier`) are not.

use crate::error::{AnalysisError, Result};
use crate::schema::FinancialFields;
use crate::utils::safe_div;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioName {
    ProfitMargin,
    Roa,
    Roe,
    DebtToAssetRatio,
    GrossMargin,
    OperatingMargin,
    CurrentRatio,
    QuickRatio,
    AssetTurnover,
    EquityMultiplier,
    DebtToEquityRatio,
    CashRatio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioUnit {
    Percent,
    Multiple,
}

impl RatioName {
    pub const ALL: [RatioName; 12] = [
        RatioName::ProfitMargin,
        RatioName::Roa,
        RatioName::Roe,
        RatioName::DebtToAssetRatio,
        RatioName::GrossMargin,
        RatioName::OperatingMargin,
        RatioName::CurrentRatio,
        RatioName::QuickRatio,
        RatioName::AssetTurnover,
        RatioName::EquityMultiplier,
        RatioName::DebtToEquityRatio,
        RatioName::CashRatio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RatioName::ProfitMargin => "profit_margin",
            RatioName::Roa => "roa",
            RatioName::Roe => "roe",
            RatioName::DebtToAssetRatio => "debt_to_asset_ratio",
            RatioName::GrossMargin => "gross_margin",
            RatioName::OperatingMargin => "operating_margin",
            RatioName::CurrentRatio => "current_ratio",
            RatioName::QuickRatio => "quick_ratio",
            RatioName::AssetTurnover => "asset_turnover",
            RatioName::EquityMultiplier => "equity_multiplier",
            RatioName::DebtToEquityRatio => "debt_to_equity_ratio",
            RatioName::CashRatio => "cash_ratio",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RatioName::ProfitMargin => "Profit Margin",
            RatioName::Roa => "ROA",
            RatioName::Roe => "ROE",
            RatioName::DebtToAssetRatio => "Debt-to-Asset Ratio",
            RatioName::GrossMargin => "Gross Margin",
            RatioName::OperatingMargin => "Operating Margin",
            RatioName::CurrentRatio => "Current Ratio",
            RatioName::QuickRatio => "Quick Ratio",
            RatioName::AssetTurnover => "Asset Turnover",
            RatioName::EquityMultiplier => "Equity Multiplier",
            RatioName::DebtToEquityRatio => "Debt-to-Equity Ratio",
            RatioName::CashRatio => "Cash Ratio",
        }
    }

    pub fn unit(&self) -> RatioUnit {
        match self {
            RatioName::CurrentRatio
            | RatioName::QuickRatio
            | RatioName::CashRatio
            | RatioName::AssetTurnover
            | RatioName::EquityMultiplier => RatioUnit::Multiple,
            _ => RatioUnit::Percent,
        }
    }
}

impl fmt::Display for RatioName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RatioName {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase();
        RatioName::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == key)
            .ok_or_else(|| AnalysisError::UnknownField(s.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioSet {
    pub profit_margin: Option<f64>,
    pub roa: Option<f64>,
    pub roe: Option<f64>,
    pub debt_to_asset_ratio: Option<f64>,
    pub gross_margin: Option<f64>,
    pub operating_margin: Option<f64>,
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub asset_turnover: Option<f64>,
    pub equity_multiplier: Option<f64>,
    #[serde(default)]
    pub debt_to_equity_ratio: Option<f64>,
    #[serde(default)]
    pub cash_ratio: Option<f64>,
}

impl RatioSet {
    pub fn get(&self, name: RatioName) -> Option<f64> {
        match name {
            RatioName::ProfitMargin => self.profit_margin,
            RatioName::Roa => self.roa,
            RatioName::Roe => self.roe,
            RatioName::DebtToAssetRatio => self.debt_to_asset_ratio,
            RatioName::GrossMargin => self.gross_margin,
            RatioName::OperatingMargin => self.operating_margin,
            RatioName::CurrentRatio => self.current_ratio,
            RatioName::QuickRatio => self.quick_ratio,
            RatioName::AssetTurnover => self.asset_turnover,
            RatioName::EquityMultiplier => self.equity_multiplier,
            RatioName::DebtToEquityRatio => self.debt_to_equity_ratio,
            RatioName::CashRatio => self.cash_ratio,
        }
    }

    /// Known ratios in canonical order.
    pub fn known(&self) -> impl Iterator<Item = (RatioName, f64)> + '_ {
        RatioName::ALL
            .iter()
            .filter_map(move |r| self.get(*r).map(|v| (*r, v)))
    }
}

fn percent(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    safe_div(numerator, denominator)
        .map(|v| v * 100.0)
        .filter(|v| v.is_finite())
}

fn difference(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? - b?)
}

pub fn compute_ratios(fields: &FinancialFields) -> RatioSet {
    RatioSet {
        profit_margin: percent(fields.net_income, fields.revenue),
        roa: percent(fields.net_income, fields.total_assets),
        roe: percent(fields.net_income, fields.equity),
        debt_to_asset_ratio: percent(fields.total_liabilities, fields.total_assets),
        gross_margin: percent(fields.gross_profit, fields.revenue),
        operating_margin: percent(
            difference(fields.revenue, fields.operating_expenses),
            fields.revenue,
        ),
        current_ratio: safe_div(fields.current_assets, fields.current_liabilities),
        quick_ratio: safe_div(
            difference(fields.current_assets, fields.inventory),
            fields.current_liabilities,
        ),
        asset_turnover: safe_div(fields.revenue, fields.total_assets),
        equity_multiplier: safe_div(fields.total_assets, fields.equity),
        debt_to_equity_ratio: percent(fields.total_liabilities, fields.equity),
        cash_ratio: safe_div(fields.cash, fields.current_liabilities),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldName;
    use approx::assert_relative_eq;

    fn scenario() -> FinancialFields {
        FinancialFields::new()
            .with(FieldName::Revenue, 5_000_000.0)
            .with(FieldName::NetIncome, 500_000.0)
            .with(FieldName::TotalAssets, 10_000_000.0)
            .with(FieldName::TotalLiabilities, 6_000_000.0)
            .with(FieldName::Equity, 4_000_000.0)
    }

    #[test]
    fn test_core_ratios() {
        let ratios = compute_ratios(&scenario());
        assert_relative_eq!(ratios.profit_margin.unwrap(), 10.0);
        assert_relative_eq!(ratios.roa.unwrap(), 5.0);
        assert_relative_eq!(ratios.roe.unwrap(), 12.5);
        assert_relative_eq!(ratios.debt_to_asset_ratio.unwrap(), 60.0);
        assert_relative_eq!(ratios.asset_turnover.unwrap(), 0.5);
        assert_relative_eq!(ratios.equity_multiplier.unwrap(), 2.5);
        assert_relative_eq!(ratios.debt_to_equity_ratio.unwrap(), 150.0);
        assert_eq!(ratios.gross_margin, None);
        assert_eq!(ratios.current_ratio, None);
    }

    #[test]
    fn test_liquidity_and_margin_ratios() {
        let fields = FinancialFields::new()
            .with(FieldName::Revenue, 1_000.0)
            .with(FieldName::GrossProfit, 400.0)
            .with(FieldName::OperatingExpenses, 850.0)
            .with(FieldName::CurrentAssets, 600.0)
            .with(FieldName::CurrentLiabilities, 400.0)
            .with(FieldName::Inventory, 200.0)
            .with(FieldName::Cash, 100.0);

        let ratios = compute_ratios(&fields);
        assert_relative_eq!(ratios.gross_margin.unwrap(), 40.0);
        assert_relative_eq!(ratios.operating_margin.unwrap(), 15.0);
        assert_relative_eq!(ratios.current_ratio.unwrap(), 1.5);
        assert_relative_eq!(ratios.quick_ratio.unwrap(), 1.0);
        assert_relative_eq!(ratios.cash_ratio.unwrap(), 0.25);
    }

    #[test]
    fn test_zero_revenue_yields_null_margins() {
        let fields = FinancialFields::new()
            .with(FieldName::Revenue, 0.0)
            .with(FieldName::NetIncome, 100.0)
            .with(FieldName::GrossProfit, 50.0)
            .with(FieldName::OperatingExpenses, 20.0);

        let ratios = compute_ratios(&fields);
        assert_eq!(ratios.profit_margin, None);
        assert_eq!(ratios.gross_margin, None);
        assert_eq!(ratios.operating_margin, None);
    }

    #[test]
    fn test_unknown_inputs_stay_unknown() {
        let ratios = compute_ratios(&FinancialFields::new());
        assert_eq!(ratios, RatioSet::default());
        assert_eq!(ratios.known().count(), 0);

        // Inventory unknown: quick ratio must not assume zero inventory.
        let fields = FinancialFields::new()
            .with(FieldName::CurrentAssets, 500.0)
            .with(FieldName::CurrentLiabilities, 250.0);
        let ratios = compute_ratios(&fields);
        assert_relative_eq!(ratios.current_ratio.unwrap(), 2.0);
        assert_eq!(ratios.quick_ratio, None);
    }

    #[test]
    fn test_zero_numerator_is_a_real_ratio() {
        let fields = FinancialFields::new()
            .with(FieldName::Revenue, 1_000.0)
            .with(FieldName::NetIncome, 0.0);
        assert_eq!(compute_ratios(&fields).profit_margin, Some(0.0));
    }

    #[test]
    fn test_percent_overflow_is_unknown() {
        let fields = FinancialFields::new()
            .with(FieldName::Revenue, 1.0)
            .with(FieldName::NetIncome, 1e307)
            .with(FieldName::TotalAssets, 1.0);

        let ratios = compute_ratios(&fields);
        assert_eq!(ratios.profit_margin, None);
        assert_eq!(ratios.roa, None);
        assert!(ratios.known().all(|(_, v)| v.is_finite()));
    }

    #[test]
    fn test_negative_equity_is_computed() {
        let fields = FinancialFields::new()
            .with(FieldName::NetIncome, -50.0)
            .with(FieldName::Equity, -200.0);
        assert_relative_eq!(compute_ratios(&fields).roe.unwrap(), 25.0);
    }

    #[test]
    fn test_compute_ratios_is_pure() {
        let fields = scenario();
        let first = compute_ratios(&fields);
        let second = compute_ratios(&fields);
        for name in RatioName::ALL {
            assert_eq!(
                first.get(name).map(f64::to_bits),
                second.get(name).map(f64::to_bits)
            );
        }
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let json = serde_json::to_value(compute_ratios(&scenario())).unwrap();
        assert_eq!(json["roe"], serde_json::json!(12.5));
        assert!(json["current_ratio"].is_null());
    }

    #[test]
    fn test_ratio_units() {
        assert_eq!(RatioName::ProfitMargin.unit(), RatioUnit::Percent);
        assert_eq!(RatioName::CurrentRatio.unit(), RatioUnit::Multiple);
        assert_eq!("roe".parse::<RatioName>().unwrap(), RatioName::Roe);
        assert!("ebitda_margin".parse::<RatioName>().is_err());
    }
}
