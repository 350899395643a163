use crate::error::{AnalysisError, Result};
use crate::utils::normalize_value;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The line items the analyzer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    Revenue,
    NetIncome,
    TotalAssets,
    TotalLiabilities,
    Equity,
    OperatingExpenses,
    GrossProfit,
    CurrentAssets,
    CurrentLiabilities,
    Inventory,
    Cash,
    OperatingCashFlow,
    InvestingCashFlow,
    FinancingCashFlow,
}

impl FieldName {
    pub const ALL: [FieldName; 14] = [
        FieldName::Revenue,
        FieldName::NetIncome,
        FieldName::TotalAssets,
        FieldName::TotalLiabilities,
        FieldName::Equity,
        FieldName::OperatingExpenses,
        FieldName::GrossProfit,
        FieldName::CurrentAssets,
        FieldName::CurrentLiabilities,
        FieldName::Inventory,
        FieldName::Cash,
        FieldName::OperatingCashFlow,
        FieldName::InvestingCashFlow,
        FieldName::FinancingCashFlow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::Revenue => "revenue",
            FieldName::NetIncome => "net_income",
            FieldName::TotalAssets => "total_assets",
            FieldName::TotalLiabilities => "total_liabilities",
            FieldName::Equity => "equity",
            FieldName::OperatingExpenses => "operating_expenses",
            FieldName::GrossProfit => "gross_profit",
            FieldName::CurrentAssets => "current_assets",
            FieldName::CurrentLiabilities => "current_liabilities",
            FieldName::Inventory => "inventory",
            FieldName::Cash => "cash",
            FieldName::OperatingCashFlow => "operating_cash_flow",
            FieldName::InvestingCashFlow => "investing_cash_flow",
            FieldName::FinancingCashFlow => "financing_cash_flow",
        }
    }

    /// Human readable label used in reports ("Net Income").
    pub fn label(&self) -> &'static str {
        match self {
            FieldName::Revenue => "Revenue",
            FieldName::NetIncome => "Net Income",
            FieldName::TotalAssets => "Total Assets",
            FieldName::TotalLiabilities => "Total Liabilities",
            FieldName::Equity => "Equity",
            FieldName::OperatingExpenses => "Operating Expenses",
            FieldName::GrossProfit => "Gross Profit",
            FieldName::CurrentAssets => "Current Assets",
            FieldName::CurrentLiabilities => "Current Liabilities",
            FieldName::Inventory => "Inventory",
            FieldName::Cash => "Cash",
            FieldName::OperatingCashFlow => "Operating Cash Flow",
            FieldName::InvestingCashFlow => "Investing Cash Flow",
            FieldName::FinancingCashFlow => "Financing Cash Flow",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase();
        if key == "sales" {
            return Ok(FieldName::Revenue);
        }
        FieldName::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == key)
            .ok_or_else(|| AnalysisError::UnknownField(s.to_string()))
    }
}

/// Normalized numeric fields of a single reporting period.
///
/// A `None` slot means the value is unknown. It is never treated as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FinancialFields {
    #[serde(default)]
    #[schemars(description = "Total revenue / net sales for the period. Null if not stated.")]
    pub revenue: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Net income (profit after tax). Negative for a loss. Null if not stated.")]
    pub net_income: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Total assets at period end.")]
    pub total_assets: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Total liabilities at period end.")]
    pub total_liabilities: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Total shareholders' equity at period end.")]
    pub equity: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Total operating expenses for the period, as a positive number.")]
    pub operating_expenses: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Gross profit (revenue less cost of sales).")]
    pub gross_profit: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Total current assets at period end.")]
    pub current_assets: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Total current liabilities at period end.")]
    pub current_liabilities: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Inventories at period end.")]
    pub inventory: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Cash and cash equivalents at period end.")]
    pub cash: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Net cash from operating activities.")]
    pub operating_cash_flow: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Net cash from investing activities (usually negative).")]
    pub investing_cash_flow: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Net cash from financing activities.")]
    pub financing_cash_flow: Option<f64>,
}

impl FinancialFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: FieldName) -> Option<f64> {
        match field {
            FieldName::Revenue => self.revenue,
            FieldName::NetIncome => self.net_income,
            FieldName::TotalAssets => self.total_assets,
            FieldName::TotalLiabilities => self.total_liabilities,
            FieldName::Equity => self.equity,
            FieldName::OperatingExpenses => self.operating_expenses,
            FieldName::GrossProfit => self.gross_profit,
            FieldName::CurrentAssets => self.current_assets,
            FieldName::CurrentLiabilities => self.current_liabilities,
            FieldName::Inventory => self.inventory,
            FieldName::Cash => self.cash,
            FieldName::OperatingCashFlow => self.operating_cash_flow,
            FieldName::InvestingCashFlow => self.investing_cash_flow,
            FieldName::FinancingCashFlow => self.financing_cash_flow,
        }
    }

    /// Stores a value; non-finite numbers are stored as unknown.
    pub fn set(&mut self, field: FieldName, value: Option<f64>) {
        let value = value.filter(|v| v.is_finite());
        let slot = match field {
            FieldName::Revenue => &mut self.revenue,
            FieldName::NetIncome => &mut self.net_income,
            FieldName::TotalAssets => &mut self.total_assets,
            FieldName::TotalLiabilities => &mut self.total_liabilities,
            FieldName::Equity => &mut self.equity,
            FieldName::OperatingExpenses => &mut self.operating_expenses,
            FieldName::GrossProfit => &mut self.gross_profit,
            FieldName::CurrentAssets => &mut self.current_assets,
            FieldName::CurrentLiabilities => &mut self.current_liabilities,
            FieldName::Inventory => &mut self.inventory,
            FieldName::Cash => &mut self.cash,
            FieldName::OperatingCashFlow => &mut self.operating_cash_flow,
            FieldName::InvestingCashFlow => &mut self.investing_cash_flow,
            FieldName::FinancingCashFlow => &mut self.financing_cash_flow,
        };
        *slot = value;
    }

    pub fn with(mut self, field: FieldName, value: f64) -> Self {
        self.set(field, Some(value));
        self
    }

    pub fn is_empty(&self) -> bool {
        FieldName::ALL.iter().all(|f| self.get(*f).is_none())
    }

    /// Iterates the known (non-null) fields in canonical order.
    pub fn known(&self) -> impl Iterator<Item = (FieldName, f64)> + '_ {
        FieldName::ALL
            .iter()
            .filter_map(move |f| self.get(*f).map(|v| (*f, v)))
    }

    /// Fills every unknown slot from `other`, leaving known values untouched.
    pub fn merge_missing(&mut self, other: &FinancialFields) {
        for field in FieldName::ALL {
            if self.get(field).is_none() {
                self.set(field, other.get(field));
            }
        }
    }

    /// Builds fields from a loose JSON object such as the output of an
    /// extraction step. Values may be numbers or currency-formatted strings.
    pub fn from_json_map(map: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut fields = Self::default();

        for (key, value) in map {
            match key.parse::<FieldName>() {
                Ok(field) => {
                    if fields.get(field).is_some() {
                        continue;
                    }
                    let normalized = normalize_value(value);
                    if normalized.is_none() && !value.is_null() {
                        debug!("Field '{}' has unparseable value {}", key, value);
                    }
                    fields.set(field, normalized);
                }
                Err(_) => debug!("Ignoring unrecognized field '{}'", key),
            }
        }

        fields
    }

    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        match value.as_object() {
            Some(map) => Ok(Self::from_json_map(map)),
            None => Err(AnalysisError::ExtractionFailed(format!(
                "Expected a JSON object of financial fields, got {}",
                value
            ))),
        }
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(FinancialFields)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_name_parsing() {
        assert_eq!("net_income".parse::<FieldName>().unwrap(), FieldName::NetIncome);
        assert_eq!(" Revenue ".parse::<FieldName>().unwrap(), FieldName::Revenue);
        assert_eq!("sales".parse::<FieldName>().unwrap(), FieldName::Revenue);
        assert!("ebitda".parse::<FieldName>().is_err());

        for field in FieldName::ALL {
            assert_eq!(field.as_str().parse::<FieldName>().unwrap(), field);
        }
    }

    #[test]
    fn test_from_json_map_normalizes_values() {
        let value = json!({
            "revenue": "$1,200,000",
            "net_income": "(45,000)",
            "total_assets": 2_500_000,
            "equity": "n/a",
            "cash": null,
            "ebitda": 10,
        });

        let fields = FinancialFields::from_value(&value).unwrap();
        assert_eq!(fields.revenue, Some(1_200_000.0));
        assert_eq!(fields.net_income, Some(-45_000.0));
        assert_eq!(fields.total_assets, Some(2_500_000.0));
        assert_eq!(fields.equity, None);
        assert_eq!(fields.cash, None);
    }

    #[test]
    fn test_zero_is_distinct_from_unknown() {
        let fields = FinancialFields::from_value(&json!({"revenue": 0, "net_income": "abc"})).unwrap();
        assert_eq!(fields.revenue, Some(0.0));
        assert_eq!(fields.net_income, None);
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(FinancialFields::from_value(&json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_set_discards_non_finite() {
        let mut fields = FinancialFields::new();
        fields.set(FieldName::Revenue, Some(f64::NAN));
        fields.set(FieldName::Cash, Some(f64::INFINITY));
        assert!(fields.is_empty());
    }

    #[test]
    fn test_merge_missing_keeps_known_values() {
        let mut primary = FinancialFields::new().with(FieldName::Revenue, 100.0);
        let fallback = FinancialFields::new()
            .with(FieldName::Revenue, 999.0)
            .with(FieldName::NetIncome, 10.0);

        primary.merge_missing(&fallback);
        assert_eq!(primary.revenue, Some(100.0));
        assert_eq!(primary.net_income, Some(10.0));
    }

    #[test]
    fn test_serializes_unknown_as_null() {
        let fields = FinancialFields::new().with(FieldName::Revenue, 5.0);
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["revenue"], json!(5.0));
        assert!(json["net_income"].is_null());
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = FinancialFields::schema_as_json().unwrap();
        assert!(schema_json.contains("revenue"));
        assert!(schema_json.contains("operating_cash_flow"));
    }
}
