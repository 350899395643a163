use crate::benchmark::BenchmarkTable;
use crate::error::{AnalysisError, Result};
use crate::risks::RiskThresholds;
use crate::trends::DEFAULT_TREND_EPSILON;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Immutable reference data shared by the engines. Built once and passed by
/// reference into each analysis; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzerConfig {
    #[serde(default)]
    #[schemars(description = "Thresholds for the rule-based risk checks")]
    pub risk_thresholds: RiskThresholds,

    #[serde(default)]
    #[schemars(description = "Reference ratios per industry. Must contain 'general'.")]
    pub benchmarks: BenchmarkTable,

    #[serde(default = "default_trend_epsilon")]
    #[schemars(description = "Positive growth rates at or below this value are reported as stable")]
    pub trend_epsilon: f64,
}

fn default_trend_epsilon() -> f64 {
    DEFAULT_TREND_EPSILON
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            risk_thresholds: RiskThresholds::default(),
            benchmarks: BenchmarkTable::default(),
            trend_epsilon: DEFAULT_TREND_EPSILON,
        }
    }
}

impl AnalyzerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.trend_epsilon.is_finite() || self.trend_epsilon < 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "trend_epsilon must be a non-negative finite number (got {})",
                self.trend_epsilon
            )));
        }
        self.risk_thresholds.validate()?;
        self.benchmarks.validate()?;
        Ok(())
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::Industry;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        assert!(AnalyzerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = AnalyzerConfig::from_json_str(
            r#"{ "risk_thresholds": { "min_profit_margin": 3.0, "max_debt_to_asset_ratio": 70.0, "min_net_income": 0.0, "min_roa": 1.0 } }"#,
        )
        .unwrap();

        assert_eq!(config.risk_thresholds.min_profit_margin, 3.0);
        assert_eq!(config.trend_epsilon, DEFAULT_TREND_EPSILON);
        assert!(config.benchmarks.baseline(Industry::Retail).is_some());
    }

    #[test]
    fn test_rejects_negative_epsilon() {
        let err = AnalyzerConfig::from_json_str(r#"{ "trend_epsilon": -1.0 }"#).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_table_without_general() {
        let json = r#"{ "benchmarks": { "retail": { "ratios": { "profit_margin": 6.0 } } } }"#;
        assert!(AnalyzerConfig::from_json_str(json).is_err());
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let err = AnalyzerConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, AnalysisError::SerializationError(_)));
    }

    #[test]
    fn test_from_path_roundtrip() {
        let config = AnalyzerConfig::default();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_json().unwrap().as_bytes()).unwrap();

        let loaded = AnalyzerConfig::from_path(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AnalyzerConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, AnalysisError::IoError(_)));
    }
}
