use crate::ratios::compute_ratios;
use crate::schema::FinancialFields;
use serde::{Deserialize, Serialize};

/// ROE expressed as profit margin x asset turnover x equity multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DupontDecomposition {
    /// Percent.
    pub profit_margin: f64,
    pub asset_turnover: f64,
    pub equity_multiplier: f64,
    /// Percent; agrees with the ratio engine's `roe`.
    pub roe_check: f64,
}

/// Returns `None` unless revenue, net income, total assets and equity are all
/// known and none of the denominators is zero.
///
/// The three factors come straight from [`compute_ratios`], so the product is
/// the ratio engine's ROE up to rounding.
pub fn compute_dupont(fields: &FinancialFields) -> Option<DupontDecomposition> {
    let ratios = compute_ratios(fields);

    let profit_margin = ratios.profit_margin?;
    let asset_turnover = ratios.asset_turnover?;
    let equity_multiplier = ratios.equity_multiplier?;
    let roe_check = profit_margin / 100.0 * asset_turnover * equity_multiplier * 100.0;

    Some(DupontDecomposition {
        profit_margin,
        asset_turnover,
        equity_multiplier,
        roe_check,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldName;
    use approx::assert_relative_eq;

    fn fields(revenue: f64, net_income: f64, assets: f64, equity: f64) -> FinancialFields {
        FinancialFields::new()
            .with(FieldName::Revenue, revenue)
            .with(FieldName::NetIncome, net_income)
            .with(FieldName::TotalAssets, assets)
            .with(FieldName::Equity, equity)
    }

    #[test]
    fn test_decomposition() {
        let d = compute_dupont(&fields(5_000_000.0, 500_000.0, 10_000_000.0, 4_000_000.0)).unwrap();
        assert_relative_eq!(d.profit_margin, 10.0);
        assert_relative_eq!(d.asset_turnover, 0.5);
        assert_relative_eq!(d.equity_multiplier, 2.5);
        assert_relative_eq!(d.roe_check, 12.5, max_relative = 1e-12);
    }

    #[test]
    fn test_roe_check_matches_ratio_engine() {
        let cases = [
            (1_234_567.0, 98_765.0, 7_654_321.0, 3_210_987.0),
            (10.0, -3.0, 7.0, 2.0),
            (0.003, 0.0001, 0.7, 0.11),
            (9.9e11, 1.7e10, 3.3e12, -4.1e11),
            (250.0, 0.0, 400.0, 100.0),
        ];

        for (revenue, net_income, assets, equity) in cases {
            let f = fields(revenue, net_income, assets, equity);
            let d = compute_dupont(&f).unwrap();
            let roe = compute_ratios(&f).roe.unwrap();
            assert_relative_eq!(d.roe_check, roe, max_relative = 1e-6, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_missing_or_zero_inputs() {
        assert!(compute_dupont(&FinancialFields::new()).is_none());
        assert!(compute_dupont(&fields(0.0, 10.0, 100.0, 50.0)).is_none());
        assert!(compute_dupont(&fields(100.0, 10.0, 0.0, 50.0)).is_none());
        assert!(compute_dupont(&fields(100.0, 10.0, 100.0, 0.0)).is_none());

        let no_income = FinancialFields::new()
            .with(FieldName::Revenue, 100.0)
            .with(FieldName::TotalAssets, 100.0)
            .with(FieldName::Equity, 50.0);
        assert!(compute_dupont(&no_income).is_none());
    }
}
