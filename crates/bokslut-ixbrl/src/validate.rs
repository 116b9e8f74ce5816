//! Plausibility checks on extracted base facts.
//!
//! Every check is independent and only ever adds warnings; the facts
//! themselves are left as extracted.

use crate::model::{FinancialFacts, ParseWarning, WarningKind};
use crate::ratios::Ratios;
use serde::{Deserialize, Serialize};

/// Configuration for [`ConsistencyValidator`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Pre-tax and net result with opposite signs are flagged when the
    /// larger magnitude exceeds this multiple of the smaller (default: 2.0)
    pub sign_disagreement_factor: f64,
    /// Margins beyond ± this many percent are flagged (default: 500.0)
    pub implausible_margin: f64,
    /// Fewer populated base facts than this is flagged (default: 2)
    pub min_populated_facts: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            sign_disagreement_factor: 2.0,
            implausible_margin: 500.0,
            min_populated_facts: 2,
        }
    }
}

/// Cross-checks base facts.
#[derive(Debug, Clone, Default)]
pub struct ConsistencyValidator {
    config: ValidatorConfig,
}

impl ConsistencyValidator {
    /// Create a validator.
    pub const fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Run every check.
    pub fn validate(&self, facts: &FinancialFacts) -> Vec<ParseWarning> {
        let mut warnings = Vec::new();

        if let (Some(pre_tax), Some(net)) = (facts.profit_after_financial_items, facts.net_result)
            && pre_tax.signum() * net.signum() < 0
        {
            let (small, large) = if pre_tax.unsigned_abs() < net.unsigned_abs() {
                (pre_tax.unsigned_abs(), net.unsigned_abs())
            } else {
                (net.unsigned_abs(), pre_tax.unsigned_abs())
            };
            if large as f64 > small as f64 * self.config.sign_disagreement_factor {
                warnings.push(
                    ParseWarning::new(
                        WarningKind::InconsistentData,
                        "net_result",
                        "result after financial items and net result have opposite signs and very different magnitudes",
                    )
                    .with_value(format!("{pre_tax} / {net}")),
                );
            }
        }

        if let (Some(equity), Some(net)) = (facts.equity, facts.net_result)
            && equity < 0
            && net > 0
        {
            warnings.push(
                ParseWarning::new(
                    WarningKind::InconsistentData,
                    "equity",
                    "negative equity despite a positive net result",
                )
                .with_value(equity.to_string()),
            );
        }

        if let Some(margin) = Ratios::from_facts(facts).profit_margin
            && margin.abs() > self.config.implausible_margin
        {
            warnings.push(
                ParseWarning::new(
                    WarningKind::InconsistentData,
                    "profit_margin",
                    "implausible profit margin, probably an extraction error",
                )
                .with_value(format!("{margin:.1}%")),
            );
        }

        let populated = facts.populated();
        if populated < self.config.min_populated_facts {
            warnings.push(
                ParseWarning::new(
                    WarningKind::MissingData,
                    "facts",
                    format!("only {populated} of 6 base facts could be extracted"),
                )
                .with_value(populated.to_string()),
            );
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn fields(warnings: &[ParseWarning]) -> Vec<&str> {
        warnings.iter().map(|w| w.field.as_str()).collect()
    }

    #[rstest]
    #[case(100, -300, true)]
    #[case(-300, 100, true)]
    #[case(100, -200, false)]
    #[case(100, -150, false)]
    #[case(100, 300, false)]
    #[case(0, -300, false)]
    fn test_sign_disagreement(#[case] pre_tax: i64, #[case] net: i64, #[case] flagged: bool) {
        let facts = FinancialFacts {
            profit_after_financial_items: Some(pre_tax),
            net_result: Some(net),
            ..Default::default()
        };
        let warnings = ConsistencyValidator::default().validate(&facts);
        assert_eq!(fields(&warnings).contains(&"net_result"), flagged);
    }

    #[test]
    fn test_negative_equity_with_profit() {
        let facts = FinancialFacts {
            equity: Some(-10),
            net_result: Some(5),
            ..Default::default()
        };
        let warnings = ConsistencyValidator::default().validate(&facts);
        assert_eq!(fields(&warnings), vec!["equity"]);
        assert_eq!(warnings[0].kind, WarningKind::InconsistentData);
    }

    #[test]
    fn test_implausible_margin() {
        let facts = FinancialFacts {
            revenue: Some(1_000),
            net_result: Some(6_000),
            ..Default::default()
        };
        let warnings = ConsistencyValidator::default().validate(&facts);
        assert_eq!(fields(&warnings), vec!["profit_margin"]);
        assert_eq!(warnings[0].value.as_deref(), Some("600.0%"));
    }

    #[test]
    fn test_too_few_facts() {
        let facts = FinancialFacts {
            revenue: Some(1_000),
            ..Default::default()
        };
        let warnings = ConsistencyValidator::default().validate(&facts);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::MissingData);

        let empty = ConsistencyValidator::default().validate(&FinancialFacts::default());
        assert_eq!(empty[0].value.as_deref(), Some("0"));
    }

    #[test]
    fn test_consistent_facts_pass() {
        let facts = FinancialFacts {
            revenue: Some(5_000_000),
            profit_after_financial_items: Some(400_000),
            net_result: Some(310_000),
            equity: Some(1_200_000),
            total_assets: Some(3_000_000),
            average_employees: Some(7),
            ..Default::default()
        };
        assert!(ConsistencyValidator::default().validate(&facts).is_empty());
    }
}
