//! Rule-based red flags.
//!
//! Registry events (bankruptcy, liquidation, deregistration) come first and
//! are always critical. Financial rules follow, each evaluated independently
//! on ratios recomputed from the base facts. The share-capital and
//! repeated-loss rules also need the registered share capital and earlier
//! periods, which only [`RedFlagAnalyzer::analyze_record`] and
//! [`RedFlagAnalyzer::analyze_series`] have.

use crate::error::{AnalysisError, Result};
use bokslut_ixbrl::{AnnualReportRecord, FinancialFacts, TrendSeries};
use bokslut_ixbrl::ratios::round1;
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious an indicator is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Immediate concern
    Critical,
    /// Worth a closer look
    Warning,
    /// Context only
    Info,
}

/// What an indicator is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskCategory {
    /// Ongoing bankruptcy proceedings
    ActiveBankruptcy,
    /// Ongoing liquidation
    ActiveLiquidation,
    /// Removed from the register
    Deregistered,
    /// Equity below zero
    NegativeEquity,
    /// Equity below half of the registered share capital
    EquityBelowHalfShareCapital,
    /// Solvency below the threshold, or negative
    LowSolvency,
    /// Net result below zero
    NetLoss,
    /// Net loss in several recent years
    RepeatedLosses,
    /// Revenue fell more than the threshold year over year
    RevenueDecline,
    /// Liabilities above the threshold multiple of equity
    HighDebtToEquity,
    /// Profit margin below the threshold
    NegativeMargin,
}

impl RiskCategory {
    /// Stable upper-case code, e.g. `NEGATIVE_EQUITY`.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ActiveBankruptcy => "ACTIVE_BANKRUPTCY",
            Self::ActiveLiquidation => "ACTIVE_LIQUIDATION",
            Self::Deregistered => "DEREGISTERED",
            Self::NegativeEquity => "NEGATIVE_EQUITY",
            Self::EquityBelowHalfShareCapital => "EQUITY_BELOW_HALF_SHARE_CAPITAL",
            Self::LowSolvency => "LOW_SOLVENCY",
            Self::NetLoss => "NET_LOSS",
            Self::RepeatedLosses => "REPEATED_LOSSES",
            Self::RevenueDecline => "REVENUE_DECLINE",
            Self::HighDebtToEquity => "HIGH_DEBT_TO_EQUITY",
            Self::NegativeMargin => "NEGATIVE_MARGIN",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One detected risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskIndicator {
    /// Severity
    pub severity: Severity,
    /// Category
    pub category: RiskCategory,
    /// Human-readable description
    pub description: String,
    /// Observed value, if numeric
    pub value: Option<f64>,
    /// Threshold the value was compared against
    pub threshold: Option<f64>,
    /// Suggested follow-up
    pub recommendation: Option<String>,
}

impl RiskIndicator {
    fn new(severity: Severity, category: RiskCategory, description: impl Into<String>) -> Self {
        Self {
            severity,
            category,
            description: description.into(),
            value: None,
            threshold: None,
            recommendation: None,
        }
    }

    fn with_value(mut self, value: f64, threshold: Option<f64>) -> Self {
        self.value = Some(value);
        self.threshold = threshold;
        self
    }

    fn with_recommendation(mut self, recommendation: &str) -> Self {
        self.recommendation = Some(recommendation.to_string());
        self
    }

    /// Whether the indicator is critical.
    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

/// A registry event affecting the entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusEvent {
    /// Date the event was registered
    pub since: Option<NaiveDate>,
    /// Reason or reference as registered
    pub detail: Option<String>,
}

impl StatusEvent {
    fn since_text(&self) -> String {
        self.since
            .map_or_else(|| "unknown date".to_string(), |d| d.to_string())
    }
}

/// Registry status of an entity. The default is an active entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityStatus {
    /// Ongoing bankruptcy proceedings
    pub bankruptcy: Option<StatusEvent>,
    /// Ongoing liquidation
    pub liquidation: Option<StatusEvent>,
    /// Deregistration
    pub deregistered: Option<StatusEvent>,
}

impl EntityStatus {
    /// No registry event recorded.
    pub const fn is_active(&self) -> bool {
        self.bankruptcy.is_none() && self.liquidation.is_none() && self.deregistered.is_none()
    }
}

/// Thresholds for [`RedFlagAnalyzer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedFlagConfig {
    /// Solvency below this percentage is flagged (default: 10.0)
    pub low_solvency: f64,
    /// Revenue decline beyond this percentage is flagged (default: 20.0)
    pub revenue_decline: f64,
    /// Profit margin below this percentage is flagged (default: -10.0)
    pub negative_margin: f64,
    /// Liabilities above this multiple of equity are flagged (default: 3.0)
    pub high_debt_to_equity: f64,
    /// Most recent periods searched for loss years (default: 4)
    pub loss_history_periods: usize,
    /// Loss years that raise a warning (default: 2)
    pub repeated_losses_warning: usize,
    /// Loss years that raise a critical indicator (default: 3)
    pub repeated_losses_critical: usize,
}

impl Default for RedFlagConfig {
    fn default() -> Self {
        Self {
            low_solvency: 10.0,
            revenue_decline: 20.0,
            negative_margin: -10.0,
            high_debt_to_equity: 3.0,
            loss_history_periods: 4,
            repeated_losses_warning: 2,
            repeated_losses_critical: 3,
        }
    }
}

impl RedFlagConfig {
    /// Check that every threshold is finite and on the right side of zero.
    pub fn validate(&self) -> Result<()> {
        if !self.low_solvency.is_finite() || self.low_solvency < 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "low_solvency must be a non-negative percentage, got {}",
                self.low_solvency
            )));
        }
        if !self.revenue_decline.is_finite() || self.revenue_decline <= 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "revenue_decline must be a positive percentage, got {}",
                self.revenue_decline
            )));
        }
        if !self.negative_margin.is_finite() || self.negative_margin > 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "negative_margin must be zero or below, got {}",
                self.negative_margin
            )));
        }
        if !self.high_debt_to_equity.is_finite() || self.high_debt_to_equity <= 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "high_debt_to_equity must be a positive multiple, got {}",
                self.high_debt_to_equity
            )));
        }
        if self.repeated_losses_warning < 2
            || self.repeated_losses_critical < self.repeated_losses_warning
            || self.loss_history_periods < self.repeated_losses_critical
        {
            return Err(AnalysisError::InvalidConfig(format!(
                "loss years must satisfy 2 <= warning ({}) <= critical ({}) <= periods ({})",
                self.repeated_losses_warning,
                self.repeated_losses_critical,
                self.loss_history_periods
            )));
        }
        Ok(())
    }
}

/// Detects risk indicators from facts and registry status.
#[derive(Debug, Clone, Default)]
pub struct RedFlagAnalyzer {
    config: RedFlagConfig,
}

impl RedFlagAnalyzer {
    /// Create an analyzer, rejecting invalid thresholds.
    pub fn new(config: RedFlagConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration.
    pub const fn config(&self) -> &RedFlagConfig {
        &self.config
    }

    /// Evaluate the rules that need no more than two periods.
    ///
    /// `previous` is the prior period, used for the revenue-decline rule and
    /// counted towards repeated losses.
    pub fn analyze(
        &self,
        facts: &FinancialFacts,
        previous: Option<&FinancialFacts>,
        status: &EntityStatus,
    ) -> Vec<RiskIndicator> {
        let history: Vec<&FinancialFacts> = std::iter::once(facts).chain(previous).collect();
        self.evaluate(facts, previous, &history, None, status)
    }

    /// Evaluate every rule on one record, using its multi-year overview as
    /// the loss history.
    pub fn analyze_record(
        &self,
        record: &AnnualReportRecord,
        status: &EntityStatus,
    ) -> Vec<RiskIndicator> {
        let mut history: Vec<&FinancialFacts> =
            record.overview.points.iter().map(|p| &p.facts).collect();
        if history.is_empty() {
            history.push(&record.facts);
        }
        self.evaluate(
            &record.facts,
            record.previous_facts(),
            &history,
            record.share_capital,
            status,
        )
    }

    /// Evaluate every rule on the most recent period of a series.
    ///
    /// An empty series yields the registry-status indicators only.
    pub fn analyze_series(
        &self,
        series: &TrendSeries,
        share_capital: Option<i64>,
        status: &EntityStatus,
    ) -> Vec<RiskIndicator> {
        let Some(latest) = series.latest() else {
            return status_flags(status);
        };
        let history: Vec<&FinancialFacts> = series.points.iter().map(|p| &p.facts).collect();
        self.evaluate(
            &latest.facts,
            series.previous().map(|p| &p.facts),
            &history,
            share_capital,
            status,
        )
    }

    /// `history` is most recent first and starts with `facts`.
    fn evaluate(
        &self,
        facts: &FinancialFacts,
        previous: Option<&FinancialFacts>,
        history: &[&FinancialFacts],
        share_capital: Option<i64>,
        status: &EntityStatus,
    ) -> Vec<RiskIndicator> {
        let mut flags = status_flags(status);
        let ratios = facts.ratios();

        if let Some(equity) = facts.equity
            && equity < 0
        {
            flags.push(
                RiskIndicator::new(
                    Severity::Critical,
                    RiskCategory::NegativeEquity,
                    format!("Negative equity: {equity} SEK"),
                )
                .with_value(equity as f64, Some(0.0))
                .with_recommendation(
                    "A control balance sheet may be required under chapter 25 of the Companies Act",
                ),
            );
        }

        if let (Some(equity), Some(capital)) = (facts.equity, share_capital)
            && capital > 0
            && equity.saturating_mul(2) < capital
        {
            flags.push(
                RiskIndicator::new(
                    Severity::Critical,
                    RiskCategory::EquityBelowHalfShareCapital,
                    format!("Equity ({equity} SEK) is below half of the share capital ({capital} SEK)"),
                )
                .with_value(equity as f64, Some(capital as f64 / 2.0))
                .with_recommendation("A control balance sheet may be called for"),
            );
        }

        if let Some(solvency) = ratios.solvency {
            if solvency < 0.0 {
                flags.push(
                    RiskIndicator::new(
                        Severity::Critical,
                        RiskCategory::LowSolvency,
                        format!("Negative solvency: {solvency:.1}%"),
                    )
                    .with_value(solvency, Some(0.0))
                    .with_recommendation("Liabilities exceed assets"),
                );
            } else if solvency < self.config.low_solvency && facts.equity.is_some_and(|e| e >= 0)
            {
                flags.push(
                    RiskIndicator::new(
                        Severity::Warning,
                        RiskCategory::LowSolvency,
                        format!("Low solvency: {solvency:.1}%"),
                    )
                    .with_value(solvency, Some(self.config.low_solvency))
                    .with_recommendation("Consider strengthening equity"),
                );
            }
        }

        if let Some(net) = facts.net_result
            && net < 0
        {
            flags.push(
                RiskIndicator::new(
                    Severity::Warning,
                    RiskCategory::NetLoss,
                    format!("Net loss for the year: {net} SEK"),
                )
                .with_value(net as f64, Some(0.0))
                .with_recommendation("Review profitability and planned measures"),
            );
        }

        if let Some(flag) = self.repeated_losses(history) {
            flags.push(flag);
        }

        if let Some(change) = revenue_change(facts, previous)
            && change < -self.config.revenue_decline
        {
            flags.push(
                RiskIndicator::new(
                    Severity::Warning,
                    RiskCategory::RevenueDecline,
                    format!(
                        "Revenue decreased by {:.1}% from the previous year",
                        change.abs()
                    ),
                )
                .with_value(change, Some(-self.config.revenue_decline))
                .with_recommendation("Investigate the causes of the revenue decline"),
            );
        }

        if let Some(ratio) = debt_to_equity(facts)
            && ratio > self.config.high_debt_to_equity
        {
            flags.push(
                RiskIndicator::new(
                    Severity::Warning,
                    RiskCategory::HighDebtToEquity,
                    format!("High debt-to-equity ratio: {ratio:.1}x"),
                )
                .with_value(round1(ratio), Some(self.config.high_debt_to_equity))
                .with_recommendation("The company is highly leveraged"),
            );
        }

        if let Some(margin) = ratios.profit_margin
            && margin < self.config.negative_margin
        {
            flags.push(
                RiskIndicator::new(
                    Severity::Warning,
                    RiskCategory::NegativeMargin,
                    format!("Strongly negative profit margin: {margin:.1}%"),
                )
                .with_value(margin, Some(self.config.negative_margin))
                .with_recommendation("Revenue does not cover costs"),
            );
        }

        debug!("{} red flags raised", flags.len());
        flags
    }

    /// Loss years among the most recent periods; missing results do not count.
    fn repeated_losses(&self, history: &[&FinancialFacts]) -> Option<RiskIndicator> {
        let window = history.len().min(self.config.loss_history_periods);
        let losses = history[..window]
            .iter()
            .filter(|f| f.net_result.is_some_and(|net| net < 0))
            .count();
        let severity = if losses >= self.config.repeated_losses_critical {
            Severity::Critical
        } else if losses >= self.config.repeated_losses_warning {
            Severity::Warning
        } else {
            return None;
        };
        Some(
            RiskIndicator::new(
                severity,
                RiskCategory::RepeatedLosses,
                format!("Net loss in {losses} of the last {window} reported years"),
            )
            .with_value(losses as f64, Some(self.config.repeated_losses_warning as f64))
            .with_recommendation("Analyze profitability and take action"),
        )
    }
}

/// Registry-status indicators, in fixed order.
fn status_flags(status: &EntityStatus) -> Vec<RiskIndicator> {
    let mut flags = Vec::new();
    if let Some(event) = &status.bankruptcy {
        flags.push(
            RiskIndicator::new(
                Severity::Critical,
                RiskCategory::ActiveBankruptcy,
                format!("Ongoing bankruptcy since {}", event.since_text()),
            )
            .with_recommendation("The company is in bankruptcy proceedings; avoid new business"),
        );
    }
    if let Some(event) = &status.liquidation {
        flags.push(
            RiskIndicator::new(
                Severity::Critical,
                RiskCategory::ActiveLiquidation,
                format!("Ongoing liquidation since {}", event.since_text()),
            )
            .with_recommendation("The company is being wound up"),
        );
    }
    if let Some(event) = &status.deregistered {
        let reason = event
            .detail
            .as_deref()
            .map(|d| format!(" ({d})"))
            .unwrap_or_default();
        flags.push(
            RiskIndicator::new(
                Severity::Critical,
                RiskCategory::Deregistered,
                format!("Deregistered{reason} as of {}", event.since_text()),
            )
            .with_recommendation("The company no longer exists as a legal entity"),
        );
    }
    flags
}

/// Liabilities (total assets less equity) per unit of equity, when equity is
/// positive.
fn debt_to_equity(facts: &FinancialFacts) -> Option<f64> {
    let equity = facts.equity.filter(|e| *e > 0)?;
    let assets = facts.total_assets?;
    Some((assets - equity) as f64 / equity as f64)
}

/// Year-over-year revenue change in percent, one decimal, when the previous
/// revenue is positive.
fn revenue_change(facts: &FinancialFacts, previous: Option<&FinancialFacts>) -> Option<f64> {
    let current = facts.revenue?;
    let previous = previous?.revenue?;
    (previous > 0).then(|| round1((current - previous) as f64 / previous as f64 * 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn categories(flags: &[RiskIndicator]) -> Vec<(RiskCategory, Severity)> {
        flags.iter().map(|f| (f.category, f.severity)).collect()
    }

    fn analyze(facts: &FinancialFacts) -> Vec<RiskIndicator> {
        RedFlagAnalyzer::default().analyze(facts, None, &EntityStatus::default())
    }

    #[test]
    fn test_negative_equity_and_solvency() {
        let facts = FinancialFacts {
            equity: Some(-50_000),
            total_assets: Some(200_000),
            ..Default::default()
        };
        let flags = analyze(&facts);
        assert_eq!(
            categories(&flags),
            vec![
                (RiskCategory::NegativeEquity, Severity::Critical),
                (RiskCategory::LowSolvency, Severity::Critical),
            ]
        );
        assert_eq!(flags[1].value, Some(-25.0));
    }

    #[rstest]
    #[case(Some(5), Some(100), Some((RiskCategory::LowSolvency, Severity::Warning)))]
    #[case(Some(10), Some(100), None)]
    #[case(Some(0), Some(100), Some((RiskCategory::LowSolvency, Severity::Warning)))]
    #[case(Some(5), Some(0), None)]
    #[case(Some(5), None, None)]
    fn test_low_solvency(
        #[case] equity: Option<i64>,
        #[case] total_assets: Option<i64>,
        #[case] expected: Option<(RiskCategory, Severity)>,
    ) {
        let facts = FinancialFacts {
            equity,
            total_assets,
            ..Default::default()
        };
        let found = categories(&analyze(&facts))
            .into_iter()
            .find(|(category, _)| *category == RiskCategory::LowSolvency);
        assert_eq!(found, expected);
    }

    #[test]
    fn test_net_loss_and_negative_margin() {
        let facts = FinancialFacts {
            revenue: Some(1_000),
            net_result: Some(-200),
            ..Default::default()
        };
        assert_eq!(
            categories(&analyze(&facts)),
            vec![
                (RiskCategory::NetLoss, Severity::Warning),
                (RiskCategory::NegativeMargin, Severity::Warning),
            ]
        );

        let mild = FinancialFacts {
            revenue: Some(1_000),
            net_result: Some(-100),
            ..Default::default()
        };
        assert_eq!(
            categories(&analyze(&mild)),
            vec![(RiskCategory::NetLoss, Severity::Warning)]
        );
    }

    #[rstest]
    #[case(790, true)]
    #[case(800, false)]
    #[case(1_200, false)]
    fn test_revenue_decline(#[case] current: i64, #[case] flagged: bool) {
        let facts = FinancialFacts {
            revenue: Some(current),
            ..Default::default()
        };
        let previous = FinancialFacts {
            revenue: Some(1_000),
            ..Default::default()
        };
        let flags =
            RedFlagAnalyzer::default().analyze(&facts, Some(&previous), &EntityStatus::default());
        assert_eq!(
            flags.iter().any(|f| f.category == RiskCategory::RevenueDecline),
            flagged
        );
    }

    #[test]
    fn test_status_flags_come_first() {
        let status = EntityStatus {
            bankruptcy: Some(StatusEvent {
                since: NaiveDate::from_ymd_opt(2024, 2, 1),
                detail: None,
            }),
            deregistered: Some(StatusEvent {
                since: None,
                detail: Some("Konkurs avslutad".to_string()),
            }),
            ..Default::default()
        };
        let facts = FinancialFacts {
            equity: Some(-1),
            total_assets: Some(10),
            ..Default::default()
        };
        let flags = RedFlagAnalyzer::default().analyze(&facts, None, &status);
        assert_eq!(flags[0].category, RiskCategory::ActiveBankruptcy);
        assert_eq!(flags[0].description, "Ongoing bankruptcy since 2024-02-01");
        assert_eq!(flags[1].category, RiskCategory::Deregistered);
        assert!(flags[1].description.contains("Konkurs avslutad"));
        assert!(flags[..2].iter().all(RiskIndicator::is_critical));
        assert_eq!(flags[2].category, RiskCategory::NegativeEquity);
    }

    #[test]
    fn test_healthy_company_has_no_flags() {
        let facts = FinancialFacts {
            revenue: Some(10_000),
            net_result: Some(800),
            equity: Some(4_000),
            total_assets: Some(9_000),
            ..Default::default()
        };
        assert!(analyze(&facts).is_empty());
        assert!(EntityStatus::default().is_active());
    }

    #[rstest]
    #[case(Some(40_000), Some(100_000), Some(Severity::Critical))]
    #[case(Some(0), Some(100_000), Some(Severity::Critical))]
    #[case(Some(-10_000), Some(100_000), Some(Severity::Critical))]
    #[case(Some(50_000), Some(100_000), None)]
    #[case(Some(40_000), Some(0), None)]
    #[case(Some(40_000), None, None)]
    #[case(None, Some(100_000), None)]
    fn test_equity_below_half_share_capital(
        #[case] equity: Option<i64>,
        #[case] share_capital: Option<i64>,
        #[case] expected: Option<Severity>,
    ) {
        let mut series = TrendSeries::new();
        series.push(
            "2023-12-31",
            FinancialFacts {
                equity,
                ..Default::default()
            },
        );
        let flags =
            RedFlagAnalyzer::default().analyze_series(&series, share_capital, &EntityStatus::default());
        let found = flags
            .iter()
            .find(|f| f.category == RiskCategory::EquityBelowHalfShareCapital);
        assert_eq!(found.map(|f| f.severity), expected);
        if let Some(flag) = found {
            assert_eq!(flag.threshold, share_capital.map(|c| c as f64 / 2.0));
        }
    }

    #[rstest]
    #[case(&[-1, 5, 5, 5], None)]
    #[case(&[-1, 5, -1, 5], Some(Severity::Warning))]
    #[case(&[5, -1, -1, 5], Some(Severity::Warning))]
    #[case(&[-1, -1, 5, -1], Some(Severity::Critical))]
    #[case(&[-1, -1, -1, -1], Some(Severity::Critical))]
    #[case(&[-1, 5, 5, 5, -1, -1], None)]
    fn test_repeated_losses(#[case] results: &[i64], #[case] expected: Option<Severity>) {
        let series: TrendSeries = results
            .iter()
            .enumerate()
            .map(|(i, net)| bokslut_ixbrl::TrendPoint {
                label: format!("period{i}"),
                facts: FinancialFacts {
                    net_result: Some(*net),
                    ..Default::default()
                },
            })
            .collect();
        let flags = RedFlagAnalyzer::default().analyze_series(&series, None, &EntityStatus::default());
        let found = flags.iter().find(|f| f.category == RiskCategory::RepeatedLosses);
        assert_eq!(found.map(|f| f.severity), expected);
    }

    #[test]
    fn test_two_period_analysis_counts_previous_loss() {
        let facts = FinancialFacts {
            net_result: Some(-10),
            ..Default::default()
        };
        let previous = FinancialFacts {
            net_result: Some(-20),
            ..Default::default()
        };
        let flags =
            RedFlagAnalyzer::default().analyze(&facts, Some(&previous), &EntityStatus::default());
        assert_eq!(
            categories(&flags),
            vec![
                (RiskCategory::NetLoss, Severity::Warning),
                (RiskCategory::RepeatedLosses, Severity::Warning),
            ]
        );
        assert_eq!(flags[1].description, "Net loss in 2 of the last 2 reported years");
    }

    #[rstest]
    #[case(Some(200), Some(1_000), true)]
    #[case(Some(250), Some(1_000), false)]
    #[case(Some(400), Some(1_000), false)]
    #[case(Some(-100), Some(1_000), false)]
    #[case(Some(200), None, false)]
    fn test_high_debt_to_equity(
        #[case] equity: Option<i64>,
        #[case] total_assets: Option<i64>,
        #[case] flagged: bool,
    ) {
        let facts = FinancialFacts {
            equity,
            total_assets,
            ..Default::default()
        };
        let flags = analyze(&facts);
        let found = flags
            .iter()
            .find(|f| f.category == RiskCategory::HighDebtToEquity);
        assert_eq!(found.is_some(), flagged);
        if let Some(flag) = found {
            assert_eq!(flag.severity, Severity::Warning);
            assert_eq!(flag.value, Some(4.0));
            assert_eq!(flag.description, "High debt-to-equity ratio: 4.0x");
        }
    }

    #[test]
    fn test_record_uses_share_capital_and_overview() {
        let text = r#"<html><body>
            <ix:nonFraction name="se-gen-base:AretsResultat" contextRef="period0" sign="-">10</ix:nonFraction>
            <ix:nonFraction name="se-gen-base:AretsResultat" contextRef="period1" sign="-">20</ix:nonFraction>
            <ix:nonFraction name="se-gen-base:AretsResultat" contextRef="period2" sign="-">30</ix:nonFraction>
            <ix:nonFraction name="se-gen-base:EgetKapital" contextRef="balans0">20000</ix:nonFraction>
            <ix:nonFraction name="se-gen-base:Tillgangar" contextRef="balans0">60000</ix:nonFraction>
            <ix:nonFraction name="se-gen-base:Aktiekapital" contextRef="balans0">50000</ix:nonFraction>
        </body></html>"#;
        let record = bokslut_ixbrl::Extractor::new().extract(text).unwrap();
        assert_eq!(record.share_capital, Some(50_000));

        let flags = RedFlagAnalyzer::default().analyze_record(&record, &EntityStatus::default());
        assert_eq!(
            categories(&flags),
            vec![
                (RiskCategory::EquityBelowHalfShareCapital, Severity::Critical),
                (RiskCategory::NetLoss, Severity::Warning),
                (RiskCategory::RepeatedLosses, Severity::Critical),
            ]
        );
    }

    #[test]
    fn test_empty_series_yields_status_flags_only() {
        let status = EntityStatus {
            liquidation: Some(StatusEvent::default()),
            ..Default::default()
        };
        let flags = RedFlagAnalyzer::default().analyze_series(&TrendSeries::new(), Some(1), &status);
        assert_eq!(
            categories(&flags),
            vec![(RiskCategory::ActiveLiquidation, Severity::Critical)]
        );
    }

    #[rstest]
    #[case(RedFlagConfig { low_solvency: -1.0, ..Default::default() })]
    #[case(RedFlagConfig { revenue_decline: 0.0, ..Default::default() })]
    #[case(RedFlagConfig { negative_margin: 5.0, ..Default::default() })]
    #[case(RedFlagConfig { low_solvency: f64::NAN, ..Default::default() })]
    #[case(RedFlagConfig { high_debt_to_equity: 0.0, ..Default::default() })]
    #[case(RedFlagConfig { repeated_losses_warning: 1, ..Default::default() })]
    #[case(RedFlagConfig { repeated_losses_critical: 1, ..Default::default() })]
    #[case(RedFlagConfig { loss_history_periods: 2, ..Default::default() })]
    fn test_invalid_config(#[case] config: RedFlagConfig) {
        assert!(matches!(
            RedFlagAnalyzer::new(config),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_category_codes() {
        assert_eq!(RiskCategory::LowSolvency.to_string(), "LOW_SOLVENCY");
        assert_eq!(
            RiskCategory::EquityBelowHalfShareCapital.code(),
            "EQUITY_BELOW_HALF_SHARE_CAPITAL"
        );
        assert_eq!(
            serde_json::to_string(&RiskCategory::HighDebtToEquity).unwrap(),
            "\"HIGH_DEBT_TO_EQUITY\""
        );
        assert_eq!(
            serde_json::to_string(&RiskCategory::NegativeEquity).unwrap(),
            "\"NEGATIVE_EQUITY\""
        );
    }
}
