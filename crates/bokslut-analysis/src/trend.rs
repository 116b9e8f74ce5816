//! Period-over-period growth and guarded projections.
//!
//! The engine reads a [`TrendSeries`] as given: index 0 is the most recent
//! period and nothing is reordered or deduplicated. A projection is a single
//! linear step, `current × (1 + growth)`, and is withheld whenever one of the
//! guardrails fires. A withheld projection always carries a note.

use crate::error::{AnalysisError, Result};
use bokslut_ixbrl::ratios::round1;
use bokslut_ixbrl::{FinancialFacts, TrendSeries};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Note recorded when growth exceeds the configured bound.
pub const GROWTH_TOO_EXTREME: &str = "growth too extreme";

/// A metric followed across periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendMetric {
    /// Net revenue
    Revenue,
    /// Result after financial items
    ProfitAfterFinancialItems,
    /// Net result
    NetResult,
    /// Equity
    Equity,
    /// Total assets
    TotalAssets,
    /// Average employees
    AverageEmployees,
    /// Solvency percentage
    Solvency,
}

impl TrendMetric {
    /// Every metric, in report order.
    pub const ALL: [Self; 7] = [
        Self::Revenue,
        Self::ProfitAfterFinancialItems,
        Self::NetResult,
        Self::Equity,
        Self::TotalAssets,
        Self::AverageEmployees,
        Self::Solvency,
    ];

    /// Snake-case field name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::ProfitAfterFinancialItems => "profit_after_financial_items",
            Self::NetResult => "net_result",
            Self::Equity => "equity",
            Self::TotalAssets => "total_assets",
            Self::AverageEmployees => "average_employees",
            Self::Solvency => "solvency",
        }
    }

    /// Value of the metric in one period. Solvency is recomputed from the
    /// base facts.
    pub fn value(&self, facts: &FinancialFacts) -> Option<f64> {
        let amount = match self {
            Self::Revenue => facts.revenue,
            Self::ProfitAfterFinancialItems => facts.profit_after_financial_items,
            Self::NetResult => facts.net_result,
            Self::Equity => facts.equity,
            Self::TotalAssets => facts.total_assets,
            Self::AverageEmployees => facts.average_employees,
            Self::Solvency => return facts.ratios().solvency,
        };
        amount.map(|v| v as f64)
    }

    /// Whether the metric is a percentage rather than an amount.
    pub const fn is_ratio(&self) -> bool {
        matches!(self, Self::Solvency)
    }
}

impl fmt::Display for TrendMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Trend of one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTrend {
    /// Metric
    pub metric: TrendMetric,
    /// Most recent value
    pub current: Option<f64>,
    /// Value one period earlier
    pub previous: Option<f64>,
    /// Growth from previous to current, percent, one decimal
    pub growth: Option<f64>,
    /// Next-period projection; whole units for amounts, one decimal for ratios
    pub projection: Option<f64>,
    /// Compound annual growth over the whole series, percent, two decimals
    pub cagr: Option<f64>,
    /// Why no projection was made
    pub note: Option<String>,
}

/// Result of [`TrendEngine::analyze`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    /// Period labels in series order
    pub periods: Vec<String>,
    /// One entry per [`TrendMetric`]
    pub metrics: Vec<MetricTrend>,
    /// Withheld projections and other remarks, `metric: reason`
    pub warnings: Vec<String>,
}

impl TrendResult {
    /// Trend of one metric.
    pub fn metric(&self, metric: TrendMetric) -> Option<&MetricTrend> {
        self.metrics.iter().find(|m| m.metric == metric)
    }
}

/// Guardrail settings for [`TrendEngine`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Growth beyond ± this percentage is not projected (default: 500.0)
    pub max_growth: f64,
    /// A projection that flips sign and exceeds this multiple of the current
    /// magnitude is withheld (default: 2.0)
    pub sign_flip_factor: f64,
    /// Projected solvency beyond ± this percentage is withheld (default: 100.0)
    pub solvency_bound: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            max_growth: 500.0,
            sign_flip_factor: 2.0,
            solvency_bound: 100.0,
        }
    }
}

impl TrendConfig {
    /// Check that every bound is finite and positive.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("max_growth", self.max_growth),
            ("sign_flip_factor", self.sign_flip_factor),
            ("solvency_bound", self.solvency_bound),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Computes growth, CAGR and projections over a series.
#[derive(Debug, Clone, Default)]
pub struct TrendEngine {
    config: TrendConfig,
}

impl TrendEngine {
    /// Create an engine, rejecting invalid bounds.
    pub fn new(config: TrendConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration.
    pub const fn config(&self) -> &TrendConfig {
        &self.config
    }

    /// Analyze every metric of a most-recent-first series.
    pub fn analyze(&self, series: &TrendSeries) -> TrendResult {
        let mut result = TrendResult {
            periods: series.labels(),
            ..Default::default()
        };
        if series.len() < 2 {
            result
                .warnings
                .push("series: at least two periods are needed for growth".to_string());
        }

        for metric in TrendMetric::ALL {
            let trend = self.metric_trend(series, metric);
            if let Some(note) = &trend.note {
                result.warnings.push(format!("{metric}: {note}"));
            }
            result.metrics.push(trend);
        }

        debug!(
            "trend over {} periods, {} warnings",
            series.len(),
            result.warnings.len()
        );
        result
    }

    fn metric_trend(&self, series: &TrendSeries, metric: TrendMetric) -> MetricTrend {
        let current = series.latest().and_then(|p| metric.value(&p.facts));
        let previous = series.previous().and_then(|p| metric.value(&p.facts));
        let growth = growth_rate(current, previous);

        let cagr = if metric.is_ratio() {
            None
        } else {
            let oldest = series.points.last().and_then(|p| metric.value(&p.facts));
            cagr(current, oldest, series.len().saturating_sub(1))
        };

        let (projection, note) = match (current, previous, growth) {
            (Some(current), _, Some(growth)) => {
                match self.project(metric, current, previous, growth) {
                    Ok(projection) => (Some(projection), None),
                    Err(reason) => (None, Some(reason)),
                }
            }
            (Some(_), Some(_), None) => (None, Some("previous value is zero".to_string())),
            (Some(_), None, _) if series.len() >= 2 => {
                (None, Some("no previous value".to_string()))
            }
            (None, Some(_), _) => (None, Some("no current value".to_string())),
            _ => (None, None),
        };

        MetricTrend {
            metric,
            current,
            previous,
            growth,
            projection,
            cagr,
            note,
        }
    }

    /// Apply the guardrails in order; the first that fires wins.
    fn project(
        &self,
        metric: TrendMetric,
        current: f64,
        previous: Option<f64>,
        growth: f64,
    ) -> std::result::Result<f64, String> {
        let raw = current * (1.0 + growth / 100.0);
        let projected = if metric.is_ratio() {
            round1(raw)
        } else {
            raw.round()
        };

        if metric == TrendMetric::Solvency {
            if current <= 0.0 || previous.is_none_or(|p| p <= 0.0) {
                return Err("solvency not positive in both periods".to_string());
            }
            if projected.abs() > self.config.solvency_bound {
                return Err(format!(
                    "projected solvency {projected:.1}% out of range"
                ));
            }
        }

        if growth.abs() > self.config.max_growth {
            return Err(GROWTH_TOO_EXTREME.to_string());
        }

        if projected.signum() != current.signum()
            && projected != 0.0
            && projected.abs() > self.config.sign_flip_factor * current.abs()
        {
            return Err("projection flips sign".to_string());
        }

        Ok(projected)
    }
}

/// Growth from `previous` to `current` in percent, one decimal.
///
/// `None` when either value is missing or `previous` is zero. The
/// denominator is `|previous|`, so growth from a loss toward profit is
/// positive.
pub fn growth_rate(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    let (current, previous) = (current?, previous?);
    if previous == 0.0 {
        return None;
    }
    Some(round1((current - previous) / previous.abs() * 100.0))
}

/// Compound annual growth in percent, two decimals.
///
/// `None` unless both endpoints are positive and at least one year separates them.
pub fn cagr(latest: Option<f64>, oldest: Option<f64>, years: usize) -> Option<f64> {
    let (latest, oldest) = (latest?, oldest?);
    if years == 0 || latest <= 0.0 || oldest <= 0.0 {
        return None;
    }
    let rate = ((latest / oldest).powf(1.0 / years as f64) - 1.0) * 100.0;
    Some((rate * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn revenue_series(values: &[i64]) -> TrendSeries {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| bokslut_ixbrl::TrendPoint {
                label: format!("{}", 2023 - i),
                facts: FinancialFacts {
                    revenue: Some(*v),
                    ..Default::default()
                },
            })
            .collect()
    }

    #[rstest]
    #[case(Some(120.0), Some(100.0), Some(20.0))]
    #[case(Some(50.0), Some(-100.0), Some(150.0))]
    #[case(Some(-150.0), Some(-100.0), Some(-50.0))]
    #[case(Some(1.0), Some(3.0), Some(-66.7))]
    #[case(Some(10.0), Some(0.0), None)]
    #[case(None, Some(1.0), None)]
    fn test_growth_rate(
        #[case] current: Option<f64>,
        #[case] previous: Option<f64>,
        #[case] expected: Option<f64>,
    ) {
        assert_eq!(growth_rate(current, previous), expected);
    }

    #[rstest]
    #[case(&[120, 100], Some(20.0), Some(144.0), None)]
    #[case(&[600, 100], Some(500.0), Some(3_600.0), None)]
    #[case(&[700, 100], Some(600.0), None, Some(GROWTH_TOO_EXTREME))]
    #[case(&[-300, 100], Some(-400.0), None, Some("projection flips sign"))]
    #[case(&[-50, 100], Some(-150.0), Some(25.0), None)]
    fn test_revenue_projection(
        #[case] values: &[i64],
        #[case] growth: Option<f64>,
        #[case] projection: Option<f64>,
        #[case] note: Option<&str>,
    ) {
        let result = TrendEngine::default().analyze(&revenue_series(values));
        let revenue = result.metric(TrendMetric::Revenue).unwrap();
        assert_eq!(revenue.growth, growth);
        assert_eq!(revenue.projection, projection);
        assert_eq!(revenue.note.as_deref(), note);
    }

    #[test]
    fn test_extreme_growth_is_reported() {
        let result = TrendEngine::default().analyze(&revenue_series(&[700, 100]));
        assert!(
            result
                .warnings
                .contains(&"revenue: growth too extreme".to_string())
        );
    }

    fn solvency_series(current: (i64, i64), previous: (i64, i64)) -> TrendSeries {
        [current, previous]
            .iter()
            .map(|(equity, assets)| bokslut_ixbrl::TrendPoint {
                label: String::new(),
                facts: FinancialFacts {
                    equity: Some(*equity),
                    total_assets: Some(*assets),
                    ..Default::default()
                },
            })
            .collect()
    }

    #[test]
    fn test_solvency_guardrails() {
        let engine = TrendEngine::default();

        let fine = engine.analyze(&solvency_series((30, 100), (25, 100)));
        let solvency = fine.metric(TrendMetric::Solvency).unwrap();
        assert_eq!(solvency.growth, Some(20.0));
        assert_eq!(solvency.projection, Some(36.0));
        assert_eq!(solvency.cagr, None);

        let negative = engine.analyze(&solvency_series((30, 100), (-5, 100)));
        let solvency = negative.metric(TrendMetric::Solvency).unwrap();
        assert_eq!(solvency.projection, None);
        assert!(solvency.note.as_deref().unwrap().contains("not positive"));

        let out_of_range = engine.analyze(&solvency_series((90, 100), (30, 100)));
        let solvency = out_of_range.metric(TrendMetric::Solvency).unwrap();
        assert_eq!(solvency.growth, Some(200.0));
        assert_eq!(solvency.projection, None);
        assert!(solvency.note.as_deref().unwrap().contains("out of range"));
    }

    #[test]
    fn test_cagr_over_series() {
        let result = TrendEngine::default().analyze(&revenue_series(&[121, 110, 100]));
        let revenue = result.metric(TrendMetric::Revenue).unwrap();
        assert_relative_eq!(revenue.cagr.unwrap(), 10.0);

        assert_eq!(cagr(Some(100.0), Some(-5.0), 2), None);
        assert_eq!(cagr(Some(100.0), Some(50.0), 0), None);
    }

    #[test]
    fn test_single_period_series() {
        let result = TrendEngine::default().analyze(&revenue_series(&[100]));
        let revenue = result.metric(TrendMetric::Revenue).unwrap();
        assert_eq!(revenue.current, Some(100.0));
        assert_eq!(revenue.growth, None);
        assert_eq!(revenue.projection, None);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_missing_previous_value_is_noted() {
        let mut series = revenue_series(&[100]);
        series.push("2022", FinancialFacts::default());
        let result = TrendEngine::default().analyze(&series);
        let revenue = result.metric(TrendMetric::Revenue).unwrap();
        assert_eq!(revenue.note.as_deref(), Some("no previous value"));
    }

    #[test]
    fn test_invalid_config() {
        let config = TrendConfig {
            max_growth: 0.0,
            ..Default::default()
        };
        assert!(TrendEngine::new(config).is_err());
    }
}
