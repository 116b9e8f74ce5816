//! Key ratios derived from base facts.

use crate::model::FinancialFacts;
use serde::{Deserialize, Serialize};

/// Solvency, margin and return ratios in percent, one decimal.
///
/// A ratio is `None` when its denominator is missing, zero or negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Ratios {
    /// Equity / total assets × 100
    pub solvency: Option<f64>,
    /// Net result / revenue × 100
    pub profit_margin: Option<f64>,
    /// Net result / equity × 100
    pub return_on_equity: Option<f64>,
}

impl Ratios {
    /// Compute all ratios from base facts.
    pub fn from_facts(facts: &FinancialFacts) -> Self {
        Self {
            solvency: percentage(facts.equity, facts.total_assets),
            profit_margin: percentage(facts.net_result, facts.revenue),
            return_on_equity: percentage(facts.net_result, facts.equity),
        }
    }
}

/// `numerator / denominator × 100`, one decimal, when the denominator is positive.
pub fn percentage(numerator: Option<i64>, denominator: Option<i64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d > 0 => Some(round1(n as f64 / d as f64 * 100.0)),
        _ => None,
    }
}

/// Round to one decimal, half away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
