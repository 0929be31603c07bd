//! The result of a computation run.

use fifotax_core::{Decimal, RealizedEvent};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::context::OpenLot;
use crate::error::RunWarning;

/// Dividend income in the reporting currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DividendSummary {
    /// Number of payments included.
    pub payments: usize,
    /// Gross income before withholding.
    pub gross: Decimal,
    /// Tax withheld at source.
    pub withheld: Decimal,
    /// Net income received.
    pub net: Decimal,
    /// Gross income per symbol.
    pub by_symbol: BTreeMap<String, Decimal>,
}

/// Capital gains report.
///
/// Every amount is in [`TaxReport::reporting_currency`], unrounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxReport {
    /// Currency of all amounts.
    pub reporting_currency: String,
    /// Year the report is scoped to, if any.
    pub tax_year: Option<i32>,
    /// Net profit or loss per symbol.
    pub per_symbol: BTreeMap<String, Decimal>,
    /// Sum of the positive per-symbol totals.
    pub total_profit: Decimal,
    /// Sum of the negative per-symbol totals. Zero or negative.
    pub total_loss: Decimal,
    /// `total_profit + total_loss`.
    pub net_profit_loss: Decimal,
    /// Converted transaction fees and commissions.
    pub total_commission: Decimal,
    /// `net_profit_loss - total_commission`.
    pub net_after_commission: Decimal,
    /// Dividend income.
    pub dividends: DividendSummary,
    /// `net_after_commission + dividends.gross`.
    pub total_taxable_income: Decimal,
    /// Symbols sold while no lot was open, in first-seen order.
    pub symbols_without_lots: Vec<String>,
    /// Sold quantity left without a lot, per symbol.
    pub unmatched: BTreeMap<String, Decimal>,
    /// Every lot/sale match, in processing order.
    pub events: Vec<RealizedEvent>,
    /// Lots still open at the end of the run.
    pub open_lots: BTreeMap<String, Vec<OpenLot>>,
}

/// Whether a run used every input row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// No warnings.
    Complete,
    /// Some rows were skipped or degraded; see [`TaxRun::warnings`].
    Partial,
}

/// A finished run: the report plus everything that went wrong on the way.
#[derive(Debug, Clone)]
pub struct TaxRun {
    /// Complete or partial.
    pub status: RunStatus,
    /// The report.
    pub report: TaxReport,
    /// Row-level warnings, in the order they were raised.
    pub warnings: Vec<RunWarning>,
}

impl TaxRun {
    /// Build a run result; the status follows from the warnings.
    pub fn new(report: TaxReport, warnings: Vec<RunWarning>) -> Self {
        let status = if warnings.is_empty() {
            RunStatus::Complete
        } else {
            RunStatus::Partial
        };
        Self {
            status,
            report,
            warnings,
        }
    }

    /// Returns true if no row was skipped or degraded.
    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Complete
    }
}
