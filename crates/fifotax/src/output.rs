//! Rendering of a finished run.
//!
//! Text output rounds amounts to two decimal places for reading. JSON output
//! carries the unrounded figures.

use clap::ValueEnum;
use fifotax_engine::{OptionWarning, RunStatus, RunWarning, TaxReport, TaxRun};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::io::{self, Write};

/// Output format for the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// JSON output for tooling
    Json,
}

/// A warning in JSON form.
#[derive(Debug, Serialize)]
pub struct JsonWarning {
    /// Warning code (`data-error`, `lookup-missing`, `unmatched-quantity`, or
    /// an option code such as `O002`).
    pub code: String,
    /// Warning message.
    pub message: String,
}

impl From<&RunWarning> for JsonWarning {
    fn from(warning: &RunWarning) -> Self {
        Self {
            code: warning.kind().code().to_string(),
            message: warning.to_string(),
        }
    }
}

impl From<&OptionWarning> for JsonWarning {
    fn from(warning: &OptionWarning) -> Self {
        Self {
            code: warning.code.to_string(),
            message: warning.message.clone(),
        }
    }
}

/// JSON output structure for a run.
#[derive(Debug, Serialize)]
pub struct JsonOutput<'a> {
    /// `complete` or `partial`.
    pub status: RunStatus,
    /// The full report.
    pub report: &'a TaxReport,
    /// Row-level warnings.
    pub warnings: Vec<JsonWarning>,
    /// Problems with the supplied options.
    pub option_warnings: Vec<JsonWarning>,
}

impl<'a> JsonOutput<'a> {
    /// Collect a run and the option warnings that preceded it.
    pub fn new(run: &'a TaxRun, option_warnings: &[OptionWarning]) -> Self {
        Self {
            status: run.status,
            report: &run.report,
            warnings: run.warnings.iter().map(JsonWarning::from).collect(),
            option_warnings: option_warnings.iter().map(JsonWarning::from).collect(),
        }
    }
}

/// Write the run as pretty-printed JSON.
pub fn write_json<W: Write>(
    run: &TaxRun,
    option_warnings: &[OptionWarning],
    writer: &mut W,
) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &JsonOutput::new(run, option_warnings))?;
    writeln!(writer)
}

/// Write the run as a text report.
///
/// With `details`, every realized event and every open lot is listed too.
pub fn write_text<W: Write>(run: &TaxRun, details: bool, writer: &mut W) -> io::Result<()> {
    let report = &run.report;
    let scope = report
        .tax_year
        .map_or_else(|| "all years".to_string(), |year| format!("tax year {year}"));

    writeln!(
        writer,
        "Capital gains report ({}, {scope})",
        report.reporting_currency
    )?;
    writeln!(writer, "{}", "=".repeat(60))?;
    writeln!(writer)?;

    if !report.per_symbol.is_empty() {
        writeln!(writer, "Per symbol")?;
        for (symbol, total) in &report.per_symbol {
            writeln!(writer, "  {symbol:<30}{:>18}", money(*total))?;
        }
        writeln!(writer)?;
    }

    line(writer, "Total profit", report.total_profit)?;
    line(writer, "Total loss", report.total_loss)?;
    line(writer, "Net profit/loss", report.net_profit_loss)?;
    line(writer, "Commissions", report.total_commission)?;
    line(writer, "Net after commissions", report.net_after_commission)?;

    let dividends = &report.dividends;
    if dividends.payments > 0 {
        line(
            writer,
            &format!("Dividends, gross ({} payments)", dividends.payments),
            dividends.gross,
        )?;
        line(writer, "  withheld", dividends.withheld)?;
        line(writer, "  net", dividends.net)?;
    }
    line(writer, "Taxable income", report.total_taxable_income)?;

    if !report.symbols_without_lots.is_empty() {
        writeln!(writer)?;
        writeln!(
            writer,
            "Sold without open lots: {}",
            report.symbols_without_lots.join(", ")
        )?;
    }
    if !report.unmatched.is_empty() {
        writeln!(writer, "Unmatched quantity:")?;
        for (symbol, quantity) in &report.unmatched {
            writeln!(writer, "  {symbol:<30}{quantity:>18}")?;
        }
    }

    if details {
        write_details(report, writer)?;
    }

    writeln!(writer)?;
    match run.status {
        RunStatus::Complete => writeln!(writer, "Status: complete")?,
        RunStatus::Partial => {
            let count = run.warnings.len();
            let noun = if count == 1 { "warning" } else { "warnings" };
            writeln!(writer, "Status: partial ({count} {noun})")?;
        }
    }
    Ok(())
}

fn write_details<W: Write>(report: &TaxReport, writer: &mut W) -> io::Result<()> {
    if !report.events.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Realized events")?;
        for event in &report.events {
            writeln!(
                writer,
                "  {} {:<10} {:>10} (lot {}) proceeds {} cost {}{} => {}",
                event.sell_date,
                event.symbol,
                event.matched_quantity,
                event.acquisition_date,
                money(event.proceeds),
                money(event.cost_basis),
                if event.inflation_applied { "*" } else { "" },
                money(event.profit),
            )?;
        }
    }

    if !report.open_lots.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Open lots")?;
        for (symbol, lots) in &report.open_lots {
            for lot in lots {
                writeln!(
                    writer,
                    "  {symbol:<10} {:>10} @ {} since {}",
                    lot.quantity,
                    money(lot.unit_cost),
                    lot.acquired
                )?;
            }
        }
    }
    Ok(())
}

fn line<W: Write>(writer: &mut W, label: &str, amount: Decimal) -> io::Result<()> {
    writeln!(writer, "{label:<32}{:>18}", money(amount))
}

/// Two decimal places, half away from zero.
fn money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}
