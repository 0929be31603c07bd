//! fifotax-report - Capital gains report from a broker transaction history.
//!
//! Matches sales against purchases first-in first-out, converts every amount
//! to TRY at the rate of its own date, indexes the cost of lots by the price
//! index when its growth exceeds the threshold, and sums the result with fees
//! and dividend income.
//!
//! # Usage
//!
//! ```bash
//! fifotax-report --transactions trades.csv --rates usd_try.csv --index yi_ufe.csv
//! fifotax-report -t statement.csv -i yi_ufe.csv --broker-statement --tax-year 2024
//! fifotax-report -t trades.csv -i yi_ufe.csv -o disposal_lookback_months=1 --format json
//! ```
//!
//! # Exit status
//!
//! - `0` - the report was produced, with or without warnings
//! - `1` - no report could be produced
//! - `2` - `--strict` was given and there were warnings

use crate::cmd::completions::{self, ShellType};
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use clap::Parser;
use fifotax_engine::{Engine, Options};
use fifotax_importer::{CsvSource, ImporterConfig};
use fifotax_rates::{ExchangeRateTable, InflationIndexTable};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Compute realized gains in TRY with inflation-indexed cost.
#[derive(Parser, Debug)]
#[command(name = "fifotax-report")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Generate shell completions and exit
    #[arg(long, value_name = "SHELL", hide = true)]
    pub generate_completions: Option<ShellType>,

    /// Transaction CSV file
    #[arg(
        short,
        long,
        value_name = "FILE",
        required_unless_present = "generate_completions"
    )]
    pub transactions: Option<PathBuf>,

    /// Price index table (long `year,month,index` or wide `YIL,OCAK,...`)
    #[arg(
        short,
        long,
        value_name = "FILE",
        required_unless_present = "generate_completions"
    )]
    pub index: Option<PathBuf>,

    /// Exchange rate table (`date,currency,rate`)
    #[arg(short, long, value_name = "FILE")]
    pub rates: Option<PathBuf>,

    /// Currency of rate files that have no currency column
    #[arg(long, value_name = "CURRENCY", default_value = "USD")]
    pub rates_currency: String,

    /// Dividend CSV file
    #[arg(short, long, value_name = "FILE")]
    pub dividends: Option<PathBuf>,

    /// Read the Turkish broker statement column layout
    #[arg(long)]
    pub broker_statement: bool,

    /// CSV delimiter of the transaction and dividend files
    #[arg(long, default_value = ",")]
    pub delimiter: char,

    /// Only use rows of this user (requires a user column)
    #[arg(long, value_name = "ID")]
    pub user: Option<String>,

    /// Name of the user column
    #[arg(long, value_name = "NAME", default_value = "user")]
    pub user_column: String,

    /// Report only this calendar year
    #[arg(long, value_name = "YEAR")]
    pub tax_year: Option<i32>,

    /// Index growth in percent that must be exceeded to index cost
    #[arg(long, value_name = "PERCENT")]
    pub threshold: Option<String>,

    /// Leave dividend income out
    #[arg(long)]
    pub no_dividends: bool,

    /// Set an engine option (can be specified multiple times)
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub options: Vec<(String, String)>,

    /// File of `key = value` option lines
    #[arg(long, value_name = "FILE")]
    pub options_file: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, short = 'f', value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// List every realized event and open lot in text output
    #[arg(long)]
    pub details: bool,

    /// Exit with status 2 when there are warnings
    #[arg(long)]
    pub strict: bool,

    /// Show verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Main entry point for the report command.
pub fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(shell) = args.generate_completions {
        completions::generate_completions::<Args>(shell, "fifotax-report");
        return ExitCode::SUCCESS;
    }

    init_tracing(args.verbose);

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// Log to stderr so stdout carries only the report.
///
/// `RUST_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "fifotax=debug" } else { "fifotax=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .without_time()
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<ExitCode> {
    let mut stdout = io::stdout().lock();

    let transactions = args
        .transactions
        .as_deref()
        .context("--transactions is required")?;
    let index_path = args.index.as_deref().context("--index is required")?;

    let options = build_options(args)?;
    for warning in &options.warnings {
        warn!(code = warning.code, "{}", warning.message);
    }

    let rates = match &args.rates {
        Some(path) => ExchangeRateTable::from_path(path, Some(args.rates_currency.as_str()))
            .with_context(|| format!("failed to load exchange rates from {}", path.display()))?,
        None => ExchangeRateTable::new(),
    };
    let index = InflationIndexTable::from_path(index_path)
        .with_context(|| format!("failed to load price index from {}", index_path.display()))?;
    debug!(
        rates = rates.len(),
        currencies = ?rates.currencies(),
        index_samples = index.len(),
        "loaded lookup tables"
    );

    let source = build_source(args, transactions);
    let engine = Engine::new(rates, index).with_options(options);
    let run = engine
        .run_for_user(args.user.as_deref().unwrap_or_default(), &source, None)
        .with_context(|| format!("no report for {}", transactions.display()))?;

    let option_warnings = &engine.options().warnings;
    match args.format {
        OutputFormat::Text => output::write_text(&run, args.details, &mut stdout)?,
        OutputFormat::Json => output::write_json(&run, option_warnings, &mut stdout)?,
    }
    stdout.flush()?;

    if args.strict && (!run.is_complete() || !option_warnings.is_empty()) {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

/// Options file first, then `-o` flags, then the dedicated flags.
fn build_options(args: &Args) -> Result<Options> {
    let mut options = Options::new();

    if let Some(path) = &args.options_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read options file {}", path.display()))?;
        options.load_str(&text);
    }

    for (key, value) in &args.options {
        options.set_override(key, value);
    }

    if let Some(year) = args.tax_year {
        options.set_override("tax_year", &year.to_string());
    }
    if let Some(threshold) = &args.threshold {
        options.set_override("inflation_threshold", threshold);
    }
    if args.no_dividends {
        options.set_override("include_dividends", "false");
    }

    Ok(options)
}

fn build_source(args: &Args, transactions: &Path) -> CsvSource {
    let mut config = if args.broker_statement {
        ImporterConfig::broker_statement()
    } else {
        ImporterConfig::default()
    };
    config.csv.delimiter = args.delimiter;
    if args.user.is_some() {
        config.transactions.user = Some(args.user_column.as_str().into());
        config.dividends.user = Some(args.user_column.as_str().into());
    }

    let source = CsvSource::new(config, transactions);
    match &args.dividends {
        Some(path) => source.with_dividends(path),
        None => source,
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("invalid option {s:?}: expected KEY=VALUE"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("tax_year = 2024"),
            Ok(("tax_year".to_string(), "2024".to_string()))
        );
        assert!(parse_key_value("tax_year").is_err());
        assert!(parse_key_value("=2024").is_err());
    }

    #[test]
    fn test_flag_precedence() {
        let args = Args::parse_from([
            "fifotax-report",
            "-t",
            "tx.csv",
            "-i",
            "index.csv",
            "-o",
            "tax_year=2023",
            "-o",
            "inflation_threshold=20",
            "--tax-year",
            "2024",
        ]);
        let options = build_options(&args).unwrap();
        assert!(options.warnings.is_empty());
        assert_eq!(options.tax_year, Some(2024));
        assert_eq!(options.inflation_threshold.to_string(), "20");
    }

    #[test]
    fn test_bad_option_is_a_warning() {
        let args = Args::parse_from([
            "fifotax-report",
            "-t",
            "tx.csv",
            "-i",
            "index.csv",
            "-o",
            "lot_order=LIFO",
        ]);
        let options = build_options(&args).unwrap();
        assert_eq!(options.warnings.len(), 1);
        assert_eq!(options.warnings[0].code, "O001");
    }
}
