//! Running a full computation.

use chrono::Datelike;
use fifotax_core::{
    Decimal, Dividend, DividendRecord, NaiveDate, Transaction, TransactionRecord,
};
use fifotax_rates::{
    CachedExchangeRates, CachedInflationIndex, ExchangeRateLookup, InflationIndexLookup,
};
use tracing::{debug, info, warn};

use crate::aggregate::PositionAggregator;
use crate::error::{RunError, RunWarning, TransactionError};
use crate::matcher::LotMatcher;
use crate::options::Options;
use crate::report::{DividendSummary, TaxRun};
use crate::source::{CommissionCharge, CommissionSource, TransactionSource};

/// Everything one run consumes besides the lookups.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunInput<'a> {
    /// Raw transaction rows, in any order.
    pub transactions: &'a [TransactionRecord],
    /// Raw dividend rows.
    pub dividends: &'a [DividendRecord],
    /// Commission charges. `None` means the transaction fees.
    pub commissions: Option<&'a [CommissionCharge]>,
}

impl<'a> RunInput<'a> {
    /// Input with transactions only.
    pub const fn new(transactions: &'a [TransactionRecord]) -> Self {
        Self {
            transactions,
            dividends: &[],
            commissions: None,
        }
    }

    /// Add dividend rows.
    pub fn with_dividends(mut self, dividends: &'a [DividendRecord]) -> Self {
        self.dividends = dividends;
        self
    }

    /// Use explicit commission charges instead of transaction fees.
    pub fn with_commissions(mut self, commissions: &'a [CommissionCharge]) -> Self {
        self.commissions = Some(commissions);
        self
    }
}

/// The computation: lookups plus options.
///
/// An engine holds no per-run state. Each call to [`Engine::run`] builds its
/// own lot queues and lookup caches and drops them when it returns, so one
/// engine can serve any number of runs.
#[derive(Debug, Clone)]
pub struct Engine<R, I> {
    rates: R,
    index: I,
    options: Options,
}

impl<R, I> Engine<R, I>
where
    R: ExchangeRateLookup,
    I: InflationIndexLookup,
{
    /// Create an engine with default options.
    pub fn new(rates: R, index: I) -> Self {
        Self {
            rates,
            index,
            options: Options::default(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// The options in effect.
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Fetch a user's history from `source` and run.
    ///
    /// Source failures abort with a [`RunError`].
    pub fn run_for_user<S>(
        &self,
        user: &str,
        source: &S,
        commissions: Option<&dyn CommissionSource>,
    ) -> Result<TaxRun, RunError>
    where
        S: TransactionSource + ?Sized,
    {
        let transactions = source.transactions(user).map_err(RunError::Source)?;
        let dividends = if self.options.include_dividends {
            source.dividends(user).map_err(RunError::Source)?
        } else {
            Vec::new()
        };
        let charges = commissions
            .map(|c| c.commissions(user))
            .transpose()
            .map_err(RunError::Commission)?;

        let mut input = RunInput::new(&transactions).with_dividends(&dividends);
        if let Some(charges) = &charges {
            input = input.with_commissions(charges);
        }
        self.run(input)
    }

    /// Run over already-fetched input.
    pub fn run(&self, input: RunInput<'_>) -> Result<TaxRun, RunError> {
        if input.transactions.is_empty() {
            return Err(RunError::NoTransactions);
        }

        let options = &self.options;
        let rates = CachedExchangeRates::new(&self.rates);
        let index = CachedInflationIndex::new(&self.index);
        let mut warnings = Vec::new();

        let mut valid: Vec<(Option<usize>, Transaction)> =
            Vec::with_capacity(input.transactions.len());
        for (i, record) in input.transactions.iter().enumerate() {
            let row = record.source_row.or(Some(i + 1));
            match Transaction::from_record(record) {
                Ok(txn) => valid.push((row, txn)),
                Err(error) => warnings.push(RunWarning::Rejected {
                    row,
                    record: "transaction",
                    error,
                }),
            }
        }
        if valid.is_empty() {
            return Err(RunError::NoUsableTransactions {
                rejected: warnings.len(),
            });
        }
        // stable: same-instant rows keep source order
        valid.sort_by_key(|(_, txn)| txn.executed_at());

        let mut matcher = LotMatcher::new(&rates, &index, options);
        let mut aggregator = PositionAggregator::new();
        let mut fees = Vec::new();

        for (row, txn) in &valid {
            let outcome = match matcher.process(txn) {
                Ok(outcome) => outcome,
                Err(TransactionError::Data(error)) => {
                    warnings.push(RunWarning::Rejected {
                        row: *row,
                        record: "transaction",
                        error,
                    });
                    continue;
                }
                Err(TransactionError::Lookup(missing)) => {
                    warnings.push(RunWarning::TransactionExcluded {
                        row: *row,
                        symbol: txn.symbol().to_string(),
                        side: txn.side(),
                        missing,
                    });
                    continue;
                }
            };

            if in_tax_year(options, txn.date()) && !txn.fee().is_zero() {
                fees.push(CommissionCharge {
                    date: txn.date(),
                    amount: txn.fee().clone(),
                    label: txn.symbol().to_string(),
                });
            }

            let Some(sale) = outcome else { continue };
            if !sale.in_scope {
                continue;
            }
            for missing in sale.index_gaps {
                warnings.push(RunWarning::IndexationSkipped {
                    symbol: txn.symbol().to_string(),
                    missing,
                });
            }
            if !sale.found_lots {
                aggregator.record_missing_lots(txn.symbol());
            }
            if !sale.unmatched.is_zero() {
                aggregator.record_unmatched(txn.symbol(), sale.unmatched);
                warnings.push(RunWarning::UnmatchedQuantity {
                    symbol: txn.symbol().to_string(),
                    date: txn.date(),
                    quantity: sale.unmatched,
                });
            }
            for event in sale.events {
                aggregator.record_event(event);
            }
        }

        let charges: Vec<&CommissionCharge> = match input.commissions {
            Some(charges) => charges
                .iter()
                .filter(|c| in_tax_year(options, c.date))
                .collect(),
            None => fees.iter().collect(),
        };
        for charge in charges {
            match matcher.to_reporting(charge.amount.amount, &charge.amount.currency, charge.date) {
                Ok(amount) => aggregator.add_commission(amount),
                Err(TransactionError::Lookup(missing)) => warnings.push(RunWarning::AmountExcluded {
                    what: "commission",
                    subject: charge.label.clone(),
                    missing,
                }),
                Err(TransactionError::Data(error)) => warnings.push(RunWarning::Rejected {
                    row: None,
                    record: "commission",
                    error,
                }),
            }
        }

        let dividends = if options.include_dividends {
            summarize_dividends(&matcher, options, input.dividends, &mut warnings)
        } else {
            DividendSummary::default()
        };

        let open_lots = matcher.into_context().open_lots();
        let report = aggregator.finish(
            &options.reporting_currency,
            options.tax_year,
            dividends,
            open_lots,
        );

        for warning in &warnings {
            warn!(kind = warning.kind().code(), "{warning}");
        }
        debug!(
            exchange_queries = rates.upstream_queries(),
            index_queries = index.upstream_queries(),
            "lookup cache usage"
        );
        info!(
            transactions = valid.len(),
            events = report.events.len(),
            warnings = warnings.len(),
            net = %report.net_after_commission,
            "computation finished"
        );

        Ok(TaxRun::new(report, warnings))
    }
}

fn in_tax_year(options: &Options, date: NaiveDate) -> bool {
    options.tax_year.map_or(true, |year| date.year() == year)
}

fn summarize_dividends<R, I>(
    matcher: &LotMatcher<'_, R, I>,
    options: &Options,
    records: &[DividendRecord],
    warnings: &mut Vec<RunWarning>,
) -> DividendSummary
where
    R: ExchangeRateLookup,
    I: InflationIndexLookup,
{
    let mut summary = DividendSummary::default();

    for (i, record) in records.iter().enumerate() {
        let row = record.source_row.or(Some(i + 1));
        let dividend = match Dividend::from_record(record) {
            Ok(dividend) => dividend,
            Err(error) => {
                warnings.push(RunWarning::Rejected {
                    row,
                    record: "dividend",
                    error,
                });
                continue;
            }
        };
        if !in_tax_year(options, dividend.paid_on) {
            continue;
        }

        let converted = [&dividend.gross, &dividend.withheld, &dividend.net]
            .map(|money| matcher.to_reporting(money.amount, &money.currency, dividend.paid_on));
        let [gross, withheld, net] = match converted {
            [Ok(gross), Ok(withheld), Ok(net)] => [gross, withheld, net],
            [Err(error), ..] | [_, Err(error), _] | [.., Err(error)] => {
                warnings.push(match error {
                    TransactionError::Lookup(missing) => RunWarning::AmountExcluded {
                        what: "dividend",
                        subject: dividend.symbol.clone(),
                        missing,
                    },
                    TransactionError::Data(error) => RunWarning::Rejected {
                        row,
                        record: "dividend",
                        error,
                    },
                });
                continue;
            }
        };

        summary.payments += 1;
        summary.gross += gross;
        summary.withheld += withheld;
        summary.net += net;
        *summary
            .by_symbol
            .entry(dividend.symbol.clone())
            .or_insert(Decimal::ZERO) += gross;
    }

    summary
}

/// Compute a report from raw transaction rows.
///
/// Commission is taken from the transaction fees and no dividends are
/// included. Use [`Engine`] directly for anything else.
pub fn compute<R, I>(
    transactions: &[TransactionRecord],
    rates: R,
    index: I,
    options: Options,
) -> Result<TaxRun, RunError>
where
    R: ExchangeRateLookup,
    I: InflationIndexLookup,
{
    Engine::new(rates, index)
        .with_options(options)
        .run(RunInput::new(transactions))
}
