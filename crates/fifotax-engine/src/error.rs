//! Error and warning types for a computation run.
//!
//! Row-level problems never stop a run. They become [`RunWarning`]s attached to
//! a still-valid report. Only a [`RunError`] aborts, and then no report exists.

use chrono::NaiveDate;
use fifotax_core::{DataError, Decimal, Side};
use std::fmt;
use thiserror::Error;

/// A lookup that had no sample for the period it was asked about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum LookupMissing {
    /// No exchange rate for `currency` on exactly `date`.
    #[error("no {currency} exchange rate for {date}")]
    ExchangeRate {
        /// Currency being converted.
        currency: String,
        /// Date the rate was needed for.
        date: NaiveDate,
    },

    /// No usable index samples to derive an inflation rate.
    #[error("no inflation rate between {from} and {to}")]
    InflationRate {
        /// Base month.
        from: fifotax_core::YearMonth,
        /// Target month.
        to: fifotax_core::YearMonth,
    },
}

/// Why a single transaction could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// The values themselves are invalid.
    #[error(transparent)]
    Data(#[from] DataError),

    /// The price could not be converted.
    #[error(transparent)]
    Lookup(#[from] LookupMissing),
}

/// Coarse classification of a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// A malformed record was rejected.
    DataError,
    /// A lookup miss excluded something or disabled an adjustment.
    LookupMissing,
    /// A sale exceeded the open lots.
    UnmatchedQuantity,
}

impl WarningKind {
    /// Short stable code for machine-readable output.
    pub const fn code(self) -> &'static str {
        match self {
            Self::DataError => "data-error",
            Self::LookupMissing => "lookup-missing",
            Self::UnmatchedQuantity => "unmatched-quantity",
        }
    }
}

/// A row-level problem surfaced alongside the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunWarning {
    /// A record failed validation and was excluded.
    Rejected {
        /// Source row, when known.
        row: Option<usize>,
        /// What the record was (transaction, dividend).
        record: &'static str,
        /// The validation failure.
        error: DataError,
    },

    /// A transaction was excluded because its price could not be converted.
    TransactionExcluded {
        /// Source row, when known.
        row: Option<usize>,
        /// Symbol traded.
        symbol: String,
        /// Buy or sell.
        side: Side,
        /// The missing rate.
        missing: LookupMissing,
    },

    /// A lot was matched without inflation adjustment.
    IndexationSkipped {
        /// Symbol sold.
        symbol: String,
        /// The missing rate.
        missing: LookupMissing,
    },

    /// A fee or dividend was left out of the totals.
    AmountExcluded {
        /// What was left out, for example "fee" or "dividend".
        what: &'static str,
        /// Symbol or label it belongs to.
        subject: String,
        /// The missing rate.
        missing: LookupMissing,
    },

    /// A sale could not be fully matched against open lots.
    UnmatchedQuantity {
        /// Symbol sold.
        symbol: String,
        /// Date of the sale.
        date: NaiveDate,
        /// Quantity left without a lot.
        quantity: Decimal,
    },
}

impl RunWarning {
    /// The warning's classification.
    pub const fn kind(&self) -> WarningKind {
        match self {
            Self::Rejected { .. } => WarningKind::DataError,
            Self::TransactionExcluded { .. }
            | Self::IndexationSkipped { .. }
            | Self::AmountExcluded { .. } => WarningKind::LookupMissing,
            Self::UnmatchedQuantity { .. } => WarningKind::UnmatchedQuantity,
        }
    }
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected { row, record, error } => {
                write_row(f, *row)?;
                write!(f, "{record} rejected: {error}")
            }
            Self::TransactionExcluded {
                row,
                symbol,
                side,
                missing,
            } => {
                write_row(f, *row)?;
                write!(f, "{side} {symbol} excluded: {missing}")
            }
            Self::IndexationSkipped { symbol, missing } => {
                write!(f, "{symbol}: cost not indexed, {missing}")
            }
            Self::AmountExcluded {
                what,
                subject,
                missing,
            } => write!(f, "{what} for {subject} excluded: {missing}"),
            Self::UnmatchedQuantity {
                symbol,
                date,
                quantity,
            } => write!(
                f,
                "{symbol}: sale on {date} exceeds open lots by {quantity}"
            ),
        }
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, row: Option<usize>) -> fmt::Result {
    match row {
        Some(row) => write!(f, "row {row}: "),
        None => Ok(()),
    }
}

/// Error from a transaction or commission source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The store could not be reached.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// I/O failure while reading.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Any other failure, with its message.
    #[error("{0}")]
    Other(String),
}

/// Failure of a whole run. No report is produced.
#[derive(Debug, Error)]
pub enum RunError {
    /// The transaction source failed.
    #[error("failed to load transactions: {0}")]
    Source(SourceError),

    /// The commission source failed.
    #[error("failed to load commissions: {0}")]
    Commission(SourceError),

    /// The source returned no transactions at all.
    #[error("no transactions to process")]
    NoTransactions,

    /// Every transaction was rejected.
    #[error("none of the {rejected} transactions could be used")]
    NoUsableTransactions {
        /// Number of rejected records.
        rejected: usize,
    },
}
