//! FIFO tax-lot matching engine.
//!
//! This crate turns a user's buy/sell history into realized capital gains in
//! the reporting currency (TRY by default):
//!
//! - [`LotMatcher`] keeps a FIFO queue of lots per symbol, converts foreign
//!   prices with an [`ExchangeRateLookup`](fifotax_rates::ExchangeRateLookup)
//!   and indexes lot costs with an
//!   [`InflationIndexLookup`](fifotax_rates::InflationIndexLookup) when index
//!   growth strictly exceeds the configured threshold
//! - [`PositionAggregator`] folds the resulting events into per-symbol and
//!   grand totals and nets commissions
//! - [`Engine`] runs the whole pipeline and returns a [`TaxRun`]: the
//!   [`TaxReport`], a [`RunStatus`] and any row-level [`RunWarning`]s
//!
//! # Example
//!
//! ```
//! use fifotax_core::TransactionRecord;
//! use fifotax_engine::{compute, Options, RunStatus};
//! use fifotax_rates::{ExchangeRateTable, InflationIndexTable};
//! use rust_decimal_macros::dec;
//!
//! let row = |side: &str, price: &str, at: &str| TransactionRecord {
//!     symbol: "THYAO".into(),
//!     side: side.into(),
//!     quantity: "100".into(),
//!     price: price.into(),
//!     currency: "TRY".into(),
//!     executed_at: at.into(),
//!     ..Default::default()
//! };
//! let history = vec![
//!     row("Buy", "250", "2023-12-20 10:00:00"),
//!     row("Sell", "270", "2023-12-22 15:30:00"),
//! ];
//!
//! let index: InflationIndexTable = [
//!     (fifotax_core::YearMonth::new(2023, 10).unwrap(), dec!(2803.29)),
//!     (fifotax_core::YearMonth::new(2023, 11).unwrap(), dec!(2882.04)),
//! ]
//! .into_iter()
//! .collect();
//!
//! let run = compute(&history, ExchangeRateTable::new(), index, Options::default()).unwrap();
//! assert_eq!(run.status, RunStatus::Complete);
//! assert_eq!(run.report.net_profit_loss, dec!(2000));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod aggregate;
mod context;
mod engine;
mod error;
mod matcher;
mod options;
mod report;
mod source;

pub use aggregate::PositionAggregator;
pub use context::{LedgerContext, OpenLot};
pub use engine::{compute, Engine, RunInput};
pub use error::{LookupMissing, RunError, RunWarning, SourceError, TransactionError, WarningKind};
pub use matcher::{LotMatcher, SellOutcome};
pub use options::{IndexLookback, OptionWarning, Options};
pub use report::{DividendSummary, RunStatus, TaxReport, TaxRun};
pub use source::{CommissionCharge, CommissionSource, TransactionSource};
