//! Core types for fifotax
//!
//! This crate provides the fundamental types used by the FIFO tax-lot engine:
//!
//! - [`Money`] - A decimal amount with a currency
//! - [`Transaction`] - A validated buy or sell, produced from a raw [`TransactionRecord`]
//! - [`Lot`] - A parcel of acquired units with a fixed unit cost in the reporting currency
//! - [`LotQueue`] - The per-symbol FIFO queue of open lots
//! - [`RealizedEvent`] - The profit/loss record of one lot/sell match
//! - [`YearMonth`] - Calendar month arithmetic used for index lookback
//! - [`Dividend`] - A validated dividend payment
//!
//! # Example
//!
//! ```
//! use fifotax_core::{Lot, LotQueue};
//! use rust_decimal_macros::dec;
//! use chrono::NaiveDate;
//!
//! let mut queue = LotQueue::new("THYAO");
//! queue.push(Lot::new("THYAO", dec!(100), dec!(10), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()));
//! queue.push(Lot::new("THYAO", dec!(50), dec!(12), NaiveDate::from_ymd_opt(2024, 2, 5).unwrap()));
//!
//! // Sell 120 units: the oldest lot is exhausted first
//! let consumption = queue.consume(dec!(120));
//!
//! assert_eq!(consumption.slices.len(), 2);
//! assert_eq!(consumption.slices[0].quantity, dec!(100));
//! assert_eq!(consumption.slices[1].quantity, dec!(20));
//! assert_eq!(queue.total_quantity(), dec!(30));
//! assert!(consumption.unmatched.is_zero());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod dividend;
pub mod event;
pub mod lot;
pub mod money;
pub mod period;
pub mod transaction;

pub use dividend::{Dividend, DividendRecord};
pub use event::RealizedEvent;
pub use lot::{Consumption, Lot, LotQueue, LotSlice, LotState};
pub use money::Money;
pub use period::YearMonth;
pub use transaction::{
    parse_decimal, parse_timestamp, DataError, Side, Transaction, TransactionRecord,
};

// Re-export commonly used external types
pub use chrono::{NaiveDate, NaiveDateTime};
pub use rust_decimal::Decimal;

/// The currency all figures are reported in.
pub const REPORTING_CURRENCY: &str = "TRY";
