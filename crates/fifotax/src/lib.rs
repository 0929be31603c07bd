//! Command-line tools for fifotax.
//!
//! - `fifotax-report`: compute realized gains, commissions and dividend income
//!   in TRY from a transaction CSV, an exchange-rate table and a price index
//!
//! # Example Usage
//!
//! ```bash
//! fifotax-report --transactions trades.csv --rates usd_try.csv --index yi_ufe.csv
//! fifotax-report -t trades.csv -i yi_ufe.csv --tax-year 2024 --format json
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
pub mod output;
