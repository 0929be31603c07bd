//! Time-indexed lookups used by the fifotax engine.
//!
//! Two collaborators feed the lot matcher:
//!
//! - [`ExchangeRateLookup`] - reporting-currency units per one unit of a foreign
//!   currency on an exact date
//! - [`InflationIndexLookup`] - monthly price-index samples, and the percentage
//!   growth between two months
//!
//! [`ExchangeRateTable`] and [`InflationIndexTable`] are in-memory
//! implementations loadable from CSV. [`CachedExchangeRates`] and
//! [`CachedInflationIndex`] wrap any lookup with a per-run memo so that
//! network- or database-backed lookups are queried once per key.
//!
//! # Example
//!
//! ```
//! use fifotax_core::YearMonth;
//! use fifotax_rates::{InflationIndexLookup, InflationIndexTable};
//! use rust_decimal_macros::dec;
//!
//! let mut index = InflationIndexTable::new();
//! index.insert(YearMonth::new(2023, 11).unwrap(), dec!(2882.04));
//! index.insert(YearMonth::new(2023, 12).unwrap(), dec!(2915.02));
//!
//! let rate = index
//!     .rate(YearMonth::new(2023, 11).unwrap(), YearMonth::new(2023, 12).unwrap())
//!     .unwrap();
//! assert_eq!(rate.round_dp(4), dec!(1.1443));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod exchange;
pub mod inflation;
mod months;

pub use cache::{CachedExchangeRates, CachedInflationIndex};
pub use exchange::{ExchangeRateLookup, ExchangeRateTable};
pub use inflation::{InflationIndexLookup, InflationIndexTable};

use thiserror::Error;

/// Error loading a rate or index table.
#[derive(Debug, Error)]
pub enum TableError {
    /// I/O error reading the file.
    #[error("failed to read {}", path.display())]
    Io {
        /// Path that failed.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// A required column is missing from the header.
    #[error("missing column `{0}`")]
    MissingColumn(&'static str),

    /// The header matches no supported layout.
    #[error("unrecognized table layout: {0}")]
    UnknownLayout(String),

    /// A cell could not be parsed.
    #[error("row {row}: invalid {what} {value:?}")]
    InvalidCell {
        /// One-based data row number.
        row: usize,
        /// What the cell should have held.
        what: &'static str,
        /// The offending text.
        value: String,
    },
}
