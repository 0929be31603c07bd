//! CSV ingestion for fifotax.
//!
//! Turns broker exports into the raw [`TransactionRecord`] and
//! [`DividendRecord`] rows the engine consumes. Column names are configurable;
//! [`ImporterConfig::broker_statement`] covers the Turkish statement layout.
//!
//! # Example
//!
//! ```rust,no_run
//! use fifotax_importer::{extract_transactions_from_file, ImporterConfig};
//! use std::path::Path;
//!
//! let config = ImporterConfig::csv()
//!     .symbol_column("Ticker")
//!     .executed_at_column("Date")
//!     .default_currency("USD")
//!     .build();
//!
//! let result = extract_transactions_from_file(Path::new("trades.csv"), &config)?;
//! for warning in &result.warnings {
//!     eprintln!("{warning}");
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod csv_importer;
mod source;

use anyhow::Result;
use fifotax_core::{DividendRecord, TransactionRecord};
use std::path::Path;

pub use config::{
    ColumnSpec, CsvConfig, CsvConfigBuilder, DividendColumns, ImporterConfig, NumberFormat,
    TransactionColumns,
};
pub use csv_importer::CsvImporter;
pub use source::CsvSource;

/// Result of an import operation.
#[derive(Debug, Clone)]
pub struct ImportResult<T> {
    /// The extracted records.
    pub records: Vec<T>,
    /// Warnings encountered during import.
    pub warnings: Vec<String>,
}

impl<T> ImportResult<T> {
    /// Create a new import result.
    pub const fn new(records: Vec<T>) -> Self {
        Self {
            records,
            warnings: Vec::new(),
        }
    }

    /// Create an empty import result.
    pub const fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Add a warning to the result.
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Extract transaction records from a file using the given configuration.
pub fn extract_transactions_from_file(
    path: &Path,
    config: &ImporterConfig,
) -> Result<ImportResult<TransactionRecord>> {
    config.extract_transactions(path)
}

/// Extract transaction records from file contents.
pub fn extract_transactions_from_string(
    content: &str,
    config: &ImporterConfig,
) -> Result<ImportResult<TransactionRecord>> {
    config.extract_transactions_from_string(content)
}

/// Extract dividend records from a file using the given configuration.
pub fn extract_dividends_from_file(
    path: &Path,
    config: &ImporterConfig,
) -> Result<ImportResult<DividendRecord>> {
    config.extract_dividends(path)
}
