//! File-backed transaction source.

use crate::csv_importer::CsvImporter;
use crate::config::ImporterConfig;
use crate::ImportResult;
use fifotax_core::{DividendRecord, TransactionRecord};
use fifotax_engine::{SourceError, TransactionSource};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Reads a user's history from CSV files on every request.
///
/// Import warnings (rows the CSV parser rejected) are logged; rows that parse
/// but hold bad values are passed on for the engine to reject.
#[derive(Debug, Clone)]
pub struct CsvSource {
    config: ImporterConfig,
    transactions: PathBuf,
    dividends: Option<PathBuf>,
}

impl CsvSource {
    /// Read transactions from `path`.
    pub fn new(config: ImporterConfig, path: impl Into<PathBuf>) -> Self {
        Self {
            config,
            transactions: path.into(),
            dividends: None,
        }
    }

    /// Also read dividends from `path`.
    pub fn with_dividends(mut self, path: impl Into<PathBuf>) -> Self {
        self.dividends = Some(path.into());
        self
    }

    /// The transaction file.
    pub fn transactions_path(&self) -> &Path {
        &self.transactions
    }

    fn importer(&self, user: &str) -> CsvImporter {
        CsvImporter::new(self.config.clone()).for_user(user)
    }
}

impl TransactionSource for CsvSource {
    fn transactions(&self, user: &str) -> Result<Vec<TransactionRecord>, SourceError> {
        let result = self
            .importer(user)
            .extract_transactions_file(&self.transactions)
            .map_err(|e| unavailable(&self.transactions, &e))?;
        Ok(log_warnings(&self.transactions, result))
    }

    fn dividends(&self, user: &str) -> Result<Vec<DividendRecord>, SourceError> {
        let Some(path) = &self.dividends else {
            return Ok(Vec::new());
        };
        let result = self
            .importer(user)
            .extract_dividends_file(path)
            .map_err(|e| unavailable(path, &e))?;
        Ok(log_warnings(path, result))
    }
}

fn unavailable(path: &Path, error: &anyhow::Error) -> SourceError {
    if error.downcast_ref::<std::io::Error>().is_some() {
        SourceError::Unavailable(format!("{error:#}"))
    } else {
        SourceError::Other(format!("{}: {error:#}", path.display()))
    }
}

fn log_warnings<T>(path: &Path, result: ImportResult<T>) -> Vec<T> {
    for warning in &result.warnings {
        warn!(file = %path.display(), "{warning}");
    }
    result.records
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_reads_transactions_and_dividends() {
        let tx = write(
            "symbol,side,quantity,price,currency,executed_at\n\
             THYAO,buy,10,250,TRY,2024-01-02\n\
             THYAO,sell,10,270,TRY,2024-03-04\n",
        );
        let div = write("symbol,paid_on,gross,currency\nTHYAO,2024-06-01,50,TRY\n");

        let source = CsvSource::new(ImporterConfig::default(), tx.path()).with_dividends(div.path());
        assert_eq!(source.transactions("anyone").unwrap().len(), 2);
        assert_eq!(source.dividends("anyone").unwrap().len(), 1);
    }

    #[test]
    fn test_no_dividend_file_means_no_dividends() {
        let tx = write("symbol,side,quantity,price,currency,executed_at\n");
        let source = CsvSource::new(ImporterConfig::default(), tx.path());
        assert!(source.dividends("anyone").unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvSource::new(ImporterConfig::default(), dir.path().join("missing.csv"));
        let err = source.transactions("anyone").unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
        assert!(err.to_string().contains("missing.csv"));
    }

    #[test]
    fn test_bad_header_is_other_error() {
        let tx = write("when,what\n2024-01-02,THYAO\n");
        let source = CsvSource::new(ImporterConfig::default(), tx.path());
        assert!(matches!(
            source.transactions("anyone"),
            Err(SourceError::Other(_))
        ));
    }
}
