//! Configuration for importers.

use crate::csv_importer::CsvImporter;
use crate::ImportResult;
use anyhow::Result;
use fifotax_core::{DividendRecord, TransactionRecord};
use std::path::Path;

/// Configuration for a CSV importer.
#[derive(Debug, Clone, Default)]
pub struct ImporterConfig {
    /// File layout shared by both record kinds.
    pub csv: CsvConfig,
    /// Column mapping for transaction files.
    pub transactions: TransactionColumns,
    /// Column mapping for dividend files.
    pub dividends: DividendColumns,
}

/// Layout of a CSV file.
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Whether the CSV has a header row.
    pub has_header: bool,
    /// The field delimiter.
    pub delimiter: char,
    /// Number of data rows to skip after the header.
    pub skip_rows: usize,
    /// Currency for rows whose currency cell is absent or empty.
    pub default_currency: Option<String>,
    /// How amounts and quantities are written.
    pub number_format: NumberFormat,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: ',',
            skip_rows: 0,
            default_currency: None,
            number_format: NumberFormat::default(),
        }
    }
}

/// Notation of numeric cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NumberFormat {
    /// `1234.56`. A lone comma is read as the decimal mark.
    #[default]
    Plain,
    /// Turkish notation, `1.234,56`: dots group thousands and the comma is the
    /// decimal mark. `TL` and `USD` unit markers are dropped.
    Turkish,
}

impl NumberFormat {
    /// Rewrite a cell into plain notation.
    ///
    /// Nothing is validated here; a cell that still is not a number is
    /// rejected when the record is read.
    pub fn normalize(self, value: &str) -> String {
        match self {
            Self::Plain => value.to_string(),
            Self::Turkish => value
                .replace("TL", "")
                .replace("USD", "")
                .trim()
                .replace('.', "")
                .replace(',', "."),
        }
    }
}

/// Specification for a column in the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSpec {
    /// Column specified by header name. Matching ignores case and surrounding
    /// whitespace.
    Name(String),
    /// Column specified by zero-based index.
    Index(usize),
}

impl From<&str> for ColumnSpec {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ColumnSpec {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for ColumnSpec {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Where each transaction field lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionColumns {
    /// Instrument symbol.
    pub symbol: ColumnSpec,
    /// Buy/sell side.
    pub side: ColumnSpec,
    /// Executed quantity.
    pub quantity: ColumnSpec,
    /// Average unit price.
    pub price: ColumnSpec,
    /// Currency of the price. Falls back to [`CsvConfig::default_currency`].
    pub currency: Option<ColumnSpec>,
    /// Execution timestamp.
    pub executed_at: ColumnSpec,
    /// Transaction fee.
    pub fee: Option<ColumnSpec>,
    /// Currency of the fee.
    pub fee_currency: Option<ColumnSpec>,
    /// Owner of the row, for files holding several users.
    pub user: Option<ColumnSpec>,
}

impl Default for TransactionColumns {
    fn default() -> Self {
        Self {
            symbol: "symbol".into(),
            side: "side".into(),
            quantity: "quantity".into(),
            price: "price".into(),
            currency: Some("currency".into()),
            executed_at: "executed_at".into(),
            fee: Some("fee".into()),
            fee_currency: Some("fee_currency".into()),
            user: None,
        }
    }
}

impl TransactionColumns {
    /// Headers of a Turkish brokerage account statement.
    pub fn broker_statement() -> Self {
        Self {
            symbol: "Sembol".into(),
            side: "İşlem Tipi".into(),
            quantity: "Gerçekleşen Adet".into(),
            price: "Ortalama İşlem Fiyatı".into(),
            currency: Some("Para Birimi".into()),
            executed_at: "Tarih".into(),
            fee: Some("İşlem Ücreti".into()),
            fee_currency: None,
            user: None,
        }
    }
}

/// Where each dividend field lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DividendColumns {
    /// Instrument symbol.
    pub symbol: ColumnSpec,
    /// Payment date.
    pub paid_on: ColumnSpec,
    /// Gross amount.
    pub gross: ColumnSpec,
    /// Tax withheld at source.
    pub withheld: Option<ColumnSpec>,
    /// Net amount received.
    pub net: Option<ColumnSpec>,
    /// Currency of the amounts. Falls back to [`CsvConfig::default_currency`].
    pub currency: Option<ColumnSpec>,
    /// Owner of the row, for files holding several users.
    pub user: Option<ColumnSpec>,
}

impl Default for DividendColumns {
    fn default() -> Self {
        Self {
            symbol: "symbol".into(),
            paid_on: "paid_on".into(),
            gross: "gross".into(),
            withheld: Some("withheld".into()),
            net: Some("net".into()),
            currency: Some("currency".into()),
            user: None,
        }
    }
}

impl DividendColumns {
    /// Headers of a Turkish dividend statement. Amounts are in TRY.
    pub fn broker_statement() -> Self {
        Self {
            symbol: "Sermaya Piyasası Aracı".into(),
            paid_on: "Ödeme Tarihi".into(),
            gross: "Brüt Temettü Tutarı".into(),
            withheld: Some("Stopaj*".into()),
            net: Some("Net Temettü Tutarı".into()),
            currency: None,
            user: None,
        }
    }
}

impl ImporterConfig {
    /// Start building a CSV importer configuration.
    pub fn csv() -> CsvConfigBuilder {
        CsvConfigBuilder::new()
    }

    /// Configuration for Turkish brokerage statements exported to CSV.
    pub fn broker_statement() -> Self {
        Self {
            csv: CsvConfig {
                default_currency: Some(fifotax_core::REPORTING_CURRENCY.to_string()),
                number_format: NumberFormat::Turkish,
                ..CsvConfig::default()
            },
            transactions: TransactionColumns::broker_statement(),
            dividends: DividendColumns::broker_statement(),
        }
    }

    /// Extract transaction records from a file.
    pub fn extract_transactions(&self, path: &Path) -> Result<ImportResult<TransactionRecord>> {
        CsvImporter::new(self.clone()).extract_transactions_file(path)
    }

    /// Extract transaction records from string content.
    pub fn extract_transactions_from_string(
        &self,
        content: &str,
    ) -> Result<ImportResult<TransactionRecord>> {
        CsvImporter::new(self.clone()).extract_transactions(content)
    }

    /// Extract dividend records from a file.
    pub fn extract_dividends(&self, path: &Path) -> Result<ImportResult<DividendRecord>> {
        CsvImporter::new(self.clone()).extract_dividends_file(path)
    }

    /// Extract dividend records from string content.
    pub fn extract_dividends_from_string(
        &self,
        content: &str,
    ) -> Result<ImportResult<DividendRecord>> {
        CsvImporter::new(self.clone()).extract_dividends(content)
    }
}

/// Builder for CSV importer configuration.
#[derive(Debug, Clone, Default)]
pub struct CsvConfigBuilder {
    config: ImporterConfig,
}

impl CsvConfigBuilder {
    /// Create a new CSV config builder with the default column names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the currency used when a row has none.
    pub fn default_currency(mut self, currency: impl Into<String>) -> Self {
        self.config.csv.default_currency = Some(currency.into());
        self
    }

    /// Set the symbol column.
    pub fn symbol_column(mut self, column: impl Into<ColumnSpec>) -> Self {
        self.config.transactions.symbol = column.into();
        self
    }

    /// Set the side column.
    pub fn side_column(mut self, column: impl Into<ColumnSpec>) -> Self {
        self.config.transactions.side = column.into();
        self
    }

    /// Set the quantity column.
    pub fn quantity_column(mut self, column: impl Into<ColumnSpec>) -> Self {
        self.config.transactions.quantity = column.into();
        self
    }

    /// Set the unit price column.
    pub fn price_column(mut self, column: impl Into<ColumnSpec>) -> Self {
        self.config.transactions.price = column.into();
        self
    }

    /// Set the currency column.
    pub fn currency_column(mut self, column: impl Into<ColumnSpec>) -> Self {
        self.config.transactions.currency = Some(column.into());
        self
    }

    /// Set the timestamp column.
    pub fn executed_at_column(mut self, column: impl Into<ColumnSpec>) -> Self {
        self.config.transactions.executed_at = column.into();
        self
    }

    /// Set the fee column.
    pub fn fee_column(mut self, column: impl Into<ColumnSpec>) -> Self {
        self.config.transactions.fee = Some(column.into());
        self
    }

    /// Set the fee currency column.
    pub fn fee_currency_column(mut self, column: impl Into<ColumnSpec>) -> Self {
        self.config.transactions.fee_currency = Some(column.into());
        self
    }

    /// Set the user column for both transaction and dividend files.
    pub fn user_column(mut self, column: impl Into<ColumnSpec>) -> Self {
        let column = column.into();
        self.config.transactions.user = Some(column.clone());
        self.config.dividends.user = Some(column);
        self
    }

    /// Set the dividend symbol column.
    pub fn dividend_symbol_column(mut self, column: impl Into<ColumnSpec>) -> Self {
        self.config.dividends.symbol = column.into();
        self
    }

    /// Set the dividend payment date column.
    pub fn paid_on_column(mut self, column: impl Into<ColumnSpec>) -> Self {
        self.config.dividends.paid_on = column.into();
        self
    }

    /// Set the gross dividend column.
    pub fn gross_column(mut self, column: impl Into<ColumnSpec>) -> Self {
        self.config.dividends.gross = column.into();
        self
    }

    /// Set the withholding column.
    pub fn withheld_column(mut self, column: impl Into<ColumnSpec>) -> Self {
        self.config.dividends.withheld = Some(column.into());
        self
    }

    /// Set the net dividend column.
    pub fn net_column(mut self, column: impl Into<ColumnSpec>) -> Self {
        self.config.dividends.net = Some(column.into());
        self
    }

    /// Set the dividend currency column.
    pub fn dividend_currency_column(mut self, column: impl Into<ColumnSpec>) -> Self {
        self.config.dividends.currency = Some(column.into());
        self
    }

    /// Set whether the CSV has a header row.
    pub const fn has_header(mut self, has_header: bool) -> Self {
        self.config.csv.has_header = has_header;
        self
    }

    /// Set the field delimiter.
    pub const fn delimiter(mut self, delimiter: char) -> Self {
        self.config.csv.delimiter = delimiter;
        self
    }

    /// Set the notation of numeric cells.
    pub const fn number_format(mut self, format: NumberFormat) -> Self {
        self.config.csv.number_format = format;
        self
    }

    /// Set the number of rows to skip.
    pub const fn skip_rows(mut self, count: usize) -> Self {
        self.config.csv.skip_rows = count;
        self
    }

    /// Build the importer configuration.
    pub fn build(self) -> ImporterConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_columns() {
        let config = ImporterConfig::csv()
            .symbol_column("Ticker")
            .side_column(1)
            .default_currency("USD")
            .delimiter(';')
            .build();

        assert_eq!(config.transactions.symbol, ColumnSpec::Name("Ticker".to_string()));
        assert_eq!(config.transactions.side, ColumnSpec::Index(1));
        assert_eq!(config.csv.default_currency.as_deref(), Some("USD"));
        assert_eq!(config.csv.delimiter, ';');
        assert_eq!(config.dividends, DividendColumns::default());
    }

    #[test]
    fn test_user_column_applies_to_both_kinds() {
        let config = ImporterConfig::csv().user_column("user").build();
        assert_eq!(config.transactions.user, Some("user".into()));
        assert_eq!(config.dividends.user, Some("user".into()));
    }

    #[test]
    fn test_broker_statement_defaults_to_try() {
        let config = ImporterConfig::broker_statement();
        assert_eq!(config.csv.default_currency.as_deref(), Some("TRY"));
        assert_eq!(config.transactions.executed_at, ColumnSpec::Name("Tarih".to_string()));
        assert!(config.dividends.currency.is_none());
        assert_eq!(config.csv.number_format, NumberFormat::Turkish);
    }

    #[test]
    fn test_turkish_numbers() {
        let turkish = NumberFormat::Turkish;
        assert_eq!(turkish.normalize("1.234,56"), "1234.56");
        assert_eq!(turkish.normalize("1.250"), "1250");
        assert_eq!(turkish.normalize("250,50 TL"), "250.50");
        assert_eq!(turkish.normalize("12,5 USD"), "12.5");
        assert_eq!(NumberFormat::Plain.normalize("1.250"), "1.250");
    }
}
