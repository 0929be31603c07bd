//! CSV file importer.
//!
//! The importer only maps columns to raw records. Numbers are rewritten into
//! plain notation but, like sides and dates, left as text and validated by the
//! engine, which rejects bad rows one at a time. Rows the CSV parser itself cannot read become import warnings.

use crate::config::{ColumnSpec, ImporterConfig};
use crate::ImportResult;
use anyhow::{Context, Result};
use fifotax_core::{DividendRecord, TransactionRecord};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// CSV file importer.
#[derive(Debug, Clone)]
pub struct CsvImporter {
    config: ImporterConfig,
    user: Option<String>,
}

impl CsvImporter {
    /// Create a new CSV importer with the given configuration.
    pub const fn new(config: ImporterConfig) -> Self {
        Self { config, user: None }
    }

    /// Keep only rows whose user column equals `user`.
    ///
    /// Has no effect when the configuration names no user column.
    pub fn for_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Extract transaction records from a file.
    pub fn extract_transactions_file(&self, path: &Path) -> Result<ImportResult<TransactionRecord>> {
        let content = read_file(path)?;
        self.extract_transactions(&content)
            .with_context(|| format!("Failed to import transactions from {}", path.display()))
    }

    /// Extract transaction records from string content.
    pub fn extract_transactions(&self, content: &str) -> Result<ImportResult<TransactionRecord>> {
        let columns = &self.config.transactions;
        let required = [
            &columns.symbol,
            &columns.side,
            &columns.quantity,
            &columns.price,
            &columns.executed_at,
        ];

        self.extract(content, &required, columns.user.as_ref(), |row| {
            Ok(TransactionRecord {
                symbol: row.required(&columns.symbol)?,
                side: row.required(&columns.side)?,
                quantity: self.number(&row.required(&columns.quantity)?),
                price: self.number(&row.required(&columns.price)?),
                currency: self.currency(row, columns.currency.as_ref()),
                executed_at: row.required(&columns.executed_at)?,
                fee: row.optional(columns.fee.as_ref()).map(|fee| self.number(&fee)),
                fee_currency: row.optional(columns.fee_currency.as_ref()),
                source_row: Some(row.line),
            })
        })
    }

    /// Extract dividend records from a file.
    pub fn extract_dividends_file(&self, path: &Path) -> Result<ImportResult<DividendRecord>> {
        let content = read_file(path)?;
        self.extract_dividends(&content)
            .with_context(|| format!("Failed to import dividends from {}", path.display()))
    }

    /// Extract dividend records from string content.
    pub fn extract_dividends(&self, content: &str) -> Result<ImportResult<DividendRecord>> {
        let columns = &self.config.dividends;
        let required = [&columns.symbol, &columns.paid_on, &columns.gross];

        self.extract(content, &required, columns.user.as_ref(), |row| {
            Ok(DividendRecord {
                symbol: row.required(&columns.symbol)?,
                paid_on: row.required(&columns.paid_on)?,
                gross: self.number(&row.required(&columns.gross)?),
                withheld: row
                    .optional(columns.withheld.as_ref())
                    .map(|withheld| self.number(&withheld)),
                net: row.optional(columns.net.as_ref()).map(|net| self.number(&net)),
                currency: self.currency(row, columns.currency.as_ref()),
                source_row: Some(row.line),
            })
        })
    }

    fn number(&self, value: &str) -> String {
        self.config.csv.number_format.normalize(value)
    }

    fn currency(&self, row: &Row<'_>, column: Option<&ColumnSpec>) -> String {
        row.optional(column)
            .or_else(|| self.config.csv.default_currency.clone())
            .unwrap_or_default()
    }

    fn extract<T>(
        &self,
        content: &str,
        required: &[&ColumnSpec],
        user_column: Option<&ColumnSpec>,
        parse: impl Fn(&Row<'_>) -> Result<T>,
    ) -> Result<ImportResult<T>> {
        let csv_config = &self.config.csv;
        let delimiter = u8::try_from(csv_config.delimiter)
            .with_context(|| format!("Delimiter {:?} is not a single byte", csv_config.delimiter))?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(csv_config.has_header)
            .delimiter(delimiter)
            .from_reader(content.as_bytes());

        // Build column name to index map from headers
        let header_map: HashMap<String, usize> = if csv_config.has_header {
            reader
                .headers()?
                .iter()
                .enumerate()
                .map(|(i, h)| (normalize_header(h), i))
                .collect()
        } else {
            HashMap::new()
        };

        for spec in required {
            if let ColumnSpec::Name(name) = spec {
                if !header_map.contains_key(&normalize_header(name)) {
                    anyhow::bail!("Column '{name}' not found in header");
                }
            }
        }

        let user_filter = self.user.as_deref().zip(user_column);
        let mut result = ImportResult::empty();
        let mut skipped_other_users = 0usize;
        let mut row_num = csv_config.skip_rows;

        for record in reader.records().skip(csv_config.skip_rows) {
            row_num += 1;
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    result = result.with_warning(format!("Row {row_num}: parse error: {e}"));
                    continue;
                }
            };

            // Skip blank rows
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }

            let line = record
                .position()
                .and_then(|p| usize::try_from(p.line()).ok())
                .unwrap_or(row_num);
            let row = Row {
                record: &record,
                header_map: &header_map,
                line,
            };

            if let Some((user, column)) = user_filter {
                if row.optional(Some(column)).as_deref() != Some(user) {
                    skipped_other_users += 1;
                    continue;
                }
            }

            match parse(&row) {
                Ok(parsed) => result.records.push(parsed),
                Err(e) => {
                    result = result.with_warning(format!("Row {line}: {e}"));
                }
            }
        }

        debug!(
            records = result.records.len(),
            warnings = result.warnings.len(),
            skipped_other_users,
            "extracted CSV rows"
        );
        Ok(result)
    }
}

/// One data row with the header it belongs to.
struct Row<'a> {
    record: &'a csv::StringRecord,
    header_map: &'a HashMap<String, usize>,
    /// Line in the file, used for warnings and `source_row`.
    line: usize,
}

impl Row<'_> {
    fn get(&self, spec: &ColumnSpec) -> Result<&str> {
        let index = match spec {
            ColumnSpec::Index(i) => *i,
            ColumnSpec::Name(name) => *self
                .header_map
                .get(&normalize_header(name))
                .with_context(|| format!("Column '{name}' not found in header"))?,
        };

        self.record
            .get(index)
            .with_context(|| format!("Column index {index} out of bounds"))
    }

    fn required(&self, spec: &ColumnSpec) -> Result<String> {
        self.get(spec).map(|value| value.trim().to_string())
    }

    /// Absent columns and blank cells are both `None`.
    fn optional(&self, spec: Option<&ColumnSpec>) -> Option<String> {
        spec.and_then(|spec| self.get(spec).ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to open file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn importer() -> CsvImporter {
        CsvImporter::new(ImporterConfig::default())
    }

    #[test]
    fn test_transactions_basic() {
        let content = "\
symbol,side,quantity,price,currency,executed_at,fee,fee_currency
THYAO,Buy,10,250.5,TRY,2024-01-02 10:00:00,1.25,
AAPL,Sell,3,190,USD,2024-02-01 15:30:00,,
";
        let result = importer().extract_transactions(content).unwrap();
        assert!(result.warnings.is_empty());
        assert_eq!(result.records.len(), 2);

        let first = &result.records[0];
        assert_eq!(first.symbol, "THYAO");
        assert_eq!(first.price, "250.5");
        assert_eq!(first.fee.as_deref(), Some("1.25"));
        assert_eq!(first.fee_currency, None);
        assert_eq!(first.source_row, Some(2));

        let second = &result.records[1];
        assert_eq!(second.side, "Sell");
        assert_eq!(second.fee, None);
        assert_eq!(second.source_row, Some(3));
    }

    #[test]
    fn test_header_matching_ignores_case_and_bom() {
        let content = "\u{feff} Symbol ,SIDE,Quantity,Price,Currency,Executed_At\n\
                       THYAO,buy,1,2,TRY,2024-01-02\n";
        let result = importer().extract_transactions(content).unwrap();
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].executed_at, "2024-01-02");
    }

    #[test]
    fn test_missing_required_column_fails_file() {
        let content = "symbol,side,quantity,currency,executed_at\nTHYAO,buy,1,TRY,2024-01-02\n";
        let err = importer().extract_transactions(content).unwrap_err();
        assert!(err.to_string().contains("'price'"));
    }

    #[test]
    fn test_short_rows_become_warnings() {
        let config = ImporterConfig::csv()
            .has_header(false)
            .symbol_column(0)
            .side_column(1)
            .quantity_column(2)
            .price_column(3)
            .currency_column(4)
            .executed_at_column(5)
            .build();
        let content = "THYAO,buy,1,2,TRY,2024-01-02\nTHYAO,buy,1,2,TRY,2024-01-03\n";
        let result = CsvImporter::new(config.clone())
            .extract_transactions(content)
            .unwrap();
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0].source_row, Some(1));

        let ragged = "THYAO,buy,1,2,TRY,2024-01-02\nTHYAO,buy\n";
        let result = CsvImporter::new(config).extract_transactions(ragged).unwrap();
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].starts_with("Row 2:"));
    }

    #[test]
    fn test_default_currency_fills_blank_cells() {
        let config = ImporterConfig::csv().default_currency("TRY").build();
        let content = "symbol,side,quantity,price,currency,executed_at\n\
                       THYAO,buy,1,2,,2024-01-02\n\
                       AAPL,buy,1,2,usd,2024-01-02\n";
        let result = config.extract_transactions_from_string(content).unwrap();
        assert_eq!(result.records[0].currency, "TRY");
        assert_eq!(result.records[1].currency, "usd");
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let content = "symbol,side,quantity,price,currency,executed_at\n\
                       ,,,,,\n\
                       THYAO,buy,1,2,TRY,2024-01-02\n";
        let result = importer().extract_transactions(content).unwrap();
        assert_eq!(result.records.len(), 1);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_user_filter() {
        let config = ImporterConfig::csv().user_column("user").build();
        let content = "user,symbol,side,quantity,price,currency,executed_at\n\
                       alice,THYAO,buy,1,2,TRY,2024-01-02\n\
                       bob,AAPL,buy,1,2,USD,2024-01-02\n";

        let alice = CsvImporter::new(config.clone())
            .for_user("alice")
            .extract_transactions(content)
            .unwrap();
        assert_eq!(alice.records.len(), 1);
        assert_eq!(alice.records[0].symbol, "THYAO");

        let everyone = CsvImporter::new(config).extract_transactions(content).unwrap();
        assert_eq!(everyone.records.len(), 2);
    }

    #[test]
    fn test_semicolon_delimited_statement() {
        let content = "\
Tarih;İşlem Türü;Sembol;İşlem Tipi;İşlem Durumu;Para Birimi;Gerçekleşen Adet;Ortalama İşlem Fiyatı;İşlem Ücreti
02/01/24 10:15:00;Hisse;THYAO;Alış;Gerçekleşti;TRY;100;250,50;1,20
";
        let mut config = ImporterConfig::broker_statement();
        config.csv.delimiter = ';';
        let result = config.extract_transactions_from_string(content).unwrap();
        assert!(result.warnings.is_empty());

        let record = &result.records[0];
        assert_eq!(record.symbol, "THYAO");
        assert_eq!(record.side, "Alış");
        assert_eq!(record.quantity, "100");
        assert_eq!(record.price, "250.50");
        assert_eq!(record.fee.as_deref(), Some("1.20"));
        assert_eq!(record.executed_at, "02/01/24 10:15:00");
    }

    #[test]
    fn test_statement_numbers_use_turkish_grouping() {
        let content = "\
Tarih;İşlem Türü;Sembol;İşlem Tipi;İşlem Durumu;Para Birimi;Gerçekleşen Adet;Ortalama İşlem Fiyatı;İşlem Ücreti
02/01/24 10:15:00;Hisse;THYAO;Alış;Gerçekleşti;TRY;1.250;1.234,56;12,35 TL
";
        let mut config = ImporterConfig::broker_statement();
        config.csv.delimiter = ';';
        let result = config.extract_transactions_from_string(content).unwrap();

        let record = &result.records[0];
        assert_eq!(record.quantity, "1250");
        assert_eq!(record.price, "1234.56");
        assert_eq!(record.fee.as_deref(), Some("12.35"));
    }

    #[test]
    fn test_plain_numbers_are_left_alone() {
        let content = "symbol,side,quantity,price,currency,executed_at\n\
                       THYAO,buy,1.250,2,TRY,2024-01-02\n";
        let result = importer().extract_transactions(content).unwrap();
        assert_eq!(result.records[0].quantity, "1.250");
    }

    #[test]
    fn test_dividends() {
        let content = "\
symbol,paid_on,gross,withheld,net,currency
KO,2024-04-01,4.60,0.69,,USD
EREGL,2024-05-10,120,,,TRY
";
        let result = importer().extract_dividends(content).unwrap();
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0].withheld.as_deref(), Some("0.69"));
        assert_eq!(result.records[0].net, None);
        assert_eq!(result.records[1].withheld, None);
        assert_eq!(result.records[1].currency, "TRY");
    }

    #[test]
    fn test_non_ascii_delimiter_is_an_error() {
        let mut config = ImporterConfig::default();
        config.csv.delimiter = '€';
        assert!(config.extract_transactions_from_string("a").is_err());
    }
}
