//! Exchange rates into the reporting currency.

use chrono::NaiveDate;
use fifotax_core::{parse_decimal, parse_timestamp};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::months::fold;
use crate::TableError;

/// Resolves how many reporting-currency units one unit of `currency` was worth
/// on `date`.
///
/// Implementations match the date exactly. A missing sample is `None`; callers
/// decide what a miss means, nothing substitutes a neighbouring date.
pub trait ExchangeRateLookup {
    /// Rate for `currency` on exactly `date`.
    fn rate(&self, currency: &str, date: NaiveDate) -> Option<Decimal>;
}

impl<T: ExchangeRateLookup + ?Sized> ExchangeRateLookup for &T {
    fn rate(&self, currency: &str, date: NaiveDate) -> Option<Decimal> {
        (**self).rate(currency, date)
    }
}

/// In-memory table of daily exchange rates.
///
/// Rates are keyed by currency code, then date.
#[derive(Debug, Clone, Default)]
pub struct ExchangeRateTable {
    rates: HashMap<String, BTreeMap<NaiveDate, Decimal>>,
}

impl ExchangeRateTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rate. A later sample for the same currency and date replaces
    /// the earlier one.
    pub fn insert(&mut self, currency: &str, date: NaiveDate, rate: Decimal) {
        let previous = self
            .rates
            .entry(currency.trim().to_ascii_uppercase())
            .or_default()
            .insert(date, rate);
        if let Some(previous) = previous {
            debug!(currency, %date, %previous, %rate, "replacing exchange rate sample");
        }
    }

    /// Total number of samples.
    pub fn len(&self) -> usize {
        self.rates.values().map(BTreeMap::len).sum()
    }

    /// Returns true if the table holds no samples.
    pub fn is_empty(&self) -> bool {
        self.rates.values().all(BTreeMap::is_empty)
    }

    /// Currencies with at least one sample, sorted.
    pub fn currencies(&self) -> Vec<&str> {
        let mut currencies: Vec<&str> = self.rates.keys().map(String::as_str).collect();
        currencies.sort_unstable();
        currencies
    }

    /// Load a table from a CSV file.
    ///
    /// See [`Self::from_csv_reader`] for the accepted layout.
    pub fn from_path(path: &Path, default_currency: Option<&str>) -> Result<Self, TableError> {
        let file = std::fs::File::open(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_reader(file, default_currency)
    }

    /// Load a table from CSV with a header row.
    ///
    /// Columns are `date`, `rate` and optionally `currency`. The central bank's
    /// Turkish headers `Tarih` / `Gecerli Oldugu Tarih` and `Doviz Alis` are
    /// accepted as aliases. Without a currency column every row is taken to
    /// be in `default_currency`.
    pub fn from_csv_reader<R: Read>(
        reader: R,
        default_currency: Option<&str>,
    ) -> Result<Self, TableError> {
        let mut csv = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv.headers()?.iter().map(fold).collect();
        let find = |names: &[&str]| headers.iter().position(|h| names.contains(&h.as_str()));

        let date_col = find(&["date", "tarih", "gecerli oldugu tarih"])
            .ok_or(TableError::MissingColumn("date"))?;
        let rate_col =
            find(&["rate", "doviz alis", "buying"]).ok_or(TableError::MissingColumn("rate"))?;
        let currency_col = find(&["currency", "doviz", "para birimi"]);
        if currency_col.is_none() && default_currency.is_none() {
            return Err(TableError::MissingColumn("currency"));
        }

        let mut table = Self::new();
        for (idx, record) in csv.records().enumerate() {
            let record = record?;
            let row = idx + 1;
            let cell = |col: usize| record.get(col).unwrap_or("");

            let date_text = cell(date_col);
            let rate_text = cell(rate_col);
            if date_text.is_empty() && rate_text.is_empty() {
                continue;
            }

            let date = parse_timestamp(date_text)
                .map_err(|_| TableError::InvalidCell {
                    row,
                    what: "date",
                    value: date_text.to_string(),
                })?
                .date();
            let rate = parse_decimal("rate", rate_text).map_err(|_| TableError::InvalidCell {
                row,
                what: "rate",
                value: rate_text.to_string(),
            })?;
            let currency = match currency_col {
                Some(col) if !cell(col).is_empty() => cell(col),
                _ => default_currency.unwrap_or_default(),
            };

            table.insert(currency, date, rate);
        }

        debug!(samples = table.len(), "loaded exchange rate table");
        Ok(table)
    }
}

impl ExchangeRateLookup for ExchangeRateTable {
    fn rate(&self, currency: &str, date: NaiveDate) -> Option<Decimal> {
        self.rates
            .get(currency)
            .or_else(|| self.rates.get(&currency.to_ascii_uppercase()))?
            .get(&date)
            .copied()
    }
}

impl FromIterator<(String, NaiveDate, Decimal)> for ExchangeRateTable {
    fn from_iter<I: IntoIterator<Item = (String, NaiveDate, Decimal)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (currency, date, rate) in iter {
            table.insert(&currency, date, rate);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_exact_date_only() {
        let mut table = ExchangeRateTable::new();
        table.insert("USD", date(2024, 3, 1), dec!(31.2));

        assert_eq!(table.rate("USD", date(2024, 3, 1)), Some(dec!(31.2)));
        assert_eq!(table.rate("usd", date(2024, 3, 1)), Some(dec!(31.2)));
        // no fallback to the previous day
        assert_eq!(table.rate("USD", date(2024, 3, 2)), None);
        assert_eq!(table.rate("EUR", date(2024, 3, 1)), None);
    }

    #[test]
    fn test_insert_replaces_same_day() {
        let mut table = ExchangeRateTable::new();
        table.insert("USD", date(2024, 3, 1), dec!(31.2));
        table.insert("USD", date(2024, 3, 1), dec!(31.3));
        assert_eq!(table.len(), 1);
        assert_eq!(table.rate("USD", date(2024, 3, 1)), Some(dec!(31.3)));
    }

    #[test]
    fn test_from_csv_with_currency_column() {
        let csv = "date,currency,rate\n2024-03-01,USD,31.2\n2024-03-01,EUR,33.9\n\n01.03.2024,GBP,\"39,5\"\n";
        let table = ExchangeRateTable::from_csv_reader(csv.as_bytes(), None).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.currencies(), vec!["EUR", "GBP", "USD"]);
        assert_eq!(table.rate("GBP", date(2024, 3, 1)), Some(dec!(39.5)));
    }

    #[test]
    fn test_from_csv_turkish_headers_with_default_currency() {
        let csv = "Gecerli Oldugu Tarih,Doviz Alis\n2023-12-20,29.1034\n2023-12-22,29.2107\n";
        let table = ExchangeRateTable::from_csv_reader(csv.as_bytes(), Some("USD")).unwrap();
        assert_eq!(table.rate("USD", date(2023, 12, 22)), Some(dec!(29.2107)));
    }

    #[test]
    fn test_from_csv_missing_currency_without_default() {
        let csv = "date,rate\n2024-03-01,31.2\n";
        let err = ExchangeRateTable::from_csv_reader(csv.as_bytes(), None).unwrap_err();
        assert!(matches!(err, TableError::MissingColumn("currency")));
    }

    #[test]
    fn test_from_csv_rejects_bad_rate() {
        let csv = "date,currency,rate\n2024-03-01,USD,abc\n";
        let err = ExchangeRateTable::from_csv_reader(csv.as_bytes(), None).unwrap_err();
        match err {
            TableError::InvalidCell { row, what, value } => {
                assert_eq!(row, 1);
                assert_eq!(what, "rate");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
