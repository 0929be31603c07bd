//! Monthly inflation index samples.

use fifotax_core::{parse_decimal, YearMonth};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::months::{fold, month_number};
use crate::TableError;

/// Resolves monthly price-index values.
pub trait InflationIndexLookup {
    /// Index value published for `period`.
    fn index(&self, period: YearMonth) -> Option<Decimal>;

    /// Percentage growth of the index from `from` to `to`:
    /// `(index(to) - index(from)) / index(from) * 100`.
    ///
    /// `None` when either sample is missing, the base is zero or the growth
    /// does not fit in a decimal. A missing sample is never read as a zero
    /// rate.
    fn rate(&self, from: YearMonth, to: YearMonth) -> Option<Decimal> {
        let start = self.index(from)?;
        let end = self.index(to)?;
        end.checked_sub(start)?
            .checked_div(start)?
            .checked_mul(Decimal::ONE_HUNDRED)
    }
}

impl<T: InflationIndexLookup + ?Sized> InflationIndexLookup for &T {
    fn index(&self, period: YearMonth) -> Option<Decimal> {
        (**self).index(period)
    }

    fn rate(&self, from: YearMonth, to: YearMonth) -> Option<Decimal> {
        (**self).rate(from, to)
    }
}

/// In-memory table of monthly index values.
#[derive(Debug, Clone, Default)]
pub struct InflationIndexTable {
    samples: BTreeMap<YearMonth, Decimal>,
}

impl InflationIndexTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the index for a month, replacing any earlier value.
    pub fn insert(&mut self, period: YearMonth, value: Decimal) {
        self.samples.insert(period, value);
    }

    /// Number of months with a sample.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Earliest and latest months covered.
    pub fn span(&self) -> Option<(YearMonth, YearMonth)> {
        let first = self.samples.keys().next()?;
        let last = self.samples.keys().next_back()?;
        Some((*first, *last))
    }

    /// Load a table from a CSV file.
    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        let file = std::fs::File::open(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_reader(file)
    }

    /// Load a table from CSV with a header row.
    ///
    /// Two layouts are accepted:
    ///
    /// - long: `year, month, index`, one month per row
    /// - wide: `YIL, OCAK, ŞUBAT, ..., ARALIK` (or `year, jan, ..., dec`),
    ///   one year per row, as the statistics office publishes Yİ-ÜFE
    ///
    /// Empty cells are months without a sample.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut csv = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv.headers()?.iter().map(fold).collect();
        let year_col = headers
            .iter()
            .position(|h| h == "year" || h == "yil")
            .ok_or(TableError::MissingColumn("year"))?;

        let layout = if let Some(month_col) = headers.iter().position(|h| h == "month" || h == "ay")
        {
            let index_col = headers
                .iter()
                .position(|h| matches!(h.as_str(), "index" | "value" | "endeks"))
                .ok_or(TableError::MissingColumn("index"))?;
            Layout::Long {
                month_col,
                index_col,
            }
        } else {
            let months: Vec<(usize, u32)> = headers
                .iter()
                .enumerate()
                .filter_map(|(col, h)| month_number(h).map(|m| (col, m)))
                .collect();
            if months.is_empty() {
                return Err(TableError::UnknownLayout(headers.join(",")));
            }
            Layout::Wide { months }
        };

        let mut table = Self::new();
        for (idx, record) in csv.records().enumerate() {
            let record = record?;
            let row = idx + 1;
            let cell = |col: usize| record.get(col).unwrap_or("");

            let year_text = cell(year_col);
            if year_text.is_empty() {
                continue;
            }
            let year: i32 = year_text.parse().map_err(|_| TableError::InvalidCell {
                row,
                what: "year",
                value: year_text.to_string(),
            })?;

            match &layout {
                Layout::Long {
                    month_col,
                    index_col,
                } => {
                    let month_text = cell(*month_col);
                    let period = month_text
                        .parse::<u32>()
                        .ok()
                        .or_else(|| month_number(&fold(month_text)))
                        .and_then(|m| YearMonth::new(year, m))
                        .ok_or_else(|| TableError::InvalidCell {
                            row,
                            what: "month",
                            value: month_text.to_string(),
                        })?;
                    if let Some(value) = parse_index(row, cell(*index_col))? {
                        table.insert(period, value);
                    }
                }
                Layout::Wide { months } => {
                    for &(col, month) in months {
                        let Some(period) = YearMonth::new(year, month) else {
                            continue;
                        };
                        if let Some(value) = parse_index(row, cell(col))? {
                            table.insert(period, value);
                        }
                    }
                }
            }
        }

        debug!(samples = table.len(), "loaded inflation index table");
        Ok(table)
    }
}

enum Layout {
    Long { month_col: usize, index_col: usize },
    Wide { months: Vec<(usize, u32)> },
}

fn parse_index(row: usize, text: &str) -> Result<Option<Decimal>, TableError> {
    if text.is_empty() {
        return Ok(None);
    }
    parse_decimal("index", text)
        .map(Some)
        .map_err(|_| TableError::InvalidCell {
            row,
            what: "index",
            value: text.to_string(),
        })
}

impl InflationIndexLookup for InflationIndexTable {
    fn index(&self, period: YearMonth) -> Option<Decimal> {
        self.samples.get(&period).copied()
    }
}

impl FromIterator<(YearMonth, Decimal)> for InflationIndexTable {
    fn from_iter<I: IntoIterator<Item = (YearMonth, Decimal)>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}
