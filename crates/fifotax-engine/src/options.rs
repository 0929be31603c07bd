//! Engine options parsing and storage.

use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;

use fifotax_core::REPORTING_CURRENCY;

/// Known option names.
const KNOWN_OPTIONS: &[&str] = &[
    "reporting_currency",
    "inflation_threshold",
    "acquisition_lookback_months",
    "disposal_lookback_months",
    "tax_year",
    "include_dividends",
];

/// Longest lookback accepted, in months.
const MAX_LOOKBACK_MONTHS: u32 = 24;

/// Option validation warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionWarning {
    /// Warning code (O001 unknown, O002 invalid value, O003 duplicate,
    /// O004 malformed line).
    pub code: &'static str,
    /// Warning message.
    pub message: String,
    /// Option name.
    pub option: String,
    /// Option value.
    pub value: String,
}

/// Which index months a lot's cost is indexed between.
///
/// The acquisition side looks `acquisition_months` back from the month the
/// lot was bought, the disposal side `disposal_months` back from the month of
/// the sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexLookback {
    /// Months before the acquisition month.
    pub acquisition_months: u32,
    /// Months before the disposal month.
    pub disposal_months: u32,
}

impl IndexLookback {
    /// One month back on both sides, as the Turkish income tax rule reads.
    pub const STATUTORY: Self = Self {
        acquisition_months: 1,
        disposal_months: 1,
    };
}

impl Default for IndexLookback {
    fn default() -> Self {
        Self {
            acquisition_months: 1,
            disposal_months: 2,
        }
    }
}

/// Engine options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Currency every figure is reported in.
    pub reporting_currency: String,

    /// Index growth, in percent, that must be strictly exceeded before a lot's
    /// cost is indexed.
    pub inflation_threshold: Decimal,

    /// Index months used for cost indexation.
    pub index_lookback: IndexLookback,

    /// Only report sales, fees and dividends of this calendar year.
    pub tax_year: Option<i32>,

    /// Include the dividend summary in taxable income.
    pub include_dividends: bool,

    /// Validation warnings collected by [`Options::set`].
    pub warnings: Vec<OptionWarning>,

    set_options: HashSet<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            reporting_currency: REPORTING_CURRENCY.to_string(),
            inflation_threshold: Decimal::TEN,
            index_lookback: IndexLookback::default(),
            tax_year: None,
            include_dividends: true,
            warnings: Vec::new(),
            set_options: HashSet::new(),
        }
    }
}

impl Options {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option by name.
    ///
    /// Validates the option and collects any warnings in `self.warnings`.
    /// An invalid value leaves the previous setting in place.
    pub fn set(&mut self, key: &str, value: &str) {
        let key = key.trim();
        let value = value.trim();

        if !KNOWN_OPTIONS.contains(&key) {
            self.warn("O001", format!("Unknown option \"{key}\""), key, value);
            return;
        }

        if !self.set_options.insert(key.to_string()) {
            self.warn(
                "O003",
                format!("Option \"{key}\" can only be specified once"),
                key,
                value,
            );
        }

        match key {
            "reporting_currency" => {
                if !value.is_empty() && value.chars().all(|c| c.is_ascii_alphabetic()) {
                    self.reporting_currency = value.to_ascii_uppercase();
                } else {
                    self.invalid(key, value, "expected a currency code");
                }
            }
            "inflation_threshold" => match Decimal::from_str(value) {
                Ok(d) if !d.is_sign_negative() => self.inflation_threshold = d,
                _ => self.invalid(key, value, "expected a non-negative decimal number"),
            },
            "acquisition_lookback_months" => match parse_lookback(value) {
                Some(n) => self.index_lookback.acquisition_months = n,
                None => self.invalid(key, value, "expected a month count from 0 to 24"),
            },
            "disposal_lookback_months" => match parse_lookback(value) {
                Some(n) => self.index_lookback.disposal_months = n,
                None => self.invalid(key, value, "expected a month count from 0 to 24"),
            },
            "tax_year" => {
                if value.eq_ignore_ascii_case("all") || value.is_empty() {
                    self.tax_year = None;
                } else if let Ok(year) = value.parse::<i32>() {
                    self.tax_year = Some(year);
                } else {
                    self.invalid(key, value, "expected a year or \"all\"");
                }
            }
            "include_dividends" => {
                if value.eq_ignore_ascii_case("true") {
                    self.include_dividends = true;
                } else if value.eq_ignore_ascii_case("false") {
                    self.include_dividends = false;
                } else {
                    self.invalid(key, value, "expected TRUE or FALSE");
                }
            }
            _ => {}
        }
    }

    /// Apply `key = value` lines. Blank lines and `#` comments are skipped.
    pub fn load_str(&mut self, text: &str) {
        for line in text.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) => self.set(key, value),
                None => self.warn(
                    "O004",
                    format!("Malformed option line \"{line}\": expected key = value"),
                    line,
                    "",
                ),
            }
        }
    }

    /// Set an option from a higher-precedence layer, such as the command line
    /// over an options file. Replaces an earlier value without a duplicate
    /// warning; unknown keys and invalid values still warn.
    pub fn set_override(&mut self, key: &str, value: &str) {
        self.set_options.remove(key.trim());
        self.set(key, value);
    }

    /// Check if an option was explicitly set.
    pub fn is_set(&self, key: &str) -> bool {
        self.set_options.contains(key)
    }

    fn invalid(&mut self, key: &str, value: &str, expected: &str) {
        self.warn(
            "O002",
            format!("Invalid value \"{value}\" for option \"{key}\": {expected}"),
            key,
            value,
        );
    }

    fn warn(&mut self, code: &'static str, message: String, key: &str, value: &str) {
        self.warnings.push(OptionWarning {
            code,
            message,
            option: key.to_string(),
            value: value.to_string(),
        });
    }
}

fn parse_lookback(value: &str) -> Option<u32> {
    value.parse::<u32>().ok().filter(|n| *n <= MAX_LOOKBACK_MONTHS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let opts = Options::default();
        assert_eq!(opts.reporting_currency, "TRY");
        assert_eq!(opts.inflation_threshold, dec!(10));
        assert_eq!(opts.index_lookback.acquisition_months, 1);
        assert_eq!(opts.index_lookback.disposal_months, 2);
        assert_eq!(opts.tax_year, None);
        assert!(opts.include_dividends);
    }

    #[test]
    fn test_set_values() {
        let mut opts = Options::new();
        opts.set("inflation_threshold", "12.5");
        opts.set("tax_year", "2024");
        opts.set("disposal_lookback_months", "1");
        opts.set("include_dividends", "FALSE");
        assert!(opts.warnings.is_empty());
        assert_eq!(opts.inflation_threshold, dec!(12.5));
        assert_eq!(opts.tax_year, Some(2024));
        assert_eq!(opts.index_lookback, IndexLookback::STATUTORY);
        assert!(!opts.include_dividends);
        assert!(opts.is_set("tax_year"));
    }

    #[test]
    fn test_unknown_option() {
        let mut opts = Options::new();
        opts.set("booking_method", "LIFO");
        assert_eq!(opts.warnings.len(), 1);
        assert_eq!(opts.warnings[0].code, "O001");
        assert!(opts.warnings[0].message.contains("Unknown option"));
    }

    #[test]
    fn test_duplicate_option() {
        let mut opts = Options::new();
        opts.set("tax_year", "2023");
        opts.set("tax_year", "2024");
        assert_eq!(opts.warnings.len(), 1);
        assert_eq!(opts.warnings[0].code, "O003");
        // last value wins
        assert_eq!(opts.tax_year, Some(2024));
    }

    #[test]
    fn test_override_replaces_without_warning() {
        let mut opts = Options::new();
        opts.load_str("tax_year = 2023\n");
        opts.set_override("tax_year", "2024");
        assert!(opts.warnings.is_empty());
        assert_eq!(opts.tax_year, Some(2024));

        opts.set_override("tax_year", "soon");
        assert_eq!(opts.warnings.len(), 1);
        assert_eq!(opts.warnings[0].code, "O002");
        assert_eq!(opts.tax_year, Some(2024));
    }

    #[test]
    fn test_invalid_values_keep_previous() {
        let mut opts = Options::new();
        opts.set("inflation_threshold", "-1");
        opts.set("acquisition_lookback_months", "36");
        opts.set("include_dividends", "maybe");
        assert_eq!(opts.warnings.len(), 3);
        assert!(opts.warnings.iter().all(|w| w.code == "O002"));
        assert_eq!(opts.inflation_threshold, dec!(10));
        assert_eq!(opts.index_lookback.acquisition_months, 1);
        assert!(opts.include_dividends);
    }

    #[test]
    fn test_load_str() {
        let mut opts = Options::new();
        opts.load_str(
            "# engine settings\n\
             inflation_threshold = 15\n\
             \n\
             tax_year = all   # every year\n\
             this line is wrong\n",
        );
        assert_eq!(opts.inflation_threshold, dec!(15));
        assert_eq!(opts.tax_year, None);
        assert_eq!(opts.warnings.len(), 1);
        assert_eq!(opts.warnings[0].code, "O004");
    }
}
