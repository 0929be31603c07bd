//! Dividend payments.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::transaction::{parse_decimal, parse_timestamp};
use crate::{DataError, Money};

/// A raw, unvalidated dividend row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendRecord {
    /// Instrument symbol.
    pub symbol: String,
    /// Payment date.
    pub paid_on: String,
    /// Gross amount before withholding.
    pub gross: String,
    /// Tax withheld at source. Defaults to zero.
    #[serde(default)]
    pub withheld: Option<String>,
    /// Net amount received. Defaults to `gross - withheld`.
    #[serde(default)]
    pub net: Option<String>,
    /// Currency of all three amounts.
    pub currency: String,
    /// Position of the row in its source, for warnings.
    #[serde(default)]
    pub source_row: Option<usize>,
}

/// A validated dividend payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dividend {
    /// Instrument symbol.
    pub symbol: String,
    /// Payment date.
    pub paid_on: NaiveDate,
    /// Gross amount.
    pub gross: Money,
    /// Tax withheld.
    pub withheld: Money,
    /// Net amount.
    pub net: Money,
}

impl Dividend {
    /// Validate a raw record.
    ///
    /// Gross must be positive and withholding non-negative.
    pub fn from_record(record: &DividendRecord) -> Result<Self, DataError> {
        let symbol = record.symbol.trim();
        if symbol.is_empty() {
            return Err(DataError::MissingField { field: "symbol" });
        }
        let currency = record.currency.trim().to_ascii_uppercase();
        if currency.is_empty() {
            return Err(DataError::MissingField { field: "currency" });
        }
        if !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DataError::InvalidCurrency(record.currency.clone()));
        }

        let paid_on = parse_timestamp(&record.paid_on)?.date();
        let gross = parse_decimal("gross", &record.gross)?;
        if gross <= Decimal::ZERO {
            return Err(DataError::NonPositive {
                field: "gross",
                value: gross,
            });
        }

        let withheld = match optional(record.withheld.as_deref()) {
            Some(value) => parse_decimal("withheld", value)?,
            None => Decimal::ZERO,
        };
        if withheld < Decimal::ZERO {
            return Err(DataError::Negative {
                field: "withheld",
                value: withheld,
            });
        }

        let net = match optional(record.net.as_deref()) {
            Some(value) => parse_decimal("net", value)?,
            None => gross - withheld,
        };

        Ok(Self {
            symbol: symbol.to_string(),
            paid_on,
            gross: Money::new(gross, currency.clone()),
            withheld: Money::new(withheld, currency.clone()),
            net: Money::new(net, currency),
        })
    }

    /// Currency the payment was made in.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.gross.currency
    }
}

fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record() -> DividendRecord {
        DividendRecord {
            symbol: "KO".to_string(),
            paid_on: "2024-04-01".to_string(),
            gross: "4.60".to_string(),
            withheld: Some("0.69".to_string()),
            net: None,
            currency: "usd".to_string(),
            source_row: Some(2),
        }
    }

    #[test]
    fn test_net_defaults_to_gross_minus_withheld() {
        let div = Dividend::from_record(&record()).unwrap();
        assert_eq!(div.net, Money::new(dec!(3.91), "USD"));
        assert_eq!(div.currency(), "USD");
        assert_eq!(div.paid_on, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
    }

    #[test]
    fn test_missing_withholding_is_zero() {
        let mut rec = record();
        rec.withheld = None;
        let div = Dividend::from_record(&rec).unwrap();
        assert!(div.withheld.is_zero());
        assert_eq!(div.net.amount, dec!(4.60));
    }

    #[test]
    fn test_rejects_non_positive_gross() {
        let mut rec = record();
        rec.gross = "0".to_string();
        assert!(matches!(
            Dividend::from_record(&rec),
            Err(DataError::NonPositive { field: "gross", .. })
        ));
    }

    #[test]
    fn test_rejects_bad_date() {
        let mut rec = record();
        rec.paid_on = "April".to_string();
        assert!(matches!(
            Dividend::from_record(&rec),
            Err(DataError::InvalidTimestamp(_))
        ));
    }
}
