//! Transaction types and the ingestion boundary.
//!
//! A [`TransactionRecord`] is what a transaction store or file importer hands
//! over: loosely typed text fields. [`Transaction::from_record`] is the only way
//! to turn one into a [`Transaction`], and it fails with a typed [`DataError`]
//! instead of defaulting malformed numbers to zero.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::Money;

/// Error for a single malformed record.
///
/// A `DataError` rejects only the record it was raised for; the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    /// A required field was empty or absent.
    #[error("missing field `{field}`")]
    MissingField {
        /// Name of the field.
        field: &'static str,
    },

    /// A numeric field could not be parsed.
    #[error("invalid number {value:?} in field `{field}`")]
    InvalidNumber {
        /// Name of the field.
        field: &'static str,
        /// The offending text.
        value: String,
    },

    /// A field that must be strictly positive was zero or negative.
    #[error("`{field}` must be positive, got {value}")]
    NonPositive {
        /// Name of the field.
        field: &'static str,
        /// The parsed value.
        value: Decimal,
    },

    /// A field that must not be negative was negative.
    #[error("`{field}` must not be negative, got {value}")]
    Negative {
        /// Name of the field.
        field: &'static str,
        /// The parsed value.
        value: Decimal,
    },

    /// An amount derived from the record does not fit in a decimal.
    #[error("`{field}` is out of range")]
    Overflow {
        /// Name of the derived amount.
        field: &'static str,
    },

    /// The side was neither a buy nor a sell.
    #[error("unknown transaction side {0:?}")]
    UnknownSide(String),

    /// The timestamp matched none of the accepted formats.
    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),

    /// The currency code is not a plausible ISO-like code.
    #[error("invalid currency code {0:?}")]
    InvalidCurrency(String),
}

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Acquisition; opens a lot.
    Buy,
    /// Disposal; consumes lots.
    Sell,
}

impl FromStr for Side {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            // `to_lowercase` maps dotted and dotless I alike to `i`
            "buy" | "b" | "long" | "alış" | "aliş" | "alis" => Ok(Self::Buy),
            "sell" | "s" | "short" | "satış" | "satiş" | "satis" => Ok(Self::Sell),
            _ => Err(DataError::UnknownSide(s.to_string())),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// A raw, unvalidated transaction row.
///
/// All fields are text as delivered by the source. Optional fee fields may be
/// absent; everything else is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Instrument symbol.
    pub symbol: String,
    /// "Buy"/"Sell" or an accepted synonym.
    pub side: String,
    /// Executed quantity.
    pub quantity: String,
    /// Average unit price in `currency`.
    pub price: String,
    /// Currency of `price`.
    pub currency: String,
    /// Execution timestamp.
    pub executed_at: String,
    /// Transaction fee, if any.
    #[serde(default)]
    pub fee: Option<String>,
    /// Currency of the fee; defaults to `currency`.
    #[serde(default)]
    pub fee_currency: Option<String>,
    /// Position of the row in its source, for warnings.
    #[serde(default)]
    pub source_row: Option<usize>,
}

/// A validated transaction.
///
/// Fields are private so that every `Transaction` in existence has passed
/// validation: positive quantity, non-negative price and fee, known side.
///
/// # Examples
///
/// ```
/// use fifotax_core::{Side, Transaction, TransactionRecord};
/// use rust_decimal_macros::dec;
///
/// let record = TransactionRecord {
///     symbol: "THYAO".into(),
///     side: "Alış".into(),
///     quantity: "100".into(),
///     price: "250,50".into(),
///     currency: "TRY".into(),
///     executed_at: "2023-12-20 10:15:00".into(),
///     ..Default::default()
/// };
///
/// let txn = Transaction::from_record(&record).unwrap();
/// assert_eq!(txn.side(), Side::Buy);
/// assert_eq!(txn.unit_price(), dec!(250.50));
/// assert!(txn.fee().is_zero());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    symbol: String,
    side: Side,
    quantity: Decimal,
    unit_price: Decimal,
    currency: String,
    executed_at: NaiveDateTime,
    fee: Money,
}

impl Transaction {
    /// Create a validated transaction with no fee.
    pub fn new(
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        unit_price: Decimal,
        currency: impl Into<String>,
        executed_at: NaiveDateTime,
    ) -> Result<Self, DataError> {
        let symbol = symbol.into().trim().to_string();
        if symbol.is_empty() {
            return Err(DataError::MissingField { field: "symbol" });
        }
        if quantity <= Decimal::ZERO {
            return Err(DataError::NonPositive {
                field: "quantity",
                value: quantity,
            });
        }
        if unit_price.is_sign_negative() && !unit_price.is_zero() {
            return Err(DataError::Negative {
                field: "price",
                value: unit_price,
            });
        }
        let currency = normalize_currency(&currency.into())?;
        let fee = Money::zero(currency.clone());

        Ok(Self {
            symbol,
            side,
            quantity,
            unit_price,
            currency,
            executed_at,
            fee,
        })
    }

    /// Attach a fee. Fails if the fee is negative.
    pub fn with_fee(mut self, fee: Money) -> Result<Self, DataError> {
        if fee.amount.is_sign_negative() && !fee.amount.is_zero() {
            return Err(DataError::Negative {
                field: "fee",
                value: fee.amount,
            });
        }
        let currency = normalize_currency(&fee.currency)?;
        self.fee = Money::new(fee.amount, currency);
        Ok(self)
    }

    /// Validate a raw record.
    pub fn from_record(record: &TransactionRecord) -> Result<Self, DataError> {
        let side = required("side", &record.side)?.parse::<Side>()?;
        let quantity = parse_decimal("quantity", required("quantity", &record.quantity)?)?;
        let price = parse_decimal("price", required("price", &record.price)?)?;
        let currency = required("currency", &record.currency)?;
        let executed_at = parse_timestamp(required("executed_at", &record.executed_at)?)?;

        let txn = Self::new(
            required("symbol", &record.symbol)?,
            side,
            quantity,
            price,
            currency,
            executed_at,
        )?;

        match record.fee.as_deref().map(str::trim) {
            None | Some("") => Ok(txn),
            Some(fee) => {
                let amount = parse_decimal("fee", fee)?;
                let fee_currency = record
                    .fee_currency
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .unwrap_or(currency);
                txn.with_fee(Money::new(amount, fee_currency))
            }
        }
    }

    /// Instrument symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Buy or sell.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Executed quantity, always positive.
    #[must_use]
    pub const fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Unit price in [`Self::currency`].
    #[must_use]
    pub const fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Currency the price is quoted in.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Execution timestamp.
    #[must_use]
    pub const fn executed_at(&self) -> NaiveDateTime {
        self.executed_at
    }

    /// Execution date.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.executed_at.date()
    }

    /// The fee charged for this transaction.
    #[must_use]
    pub const fn fee(&self) -> &Money {
        &self.fee
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} @ {} {} ({})",
            self.executed_at.format("%Y-%m-%d %H:%M:%S"),
            self.side,
            self.quantity,
            self.unit_price,
            self.currency,
            self.symbol
        )
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, DataError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(DataError::MissingField { field })
    } else {
        Ok(trimmed)
    }
}

fn normalize_currency(code: &str) -> Result<String, DataError> {
    let code = code.trim();
    if (2..=5).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(DataError::InvalidCurrency(code.to_string()))
    }
}

/// Parse a decimal field.
///
/// Accepts `.` as the decimal separator, or `,` when no `.` is present
/// (`"250,50"`). Surrounding whitespace is ignored. Anything else is a
/// [`DataError::InvalidNumber`]; there is no fallback to zero.
pub fn parse_decimal(field: &'static str, value: &str) -> Result<Decimal, DataError> {
    let trimmed = value.trim();
    let invalid = || DataError::InvalidNumber {
        field,
        value: value.to_string(),
    };
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let normalized = if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replace(',', ".")
    } else {
        trimmed.to_string()
    };

    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .map_err(|_| invalid())
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d/%m/%y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%y"];

/// Parse an execution timestamp.
///
/// Date-only values are taken as midnight.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, DataError> {
    let trimmed = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| DataError::InvalidTimestamp(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(side: &str, quantity: &str, price: &str) -> TransactionRecord {
        TransactionRecord {
            symbol: "AAPL".to_string(),
            side: side.to_string(),
            quantity: quantity.to_string(),
            price: price.to_string(),
            currency: "usd".to_string(),
            executed_at: "2024-03-01 15:30:00".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_side_synonyms() {
        assert_eq!("Alış".parse::<Side>(), Ok(Side::Buy));
        assert_eq!("SATIŞ".parse::<Side>(), Ok(Side::Sell));
        assert_eq!("buy".parse::<Side>(), Ok(Side::Buy));
        assert_eq!(" s ".parse::<Side>(), Ok(Side::Sell));
        assert!(matches!(
            "hold".parse::<Side>(),
            Err(DataError::UnknownSide(_))
        ));
    }

    #[test]
    fn test_from_record_valid() {
        let txn = Transaction::from_record(&record("Buy", "10", "185.25")).unwrap();
        assert_eq!(txn.symbol(), "AAPL");
        assert_eq!(txn.quantity(), dec!(10));
        assert_eq!(txn.unit_price(), dec!(185.25));
        assert_eq!(txn.currency(), "USD");
        assert_eq!(txn.fee(), &Money::zero("USD"));
        assert_eq!(
            txn.date(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }

    #[test]
    fn test_from_record_with_fee_defaults_to_native_currency() {
        let mut rec = record("Sell", "10", "185.25");
        rec.fee = Some("1,25".to_string());
        let txn = Transaction::from_record(&rec).unwrap();
        assert_eq!(txn.fee(), &Money::new(dec!(1.25), "USD"));

        rec.fee_currency = Some("try".to_string());
        let txn = Transaction::from_record(&rec).unwrap();
        assert_eq!(txn.fee(), &Money::new(dec!(1.25), "TRY"));
    }

    #[test]
    fn test_from_record_rejects_non_numeric_price() {
        let err = Transaction::from_record(&record("Buy", "10", "abc")).unwrap_err();
        assert_eq!(
            err,
            DataError::InvalidNumber {
                field: "price",
                value: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_from_record_rejects_zero_quantity() {
        let err = Transaction::from_record(&record("Buy", "0", "10")).unwrap_err();
        assert!(matches!(
            err,
            DataError::NonPositive {
                field: "quantity",
                ..
            }
        ));
    }

    #[test]
    fn test_from_record_rejects_negative_quantity() {
        let err = Transaction::from_record(&record("Buy", "-5", "10")).unwrap_err();
        assert!(matches!(err, DataError::NonPositive { .. }));
    }

    #[test]
    fn test_from_record_missing_fields() {
        let mut rec = record("Buy", "10", "10");
        rec.symbol = "  ".to_string();
        assert_eq!(
            Transaction::from_record(&rec).unwrap_err(),
            DataError::MissingField { field: "symbol" }
        );

        let rec = record("Buy", "", "10");
        assert_eq!(
            Transaction::from_record(&rec).unwrap_err(),
            DataError::MissingField { field: "quantity" }
        );
    }

    #[test]
    fn test_from_record_rejects_bad_currency() {
        let mut rec = record("Buy", "10", "10");
        rec.currency = "US$".to_string();
        assert!(matches!(
            Transaction::from_record(&rec),
            Err(DataError::InvalidCurrency(_))
        ));
    }

    #[test]
    fn test_negative_fee_rejected() {
        let mut rec = record("Buy", "10", "10");
        rec.fee = Some("-1".to_string());
        assert!(matches!(
            Transaction::from_record(&rec),
            Err(DataError::Negative { field: "fee", .. })
        ));
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("x", "12.5"), Ok(dec!(12.5)));
        assert_eq!(parse_decimal("x", " 12,5 "), Ok(dec!(12.5)));
        assert_eq!(parse_decimal("x", "1e2"), Ok(dec!(100)));
        assert!(parse_decimal("x", "").is_err());
        assert!(parse_decimal("x", "NaN").is_err());
        assert!(parse_decimal("x", "1.234,56").is_err());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 12, 20)
            .unwrap()
            .and_hms_opt(10, 15, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2023-12-20 10:15:00"), Ok(expected));
        assert_eq!(parse_timestamp("2023-12-20T10:15:00"), Ok(expected));
        assert_eq!(parse_timestamp("20.12.2023 10:15:00"), Ok(expected));
        assert_eq!(parse_timestamp("20/12/23 10:15:00"), Ok(expected));

        let midnight = NaiveDate::from_ymd_opt(2023, 12, 20)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2023-12-20"), Ok(midnight));
        assert_eq!(parse_timestamp("20.12.2023"), Ok(midnight));
        assert_eq!(parse_timestamp("20/12/23"), Ok(midnight));

        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_display() {
        let txn = Transaction::from_record(&record("Buy", "10", "185.25")).unwrap();
        assert_eq!(
            txn.to_string(),
            "2024-03-01 15:30:00 BUY 10 @ 185.25 USD (AAPL)"
        );
    }
}
