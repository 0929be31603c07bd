//! Realized profit/loss events.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The outcome of matching part or all of one lot against part of one sale.
///
/// All amounts are in the reporting currency. `cost_basis` is after any
/// inflation adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealizedEvent {
    /// Instrument symbol.
    pub symbol: String,
    /// Date of the sale.
    pub sell_date: NaiveDate,
    /// Acquisition date of the matched lot.
    pub acquisition_date: NaiveDate,
    /// Units matched.
    pub matched_quantity: Decimal,
    /// Sale proceeds for the matched units.
    pub proceeds: Decimal,
    /// Cost of the matched units, adjusted when `inflation_applied`.
    pub cost_basis: Decimal,
    /// Whether the cost was scaled by the inflation rate.
    pub inflation_applied: bool,
    /// Index growth between the lookup months, in percent, when both samples
    /// were available.
    pub inflation_rate: Option<Decimal>,
    /// `proceeds - cost_basis`.
    pub profit: Decimal,
}

impl RealizedEvent {
    /// Returns true for a loss.
    #[must_use]
    pub fn is_loss(&self) -> bool {
        self.profit.is_sign_negative() && !self.profit.is_zero()
    }
}

impl fmt::Display for RealizedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} x{} (lot {}): proceeds {} cost {}{} => {}",
            self.sell_date,
            self.symbol,
            self.matched_quantity,
            self.acquisition_date,
            self.proceeds,
            self.cost_basis,
            if self.inflation_applied { "*" } else { "" },
            self.profit
        )
    }
}
