//! Folding realized events into report totals.

use fifotax_core::{Decimal, RealizedEvent};
use std::collections::BTreeMap;

use crate::context::OpenLot;
use crate::report::{DividendSummary, TaxReport};

/// Accumulates the output of a [`LotMatcher`](crate::LotMatcher) run.
#[derive(Debug, Clone, Default)]
pub struct PositionAggregator {
    per_symbol: BTreeMap<String, Decimal>,
    events: Vec<RealizedEvent>,
    unmatched: BTreeMap<String, Decimal>,
    symbols_without_lots: Vec<String>,
    commission: Decimal,
}

impl PositionAggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one realized event.
    pub fn record_event(&mut self, event: RealizedEvent) {
        *self
            .per_symbol
            .entry(event.symbol.clone())
            .or_insert(Decimal::ZERO) += event.profit;
        self.events.push(event);
    }

    /// Note quantity sold without a lot.
    pub fn record_unmatched(&mut self, symbol: &str, quantity: Decimal) {
        *self
            .unmatched
            .entry(symbol.to_string())
            .or_insert(Decimal::ZERO) += quantity;
    }

    /// Note a sale that found no open lot at all.
    pub fn record_missing_lots(&mut self, symbol: &str) {
        if !self.symbols_without_lots.iter().any(|s| s == symbol) {
            self.symbols_without_lots.push(symbol.to_string());
        }
    }

    /// Add a commission already converted to the reporting currency.
    pub fn add_commission(&mut self, amount: Decimal) {
        self.commission += amount;
    }

    /// Per-symbol totals so far.
    pub fn per_symbol(&self) -> &BTreeMap<String, Decimal> {
        &self.per_symbol
    }

    /// Produce the report.
    pub fn finish(
        self,
        reporting_currency: &str,
        tax_year: Option<i32>,
        dividends: DividendSummary,
        open_lots: BTreeMap<String, Vec<OpenLot>>,
    ) -> TaxReport {
        let (total_profit, total_loss) = self.per_symbol.values().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(profit, loss), &total| {
                if total > Decimal::ZERO {
                    (profit + total, loss)
                } else {
                    (profit, loss + total)
                }
            },
        );
        let net_profit_loss = total_profit + total_loss;
        let net_after_commission = net_profit_loss - self.commission;
        let total_taxable_income = net_after_commission + dividends.gross;

        TaxReport {
            reporting_currency: reporting_currency.to_string(),
            tax_year,
            per_symbol: self.per_symbol,
            total_profit,
            total_loss,
            net_profit_loss,
            total_commission: self.commission,
            net_after_commission,
            dividends,
            total_taxable_income,
            symbols_without_lots: self.symbols_without_lots,
            unmatched: self.unmatched,
            events: self.events,
            open_lots,
        }
    }
}
