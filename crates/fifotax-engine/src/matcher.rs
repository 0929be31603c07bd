//! FIFO lot matching with currency conversion and cost indexation.

use chrono::Datelike;
use fifotax_core::{
    DataError, Decimal, Lot, LotSlice, NaiveDate, RealizedEvent, Side, Transaction, YearMonth,
};
use fifotax_rates::{ExchangeRateLookup, InflationIndexLookup};
use std::collections::HashSet;
use tracing::{debug, trace};

use crate::context::LedgerContext;
use crate::error::{LookupMissing, TransactionError};
use crate::options::Options;

/// What a processed sale produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SellOutcome {
    /// One event per lot slice consumed. Empty for sales outside the tax year.
    pub events: Vec<RealizedEvent>,
    /// Quantity no open lot could cover.
    pub unmatched: Decimal,
    /// Whether the sale falls in the reported tax year.
    pub in_scope: bool,
    /// Whether any lot was open when the sale was processed.
    pub found_lots: bool,
    /// Index gaps hit for the first time for this symbol.
    pub index_gaps: Vec<LookupMissing>,
}

#[derive(Debug, Clone)]
struct Indexation {
    unit_cost: Decimal,
    applied: bool,
    rate: Option<Decimal>,
    missing: Option<LookupMissing>,
}

/// The FIFO engine for one run.
///
/// Owns the run's [`LedgerContext`] and borrows the lookups and options.
/// Transactions must be fed in execution order.
pub struct LotMatcher<'a, R, I> {
    context: LedgerContext,
    rates: &'a R,
    index: &'a I,
    options: &'a Options,
    /// Index gaps already warned about, per symbol.
    reported_gaps: HashSet<(String, LookupMissing)>,
}

impl<'a, R, I> LotMatcher<'a, R, I>
where
    R: ExchangeRateLookup,
    I: InflationIndexLookup,
{
    /// Create a matcher with a fresh, empty context.
    pub fn new(rates: &'a R, index: &'a I, options: &'a Options) -> Self {
        Self {
            context: LedgerContext::new(),
            rates,
            index,
            options,
            reported_gaps: HashSet::new(),
        }
    }

    /// The lot state so far.
    pub const fn context(&self) -> &LedgerContext {
        &self.context
    }

    /// Finish matching and hand back the lot state.
    pub fn into_context(self) -> LedgerContext {
        self.context
    }

    /// Convert `amount` of `currency` into the reporting currency using the
    /// rate for exactly `date`.
    pub fn to_reporting(
        &self,
        amount: Decimal,
        currency: &str,
        date: NaiveDate,
    ) -> Result<Decimal, TransactionError> {
        if currency.eq_ignore_ascii_case(&self.options.reporting_currency) {
            return Ok(amount);
        }
        let rate = self
            .rates
            .rate(currency, date)
            .ok_or_else(|| LookupMissing::ExchangeRate {
                currency: currency.to_string(),
                date,
            })?;
        product("converted amount", amount, rate).map_err(TransactionError::from)
    }

    /// Dispatch a validated transaction to [`Self::process_buy`] or
    /// [`Self::process_sell`]. Buys yield `None`.
    pub fn process(&mut self, txn: &Transaction) -> Result<Option<SellOutcome>, TransactionError> {
        match txn.side() {
            Side::Buy => self
                .process_buy(
                    txn.symbol(),
                    txn.quantity(),
                    txn.unit_price(),
                    txn.currency(),
                    txn.date(),
                )
                .map(|()| None),
            Side::Sell => self
                .process_sell(
                    txn.symbol(),
                    txn.quantity(),
                    txn.unit_price(),
                    txn.currency(),
                    txn.date(),
                )
                .map(Some),
        }
    }

    /// Open a lot.
    ///
    /// The unit price is converted to the reporting currency with the rate of
    /// `date`. Fails, leaving the context untouched, if the quantity is not
    /// positive, the price is negative, the rate is missing or the converted
    /// price is out of range.
    pub fn process_buy(
        &mut self,
        symbol: &str,
        quantity: Decimal,
        unit_price: Decimal,
        currency: &str,
        date: NaiveDate,
    ) -> Result<(), TransactionError> {
        validate(quantity, unit_price)?;
        let unit_cost = self.to_reporting(unit_price, currency, date)?;

        debug!(symbol, %quantity, %unit_cost, %date, "opening lot");
        self.context
            .add_lot(Lot::new(symbol, quantity, unit_cost, date));
        Ok(())
    }

    /// Match a sale against the oldest open lots.
    ///
    /// Each consumed slice yields one [`RealizedEvent`]. Quantity beyond the
    /// open lots is returned as [`SellOutcome::unmatched`]. Sales outside the
    /// configured tax year consume lots without producing events and without
    /// needing an exchange rate. A sale whose amounts overflow fails with
    /// [`DataError::Overflow`] and consumes nothing.
    pub fn process_sell(
        &mut self,
        symbol: &str,
        quantity: Decimal,
        unit_price: Decimal,
        currency: &str,
        date: NaiveDate,
    ) -> Result<SellOutcome, TransactionError> {
        validate(quantity, unit_price)?;

        let in_scope = self.options.tax_year.map_or(true, |year| date.year() == year);
        if !in_scope {
            let queue = self.context.queue_mut(symbol);
            let found_lots = !queue.is_empty();
            let consumption = queue.consume(quantity);
            debug!(
                symbol,
                %quantity,
                %date,
                unmatched = %consumption.unmatched,
                "sale outside tax year, lots consumed without reporting"
            );
            return Ok(SellOutcome {
                unmatched: consumption.unmatched,
                in_scope,
                found_lots,
                ..SellOutcome::default()
            });
        }

        let sell_unit = self.to_reporting(unit_price, currency, date)?;

        // Work on a copy so a failed sale leaves the open lots as they were.
        let mut queue = self.context.queue_mut(symbol).clone();
        let found_lots = !queue.is_empty();
        let consumption = queue.consume(quantity);

        let mut events = Vec::with_capacity(consumption.slices.len());
        let mut gaps = Vec::new();
        for slice in &consumption.slices {
            let indexation = self.index_cost(slice, date)?;
            let proceeds = product("proceeds", sell_unit, slice.quantity)?;
            let cost_basis = product("cost basis", indexation.unit_cost, slice.quantity)?;
            let profit = proceeds
                .checked_sub(cost_basis)
                .ok_or(DataError::Overflow { field: "profit" })?;
            debug!(
                symbol,
                quantity = %slice.quantity,
                acquired = %slice.acquired,
                cost = %indexation.unit_cost,
                indexed = indexation.applied,
                %profit,
                "matched lot"
            );
            gaps.extend(indexation.missing);
            events.push(RealizedEvent {
                symbol: symbol.to_string(),
                sell_date: date,
                acquisition_date: slice.acquired,
                matched_quantity: slice.quantity,
                proceeds,
                cost_basis,
                inflation_applied: indexation.applied,
                inflation_rate: indexation.rate,
                profit,
            });
        }
        *self.context.queue_mut(symbol) = queue;

        let mut index_gaps = Vec::new();
        for gap in gaps {
            if self.reported_gaps.insert((symbol.to_string(), gap.clone())) {
                index_gaps.push(gap);
            }
        }

        Ok(SellOutcome {
            events,
            unmatched: consumption.unmatched,
            in_scope,
            found_lots,
            index_gaps,
        })
    }

    /// Index a slice's unit cost between the lookback months of its
    /// acquisition and of the sale.
    fn index_cost(&self, slice: &LotSlice, sold: NaiveDate) -> Result<Indexation, DataError> {
        let lookback = self.options.index_lookback;
        let from = YearMonth::of(slice.acquired).months_back(lookback.acquisition_months);
        let to = YearMonth::of(sold).months_back(lookback.disposal_months);

        let Some(rate) = self.index.rate(from, to) else {
            return Ok(Indexation {
                unit_cost: slice.unit_cost,
                applied: false,
                rate: None,
                missing: Some(LookupMissing::InflationRate { from, to }),
            });
        };

        if rate > self.options.inflation_threshold {
            let factor = Decimal::ONE
                .checked_add(rate / Decimal::ONE_HUNDRED)
                .ok_or(DataError::Overflow { field: "index factor" })?;
            let unit_cost = product("indexed cost", slice.unit_cost, factor)?;
            trace!(%from, %to, %rate, %unit_cost, "indexed cost");
            Ok(Indexation {
                unit_cost,
                applied: true,
                rate: Some(rate),
                missing: None,
            })
        } else {
            Ok(Indexation {
                unit_cost: slice.unit_cost,
                applied: false,
                rate: Some(rate),
                missing: None,
            })
        }
    }
}

fn product(field: &'static str, a: Decimal, b: Decimal) -> Result<Decimal, DataError> {
    a.checked_mul(b).ok_or(DataError::Overflow { field })
}

fn validate(quantity: Decimal, unit_price: Decimal) -> Result<(), DataError> {
    if quantity <= Decimal::ZERO {
        return Err(DataError::NonPositive {
            field: "quantity",
            value: quantity,
        });
    }
    if unit_price < Decimal::ZERO {
        return Err(DataError::Negative {
            field: "price",
            value: unit_price,
        });
    }
    Ok(())
}
