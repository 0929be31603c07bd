//! Per-run memoization of lookups.
//!
//! A run asks for the same date or month many times (every lot matched by a
//! sale needs two index samples). The wrappers here remember each answer,
//! misses included, for the lifetime of one run. They are not `Sync`; build one
//! per run and drop it with the run.

use chrono::NaiveDate;
use fifotax_core::YearMonth;
use rust_decimal::Decimal;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::{ExchangeRateLookup, InflationIndexLookup};

/// Memoizing wrapper around an [`ExchangeRateLookup`].
#[derive(Debug)]
pub struct CachedExchangeRates<L> {
    inner: L,
    memo: RefCell<HashMap<(String, NaiveDate), Option<Decimal>>>,
    queries: Cell<usize>,
}

impl<L: ExchangeRateLookup> CachedExchangeRates<L> {
    /// Wrap a lookup.
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            memo: RefCell::new(HashMap::new()),
            queries: Cell::new(0),
        }
    }

    /// Number of calls that reached the wrapped lookup.
    pub fn upstream_queries(&self) -> usize {
        self.queries.get()
    }

    /// Unwrap the inner lookup.
    pub fn into_inner(self) -> L {
        self.inner
    }
}

impl<L: ExchangeRateLookup> ExchangeRateLookup for CachedExchangeRates<L> {
    fn rate(&self, currency: &str, date: NaiveDate) -> Option<Decimal> {
        let key = (currency.to_string(), date);
        if let Some(hit) = self.memo.borrow().get(&key) {
            return *hit;
        }
        self.queries.set(self.queries.get() + 1);
        let value = self.inner.rate(currency, date);
        self.memo.borrow_mut().insert(key, value);
        value
    }
}

/// Memoizing wrapper around an [`InflationIndexLookup`].
///
/// Only [`InflationIndexLookup::index`] is memoized; rates are derived from
/// cached samples.
#[derive(Debug)]
pub struct CachedInflationIndex<L> {
    inner: L,
    memo: RefCell<HashMap<YearMonth, Option<Decimal>>>,
    queries: Cell<usize>,
}

impl<L: InflationIndexLookup> CachedInflationIndex<L> {
    /// Wrap a lookup.
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            memo: RefCell::new(HashMap::new()),
            queries: Cell::new(0),
        }
    }

    /// Number of calls that reached the wrapped lookup.
    pub fn upstream_queries(&self) -> usize {
        self.queries.get()
    }

    /// Unwrap the inner lookup.
    pub fn into_inner(self) -> L {
        self.inner
    }
}

impl<L: InflationIndexLookup> InflationIndexLookup for CachedInflationIndex<L> {
    fn index(&self, period: YearMonth) -> Option<Decimal> {
        if let Some(hit) = self.memo.borrow().get(&period) {
            return *hit;
        }
        self.queries.set(self.queries.get() + 1);
        let value = self.inner.index(period);
        self.memo.borrow_mut().insert(period, value);
        value
    }
}
