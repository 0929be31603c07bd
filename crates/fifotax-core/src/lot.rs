//! Lots and the per-symbol FIFO lot queue.
//!
//! A [`LotQueue`] holds the open lots of one symbol, oldest acquisition first.
//! Lots with the same acquisition date keep their arrival order. Selling
//! consumes from the head of the queue and removes lots as they are exhausted.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Consumption state of a lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LotState {
    /// Nothing consumed yet.
    Open,
    /// Some, but not all, units consumed.
    PartiallyConsumed,
    /// All units consumed. Exhausted lots never stay in a queue.
    Exhausted,
}

/// A parcel of acquired units with a fixed unit cost in the reporting currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    symbol: String,
    original_quantity: Decimal,
    remaining_quantity: Decimal,
    unit_cost: Decimal,
    acquired: NaiveDate,
    sequence: u64,
}

impl Lot {
    /// Create a new open lot.
    ///
    /// `unit_cost` must already be in the reporting currency.
    #[must_use]
    pub fn new(
        symbol: impl Into<String>,
        quantity: Decimal,
        unit_cost: Decimal,
        acquired: NaiveDate,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            original_quantity: quantity,
            remaining_quantity: quantity,
            unit_cost,
            acquired,
            sequence: 0,
        }
    }

    /// Instrument symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Quantity at acquisition.
    #[must_use]
    pub const fn original_quantity(&self) -> Decimal {
        self.original_quantity
    }

    /// Units not yet consumed.
    #[must_use]
    pub const fn remaining_quantity(&self) -> Decimal {
        self.remaining_quantity
    }

    /// Unit cost in the reporting currency, fixed at creation.
    #[must_use]
    pub const fn unit_cost(&self) -> Decimal {
        self.unit_cost
    }

    /// Acquisition date.
    #[must_use]
    pub const fn acquired(&self) -> NaiveDate {
        self.acquired
    }

    /// Arrival position within its queue.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Current consumption state.
    #[must_use]
    pub fn state(&self) -> LotState {
        if self.remaining_quantity <= Decimal::ZERO {
            LotState::Exhausted
        } else if self.remaining_quantity < self.original_quantity {
            LotState::PartiallyConsumed
        } else {
            LotState::Open
        }
    }

    /// Take up to `quantity` units, returning how many were taken.
    fn take(&mut self, quantity: Decimal) -> Decimal {
        let take = quantity.min(self.remaining_quantity);
        self.remaining_quantity -= take;
        take
    }
}

impl fmt::Display for Lot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{} @ {} [{}]",
            self.symbol, self.remaining_quantity, self.original_quantity, self.unit_cost, self.acquired
        )
    }
}

/// The part of one lot consumed by a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotSlice {
    /// Units taken from the lot.
    pub quantity: Decimal,
    /// The lot's unit cost in the reporting currency.
    pub unit_cost: Decimal,
    /// The lot's acquisition date.
    pub acquired: NaiveDate,
    /// Lot state after this slice was taken.
    pub state_after: LotState,
}

impl LotSlice {
    /// Unadjusted cost of the slice.
    #[must_use]
    pub fn cost_basis(&self) -> Decimal {
        self.quantity * self.unit_cost
    }
}

/// Result of consuming a quantity from a [`LotQueue`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Consumption {
    /// Slices in the order they were taken, oldest lot first.
    pub slices: Vec<LotSlice>,
    /// Quantity that no lot could cover. Zero when the sale was fully matched.
    pub unmatched: Decimal,
}

impl Consumption {
    /// Total quantity matched against lots.
    #[must_use]
    pub fn matched(&self) -> Decimal {
        self.slices.iter().map(|s| s.quantity).sum()
    }
}

/// FIFO queue of open lots for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotQueue {
    symbol: String,
    lots: VecDeque<Lot>,
    next_sequence: u64,
}

impl LotQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            lots: VecDeque::new(),
            next_sequence: 0,
        }
    }

    /// The symbol this queue tracks.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Open lots, oldest first.
    pub fn lots(&self) -> impl Iterator<Item = &Lot> {
        self.lots.iter()
    }

    /// Number of open lots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lots.len()
    }

    /// Returns true if no lots are open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    /// Sum of remaining quantities.
    #[must_use]
    pub fn total_quantity(&self) -> Decimal {
        self.lots.iter().map(Lot::remaining_quantity).sum()
    }

    /// Add a lot.
    ///
    /// The lot goes after every lot acquired on or before its date, so a lot
    /// arriving out of date order still lands in its acquisition position and
    /// same-day lots keep arrival order. Lots with no remaining quantity are
    /// dropped.
    pub fn push(&mut self, mut lot: Lot) {
        if lot.remaining_quantity <= Decimal::ZERO {
            return;
        }
        lot.sequence = self.next_sequence;
        self.next_sequence += 1;

        let idx = self.lots.partition_point(|l| l.acquired <= lot.acquired);
        self.lots.insert(idx, lot);
    }

    /// Consume `quantity` units from the head of the queue.
    ///
    /// Each lot contributes `min(remaining, still_needed)` units. Exhausted
    /// lots are removed. Whatever the queue cannot cover is returned as
    /// [`Consumption::unmatched`]; the queue never goes negative.
    pub fn consume(&mut self, quantity: Decimal) -> Consumption {
        let mut remaining = quantity.max(Decimal::ZERO);
        let mut slices = Vec::new();

        while !remaining.is_zero() {
            let Some(head) = self.lots.front_mut() else {
                break;
            };

            let take = head.take(remaining);
            remaining -= take;
            slices.push(LotSlice {
                quantity: take,
                unit_cost: head.unit_cost,
                acquired: head.acquired,
                state_after: head.state(),
            });

            if head.state() == LotState::Exhausted {
                self.lots.pop_front();
            }
        }

        Consumption {
            slices,
            unmatched: remaining,
        }
    }
}

impl fmt::Display for LotQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.symbol)?;
        for (i, lot) in self.lots.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(
                f,
                "{} @ {} [{}]",
                lot.remaining_quantity, lot.unit_cost, lot.acquired
            )?;
        }
        write!(f, ")")
    }
}
