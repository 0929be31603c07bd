//! Per-run lot state.

use fifotax_core::{Decimal, Lot, LotQueue, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// All lot queues of one computation run, keyed by symbol.
///
/// A context is created empty at the start of a run and dropped at its end.
/// Nothing in it is shared between runs.
#[derive(Debug, Clone, Default)]
pub struct LedgerContext {
    queues: BTreeMap<String, LotQueue>,
}

/// A lot still open at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenLot {
    /// Units not yet sold.
    pub quantity: Decimal,
    /// Unit cost in the reporting currency.
    pub unit_cost: Decimal,
    /// Acquisition date.
    pub acquired: NaiveDate,
}

impl LedgerContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// The queue for `symbol`, created on first use.
    pub fn queue_mut(&mut self, symbol: &str) -> &mut LotQueue {
        self.queues
            .entry(symbol.to_string())
            .or_insert_with(|| LotQueue::new(symbol))
    }

    /// The queue for `symbol`, if any lot was ever added.
    pub fn queue(&self, symbol: &str) -> Option<&LotQueue> {
        self.queues.get(symbol)
    }

    /// Add a lot to its symbol's queue.
    pub fn add_lot(&mut self, lot: Lot) {
        let symbol = lot.symbol().to_string();
        self.queue_mut(&symbol).push(lot);
    }

    /// Open quantity for `symbol`.
    pub fn open_quantity(&self, symbol: &str) -> Decimal {
        self.queue(symbol)
            .map_or(Decimal::ZERO, LotQueue::total_quantity)
    }

    /// Remaining lots per symbol, omitting symbols with nothing open.
    pub fn open_lots(&self) -> BTreeMap<String, Vec<OpenLot>> {
        self.queues
            .iter()
            .filter(|(_, queue)| !queue.is_empty())
            .map(|(symbol, queue)| {
                let lots = queue
                    .lots()
                    .map(|lot| OpenLot {
                        quantity: lot.remaining_quantity(),
                        unit_cost: lot.unit_cost(),
                        acquired: lot.acquired(),
                    })
                    .collect();
                (symbol.clone(), lots)
            })
            .collect()
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
    fn test_queues_are_per_symbol() {
        let mut ctx = LedgerContext::new();
        ctx.add_lot(Lot::new("THYAO", dec!(10), dec!(250), date(2024, 1, 2)));
        ctx.add_lot(Lot::new("ASELS", dec!(5), dec!(40), date(2024, 1, 3)));

        assert_eq!(ctx.open_quantity("THYAO"), dec!(10));
        assert_eq!(ctx.open_quantity("ASELS"), dec!(5));
        assert_eq!(ctx.open_quantity("GARAN"), dec!(0));
        assert!(ctx.queue("GARAN").is_none());
    }

    #[test]
    fn test_open_lots_skips_empty_queues() {
        let mut ctx = LedgerContext::new();
        ctx.add_lot(Lot::new("THYAO", dec!(10), dec!(250), date(2024, 1, 2)));
        ctx.add_lot(Lot::new("ASELS", dec!(5), dec!(40), date(2024, 1, 3)));
        let _ = ctx.queue_mut("ASELS").consume(dec!(5));

        let open = ctx.open_lots();
        assert_eq!(open.len(), 1);
        assert_eq!(
            open["THYAO"],
            vec![OpenLot {
                quantity: dec!(10),
                unit_cost: dec!(250),
                acquired: date(2024, 1, 2),
            }]
        );
    }
}
