//! FIFO must follow acquisition date, not insertion order.
//!
//! A lot recorded late (for example a back-dated broker correction) has to be
//! consumed before younger lots that were recorded earlier.

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use fifotax_core::{Lot, LotQueue};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[test]
fn fifo_selects_oldest_by_date_not_insertion_order() {
    let mut queue = LotQueue::new("AAPL");

    queue.push(Lot::new("AAPL", dec!(10), dec!(150), date(2024, 1, 2)));
    // older, but recorded second
    queue.push(Lot::new("AAPL", dec!(10), dec!(100), date(2024, 1, 1)));

    let consumption = queue.consume(dec!(5));

    let cost: rust_decimal::Decimal = consumption.slices.iter().map(|s| s.cost_basis()).sum();
    assert_eq!(
        cost,
        dec!(500),
        "FIFO should select oldest lot by DATE. Got cost basis {cost}, expected 500"
    );
    assert_eq!(consumption.slices[0].acquired, date(2024, 1, 1));
}

#[test]
fn fifo_consumes_first_lot_entirely_before_second() {
    let mut queue = LotQueue::new("THYAO");
    queue.push(Lot::new("THYAO", dec!(10), dec!(100), date(2024, 1, 1)));
    queue.push(Lot::new("THYAO", dec!(5), dec!(110), date(2024, 1, 2)));

    let consumption = queue.consume(dec!(10));

    assert_eq!(consumption.slices.len(), 1);
    assert_eq!(consumption.slices[0].quantity, dec!(10));
    assert_eq!(consumption.slices[0].unit_cost, dec!(100));
    assert_eq!(queue.total_quantity(), dec!(5));
}

#[test]
fn fifo_interleaved_sells_keep_order() {
    let mut queue = LotQueue::new("THYAO");
    queue.push(Lot::new("THYAO", dec!(100), dec!(10), date(2024, 1, 1)));
    queue.push(Lot::new("THYAO", dec!(50), dec!(12), date(2024, 2, 1)));

    let first = queue.consume(dec!(120));
    assert_eq!(first.matched(), dec!(120));

    queue.push(Lot::new("THYAO", dec!(40), dec!(14), date(2024, 3, 1)));
    let second = queue.consume(dec!(50));

    // 30 left in the February lot, then 20 from March
    assert_eq!(second.slices.len(), 2);
    assert_eq!(second.slices[0].unit_cost, dec!(12));
    assert_eq!(second.slices[0].quantity, dec!(30));
    assert_eq!(second.slices[1].unit_cost, dec!(14));
    assert_eq!(second.slices[1].quantity, dec!(20));
    assert_eq!(queue.total_quantity(), dec!(20));
}
