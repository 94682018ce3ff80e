//! # Pricing Engine
//!
//! `per_room = nights × base_price`, `total = per_room × room_count`.
//! Pure decimal arithmetic, rounded to 2 fractional digits.

use crate::booking::StayDates;
use crate::error::{BookingError, BookingResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Fractional digits kept on every stored amount
pub const MONEY_SCALE: u32 = 2;

/// Price breakdown for one allocation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub nights: u32,
    pub base_price: Decimal,
    pub room_count: u32,
    /// Amount charged on each booking row
    pub per_room: Decimal,
    pub total: Decimal,
}

/// Half-up rounding to [`MONEY_SCALE`] digits
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Price of one room for the whole stay
pub fn per_room_amount(base_price: Decimal, dates: &StayDates) -> Decimal {
    round_money(base_price * Decimal::from(dates.nights()))
}

/// Price `room_count` rooms at `base_price` for `dates`
pub fn quote(base_price: Decimal, dates: &StayDates, room_count: u32) -> Quote {
    let per_room = per_room_amount(base_price, dates);
    Quote {
        nights: dates.nights(),
        base_price,
        room_count,
        per_room,
        total: round_money(per_room * Decimal::from(room_count)),
    }
}

/// Convert a decimal amount to the gateway's minor unit (kobo, cents)
pub fn to_minor_units(amount: Decimal) -> BookingResult<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| BookingError::Validation(format!("amount {} is out of range", amount)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn stay(from: u32, to: u32) -> StayDates {
        StayDates::new(
            NaiveDate::from_ymd_opt(2026, 1, from).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, to).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_standard_room_two_nights_two_rooms() {
        let q = quote(dec!(70000), &stay(10, 12), 2);
        assert_eq!(q.nights, 2);
        assert_eq!(q.per_room, dec!(140000));
        assert_eq!(q.total, dec!(280000));
    }

    #[test]
    fn test_amount_tracks_nights_for_every_stay_length() {
        for nights in 1..=20u32 {
            let dates = stay(1, 1 + nights);
            let expected = dec!(30000.50) * Decimal::from(nights);
            assert_eq!(per_room_amount(dec!(30000.50), &dates), expected);
        }
    }

    #[test]
    fn test_rounds_to_two_places() {
        assert_eq!(per_room_amount(dec!(99.999), &stay(1, 2)), dec!(100.00));
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(to_minor_units(dec!(140000)).unwrap(), 14_000_000);
        assert_eq!(to_minor_units(dec!(12.345)).unwrap(), 1235);
    }
}
