//! Decimal rounding for rate totals
//!
//! Totals are rounded through their shortest decimal representation, so
//! `0.125` rounds to `0.13` and `2.675` (stored as 2.67499...) still rounds
//! to `2.68`, matching what a user would compute by hand.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Round half away from zero to `places` decimal places
pub fn round_half_up(value: f64, places: u32) -> f64 {
    let decimal = match Decimal::from_str(&value.to_string()) {
        Ok(d) => d,
        Err(_) => {
            // NaN, infinities and magnitudes beyond 96 bits
            log::warn!("cannot round {value} as a decimal, keeping it unrounded");
            return value;
        }
    };

    decimal
        .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
        .to_string()
        .parse()
        .unwrap_or(value)
}

/// Add `delta` to a running total and round the result to two places
pub(crate) fn accumulate(total: f64, delta: f64) -> f64 {
    round_half_up(total + delta, 2)
}
