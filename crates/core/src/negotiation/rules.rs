//! Fixed pricing rules shared by every negotiation.

use std::time::Duration;

/// Delay before the simulated seller answers a buyer proposal.
pub const COUNTERPARTY_DELAY: Duration = Duration::from_secs(2);

/// Buyer steps move by 1/20 (5%) of the price on the table.
const STEP_DIVISOR: u64 = 20;
/// Lowering never goes below 30% of the asking price.
const FLOOR_TENTHS: u64 = 3;
/// Proposals at or above 80% of the asking price are accepted outright.
const ACCEPT_TENTHS: u64 = 8;
/// Proposals at or above 70% of the asking price get a counter-offer.
const COUNTER_TENTHS: u64 = 7;

/// How the simulated seller answers a buyer proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterpartyResponse {
    /// Deal at the buyer's price.
    Accept,
    /// Seller proposes the midpoint between the buyer's price and the asking price.
    Counter(u64),
    /// Too low; nothing changes.
    Reject,
}

/// Size of one UP/DOWN step for the price currently on the table.
pub fn step(current_price: u64) -> u64 {
    current_price / STEP_DIVISOR
}

/// Lowest price the buyer may propose for a listing.
pub fn floor_price(initial_price: u64) -> u64 {
    (u128::from(initial_price) * u128::from(FLOOR_TENTHS) / 10) as u64
}

/// Evaluate a buyer proposal against the listing's asking price.
pub fn respond(initial_price: u64, buyer_price: u64) -> CounterpartyResponse {
    if at_least_tenths(buyer_price, initial_price, ACCEPT_TENTHS) {
        CounterpartyResponse::Accept
    } else if at_least_tenths(buyer_price, initial_price, COUNTER_TENTHS) {
        let midpoint = (u128::from(buyer_price) + u128::from(initial_price)) / 2;
        CounterpartyResponse::Counter(midpoint as u64)
    } else {
        CounterpartyResponse::Reject
    }
}

fn at_least_tenths(price: u64, initial_price: u64, tenths: u64) -> bool {
    u128::from(price) * 10 >= u128::from(initial_price) * u128::from(tenths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_for_a_million() {
        assert_eq!(respond(1_000_000, 800_000), CounterpartyResponse::Accept);
        assert_eq!(respond(1_000_000, 1_250_000), CounterpartyResponse::Accept);
        assert_eq!(
            respond(1_000_000, 799_999),
            CounterpartyResponse::Counter(899_999)
        );
        assert_eq!(
            respond(1_000_000, 700_000),
            CounterpartyResponse::Counter(850_000)
        );
        assert_eq!(respond(1_000_000, 699_999), CounterpartyResponse::Reject);
    }

    #[test]
    fn thresholds_are_exact_for_odd_prices() {
        // 80% of 999 is 799.2
        assert_eq!(respond(999, 799), CounterpartyResponse::Counter(899));
        assert_eq!(respond(999, 800), CounterpartyResponse::Accept);
        // 70% of 999 is 699.3
        assert_eq!(respond(999, 699), CounterpartyResponse::Reject);
        assert_eq!(respond(999, 700), CounterpartyResponse::Counter(849));
    }

    #[test]
    fn step_and_floor_round_down() {
        assert_eq!(step(100_000), 5_000);
        assert_eq!(step(19), 0);
        assert_eq!(step(1_234_567), 61_728);
        assert_eq!(floor_price(1_000_000), 300_000);
        assert_eq!(floor_price(333), 99);
    }

    #[test]
    fn large_prices_do_not_overflow() {
        assert_eq!(respond(u64::MAX, u64::MAX), CounterpartyResponse::Accept);
        assert_eq!(floor_price(u64::MAX), (u64::MAX as u128 * 3 / 10) as u64);
    }
}
