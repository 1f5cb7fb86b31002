//! Exchange identifiers and the per-exchange odds tick ladders.
//!
//! Both exchanges quote decimal odds in the legal range `[1.0, 1000.0]`, but
//! each uses its own ladder of minimum price increments. The increment is a
//! step function of the odds level; quoting off-ladder prices is rejected by
//! the exchanges, so every price this system produces is built by stepping an
//! observed price up or down with [`next_tick_up`] / [`next_tick_down`].

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Highest odds either exchange accepts.
pub const MAX_ODDS: Decimal = dec!(1000);

/// Sentinel for "no back price offered".
///
/// Compares below every real back price, so a profitability test against an
/// empty book can never succeed.
pub const BACK_ABSENT: Decimal = dec!(1);

/// Sentinel for "no lay price offered".
///
/// Compares above every real lay price.
pub const LAY_ABSENT: Decimal = dec!(1000);

// =============================================================================
// Exchange Identifier
// =============================================================================

/// The two betting exchanges this system trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeId {
    /// Betfair: returns an order reference synchronously on placement.
    Betfair,
    /// Betdaq: order references surface only through the changed-orders poll.
    Betdaq,
}

impl ExchangeId {
    /// Returns the other exchange.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Betfair => Self::Betdaq,
            Self::Betdaq => Self::Betfair,
        }
    }

    /// Lowest odds this exchange accepts.
    #[must_use]
    pub fn min_odds(self) -> Decimal {
        match self {
            Self::Betfair => dec!(1.01),
            Self::Betdaq => dec!(1.0),
        }
    }

    /// Returns the display string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Betfair => "betfair",
            Self::Betdaq => "betdaq",
        }
    }
}

impl std::fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Tick Ladders
// =============================================================================

// (band lower bound, increment within the band), best-to-worst coverage up to
// MAX_ODDS. Bands are half-open: a price on a lower bound belongs to that band.
const BETFAIR_BANDS: [(Decimal, Decimal); 10] = [
    (dec!(1.01), dec!(0.01)),
    (dec!(2), dec!(0.02)),
    (dec!(3), dec!(0.05)),
    (dec!(4), dec!(0.1)),
    (dec!(6), dec!(0.2)),
    (dec!(10), dec!(0.5)),
    (dec!(20), dec!(1)),
    (dec!(30), dec!(2)),
    (dec!(50), dec!(5)),
    (dec!(100), dec!(10)),
];

// The 0.5 band runs through 20.5 inclusive: one tick below 21.0 is 20.5.
const BETDAQ_BANDS: [(Decimal, Decimal); 8] = [
    (dec!(1.0), dec!(0.01)),
    (dec!(3), dec!(0.05)),
    (dec!(4), dec!(0.1)),
    (dec!(6), dec!(0.2)),
    (dec!(10), dec!(0.5)),
    (dec!(21), dec!(1)),
    (dec!(50), dec!(2)),
    (dec!(200), dec!(5)),
];

fn bands(exchange: ExchangeId) -> &'static [(Decimal, Decimal)] {
    match exchange {
        ExchangeId::Betfair => &BETFAIR_BANDS,
        ExchangeId::Betdaq => &BETDAQ_BANDS,
    }
}

/// Minimum price increment at `price` on `exchange`.
#[must_use]
pub fn tick_increment(exchange: ExchangeId, price: Decimal) -> Decimal {
    let table = bands(exchange);
    let mut step = table[0].1;
    for &(lower, increment) in table {
        if price >= lower {
            step = increment;
        } else {
            break;
        }
    }
    step
}

// Increment governing prices strictly below `price`. Differs from
// `tick_increment` only when `price` sits exactly on a band boundary.
fn increment_below(exchange: ExchangeId, price: Decimal) -> Decimal {
    let table = bands(exchange);
    let mut step = table[0].1;
    for &(lower, increment) in table {
        if price > lower {
            step = increment;
        } else {
            break;
        }
    }
    step
}

/// One ladder step up from `price`, clamped to [`MAX_ODDS`].
#[must_use]
pub fn next_tick_up(exchange: ExchangeId, price: Decimal) -> Decimal {
    let min = exchange.min_odds();
    if price < min {
        return min;
    }
    if price >= MAX_ODDS {
        return MAX_ODDS;
    }
    (price + tick_increment(exchange, price)).min(MAX_ODDS)
}

/// One ladder step down from `price`, clamped to the exchange minimum.
///
/// A price sitting on a band's lower bound steps with the band below it:
/// Betdaq 21.0 steps to 20.5, Betfair 20.0 steps to 19.5.
#[must_use]
pub fn next_tick_down(exchange: ExchangeId, price: Decimal) -> Decimal {
    let min = exchange.min_odds();
    if price <= min {
        return min;
    }
    (price - increment_below(exchange, price)).max(min)
}
